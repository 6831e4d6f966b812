//! Domain definitions.

pub mod policy;
pub mod timesheet;
pub mod user;

pub use self::{policy::Actor, timesheet::Timesheet, user::User};
