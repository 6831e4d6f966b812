//! Read entities definitions.

pub mod timesheet;

#[cfg(doc)]
use crate::infra::Database;

/// Confirmation of the [`Database`] being able to serve requests.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Health;
