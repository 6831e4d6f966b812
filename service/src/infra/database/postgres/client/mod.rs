//! Postgres database clients acquiring their [`Connection`]s lazily.
//!
//! [`Connection`]: super::Connection

pub mod non_tx;
pub mod tx;

pub use self::{non_tx::NonTx, tx::Tx};
