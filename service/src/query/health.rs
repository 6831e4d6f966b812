//! [`Query`] of the [`Service`] health.

use common::operations::By;

#[cfg(doc)]
use crate::{Query, Service};
use crate::read;

use super::DatabaseQuery;

/// Queries whether the [`Service`] is able to reach its storage.
pub type Health = DatabaseQuery<By<read::Health, ()>>;
