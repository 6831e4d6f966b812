//! GraphQL API definitions.

mod mutation;
mod query;
pub mod scalar;
pub mod timesheet;
pub mod user;

use juniper::EmptySubscription;
use service::domain::policy;

use crate::{define_error, AsError, Context, Error};

pub use self::{
    mutation::Mutation, query::Query, timesheet::Timesheet, user::User,
};

/// GraphQL schema.
pub type Schema =
    juniper::RootNode<'static, Query, Mutation, EmptySubscription<Context>>;

define_error! {
    enum PrivilegeError {
        #[code = "FORBIDDEN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` is not permitted to perform this \
                     action"]
        Forbidden,
    }
}

impl AsError for policy::Forbidden {
    fn try_as_error(&self) -> Option<Error> {
        Some(PrivilegeError::Forbidden.into())
    }
}
