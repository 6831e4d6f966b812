//! [`Query`] definition.

pub mod health;
pub mod timesheet;
pub mod timesheets;
pub mod user;

use common::operations::{By, Select};
use tracerr::Traced;

use crate::{
    infra::{database, Database},
    Service,
};

/// [`Query`] of the [`Service`].
pub use common::Handler as Query;

/// [`Query`] [`Select`]ing a `T`ype from a [`Database`].
#[derive(Clone, Copy, Debug)]
#[expect(clippy::module_name_repetitions, reason = "more readable")]
pub struct DatabaseQuery<T>(T);

impl<W, B> DatabaseQuery<By<W, B>> {
    /// Creates a new [`DatabaseQuery`] selecting a `W` by the provided `B`.
    #[must_use]
    pub fn by(by: B) -> Self {
        Self(By::new(by))
    }
}

impl<Db, W, B> Query<DatabaseQuery<By<W, B>>> for Service<Db>
where
    Db: Database<Select<By<W, B>>, Ok = W, Err = Traced<database::Error>>,
{
    type Ok = W;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        DatabaseQuery(by): DatabaseQuery<By<W, B>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(by))
            .await
            .map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture::{employee, service},
        domain::user,
        read, Query as _,
    };

    use super::{health::Health, user::ById};

    #[tokio::test]
    async fn selects_from_database() {
        let service = service();
        let actor = employee(&service).await;

        let found = service
            .execute(ById::by(actor.user_id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.roles, actor.roles);

        assert!(service
            .execute(ById::by(user::Id::new()))
            .await
            .unwrap()
            .is_none());

        assert_eq!(
            service.execute(Health::by(())).await.unwrap(),
            read::Health,
        );
    }
}
