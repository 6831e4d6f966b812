//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{user, Actor, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// Name of the unique constraint of [`user::Email`]s.
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// [`Command`] for creating a new [`User`].
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Actor`] creating the [`User`].
    ///
    /// [`None`] for the system itself (bootstrapping an administrator, for
    /// example).
    pub actor: Option<Actor>,

    /// [`user::Name`] of a new [`User`].
    pub name: user::Name,

    /// [`user::Email`] of a new [`User`].
    pub email: user::Email,

    /// [`user::Roles`] granted to a new [`User`].
    pub roles: user::Roles,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            actor,
            name,
            email,
            roles,
        } = cmd;

        if let Some(actor) = &actor {
            if !actor.can_manage_users() {
                return Err(tracerr::new!(E::NotPermitted(actor.user_id)));
            }
        }

        let u = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if u.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let user = User {
            id: user::Id::new(),
            name,
            email,
            roles,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let stored = match tx.execute(Insert(user.clone())).await {
            Ok(_) => tx.execute(Commit).await.map(drop),
            Err(e) => Err(e),
        };
        if let Err(e) = stored {
            // Concurrent creation has won the race for the `Email`.
            if e.as_ref().is_unique_violation(EMAIL_CONSTRAINT) {
                return Err(tracerr::new!(E::EmailOccupied(user.email)));
            }
            return Err(e).map_err(tracerr::map_from_and_wrap!(=> E));
        }

        log::info!(
            "`User(id: {})` created with `{}` e-mail",
            user.id,
            user.email,
        );

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Email`] is already occupied.
    #[display("`{_0}` e-mail is occupied")]
    EmailOccupied(#[error(not(source))] user::Email),

    /// [`Actor`] is not permitted to create [`User`]s.
    #[display("`User(id: {_0})` is not permitted to create users")]
    NotPermitted(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture::{employee, service, user},
        domain::{
            user::{self, Role, Roles},
            Actor,
        },
        Command as _,
    };

    use super::{CreateUser, ExecutionError};

    fn cmd(actor: Option<Actor>, email: &str) -> CreateUser {
        CreateUser {
            actor,
            name: user::Name::new("John Roe").unwrap(),
            email: user::Email::new(email).unwrap(),
            roles: Roles::new([Role::Manager]),
        }
    }

    #[tokio::test]
    async fn admin_creates_user() {
        let service = service();
        let admin = user(&service, [Role::Admin]).await;

        let created = service
            .execute(cmd(Some(admin), "John@Example.com"))
            .await
            .unwrap();

        assert_eq!(created.email.to_string(), "john@example.com");
        assert!(created.roles.contains(Role::Manager));
    }

    #[tokio::test]
    async fn rejects_occupied_email() {
        let service = service();
        drop(service.execute(cmd(None, "john@example.com")).await.unwrap());

        let err = service
            .execute(cmd(None, "JOHN@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::EmailOccupied(_)));
    }

    #[tokio::test]
    async fn forbids_employees() {
        let service = service();
        let actor = employee(&service).await;

        let err = service
            .execute(cmd(Some(actor), "john@example.com"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));
    }
}
