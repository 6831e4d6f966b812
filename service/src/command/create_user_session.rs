//! [`Command`] for creating a [`Session`].

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::{domain::user::session::Token, Config};
use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`] valid for the configured
/// [`Config::session_ttl`].
#[derive(Clone, Debug, From)]
pub enum CreateUserSession {
    /// Create a new [`Session`] for the [`User`] with the provided
    /// [`user::Email`].
    ByEmail(user::Email),

    /// Create a new [`Session`] for the [`User`] with the provided ID.
    ByUserId(user::Id),
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the created [`Session`].
    pub token: session::Token,

    /// [`User`] whose [`Session`] has been created.
    pub user: User,

    /// [`DateTime`] when the [`Session`] expires.
    pub expires_at: session::ExpirationDateTime,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let user = match cmd {
            Cmd::ByEmail(email) => self
                .database()
                .execute(Select(By::new(&email)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| E::EmailNotExists(email))
                .map_err(tracerr::wrap!())?,
            Cmd::ByUserId(user_id) => self
                .database()
                .execute(Select(By::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?,
        };

        let expires_at = (DateTime::now() + self.config().session_ttl).coerce();
        let token = jsonwebtoken::encode::<Session>(
            &jsonwebtoken::Header::default(),
            &Session {
                user_id: user.id,
                expires_at,
            },
            &self.config().jwt_encoding_key,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        // SAFETY: `jsonwebtoken::encode` always returns a valid
        //         `session::Token`.
        #[expect(unsafe_code, reason = "invariants are preserved")]
        let token = unsafe { session::Token::new_unchecked(token) };

        log::debug!("`Session` issued for `User(id: {})`", user.id);

        Ok(Output {
            token,
            user,
            expires_at,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`User`] with the provided [`user::Email`] does not exist.
    #[display("`User(email: {_0})` does not exist")]
    #[from(ignore)]
    EmailNotExists(#[error(not(source))] user::Email),

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        command::{
            fixture::{employee, service},
            AuthorizeUserSession,
        },
        domain::user,
        Command as _,
    };

    use super::{CreateUserSession, ExecutionError};

    #[tokio::test]
    async fn issues_token_accepted_by_authorization() {
        let service = service();
        let actor = employee(&service).await;

        let out = service
            .execute(CreateUserSession::ByUserId(actor.user_id))
            .await
            .unwrap();
        assert_eq!(out.user.id, actor.user_id);
        assert!(out.expires_at > DateTime::now().coerce());

        let authorized = service
            .execute(AuthorizeUserSession { token: out.token })
            .await
            .unwrap();
        assert_eq!(authorized.actor.user_id, actor.user_id);
        assert_eq!(authorized.actor.roles, actor.roles);
    }

    #[tokio::test]
    async fn finds_users_by_email() {
        let service = service();
        let actor = employee(&service).await;
        let email = user::Email::new(format!("{}@EXAMPLE.com", actor.user_id))
            .unwrap();

        let out = service
            .execute(CreateUserSession::ByEmail(email))
            .await
            .unwrap();
        assert_eq!(out.user.id, actor.user_id);

        let err = service
            .execute(CreateUserSession::ByEmail(
                user::Email::new("nobody@example.com").unwrap(),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::EmailNotExists(_)));
    }
}
