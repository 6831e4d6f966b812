//! GraphQL [`Mutation`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{command, Command as _};

use crate::{api, define_error, AsError, Context, Error, Session};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `User` with the provided name, email and `UserRole`s.
    ///
    /// `User` without any `UserRole` is an `EMPLOYEE`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `EMAIL_OCCUPIED` - provided `UserEmail` is occupied by another
    ///                      `User`;
    /// - `FORBIDDEN` - the current `User` doesn't administer `User`s.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUser",
            name = %name,
            otel.name = Self::SPAN_NAME,
            roles = ?roles,
        ),
    )]
    pub async fn create_user(
        name: api::user::Name,
        email: api::user::Email,
        roles: Option<Vec<api::user::Role>>,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        let actor = ctx.actor().await?;
        ctx.service()
            .execute(command::CreateUser {
                actor: Some(actor),
                name: name.into(),
                email: email.into(),
                roles: roles.into_iter().flatten().map(Into::into).collect(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `Session` of the `User` with the provided email.
    ///
    /// Stands in for an external identity provider, so is permitted to the
    /// `User`s administering `User`s only.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USER_NOT_EXISTS` - no `User` has the provided `UserEmail`;
    /// - `FORBIDDEN` - the current `User` doesn't administer `User`s.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUserSession",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        email: api::user::Email,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let actor = ctx.actor().await?;
        if !actor.can_manage_users() {
            return Err(api::PrivilegeError::Forbidden.into())
                .map_err(ctx.error());
        }

        ctx.service()
            .execute(command::CreateUserSession::ByEmail(email.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `Session` of the current `User`, prolonging its
    /// authentication.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "refreshUserSession",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn refresh_user_session(
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let actor = ctx.actor().await?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(actor.user_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.set_current_session(Session {
            actor,
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        Ok(output.into())
    }

    /// Creates a new draft `Timesheet` of the current `User` over the
    /// provided period.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_PERIOD` - `periodStart` is after `periodEnd`;
    /// - `EMPTY_ENTRY` - some of the `entries` records no work;
    /// - `WORK_DATE_OUT_OF_PERIOD` - some of the `entries` is dated outside
    ///                               of the period.
    #[tracing::instrument(
        skip_all,
        fields(
            entries = entries.as_ref().map_or(0, Vec::len),
            gql.name = "createTimesheet",
            otel.name = Self::SPAN_NAME,
            period_end = %period_end,
            period_start = %period_start,
        ),
    )]
    pub async fn create_timesheet(
        period_start: Date,
        period_end: Date,
        entries: Option<Vec<api::timesheet::EntryInput>>,
        ctx: &Context,
    ) -> Result<api::Timesheet, Error> {
        let entries = entries
            .into_iter()
            .flatten()
            .map(api::timesheet::EntryInput::into_details)
            .collect::<Result<Vec<_>, _>>()
            .map_err(ctx.error())?;
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::CreateTimesheet {
                actor,
                period_start,
                period_end,
                entries,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Adds a new `TimesheetEntry` to the draft `Timesheet`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TIMESHEET_NOT_EXISTS` - the `Timesheet` doesn't exist;
    /// - `FORBIDDEN` - the current `User` may not edit the `Timesheet`;
    /// - `TIMESHEET_NOT_DRAFT` - the `Timesheet` is not a draft;
    /// - `EMPTY_ENTRY` - the `entry` records no work;
    /// - `WORK_DATE_OUT_OF_PERIOD` - the `entry` is dated outside of the
    ///                               `Timesheet` period;
    /// - `VERSION_REQUIRED` - `expectedVersion` must be provided;
    /// - `VERSION_MISMATCH` - the `Timesheet` has been changed concurrently.
    #[tracing::instrument(
        skip_all,
        fields(
            expected_version = ?expected_version,
            gql.name = "addTimesheetEntry",
            otel.name = Self::SPAN_NAME,
            timesheet_id = %timesheet_id,
        ),
    )]
    pub async fn add_timesheet_entry(
        timesheet_id: api::timesheet::Id,
        entry: api::timesheet::EntryInput,
        expected_version: Option<i32>,
        ctx: &Context,
    ) -> Result<api::Timesheet, Error> {
        let details = entry.into_details().map_err(ctx.error())?;
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::AddTimesheetEntry {
                actor,
                timesheet_id: timesheet_id.into(),
                details,
                expected_version: expected_version.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|out| out.timesheet.into())
    }

    /// Replaces the `TimesheetEntry` of the draft `Timesheet`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TIMESHEET_NOT_EXISTS` - the `Timesheet` doesn't exist;
    /// - `ENTRY_NOT_EXISTS` - the `TimesheetEntry` doesn't exist;
    /// - `FORBIDDEN` - the current `User` may not edit the `Timesheet`;
    /// - `TIMESHEET_NOT_DRAFT` - the `Timesheet` is not a draft;
    /// - `EMPTY_ENTRY` - the `entry` records no work;
    /// - `WORK_DATE_OUT_OF_PERIOD` - the `entry` is dated outside of the
    ///                               `Timesheet` period;
    /// - `VERSION_REQUIRED` - `expectedVersion` must be provided;
    /// - `VERSION_MISMATCH` - the `Timesheet` has been changed concurrently.
    #[tracing::instrument(
        skip_all,
        fields(
            entry_id = %entry_id,
            expected_version = ?expected_version,
            gql.name = "editTimesheetEntry",
            otel.name = Self::SPAN_NAME,
            timesheet_id = %timesheet_id,
        ),
    )]
    pub async fn edit_timesheet_entry(
        timesheet_id: api::timesheet::Id,
        entry_id: api::timesheet::EntryId,
        entry: api::timesheet::EntryInput,
        expected_version: Option<i32>,
        ctx: &Context,
    ) -> Result<api::Timesheet, Error> {
        let details = entry.into_details().map_err(ctx.error())?;
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::EditTimesheetEntry {
                actor,
                timesheet_id: timesheet_id.into(),
                entry_id: entry_id.into(),
                details,
                expected_version: expected_version.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `TimesheetEntry` of the draft `Timesheet`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TIMESHEET_NOT_EXISTS` - the `Timesheet` doesn't exist;
    /// - `ENTRY_NOT_EXISTS` - the `TimesheetEntry` doesn't exist;
    /// - `FORBIDDEN` - the current `User` may not edit the `Timesheet`;
    /// - `TIMESHEET_NOT_DRAFT` - the `Timesheet` is not a draft;
    /// - `VERSION_REQUIRED` - `expectedVersion` must be provided;
    /// - `VERSION_MISMATCH` - the `Timesheet` has been changed concurrently.
    #[tracing::instrument(
        skip_all,
        fields(
            entry_id = %entry_id,
            expected_version = ?expected_version,
            gql.name = "deleteTimesheetEntry",
            otel.name = Self::SPAN_NAME,
            timesheet_id = %timesheet_id,
        ),
    )]
    pub async fn delete_timesheet_entry(
        timesheet_id: api::timesheet::Id,
        entry_id: api::timesheet::EntryId,
        expected_version: Option<i32>,
        ctx: &Context,
    ) -> Result<api::Timesheet, Error> {
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::DeleteTimesheetEntry {
                actor,
                timesheet_id: timesheet_id.into(),
                entry_id: entry_id.into(),
                expected_version: expected_version.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Submits the `Timesheet` for a review.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TIMESHEET_NOT_EXISTS` - the `Timesheet` doesn't exist;
    /// - `FORBIDDEN` - the current `User` may not submit the `Timesheet`;
    /// - `INVALID_TRANSITION` - the `Timesheet` cannot be submitted;
    /// - `VERSION_REQUIRED` - `expectedVersion` must be provided;
    /// - `VERSION_MISMATCH` - the `Timesheet` has been changed concurrently.
    #[tracing::instrument(
        skip_all,
        fields(
            expected_version = ?expected_version,
            gql.name = "submitTimesheet",
            otel.name = Self::SPAN_NAME,
            timesheet_id = %timesheet_id,
        ),
    )]
    pub async fn submit_timesheet(
        timesheet_id: api::timesheet::Id,
        expected_version: Option<i32>,
        ctx: &Context,
    ) -> Result<api::Timesheet, Error> {
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::SubmitTimesheet {
                actor,
                timesheet_id: timesheet_id.into(),
                expected_version: expected_version.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Approves the `Timesheet`, optionally replacing its reviewer notes.
    ///
    /// Blank `notes` keep the existing ones.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TIMESHEET_NOT_EXISTS` - the `Timesheet` doesn't exist;
    /// - `FORBIDDEN` - the current `User` doesn't review `Timesheet`s;
    /// - `INVALID_TRANSITION` - the `Timesheet` cannot be approved;
    /// - `INVALID_NOTES` - `notes` are too long;
    /// - `VERSION_REQUIRED` - `expectedVersion` must be provided;
    /// - `VERSION_MISMATCH` - the `Timesheet` has been changed concurrently.
    #[tracing::instrument(
        skip_all,
        fields(
            expected_version = ?expected_version,
            gql.name = "approveTimesheet",
            otel.name = Self::SPAN_NAME,
            timesheet_id = %timesheet_id,
        ),
    )]
    pub async fn approve_timesheet(
        timesheet_id: api::timesheet::Id,
        notes: Option<String>,
        expected_version: Option<i32>,
        ctx: &Context,
    ) -> Result<api::Timesheet, Error> {
        let notes = api::timesheet::notes(notes).map_err(ctx.error())?;
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::ApproveTimesheet {
                actor,
                timesheet_id: timesheet_id.into(),
                notes,
                expected_version: expected_version.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Timesheet` to its employee, optionally replacing its
    /// reviewer notes.
    ///
    /// Blank `notes` keep the existing ones.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TIMESHEET_NOT_EXISTS` - the `Timesheet` doesn't exist;
    /// - `FORBIDDEN` - the current `User` doesn't review `Timesheet`s;
    /// - `INVALID_TRANSITION` - the `Timesheet` cannot be returned;
    /// - `INVALID_NOTES` - `notes` are too long;
    /// - `VERSION_REQUIRED` - `expectedVersion` must be provided;
    /// - `VERSION_MISMATCH` - the `Timesheet` has been changed concurrently.
    #[tracing::instrument(
        skip_all,
        fields(
            expected_version = ?expected_version,
            gql.name = "returnTimesheet",
            otel.name = Self::SPAN_NAME,
            timesheet_id = %timesheet_id,
        ),
    )]
    pub async fn return_timesheet(
        timesheet_id: api::timesheet::Id,
        notes: Option<String>,
        expected_version: Option<i32>,
        ctx: &Context,
    ) -> Result<api::Timesheet, Error> {
        let notes = api::timesheet::notes(notes).map_err(ctx.error())?;
        let actor = ctx.actor().await?;

        ctx.service()
            .execute(command::ReturnTimesheet {
                actor,
                timesheet_id: timesheet_id.into(),
                notes,
                expected_version: expected_version.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserEmail` is occupied by another `User`"]
                EmailOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
            Self::NotPermitted(_) => {
                Some(api::PrivilegeError::Forbidden.into())
            }
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailNotExists(_) | Self::UserNotExists(_) => {
                Some(api::query::UserError::NotExists.into())
            }
            Self::JsonWebTokenEncodeError(_) => None,
        }
    }
}

impl AsError for command::create_timesheet::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Entry(e) => e.try_as_error(),
            Self::Period(e) => e.try_as_error(),
        }
    }
}

/// Implements [`AsError`] for an `ExecutionError` of a [`command`] mutating
/// an existing `Timesheet`.
macro_rules! impl_timesheet_as_error {
    ($module:ident { $($variant:ident),* $(,)? }) => {
        impl AsError for command::$module::ExecutionError {
            fn try_as_error(&self) -> Option<Error> {
                match self {
                    Self::Db(e) => e.try_as_error(),
                    Self::Forbidden(e) => e.try_as_error(),
                    Self::TimesheetNotExists(_) => Some(
                        api::query::TimesheetError::NotExists.into(),
                    ),
                    Self::Version(e) => e.try_as_error(),
                    $(Self::$variant(e) => e.try_as_error(),)*
                }
            }
        }
    };
}

impl_timesheet_as_error!(add_timesheet_entry { Entry });
impl_timesheet_as_error!(edit_timesheet_entry { Entry });
impl_timesheet_as_error!(delete_timesheet_entry { Entry });
impl_timesheet_as_error!(submit_timesheet { Transition });
impl_timesheet_as_error!(approve_timesheet { Transition });
impl_timesheet_as_error!(return_timesheet { Transition });

#[cfg(test)]
mod spec {
    use service::{
        command,
        domain::{policy, timesheet, user},
    };

    use crate::AsError as _;

    #[test]
    fn maps_timesheet_command_errors() {
        let err = command::submit_timesheet::ExecutionError::TimesheetNotExists(
            timesheet::Id::new(),
        )
        .as_error();
        assert_eq!(err.code, "TIMESHEET_NOT_EXISTS");
        assert_eq!(err.status_code, http::StatusCode::NOT_FOUND);

        let err = command::approve_timesheet::ExecutionError::Forbidden(
            policy::Forbidden {
                user_id: user::Id::new(),
                action: policy::Action::Review,
            },
        )
        .as_error();
        assert_eq!(err.code, "FORBIDDEN");
        assert_eq!(err.status_code, http::StatusCode::FORBIDDEN);

        let err = command::delete_timesheet_entry::ExecutionError::Entry(
            timesheet::EntryError::NotDraft(timesheet::Status::Submitted),
        )
        .as_error();
        assert_eq!(err.code, "TIMESHEET_NOT_DRAFT");
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn maps_occupied_emails() {
        let err = command::create_user::ExecutionError::EmailOccupied(
            user::Email::new("boss@example.com").unwrap(),
        )
        .as_error();

        assert_eq!(err.code, "EMAIL_OCCUPIED");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
    }
}
