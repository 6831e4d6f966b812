//! GraphQL [`Query`]s definitions.

use common::Date;
use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "me",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn me(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.actor().await?.user_id;
        ctx.service()
            .execute(query::user::ById::by(my_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Timesheet` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TIMESHEET_NOT_EXISTS` - the `Timesheet` with the specified ID does
    ///                            not exist;
    /// - `FORBIDDEN` - the current `User` neither owns the `Timesheet` nor
    ///                 reviews `Timesheet`s.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "timesheet",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn timesheet(
        id: api::timesheet::Id,
        ctx: &Context,
    ) -> Result<api::Timesheet, Error> {
        let actor = ctx.actor().await?;
        ctx.service()
            .execute(query::timesheet::Get {
                actor,
                timesheet_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Timesheet` with the specified ID as a semicolon-separated
    /// CSV document.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TIMESHEET_NOT_EXISTS` - the `Timesheet` with the specified ID does
    ///                            not exist;
    /// - `FORBIDDEN` - the current `User` neither owns the `Timesheet` nor
    ///                 reviews `Timesheet`s.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "timesheetCsv",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn timesheet_csv(
        id: api::timesheet::Id,
        ctx: &Context,
    ) -> Result<String, Error> {
        let actor = ctx.actor().await?;
        ctx.service()
            .execute(query::timesheet::Csv(query::timesheet::Get {
                actor,
                timesheet_id: id.into(),
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Returns `Timesheet`s of the current `User`, ordered by their period
    /// start descending.
    ///
    /// `from` keeps `Timesheet`s starting on or after it, `to` keeps
    /// `Timesheet`s ending on or before it.
    #[tracing::instrument(
        skip_all,
        fields(
            from = ?from,
            gql.name = "myTimesheets",
            otel.name = Self::SPAN_NAME,
            status = ?status,
            to = ?to,
        ),
    )]
    pub async fn my_timesheets(
        from: Option<Date>,
        to: Option<Date>,
        status: Option<api::timesheet::Status>,
        ctx: &Context,
    ) -> Result<Vec<api::Timesheet>, Error> {
        let actor = ctx.actor().await?;
        ctx.service()
            .execute(query::timesheets::Mine {
                actor,
                filter: api::timesheet::filter(from, to, status),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|ts| ts.into_iter().map(Into::into).collect())
    }

    /// Returns `Timesheet`s of the current `User` as a semicolon-separated
    /// CSV document with a row per `TimesheetEntry`.
    #[tracing::instrument(
        skip_all,
        fields(
            from = ?from,
            gql.name = "myTimesheetsCsv",
            otel.name = Self::SPAN_NAME,
            status = ?status,
            to = ?to,
        ),
    )]
    pub async fn my_timesheets_csv(
        from: Option<Date>,
        to: Option<Date>,
        status: Option<api::timesheet::Status>,
        ctx: &Context,
    ) -> Result<String, Error> {
        let actor = ctx.actor().await?;
        ctx.service()
            .execute(query::timesheets::MineCsv(query::timesheets::Mine {
                actor,
                filter: api::timesheet::filter(from, to, status),
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Fetches the page of all the `Timesheet`s, ordered by their period
    /// start descending.
    ///
    /// Out of range `page` and `pageSize` are clamped to `1..` and `1..=200`
    /// respectively.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `FORBIDDEN` - the current `User` doesn't review `Timesheet`s.
    #[tracing::instrument(
        skip_all,
        fields(
            employee_email = ?employee_email.as_ref().map(ToString::to_string),
            from = ?from,
            gql.name = "timesheets",
            otel.name = Self::SPAN_NAME,
            page = ?page,
            page_size = ?page_size,
            status = ?status,
            to = ?to,
        ),
    )]
    pub async fn timesheets(
        from: Option<Date>,
        to: Option<Date>,
        status: Option<api::timesheet::Status>,
        employee_email: Option<api::user::Email>,
        page: Option<i32>,
        page_size: Option<i32>,
        ctx: &Context,
    ) -> Result<api::timesheet::list::Page, Error> {
        let actor = ctx.actor().await?;
        ctx.service()
            .execute(query::timesheets::List {
                actor,
                filter: api::timesheet::filter(from, to, status),
                employee_email: employee_email.map(Into::into),
                arguments: read::timesheet::list::Arguments::new(
                    page, page_size,
                ),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

impl AsError for query::timesheet::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Forbidden(e) => e.try_as_error(),
            Self::TimesheetNotExists(_) => {
                Some(TimesheetError::NotExists.into())
            }
        }
    }
}

impl AsError for query::timesheets::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotPermitted(_) => Some(api::PrivilegeError::Forbidden.into()),
        }
    }
}

define_error! {
    enum TimesheetError {
        #[code = "TIMESHEET_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Timesheet` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}
