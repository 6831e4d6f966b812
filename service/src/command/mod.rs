//! [`Command`] definition.

pub mod add_timesheet_entry;
pub mod approve_timesheet;
pub mod authorize_user_session;
pub mod create_timesheet;
pub mod create_user;
pub mod create_user_session;
pub mod delete_timesheet_entry;
pub mod edit_timesheet_entry;
pub mod return_timesheet;
pub mod submit_timesheet;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    add_timesheet_entry::AddTimesheetEntry,
    approve_timesheet::ApproveTimesheet,
    authorize_user_session::AuthorizeUserSession,
    create_timesheet::CreateTimesheet, create_user::CreateUser,
    create_user_session::CreateUserSession,
    delete_timesheet_entry::DeleteTimesheetEntry,
    edit_timesheet_entry::EditTimesheetEntry,
    return_timesheet::ReturnTimesheet, submit_timesheet::SubmitTimesheet,
};

#[cfg(test)]
pub(crate) mod fixture {
    //! Shared fixtures for [`Command`] scenarios.

    use std::{str::FromStr as _, time::Duration};

    use common::{
        operations::{Commit, Insert, Transact},
        Date, DateTime, Handler as _, Hours, Kilometers, Pieces, Rate,
    };

    use crate::{
        domain::{
            timesheet::{entry, Period},
            user::{self, Role, Roles},
            Actor, Timesheet, User,
        },
        infra::Memory,
        Config, Service,
    };

    /// Creates a new [`Service`] backed by an empty [`Memory`] database.
    pub(crate) fn service() -> Service<Memory> {
        service_with(false)
    }

    /// Creates a new [`Service`] optionally requiring expected versions.
    pub(crate) fn service_with(require_version: bool) -> Service<Memory> {
        let mut config =
            Config::from_secret(b"test-secret", Duration::from_secs(60));
        config.require_version = require_version;
        Service::new(config, Memory::new())
    }

    /// Stores a new [`User`] with the provided [`Role`]s.
    pub(crate) async fn user(
        service: &Service<Memory>,
        roles: impl IntoIterator<Item = Role>,
    ) -> Actor {
        let id = user::Id::new();
        let user = User {
            id,
            name: user::Name::new("Jane Doe").unwrap(),
            email: user::Email::new(format!("{id}@example.com")).unwrap(),
            roles: Roles::new(roles),
            created_at: DateTime::now().coerce(),
        };
        let roles = user.roles.clone();

        let tx = service.database().execute(Transact).await.unwrap();
        tx.execute(Insert(user)).await.unwrap();
        tx.execute(Commit).await.unwrap();

        Actor { user_id: id, roles }
    }

    /// Stores a new [`Role::Employee`].
    pub(crate) async fn employee(service: &Service<Memory>) -> Actor {
        user(service, [Role::Employee]).await
    }

    /// Stores a new [`Role::Manager`].
    pub(crate) async fn manager(service: &Service<Memory>) -> Actor {
        user(service, [Role::Manager]).await
    }

    /// Returns [`entry::Details`] of hourly work in January 2025.
    pub(crate) fn details(day: u8, hours: &str, rate: &str) -> entry::Details {
        entry::Details {
            work_date: Date::from_ymd(2025, 1, day).unwrap(),
            project: entry::Label::new("North").unwrap(),
            task: entry::Label::new("Wiring").unwrap(),
            hours: Hours::from_str(hours).unwrap(),
            km: Kilometers::ZERO,
            pieces: Pieces::ZERO,
            hour_rate: Rate::from_str(rate).unwrap(),
            km_rate: Rate::ZERO,
            piece_rate: Rate::ZERO,
            comment: None,
        }
    }

    /// Stores a new draft [`Timesheet`] of the first week of January 2025
    /// with a single 160.00 worth [`entry::Entry`].
    pub(crate) async fn draft(
        service: &Service<Memory>,
        owner: &Actor,
    ) -> Timesheet {
        let timesheet = Timesheet::new(
            owner.user_id,
            Period::new(
                Date::from_ymd(2025, 1, 1).unwrap(),
                Date::from_ymd(2025, 1, 7).unwrap(),
            )
            .unwrap(),
            [details(2, "8", "20")],
            DateTime::now().coerce(),
        )
        .unwrap();

        let tx = service.database().execute(Transact).await.unwrap();
        tx.execute(Insert(timesheet.clone())).await.unwrap();
        tx.execute(Commit).await.unwrap();

        timesheet
    }
}
