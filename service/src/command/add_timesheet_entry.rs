//! [`Command`] for adding a new [`Entry`] to a [`Timesheet`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::timesheet::Entry;
use crate::{
    domain::{
        policy::{Action, Forbidden},
        timesheet::{self, entry, EntryError, VersionConflict},
        Actor, Timesheet,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for adding a new [`Entry`] to a draft [`Timesheet`].
#[derive(Clone, Debug)]
pub struct AddTimesheetEntry {
    /// [`Actor`] adding the [`Entry`].
    pub actor: Actor,

    /// ID of the [`Timesheet`] to add the [`Entry`] to.
    pub timesheet_id: timesheet::Id,

    /// [`entry::Details`] of the new [`Entry`].
    pub details: entry::Details,

    /// [`timesheet::Version`] the [`Actor`] expects the [`Timesheet`] to be
    /// of.
    pub expected_version: Option<timesheet::Version>,
}

/// Output of [`AddTimesheetEntry`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// ID of the added [`Entry`].
    pub entry_id: entry::Id,

    /// [`Timesheet`] with the added [`Entry`].
    pub timesheet: Timesheet,
}

impl<Db> Command<AddTimesheetEntry> for Service<Db>
where
    Db: Database<
            Select<By<Option<Timesheet>, timesheet::Id>>,
            Ok = Option<Timesheet>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Timesheet, timesheet::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Timesheet>, timesheet::Id>>,
            Ok = Option<Timesheet>,
            Err = Traced<database::Error>,
        > + Database<Insert<Timesheet>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AddTimesheetEntry,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AddTimesheetEntry {
            actor,
            timesheet_id,
            details,
            expected_version,
        } = cmd;

        let timesheet = self
            .database()
            .execute(Select(By::<Option<Timesheet>, _>::new(timesheet_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TimesheetNotExists(timesheet_id))
            .map_err(tracerr::wrap!())?;
        actor
            .authorize(Action::Edit, timesheet.employee_id())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent changes of the same `Timesheet`.
        tx.execute(Lock(By::new(timesheet_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut timesheet = tx
            .execute(Select(By::<Option<Timesheet>, _>::new(timesheet_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TimesheetNotExists(timesheet_id))
            .map_err(tracerr::wrap!())?;
        timesheet
            .version()
            .check(expected_version, self.config().require_version)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let entry_id = timesheet
            .add_entry(details)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Insert(timesheet.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::debug!(
            "`Entry(id: {entry_id})` added to `Timesheet(id: {timesheet_id})`",
        );

        Ok(Output {
            entry_id,
            timesheet,
        })
    }
}

/// Error of [`AddTimesheetEntry`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Entry`] cannot be added.
    #[display("Cannot add `Entry`: {_0}")]
    Entry(EntryError),

    /// [`Actor`] is not permitted to edit the [`Timesheet`].
    #[display("{_0}")]
    Forbidden(Forbidden),

    /// [`Timesheet`] with the provided ID does not exist.
    #[display("`Timesheet(id: {_0})` does not exist")]
    #[from(ignore)]
    TimesheetNotExists(#[error(not(source))] timesheet::Id),

    /// [`Timesheet`] is not of the expected [`timesheet::Version`].
    #[display("{_0}")]
    Version(VersionConflict),
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::Money;

    use crate::{
        command::fixture::{details, draft, employee, manager, service},
        domain::timesheet::{self, EntryError, Version},
        Command as _,
    };

    use super::{AddTimesheetEntry, ExecutionError};

    #[tokio::test]
    async fn recomputes_totals() {
        let service = service();
        let owner = employee(&service).await;
        let timesheet = draft(&service, &owner).await;

        let out = service
            .execute(AddTimesheetEntry {
                actor: owner,
                timesheet_id: timesheet.id(),
                details: details(3, "2.5", "10"),
                expected_version: Some(timesheet.version()),
            })
            .await
            .unwrap();

        assert!(out.timesheet.entry(out.entry_id).is_some());
        assert_eq!(out.timesheet.entries().len(), 2);
        assert_eq!(out.timesheet.totals().pay, Money::from_str("185").unwrap());
        assert_eq!(out.timesheet.version(), Version::INITIAL.next());
    }

    #[tokio::test]
    async fn permits_approvers_only_among_strangers() {
        let service = service();
        let owner = employee(&service).await;
        let timesheet = draft(&service, &owner).await;

        let err = service
            .execute(AddTimesheetEntry {
                actor: employee(&service).await,
                timesheet_id: timesheet.id(),
                details: details(3, "1", "10"),
                expected_version: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden(_)));

        drop(
            service
                .execute(AddTimesheetEntry {
                    actor: manager(&service).await,
                    timesheet_id: timesheet.id(),
                    details: details(3, "1", "10"),
                    expected_version: None,
                })
                .await
                .unwrap(),
        );
    }

    #[tokio::test]
    async fn fails_on_unknown_timesheet() {
        let service = service();
        let owner = employee(&service).await;
        let timesheet_id = timesheet::Id::new();

        let err = service
            .execute(AddTimesheetEntry {
                actor: owner,
                timesheet_id,
                details: details(3, "1", "10"),
                expected_version: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::TimesheetNotExists(id) if *id == timesheet_id,
        ));
    }

    #[tokio::test]
    async fn rejects_empty_entries() {
        let service = service();
        let owner = employee(&service).await;
        let timesheet = draft(&service, &owner).await;

        let err = service
            .execute(AddTimesheetEntry {
                actor: owner,
                timesheet_id: timesheet.id(),
                details: details(3, "0", "10"),
                expected_version: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Entry(EntryError::Empty),
        ));
    }
}
