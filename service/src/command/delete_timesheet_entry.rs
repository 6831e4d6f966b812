//! [`Command`] for deleting an [`Entry`] of a [`Timesheet`].

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

/// [`Command`] for deleting an [`Entry`] of a draft [`Timesheet`].
#[derive(Clone, Debug)]
pub struct DeleteTimesheetEntry {
    /// [`Actor`] deleting the [`Entry`].
    pub actor: Actor,

    /// ID of the [`Timesheet`] owning the [`Entry`].
    pub timesheet_id: timesheet::Id,

    /// ID of the [`Entry`] to delete.
    pub entry_id: entry::Id,

    /// [`timesheet::Version`] the [`Actor`] expects the [`Timesheet`] to be
    /// of.
    pub expected_version: Option<timesheet::Version>,
}

impl<Db> Command<DeleteTimesheetEntry> for Service<Db>
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
    type Ok = Timesheet;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: DeleteTimesheetEntry,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteTimesheetEntry {
            actor,
            timesheet_id,
            entry_id,
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

        drop(
            timesheet
                .delete_entry(entry_id)
                .map_err(tracerr::from_and_wrap!(=> E))?,
        );

        tx.execute(Insert(timesheet.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::debug!(
            "`Entry(id: {entry_id})` of `Timesheet(id: {timesheet_id})` \
             deleted",
        );

        Ok(timesheet)
    }
}

/// Error of [`DeleteTimesheetEntry`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Entry`] cannot be deleted.
    #[display("Cannot delete `Entry`: {_0}")]
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

    use common::{
        operations::{By, Select},
        Handler as _, Money,
    };

    use crate::{
        command::{
            fixture::{details, draft, employee, service},
            AddTimesheetEntry, SubmitTimesheet,
        },
        domain::{
            timesheet::{EntryError, Status},
            Timesheet,
        },
    };

    use super::{DeleteTimesheetEntry, ExecutionError};

    #[tokio::test]
    async fn recomputes_totals() {
        let service = service();
        let owner = employee(&service).await;
        let timesheet = draft(&service, &owner).await;

        let timesheet = service
            .execute(DeleteTimesheetEntry {
                actor: owner,
                timesheet_id: timesheet.id(),
                entry_id: timesheet.entries()[0].id,
                expected_version: None,
            })
            .await
            .unwrap();

        assert!(timesheet.entries().is_empty());
        assert_eq!(timesheet.totals().pay, Money::ZERO);
    }

    #[tokio::test]
    async fn rejects_deletion_after_submission() {
        let service = service();
        let owner = employee(&service).await;
        let timesheet = draft(&service, &owner).await;
        let timesheet_id = timesheet.id();

        let added = service
            .execute(AddTimesheetEntry {
                actor: owner.clone(),
                timesheet_id,
                details: details(3, "0.5", "0"),
                expected_version: None,
            })
            .await
            .unwrap();
        drop(
            service
                .execute(SubmitTimesheet {
                    actor: owner.clone(),
                    timesheet_id,
                    expected_version: None,
                })
                .await
                .unwrap(),
        );

        let err = service
            .execute(DeleteTimesheetEntry {
                actor: owner,
                timesheet_id,
                entry_id: added.entry_id,
                expected_version: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Entry(EntryError::NotDraft(Status::Submitted)),
        ));

        let stored = service
            .database()
            .execute(Select(By::<Option<Timesheet>, _>::new(timesheet_id)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.entries().len(), 2);
        assert_eq!(stored.totals().pay, Money::from_str("160.00").unwrap());
    }

    #[tokio::test]
    async fn leaves_state_untouched_on_failed_commit() {
        let service = service();
        let owner = employee(&service).await;
        let timesheet = draft(&service, &owner).await;

        service.database().fail_commits(true);
        let err = service
            .execute(DeleteTimesheetEntry {
                actor: owner.clone(),
                timesheet_id: timesheet.id(),
                entry_id: timesheet.entries()[0].id,
                expected_version: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Db(_)));
        service.database().fail_commits(false);

        let stored = service
            .database()
            .execute(Select(By::<Option<Timesheet>, _>::new(timesheet.id())))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.entries(), timesheet.entries());
        assert_eq!(stored.totals(), timesheet.totals());
        assert_eq!(stored.version(), timesheet.version());

        // Lock is released, so the `Timesheet` is still changeable.
        drop(
            service
                .execute(DeleteTimesheetEntry {
                    actor: owner,
                    timesheet_id: timesheet.id(),
                    entry_id: timesheet.entries()[0].id,
                    expected_version: None,
                })
                .await
                .unwrap(),
        );
    }
}
