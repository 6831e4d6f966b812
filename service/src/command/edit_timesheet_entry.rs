//! [`Command`] for editing an [`Entry`] of a [`Timesheet`].

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

/// [`Command`] for replacing [`entry::Details`] of an [`Entry`] in a draft
/// [`Timesheet`].
#[derive(Clone, Debug)]
pub struct EditTimesheetEntry {
    /// [`Actor`] editing the [`Entry`].
    pub actor: Actor,

    /// ID of the [`Timesheet`] owning the [`Entry`].
    pub timesheet_id: timesheet::Id,

    /// ID of the [`Entry`] to edit.
    pub entry_id: entry::Id,

    /// New [`entry::Details`] of the [`Entry`].
    pub details: entry::Details,

    /// [`timesheet::Version`] the [`Actor`] expects the [`Timesheet`] to be
    /// of.
    pub expected_version: Option<timesheet::Version>,
}

impl<Db> Command<EditTimesheetEntry> for Service<Db>
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
        cmd: EditTimesheetEntry,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let EditTimesheetEntry {
            actor,
            timesheet_id,
            entry_id,
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

        timesheet
            .edit_entry(entry_id, details)
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
            "`Entry(id: {entry_id})` of `Timesheet(id: {timesheet_id})` edited",
        );

        Ok(timesheet)
    }
}

/// Error of [`EditTimesheetEntry`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Entry`] cannot be edited.
    #[display("Cannot edit `Entry`: {_0}")]
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
        Handler as _, Hours, Money,
    };

    use crate::{
        command::{
            fixture::{details, draft, employee, service, service_with},
            SubmitTimesheet,
        },
        domain::{
            timesheet::{entry, EntryError, Status, Version, VersionConflict},
            Timesheet,
        },
        Command as _,
    };

    use super::{EditTimesheetEntry, ExecutionError};

    #[tokio::test]
    async fn recomputes_entry_pay_and_totals() {
        let service = service();
        let owner = employee(&service).await;
        let timesheet = draft(&service, &owner).await;
        let entry_id = timesheet.entries()[0].id;

        let mut changed = details(4, "6", "20");
        changed.km = "10".parse().unwrap();
        changed.km_rate = "0.5".parse().unwrap();

        let timesheet = service
            .execute(EditTimesheetEntry {
                actor: owner,
                timesheet_id: timesheet.id(),
                entry_id,
                details: changed,
                expected_version: None,
            })
            .await
            .unwrap();

        let entry = timesheet.entry(entry_id).unwrap();
        assert_eq!(entry.details.hours, Hours::from_str("6").unwrap());
        assert_eq!(entry.pay(), Money::from_str("125").unwrap());
        assert_eq!(timesheet.totals().pay, Money::from_str("125").unwrap());
    }

    #[tokio::test]
    async fn fails_on_unknown_entry() {
        let service = service();
        let owner = employee(&service).await;
        let timesheet = draft(&service, &owner).await;
        let entry_id = entry::Id::new();

        let err = service
            .execute(EditTimesheetEntry {
                actor: owner,
                timesheet_id: timesheet.id(),
                entry_id,
                details: details(4, "6", "20"),
                expected_version: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Entry(EntryError::NotExists(id)) if *id == entry_id,
        ));
    }

    #[tokio::test]
    async fn leaves_submitted_timesheet_intact() {
        let service = service();
        let owner = employee(&service).await;
        let timesheet = draft(&service, &owner).await;
        let entry_id = timesheet.entries()[0].id;

        let submitted = service
            .execute(SubmitTimesheet {
                actor: owner.clone(),
                timesheet_id: timesheet.id(),
                expected_version: None,
            })
            .await
            .unwrap();

        let err = service
            .execute(EditTimesheetEntry {
                actor: owner,
                timesheet_id: timesheet.id(),
                entry_id,
                details: details(4, "6", "20"),
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
            .execute(Select(By::<Option<Timesheet>, _>::new(timesheet.id())))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.entries(), submitted.entries());
        assert_eq!(stored.totals(), submitted.totals());
        assert_eq!(stored.totals().pay, Money::from_str("160").unwrap());
        assert_eq!(stored.version(), submitted.version());
    }

    #[tokio::test]
    async fn guards_versions() {
        let service = service_with(true);
        let owner = employee(&service).await;
        let timesheet = draft(&service, &owner).await;
        let entry_id = timesheet.entries()[0].id;

        let err = service
            .execute(EditTimesheetEntry {
                actor: owner.clone(),
                timesheet_id: timesheet.id(),
                entry_id,
                details: details(4, "6", "20"),
                expected_version: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Version(VersionConflict::Required),
        ));

        let err = service
            .execute(EditTimesheetEntry {
                actor: owner.clone(),
                timesheet_id: timesheet.id(),
                entry_id,
                details: details(4, "6", "20"),
                expected_version: Some(Version::INITIAL.next()),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Version(VersionConflict::Mismatch { .. }),
        ));

        let edited = service
            .execute(EditTimesheetEntry {
                actor: owner,
                timesheet_id: timesheet.id(),
                entry_id,
                details: details(4, "6", "20"),
                expected_version: Some(Version::INITIAL),
            })
            .await
            .unwrap();
        assert_eq!(edited.version(), Version::INITIAL.next());
    }
}
