//! [`Command`] for returning a [`Timesheet`] to its employee.

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        policy::Forbidden,
        timesheet::{self, InvalidTransition, Notes, VersionConflict},
        Actor, Timesheet,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for returning a [`Timesheet`] to its employee.
///
/// Reviewers may overwrite [`Notes`] of the [`Timesheet`], while absent
/// [`Notes`] leave the existing ones untouched.
#[derive(Clone, Debug)]
pub struct ReturnTimesheet {
    /// [`Actor`] returning the [`Timesheet`].
    pub actor: Actor,

    /// ID of the [`Timesheet`] to return.
    pub timesheet_id: timesheet::Id,

    /// [`Notes`] of the review, if any.
    pub notes: Option<Notes>,

    /// [`timesheet::Version`] the [`Actor`] expects the [`Timesheet`] to be
    /// of.
    pub expected_version: Option<timesheet::Version>,
}

impl<Db> Command<ReturnTimesheet> for Service<Db>
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
        cmd: ReturnTimesheet,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReturnTimesheet {
            actor,
            timesheet_id,
            notes,
            expected_version,
        } = cmd;

        // Non-reviewers never learn whether the `Timesheet` exists.
        actor
            .authorize_review()
            .map_err(tracerr::from_and_wrap!(=> E))?;
        self.database()
            .execute(Select(By::<Option<Timesheet>, _>::new(timesheet_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TimesheetNotExists(timesheet_id))
            .map_err(tracerr::wrap!())
            .map(drop)?;

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
            .send_back(notes)
            .map_err(tracerr::from_and_wrap!(=> E))?;

        tx.execute(Insert(timesheet.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Timesheet(id: {timesheet_id})` returned by `User(id: {})`",
            actor.user_id,
        );

        Ok(timesheet)
    }
}

/// Error of [`ReturnTimesheet`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Actor`] is not permitted to review the [`Timesheet`].
    #[display("{_0}")]
    Forbidden(Forbidden),

    /// [`Timesheet`] with the provided ID does not exist.
    #[display("`Timesheet(id: {_0})` does not exist")]
    #[from(ignore)]
    TimesheetNotExists(#[error(not(source))] timesheet::Id),

    /// [`Timesheet`] cannot be returned in its current status.
    #[display("{_0}")]
    Transition(InvalidTransition),

    /// [`Timesheet`] is not of the expected [`timesheet::Version`].
    #[display("{_0}")]
    Version(VersionConflict),
}
