//! [`Command`] for creating a new [`Timesheet`].

use common::{
    operations::{Commit, Insert, Transact, Transacted},
    Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        timesheet::{self, entry, EntryError, InvalidPeriod},
        Actor, Timesheet,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Timesheet`] owned by its [`Actor`].
#[derive(Clone, Debug)]
pub struct CreateTimesheet {
    /// [`Actor`] creating and owning the [`Timesheet`].
    pub actor: Actor,

    /// First [`Date`] of the [`Timesheet`] period.
    pub period_start: Date,

    /// Last [`Date`] of the [`Timesheet`] period.
    pub period_end: Date,

    /// Initial [`entry::Details`] of the [`Timesheet`].
    pub entries: Vec<entry::Details>,
}

impl<Db> Command<CreateTimesheet> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Timesheet>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Timesheet;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateTimesheet,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateTimesheet {
            actor,
            period_start,
            period_end,
            entries,
        } = cmd;

        let period = timesheet::Period::new(period_start, period_end)
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let timesheet = Timesheet::new(
            actor.user_id,
            period,
            entries,
            DateTime::now().coerce(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(timesheet.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!(
            "`Timesheet(id: {})` created by `User(id: {})`",
            timesheet.id(),
            actor.user_id,
        );

        Ok(timesheet)
    }
}

/// Error of [`CreateTimesheet`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Initial [`entry::Details`] are not acceptable.
    #[display("Invalid `Entry`: {_0}")]
    Entry(EntryError),

    /// [`timesheet::Period`] is inverted.
    #[display("Invalid `Period`: {_0}")]
    Period(InvalidPeriod),
}
