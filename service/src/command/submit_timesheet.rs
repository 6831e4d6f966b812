//! [`Command`] for submitting a [`Timesheet`] for a review.

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        policy::{Action, Forbidden},
        timesheet::{self, InvalidTransition, VersionConflict},
        Actor, Timesheet,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for submitting a [`Timesheet`] for a review.
#[derive(Clone, Debug)]
pub struct SubmitTimesheet {
    /// [`Actor`] submitting the [`Timesheet`].
    pub actor: Actor,

    /// ID of the [`Timesheet`] to submit.
    pub timesheet_id: timesheet::Id,

    /// [`timesheet::Version`] the [`Actor`] expects the [`Timesheet`] to be
    /// of.
    pub expected_version: Option<timesheet::Version>,
}

impl<Db> Command<SubmitTimesheet> for Service<Db>
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
        cmd: SubmitTimesheet,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SubmitTimesheet {
            actor,
            timesheet_id,
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
            .authorize(Action::Submit, timesheet.employee_id())
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
            .submit(DateTime::now().coerce())
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
            "`Timesheet(id: {timesheet_id})` submitted by `User(id: {})`",
            actor.user_id,
        );

        Ok(timesheet)
    }
}

/// Error of [`SubmitTimesheet`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Actor`] is not permitted to submit the [`Timesheet`].
    #[display("{_0}")]
    Forbidden(Forbidden),

    /// [`Timesheet`] with the provided ID does not exist.
    #[display("`Timesheet(id: {_0})` does not exist")]
    #[from(ignore)]
    TimesheetNotExists(#[error(not(source))] timesheet::Id),

    /// [`Timesheet`] cannot be submitted in its current status.
    #[display("{_0}")]
    Transition(InvalidTransition),

    /// [`Timesheet`] is not of the expected [`timesheet::Version`].
    #[display("{_0}")]
    Version(VersionConflict),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture::{draft, employee, service},
        domain::timesheet::Status,
        Command as _,
    };

    use super::{ExecutionError, SubmitTimesheet};

    #[tokio::test]
    async fn submits_own_draft() {
        let service = service();
        let owner = employee(&service).await;
        let draft = draft(&service, &owner).await;

        let timesheet = service
            .execute(SubmitTimesheet {
                actor: owner,
                timesheet_id: draft.id(),
                expected_version: Some(draft.version()),
            })
            .await
            .unwrap();

        assert_eq!(timesheet.status(), Status::Submitted);
        let submitted_at = timesheet.submitted_at().unwrap();
        assert!(submitted_at.coerce() >= draft.created_at());
    }

    #[tokio::test]
    async fn accepts_repeated_submission() {
        let service = service();
        let owner = employee(&service).await;
        let draft = draft(&service, &owner).await;

        let submit = || SubmitTimesheet {
            actor: owner.clone(),
            timesheet_id: draft.id(),
            expected_version: None,
        };
        let first = service.execute(submit()).await.unwrap();
        let second = service.execute(submit()).await.unwrap();

        assert_eq!(second.status(), Status::Submitted);
        assert!(second.submitted_at() >= first.submitted_at());
        assert!(second.version() > first.version());
    }

    #[tokio::test]
    async fn forbids_strangers() {
        let service = service();
        let owner = employee(&service).await;
        let draft = draft(&service, &owner).await;

        let err = service
            .execute(SubmitTimesheet {
                actor: employee(&service).await,
                timesheet_id: draft.id(),
                expected_version: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Forbidden(_)));
    }
}
