//! [`Command`] for approving a [`Timesheet`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
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

/// [`Command`] for approving a [`Timesheet`].
///
/// Reviewers may overwrite [`Notes`] of the [`Timesheet`], while absent
/// [`Notes`] leave the existing ones untouched.
#[derive(Clone, Debug)]
pub struct ApproveTimesheet {
    /// [`Actor`] approving the [`Timesheet`].
    pub actor: Actor,

    /// ID of the [`Timesheet`] to approve.
    pub timesheet_id: timesheet::Id,

    /// [`Notes`] of the review, if any.
    pub notes: Option<Notes>,

    /// [`timesheet::Version`] the [`Actor`] expects the [`Timesheet`] to be
    /// of.
    pub expected_version: Option<timesheet::Version>,
}

impl<Db> Command<ApproveTimesheet> for Service<Db>
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
        cmd: ApproveTimesheet,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ApproveTimesheet {
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
            .approve(DateTime::now().coerce(), notes)
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
            "`Timesheet(id: {timesheet_id})` approved by `User(id: {})`",
            actor.user_id,
        );

        Ok(timesheet)
    }
}

/// Error of [`ApproveTimesheet`] [`Command`] execution.
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

    /// [`Timesheet`] cannot be approved in its current status.
    #[display("{_0}")]
    Transition(InvalidTransition),

    /// [`Timesheet`] is not of the expected [`timesheet::Version`].
    #[display("{_0}")]
    Version(VersionConflict),
}

#[cfg(test)]
mod spec {
    use rstest::rstest;

    use crate::{
        command::{
            fixture::{draft, employee, manager, service, user},
            SubmitTimesheet,
        },
        domain::{
            timesheet::{self, Notes, Status},
            user::Role,
        },
        Command as _,
    };

    use super::{ApproveTimesheet, ExecutionError};

    #[rstest]
    #[case::draft(false)]
    #[case::submitted(true)]
    #[tokio::test]
    async fn manager_approves_regardless_of_status(#[case] submitted: bool) {
        let service = service();
        let owner = employee(&service).await;
        let draft = draft(&service, &owner).await;
        if submitted {
            drop(
                service
                    .execute(SubmitTimesheet {
                        actor: owner,
                        timesheet_id: draft.id(),
                        expected_version: None,
                    })
                    .await
                    .unwrap(),
            );
        }

        let timesheet = service
            .execute(ApproveTimesheet {
                actor: manager(&service).await,
                timesheet_id: draft.id(),
                notes: Notes::new("Looks good"),
                expected_version: None,
            })
            .await
            .unwrap();

        assert_eq!(timesheet.status(), Status::Approved);
        assert!(timesheet.approved_at().is_some());
        assert_eq!(timesheet.notes().unwrap().to_string(), "Looks good");
    }

    #[tokio::test]
    async fn keeps_notes_when_none_provided() {
        let service = service();
        let owner = employee(&service).await;
        let draft = draft(&service, &owner).await;
        let admin = user(&service, [Role::Admin]).await;

        let approve = |notes| ApproveTimesheet {
            actor: admin.clone(),
            timesheet_id: draft.id(),
            notes,
            expected_version: None,
        };
        drop(service.execute(approve(Notes::new("First"))).await.unwrap());
        let timesheet = service.execute(approve(None)).await.unwrap();

        assert_eq!(timesheet.notes().unwrap().to_string(), "First");
    }

    #[tokio::test]
    async fn forbids_owner() {
        let service = service();
        let owner = employee(&service).await;
        let draft = draft(&service, &owner).await;

        let err = service
            .execute(ApproveTimesheet {
                actor: owner,
                timesheet_id: draft.id(),
                notes: None,
                expected_version: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::Forbidden(_)));
    }

    #[tokio::test]
    async fn hides_unknown_timesheets_from_non_reviewers() {
        let service = service();
        let owner = employee(&service).await;
        let stranger = employee(&service).await;
        let draft = draft(&service, &owner).await;

        for timesheet_id in [draft.id(), timesheet::Id::new()] {
            let err = service
                .execute(ApproveTimesheet {
                    actor: stranger.clone(),
                    timesheet_id,
                    notes: None,
                    expected_version: None,
                })
                .await
                .unwrap_err();

            assert!(matches!(err.as_ref(), ExecutionError::Forbidden(_)));
        }

        let missing = timesheet::Id::new();
        let err = service
            .execute(ApproveTimesheet {
                actor: manager(&service).await,
                timesheet_id: missing,
                notes: None,
                expected_version: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::TimesheetNotExists(id) if *id == missing,
        ));
    }
}
