//! [`Query`] collection related to a single [`Timesheet`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        policy::{Action, Forbidden},
        timesheet, Actor, Timesheet,
    },
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] of a [`Timesheet`] visible to its [`Actor`].
#[derive(Clone, Debug)]
pub struct Get {
    /// [`Actor`] viewing the [`Timesheet`].
    pub actor: Actor,

    /// ID of the [`Timesheet`] to view.
    pub timesheet_id: timesheet::Id,
}

impl<Db> Query<Get> for Service<Db>
where
    Db: Database<
        Select<By<Option<Timesheet>, timesheet::Id>>,
        Ok = Option<Timesheet>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Timesheet;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        Get {
            actor,
            timesheet_id,
        }: Get,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let timesheet = self
            .database()
            .execute(Select(By::<Option<Timesheet>, _>::new(timesheet_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::TimesheetNotExists(timesheet_id))
            .map_err(tracerr::wrap!())?;
        actor
            .authorize(Action::View, timesheet.employee_id())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        Ok(timesheet)
    }
}

/// [`Query`] of a CSV export of a [`Timesheet`] visible to its [`Actor`].
#[derive(Clone, Debug)]
pub struct Csv(pub Get);

impl<Db> Query<Csv> for Service<Db>
where
    Self: Query<Get, Ok = Timesheet, Err = Traced<ExecutionError>>,
{
    type Ok = String;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, Csv(get): Csv) -> Result<Self::Ok, Self::Err> {
        let timesheet = self.execute(get).await.map_err(tracerr::wrap!())?;
        Ok(read::timesheet::csv::timesheet(&timesheet))
    }
}

/// Error of [`Get`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Actor`] is not permitted to view the [`Timesheet`].
    #[display("{_0}")]
    Forbidden(Forbidden),

    /// [`Timesheet`] with the provided ID does not exist.
    #[display("`Timesheet(id: {_0})` does not exist")]
    #[from(ignore)]
    TimesheetNotExists(#[error(not(source))] timesheet::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::fixture::{draft, employee, manager, service},
        domain::timesheet,
        Query as _,
    };

    use super::{Csv, ExecutionError, Get};

    #[tokio::test]
    async fn shows_timesheet_to_owner_and_approvers_only() {
        let service = service();
        let owner = employee(&service).await;
        let draft = draft(&service, &owner).await;

        for actor in [owner, manager(&service).await] {
            let timesheet = service
                .execute(Get {
                    actor,
                    timesheet_id: draft.id(),
                })
                .await
                .unwrap();
            assert_eq!(timesheet.id(), draft.id());
        }

        let err = service
            .execute(Get {
                actor: employee(&service).await,
                timesheet_id: draft.id(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden(_)));
    }

    #[tokio::test]
    async fn fails_on_unknown_timesheet() {
        let service = service();

        let err = service
            .execute(Get {
                actor: employee(&service).await,
                timesheet_id: timesheet::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::TimesheetNotExists(_)));
    }

    #[tokio::test]
    async fn exports_csv() {
        let service = service();
        let owner = employee(&service).await;
        let draft = draft(&service, &owner).await;

        let csv = service
            .execute(Csv(Get {
                actor: owner,
                timesheet_id: draft.id(),
            }))
            .await
            .unwrap();

        assert!(csv.lines().nth(1).unwrap().ends_with(";8;0;0;160"));
        assert!(csv.contains("Entries:"));
    }
}
