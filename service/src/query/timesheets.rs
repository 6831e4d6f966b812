//! [`Query`] collection related to multiple [`Timesheet`]s.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{user, Actor, Timesheet, User},
    infra::{database, Database},
    read::timesheet::{self as read, list, mine},
    Query, Service,
};

/// [`Query`] of the [`Timesheet`]s owned by their [`Actor`], ordered by
/// their period start descending.
#[derive(Clone, Debug)]
pub struct Mine {
    /// [`Actor`] owning the [`Timesheet`]s.
    pub actor: Actor,

    /// [`read::Filter`] to apply.
    pub filter: read::Filter,
}

impl<Db> Query<Mine> for Service<Db>
where
    Db: Database<
        Select<By<Vec<Timesheet>, mine::Selector>>,
        Ok = Vec<Timesheet>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Vec<Timesheet>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Mine { actor, filter }: Mine,
    ) -> Result<Self::Ok, Self::Err> {
        self.database()
            .execute(Select(By::new(mine::Selector {
                employee_id: actor.user_id,
                filter,
            })))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// [`Query`] of a CSV export of the [`Timesheet`]s owned by their [`Actor`].
#[derive(Clone, Debug)]
pub struct MineCsv(pub Mine);

impl<Db> Query<MineCsv> for Service<Db>
where
    Self: Query<Mine, Ok = Vec<Timesheet>, Err = Traced<database::Error>>,
{
    type Ok = String;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        MineCsv(mine): MineCsv,
    ) -> Result<Self::Ok, Self::Err> {
        let timesheets = self.execute(mine).await.map_err(tracerr::wrap!())?;
        Ok(read::csv::export(&timesheets))
    }
}

/// [`Query`] of a [`list::Page`] of all the [`Timesheet`]s, permitted to
/// approvers only.
#[derive(Clone, Debug)]
pub struct List {
    /// [`Actor`] listing the [`Timesheet`]s.
    pub actor: Actor,

    /// [`read::Filter`] to apply.
    pub filter: read::Filter,

    /// [`user::Email`] of the employee to list the [`Timesheet`]s of.
    pub employee_email: Option<user::Email>,

    /// [`list::Arguments`] of the requested [`list::Page`].
    pub arguments: list::Arguments,
}

impl<Db> Query<List> for Service<Db>
where
    Db: Database<
            Select<By<list::Page, list::Selector>>,
            Ok = list::Page,
            Err = Traced<database::Error>,
        > + for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = list::Page;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        List {
            actor,
            filter,
            employee_email,
            arguments,
        }: List,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        if !actor.can_approve() {
            return Err(tracerr::new!(E::NotPermitted(actor.user_id)));
        }

        let employee_id = match employee_email {
            Some(email) => {
                let employee = self
                    .database()
                    .execute(Select(By::<Option<User>, _>::new(&email)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?;
                let Some(employee) = employee else {
                    return Ok(list::Page::empty(arguments));
                };
                Some(employee.id)
            }
            None => None,
        };

        self.database()
            .execute(Select(By::new(list::Selector {
                arguments,
                filter: list::Filter {
                    timesheet: filter,
                    employee_id,
                },
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
    }
}

/// Error of [`List`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Actor`] is not permitted to list [`Timesheet`]s of others.
    #[display("`User(id: {_0})` is not permitted to list timesheets")]
    NotPermitted(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::Date;

    use crate::{
        command::{
            fixture::{details, employee, manager, service},
            ApproveTimesheet, CreateTimesheet,
        },
        domain::{
            timesheet::{Notes, Status},
            user, Actor, Timesheet,
        },
        infra::Memory,
        read::timesheet::{list, Filter},
        Command as _, Service,
    };

    use super::{ExecutionError, List, Mine, MineCsv};

    fn date(month: u8, day: u8) -> Date {
        Date::from_ymd(2025, month, day).unwrap()
    }

    async fn create(
        service: &Service<Memory>,
        actor: &Actor,
        month: u8,
    ) -> Timesheet {
        let mut entry = details(2, "8", "20");
        entry.work_date = date(month, 2);
        service
            .execute(CreateTimesheet {
                actor: actor.clone(),
                period_start: date(month, 1),
                period_end: date(month, 7),
                entries: vec![entry],
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn lists_own_timesheets_newest_first() {
        let service = service();
        let owner = employee(&service).await;
        let january = create(&service, &owner, 1).await;
        let march = create(&service, &owner, 3).await;
        let february = create(&service, &owner, 2).await;
        drop(create(&service, &employee(&service).await, 2).await);

        let all = service
            .execute(Mine {
                actor: owner.clone(),
                filter: Filter::default(),
            })
            .await
            .unwrap();
        assert_eq!(
            all.iter().map(Timesheet::id).collect::<Vec<_>>(),
            [march.id(), february.id(), january.id()],
        );

        let filtered = service
            .execute(Mine {
                actor: owner,
                filter: Filter {
                    period_from: Some(date(2, 1)),
                    period_to: Some(date(2, 28)),
                    status: Some(Status::Draft),
                },
            })
            .await
            .unwrap();
        assert_eq!(
            filtered.iter().map(Timesheet::id).collect::<Vec<_>>(),
            [february.id()],
        );
    }

    #[tokio::test]
    async fn exports_own_timesheets_oldest_first() {
        let service = service();
        let owner = employee(&service).await;
        let january = create(&service, &owner, 1).await;
        let february = create(&service, &owner, 2).await;

        let csv = service
            .execute(MineCsv(Mine {
                actor: owner,
                filter: Filter::default(),
            }))
            .await
            .unwrap();
        let lines = csv.lines().collect::<Vec<_>>();

        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with(&january.id().to_string()));
        assert!(lines[3].starts_with(&february.id().to_string()));
        assert!(lines[4].contains("\"TOTAL_DRAFT\""));
    }

    #[tokio::test]
    async fn lists_pages_for_approvers() {
        let service = service();
        let reviewer = manager(&service).await;
        let alice = employee(&service).await;
        let bob = employee(&service).await;
        for month in 1..=3 {
            drop(create(&service, &alice, month).await);
        }
        let approved = create(&service, &bob, 4).await;
        drop(
            service
                .execute(ApproveTimesheet {
                    actor: reviewer.clone(),
                    timesheet_id: approved.id(),
                    notes: Notes::new("Fine"),
                    expected_version: None,
                })
                .await
                .unwrap(),
        );

        let page = service
            .execute(List {
                actor: reviewer.clone(),
                filter: Filter::default(),
                employee_email: None,
                arguments: list::Arguments::new(Some(1), Some(3)),
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 4);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.items[0].timesheet.id(), approved.id());
        assert_eq!(page.items[0].employee.id, bob.user_id);
        assert!(page.has_next_page());

        let alice_email =
            user::Email::new(format!("{}@example.com", alice.user_id)).unwrap();
        let page = service
            .execute(List {
                actor: reviewer.clone(),
                filter: Filter::default(),
                employee_email: Some(alice_email),
                arguments: list::Arguments::new(Some(2), Some(2)),
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 3);
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_next_page());

        let page = service
            .execute(List {
                actor: reviewer,
                filter: Filter::default(),
                employee_email: user::Email::new("nobody@example.com"),
                arguments: list::Arguments::new(None, None),
            })
            .await
            .unwrap();
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn forbids_listing_to_employees() {
        let service = service();
        let actor = employee(&service).await;

        let err = service
            .execute(List {
                actor,
                filter: Filter::default(),
                employee_email: None,
                arguments: list::Arguments::new(None, None),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::NotPermitted(_)));
    }
}
