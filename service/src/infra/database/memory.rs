//! In-memory [`Database`] implementation.
//!
//! Changes made in a transaction are staged and become visible to others only
//! on [`Commit`]. [`Lock`]s are exclusive for the whole [`Memory`] database
//! and are held until the transaction is committed or dropped.

use std::{
    collections::HashMap,
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use common::operations::{By, Commit, Insert, Lock, Select, Transact, Update};
use derive_more::{Display, Error as StdError};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracerr::Traced;

use crate::{
    domain::{timesheet, user, Timesheet, User},
    infra::{database, Database},
    read,
};

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default)]
pub struct Memory<T = NonTx>(T);

impl Memory {
    /// Creates a new empty [`Memory`] database.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following [`Commit`] fail (or succeed again), leaving the
    /// stored state untouched.
    pub fn fail_commits(&self, fail: bool) {
        self.0.store.fail_commits.store(fail, Ordering::SeqCst);
    }
}

/// Non-transactional [`Memory`] database client.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`Store`] of the [`Memory`] database.
    store: Arc<Store>,
}

/// Transactional [`Memory`] database client.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Shared [`Store`] of the [`Memory`] database.
    store: Arc<Store>,

    /// Changes staged by this transaction.
    staged: Arc<Mutex<Staged>>,
}

/// Storage shared by all the [`Memory`] database clients.
#[derive(Debug, Default)]
struct Store {
    /// Committed [`State`].
    state: RwLock<State>,

    /// Exclusive lock taken by [`Lock`] operations.
    lock: Arc<Mutex<()>>,

    /// Indicator whether [`Commit`]s should fail.
    fail_commits: AtomicBool,
}

/// Changes of a [`Tx`] not committed yet.
#[derive(Debug, Default)]
struct Staged {
    /// Changed [`State`] entities.
    changes: State,

    /// Held exclusive lock, if any.
    lock: Option<OwnedMutexGuard<()>>,
}

/// Entities stored in a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct State {
    /// Stored [`User`]s.
    users: HashMap<user::Id, User>,

    /// Stored [`Timesheet`]s.
    timesheets: HashMap<timesheet::Id, Timesheet>,
}

impl State {
    /// Overwrites entities of this [`State`] with the provided ones.
    fn apply(&mut self, changes: Self) {
        self.users.extend(changes.users);
        self.timesheets.extend(changes.timesheets);
    }

    /// Checks the provided `changes` may be applied to this [`State`].
    fn check(&self, changes: &Self) -> Result<(), Error> {
        for u in changes.users.values() {
            let occupied = self
                .users
                .values()
                .chain(changes.users.values())
                .any(|other| other.id != u.id && other.email == u.email);
            if occupied {
                return Err(Error::UniqueViolation(USERS_EMAIL_CONSTRAINT));
            }
        }
        Ok(())
    }
}

/// Name of the unique constraint of [`User`] e-mails.
const USERS_EMAIL_CONSTRAINT: &str = "users_email_key";

/// [`Memory`] database client able to provide a view of its [`State`].
pub trait Client {
    /// Returns the [`State`] visible to this [`Client`].
    fn state(&self) -> impl Future<Output = State>;
}

impl Client for NonTx {
    async fn state(&self) -> State {
        self.store.state.read().await.clone()
    }
}

impl Client for Tx {
    async fn state(&self) -> State {
        let mut state = self.store.state.read().await.clone();
        state.apply(self.staged.lock().await.changes.clone());
        state
    }
}

/// [`Memory`] database error.
#[derive(Clone, Copy, Debug, Display, StdError)]
pub enum Error {
    /// [`Commit`] was rejected on purpose.
    #[display("`Commit` is rejected")]
    CommitRejected,

    /// Unique constraint is violated.
    #[display("Unique `{_0}` constraint is violated")]
    UniqueViolation(#[error(not(source))] &'static str),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: &str) -> bool {
        matches!(self, Self::UniqueViolation(c) if *c == constraint)
    }
}

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx {
            store: Arc::clone(&self.0.store),
            staged: Arc::default(),
        }))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let Tx { store, staged } = &self.0;

        let mut staged = staged.lock().await;
        let changes = std::mem::take(&mut staged.changes);
        // Lock is released after the changes are applied.
        let _lock = staged.lock.take();

        if store.fail_commits.load(Ordering::SeqCst) {
            return Err(tracerr::map_from(tracerr::new!(
                Error::CommitRejected
            )));
        }

        let mut state = store.state.write().await;
        state
            .check(&changes)
            .map_err(tracerr::wrap!())
            .map_err(tracerr::map_from)?;
        state.apply(changes);

        Ok(())
    }
}

impl Database<Lock<By<Timesheet, timesheet::Id>>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Timesheet, timesheet::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut staged = self.0.staged.lock().await;
        if staged.lock.is_none() {
            let lock = Arc::clone(&self.0.store.lock);
            staged.lock = Some(lock.lock_owned().await);
        }
        Ok(())
    }
}

impl Database<Insert<Timesheet>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(timesheet): Insert<Timesheet>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(timesheet))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl Database<Update<Timesheet>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(timesheet): Update<Timesheet>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self
            .0
            .staged
            .lock()
            .await
            .changes
            .timesheets
            .insert(timesheet.id(), timesheet);
        Ok(())
    }
}

impl Database<Insert<User>> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self
            .0
            .staged
            .lock()
            .await
            .changes
            .users
            .insert(user.id, user);
        Ok(())
    }
}

impl<C: Client> Database<Select<By<Option<Timesheet>, timesheet::Id>>>
    for Memory<C>
{
    type Ok = Option<Timesheet>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Timesheet>, timesheet::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.state().await.timesheets.remove(&by.into_inner()))
    }
}

impl<C: Client>
    Database<Select<By<Vec<Timesheet>, read::timesheet::mine::Selector>>>
    for Memory<C>
{
    type Ok = Vec<Timesheet>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Vec<Timesheet>, read::timesheet::mine::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::timesheet::mine::Selector {
            employee_id,
            filter,
        } = by.into_inner();

        let mut found = self
            .0
            .state()
            .await
            .timesheets
            .into_values()
            .filter(|t| t.employee_id() == employee_id && filter.matches(t))
            .collect::<Vec<_>>();
        found.sort_by(|a, b| {
            b.period()
                .start()
                .cmp(&a.period().start())
                .then_with(|| a.id().cmp(&b.id()))
        });
        Ok(found)
    }
}

impl<C: Client>
    Database<
        Select<
            By<read::timesheet::list::Page, read::timesheet::list::Selector>,
        >,
    > for Memory<C>
{
    type Ok = read::timesheet::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::timesheet::list::Page, read::timesheet::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::timesheet::list::Selector { arguments, filter } =
            by.into_inner();

        let State { users, timesheets } = self.0.state().await;

        let mut found = timesheets
            .into_values()
            .filter(|t| filter.matches(t))
            .collect::<Vec<_>>();
        found.sort_by(|a, b| {
            b.period()
                .start()
                .cmp(&a.period().start())
                .then_with(|| a.id().cmp(&b.id()))
        });

        let total_count = found.len() as u64;
        let skip = usize::try_from(arguments.offset()).unwrap_or(usize::MAX);
        let items = found
            .into_iter()
            .skip(skip)
            .take(arguments.size() as usize)
            .filter_map(|timesheet| {
                let employee = users.get(&timesheet.employee_id())?.clone();
                Some(read::timesheet::list::Item {
                    timesheet,
                    employee,
                })
            })
            .collect::<Vec<_>>();

        Ok(read::timesheet::list::Page::new(
            arguments,
            items,
            total_count,
        ))
    }
}

impl<C: Client> Database<Select<By<Option<User>, user::Id>>> for Memory<C> {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.0.state().await.users.remove(&by.into_inner()))
    }
}

impl<'e, C: Client> Database<Select<By<Option<User>, &'e user::Email>>>
    for Memory<C>
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'e user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        Ok(self
            .0
            .state()
            .await
            .users
            .into_values()
            .find(|u| &u.email == email))
    }
}

impl<C: Client> Database<Select<By<read::Health, ()>>> for Memory<C> {
    type Ok = read::Health;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::Health, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(read::Health)
    }
}

#[cfg(test)]
mod spec {
    use common::{
        operations::{By, Commit, Insert, Lock, Select, Transact},
        Date, DateTime, Handler as _,
    };

    use crate::domain::{
        timesheet::{self, Period},
        user, Timesheet, User,
    };

    use super::Memory;

    fn timesheet() -> Timesheet {
        let day = Date::from_ymd(2025, 1, 1).unwrap();
        Timesheet::new(
            user::Id::new(),
            Period::new(day, day).unwrap(),
            [],
            DateTime::now().coerce(),
        )
        .unwrap()
    }

    fn user(email: &str) -> User {
        User {
            id: user::Id::new(),
            name: user::Name::new("Jane Doe").unwrap(),
            email: user::Email::new(email).unwrap(),
            roles: user::Roles::new([]),
            created_at: DateTime::now().coerce(),
        }
    }

    async fn find(db: &Memory, id: timesheet::Id) -> Option<Timesheet> {
        db.execute(Select(By::<Option<Timesheet>, _>::new(id)))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn stages_changes_until_commit() {
        let db = Memory::new();
        let t = timesheet();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(t.clone())).await.unwrap();

        assert!(find(&db, t.id()).await.is_none());
        assert!(tx
            .execute(Select(By::<Option<Timesheet>, _>::new(t.id())))
            .await
            .unwrap()
            .is_some());

        tx.execute(Commit).await.unwrap();
        assert!(find(&db, t.id()).await.is_some());
    }

    #[tokio::test]
    async fn discards_changes_of_failed_commit() {
        let db = Memory::new();
        let t = timesheet();
        db.fail_commits(true);

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Lock(By::<Timesheet, _>::new(t.id())))
            .await
            .unwrap();
        tx.execute(Insert(t.clone())).await.unwrap();

        assert!(tx.execute(Commit).await.is_err());
        assert!(find(&db, t.id()).await.is_none());

        // Lock is released by the failed commit.
        db.fail_commits(false);
        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Lock(By::<Timesheet, _>::new(t.id())))
            .await
            .unwrap();
        tx.execute(Commit).await.unwrap();
    }

    #[tokio::test]
    async fn rejects_occupied_email() {
        let db = Memory::new();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(user("jane@example.com"))).await.unwrap();
        tx.execute(Commit).await.unwrap();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(user("jane@example.com"))).await.unwrap();
        let err = tx.execute(Commit).await.unwrap_err();

        assert!(err
            .as_ref()
            .is_unique_violation(super::USERS_EMAIL_CONSTRAINT));
    }
}
