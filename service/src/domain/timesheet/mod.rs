//! [`Timesheet`] definitions.

pub mod entry;
pub mod status;
pub mod totals;

#[cfg(doc)]
use common::DateTime;
use common::{unit, Date, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;

pub use self::{
    entry::Entry,
    status::{InvalidTransition, Status, Transition},
    totals::Totals,
};

/// Work of an employee recorded over a [`Period`].
///
/// Owns its [`Entry`]s and keeps its [`Totals`] in sync with them: every
/// mutation goes through this type, so the [`Totals`] are never stale.
#[derive(Clone, Debug)]
pub struct Timesheet {
    id: Id,
    employee_id: user::Id,
    period: Period,
    status: Status,
    entries: Vec<Entry>,
    totals: Totals,
    notes: Option<Notes>,
    version: Version,
    created_at: CreationDateTime,
    submitted_at: Option<SubmissionDateTime>,
    approved_at: Option<ApprovalDateTime>,
}

/// Stored state of a [`Timesheet`].
///
/// Contains no [`Totals`], as those are always recomputed out of the
/// [`Entry`]s when [restoring](Timesheet::restore).
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// ID of the [`Timesheet`].
    pub id: Id,

    /// ID of the employee owning the [`Timesheet`].
    pub employee_id: user::Id,

    /// [`Period`] of the [`Timesheet`].
    pub period: Period,

    /// [`Status`] of the [`Timesheet`].
    pub status: Status,

    /// [`Entry`]s of the [`Timesheet`].
    pub entries: Vec<Entry>,

    /// Reviewer [`Notes`] of the [`Timesheet`].
    pub notes: Option<Notes>,

    /// [`Version`] of the [`Timesheet`].
    pub version: Version,

    /// [`DateTime`] when the [`Timesheet`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when the [`Timesheet`] was last submitted.
    pub submitted_at: Option<SubmissionDateTime>,

    /// [`DateTime`] when the [`Timesheet`] was last approved.
    pub approved_at: Option<ApprovalDateTime>,
}

impl Timesheet {
    /// Creates a new [`Status::Draft`] [`Timesheet`] with the provided
    /// [`entry::Details`].
    ///
    /// # Errors
    ///
    /// With [`EntryError`] if any of the provided [`entry::Details`] is not
    /// acceptable for the [`Period`].
    pub fn new(
        employee_id: user::Id,
        period: Period,
        entries: impl IntoIterator<Item = entry::Details>,
        created_at: CreationDateTime,
    ) -> Result<Self, EntryError> {
        let entries = entries
            .into_iter()
            .map(|details| {
                period.admit(&details)?;
                Ok(Entry {
                    id: entry::Id::new(),
                    details,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::restore(Snapshot {
            id: Id::new(),
            employee_id,
            period,
            status: Status::Draft,
            entries,
            notes: None,
            version: Version::INITIAL,
            created_at,
            submitted_at: None,
            approved_at: None,
        }))
    }

    /// Restores a [`Timesheet`] from its stored [`Snapshot`].
    #[must_use]
    pub fn restore(snapshot: Snapshot) -> Self {
        let Snapshot {
            id,
            employee_id,
            period,
            status,
            mut entries,
            notes,
            version,
            created_at,
            submitted_at,
            approved_at,
        } = snapshot;

        entries.sort_by_key(|e| (e.details.work_date, e.id));
        let totals = Totals::aggregate(&entries);

        Self {
            id,
            employee_id,
            period,
            status,
            entries,
            totals,
            notes,
            version,
            created_at,
            submitted_at,
            approved_at,
        }
    }

    /// Returns ID of this [`Timesheet`].
    #[must_use]
    pub const fn id(&self) -> Id {
        self.id
    }

    /// Returns ID of the employee owning this [`Timesheet`].
    #[must_use]
    pub const fn employee_id(&self) -> user::Id {
        self.employee_id
    }

    /// Returns [`Period`] of this [`Timesheet`].
    #[must_use]
    pub const fn period(&self) -> Period {
        self.period
    }

    /// Returns [`Status`] of this [`Timesheet`].
    #[must_use]
    pub const fn status(&self) -> Status {
        self.status
    }

    /// Returns [`Entry`]s of this [`Timesheet`] ordered by their work date.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Returns [`Entry`] of this [`Timesheet`] with the provided ID, if any.
    #[must_use]
    pub fn entry(&self, id: entry::Id) -> Option<&Entry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Returns [`Totals`] of this [`Timesheet`].
    #[must_use]
    pub const fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Returns reviewer [`Notes`] of this [`Timesheet`], if any.
    #[must_use]
    pub const fn notes(&self) -> Option<&Notes> {
        self.notes.as_ref()
    }

    /// Returns current [`Version`] of this [`Timesheet`].
    #[must_use]
    pub const fn version(&self) -> Version {
        self.version
    }

    /// Returns [`DateTime`] when this [`Timesheet`] was created.
    #[must_use]
    pub const fn created_at(&self) -> CreationDateTime {
        self.created_at
    }

    /// Returns [`DateTime`] when this [`Timesheet`] was last submitted.
    #[must_use]
    pub const fn submitted_at(&self) -> Option<SubmissionDateTime> {
        self.submitted_at
    }

    /// Returns [`DateTime`] when this [`Timesheet`] was last approved.
    #[must_use]
    pub const fn approved_at(&self) -> Option<ApprovalDateTime> {
        self.approved_at
    }

    /// Adds a new [`Entry`] to this [`Timesheet`].
    ///
    /// # Errors
    ///
    /// With [`EntryError`] if this [`Timesheet`] is not a draft, or the
    /// provided [`entry::Details`] are not acceptable.
    pub fn add_entry(
        &mut self,
        details: entry::Details,
    ) -> Result<entry::Id, EntryError> {
        self.ensure_draft()?;
        self.period.admit(&details)?;

        let id = entry::Id::new();
        self.entries.push(Entry { id, details });
        self.entries_changed();

        Ok(id)
    }

    /// Replaces [`entry::Details`] of the [`Entry`] with the provided ID.
    ///
    /// # Errors
    ///
    /// With [`EntryError`] if this [`Timesheet`] is not a draft, the [`Entry`]
    /// doesn't exist, or the provided [`entry::Details`] are not acceptable.
    pub fn edit_entry(
        &mut self,
        id: entry::Id,
        details: entry::Details,
    ) -> Result<(), EntryError> {
        self.ensure_draft()?;
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(EntryError::NotExists(id))?;
        self.period.admit(&details)?;

        entry.details = details;
        self.entries_changed();

        Ok(())
    }

    /// Removes the [`Entry`] with the provided ID from this [`Timesheet`].
    ///
    /// # Errors
    ///
    /// With [`EntryError`] if this [`Timesheet`] is not a draft, or the
    /// [`Entry`] doesn't exist.
    pub fn delete_entry(&mut self, id: entry::Id) -> Result<Entry, EntryError> {
        self.ensure_draft()?;
        let pos = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or(EntryError::NotExists(id))?;

        let removed = self.entries.remove(pos);
        self.entries_changed();

        Ok(removed)
    }

    /// Submits this [`Timesheet`] for a review.
    ///
    /// # Errors
    ///
    /// With [`InvalidTransition`] if this [`Timesheet`] cannot be submitted.
    pub fn submit(
        &mut self,
        at: SubmissionDateTime,
    ) -> Result<(), InvalidTransition> {
        self.status = self.status.transition(Transition::Submit)?;
        self.submitted_at = Some(at);
        self.version = self.version.next();
        Ok(())
    }

    /// Approves this [`Timesheet`], overwriting its [`Notes`] if any provided.
    ///
    /// # Errors
    ///
    /// With [`InvalidTransition`] if this [`Timesheet`] cannot be approved.
    pub fn approve(
        &mut self,
        at: ApprovalDateTime,
        notes: Option<Notes>,
    ) -> Result<(), InvalidTransition> {
        self.status = self.status.transition(Transition::Approve)?;
        self.approved_at = Some(at);
        self.review(notes);
        Ok(())
    }

    /// Returns this [`Timesheet`] to its employee, overwriting its [`Notes`]
    /// if any provided.
    ///
    /// # Errors
    ///
    /// With [`InvalidTransition`] if this [`Timesheet`] cannot be returned.
    pub fn send_back(
        &mut self,
        notes: Option<Notes>,
    ) -> Result<(), InvalidTransition> {
        self.status = self.status.transition(Transition::Return)?;
        self.review(notes);
        Ok(())
    }

    /// Finishes a review with the provided [`Notes`].
    fn review(&mut self, notes: Option<Notes>) {
        if let Some(notes) = notes {
            self.notes = Some(notes);
        }
        self.version = self.version.next();
    }

    /// Ensures this [`Timesheet`] allows changing its [`Entry`]s.
    fn ensure_draft(&self) -> Result<(), EntryError> {
        if self.status.allows_entry_changes() {
            Ok(())
        } else {
            Err(EntryError::NotDraft(self.status))
        }
    }

    /// Restores ordering of [`Entry`]s and recomputes [`Totals`] after they
    /// have been changed.
    fn entries_changed(&mut self) {
        self.entries.sort_by_key(|e| (e.details.work_date, e.id));
        self.totals = Totals::aggregate(&self.entries);
        self.version = self.version.next();
    }
}

/// ID of a [`Timesheet`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Inclusive range of [`Date`]s covered by a [`Timesheet`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Period {
    start: Date,
    end: Date,
}

impl Period {
    /// Creates a new [`Period`].
    ///
    /// # Errors
    ///
    /// With [`InvalidPeriod`] if `start` is after `end`.
    pub fn new(start: Date, end: Date) -> Result<Self, InvalidPeriod> {
        if start <= end {
            Ok(Self { start, end })
        } else {
            Err(InvalidPeriod { start, end })
        }
    }

    /// Returns the first [`Date`] of this [`Period`].
    #[must_use]
    pub const fn start(&self) -> Date {
        self.start
    }

    /// Returns the last [`Date`] of this [`Period`].
    #[must_use]
    pub const fn end(&self) -> Date {
        self.end
    }

    /// Checks whether the provided [`Date`] is within this [`Period`].
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        (self.start..=self.end).contains(&date)
    }

    /// Checks whether the provided [`entry::Details`] may be recorded in this
    /// [`Period`].
    fn admit(&self, details: &entry::Details) -> Result<(), EntryError> {
        if details.is_empty() {
            return Err(EntryError::Empty);
        }
        if !self.contains(details.work_date) {
            return Err(EntryError::OutOfPeriod {
                work_date: details.work_date,
                period: *self,
            });
        }
        Ok(())
    }
}

/// [`Period`] starts after it ends.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("`Period` start `{start}` is after its end `{end}`")]
pub struct InvalidPeriod {
    /// Requested start of the [`Period`].
    #[error(not(source))]
    pub start: Date,

    /// Requested end of the [`Period`].
    #[error(not(source))]
    pub end: Date,
}

/// Error of changing [`Entry`]s of a [`Timesheet`].
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum EntryError {
    /// [`Timesheet`] is not a [`Status::Draft`].
    #[display(
        "`Entry`s are only mutable while the `Timesheet` is a draft, \
         but it is `{_0}`"
    )]
    NotDraft(#[error(not(source))] Status),

    /// [`Entry`] doesn't exist in the [`Timesheet`].
    #[display("`Entry(id: {_0})` does not exist")]
    NotExists(#[error(not(source))] entry::Id),

    /// [`Entry`] records no work.
    #[display("`Entry` must record some hours, kilometers or pieces")]
    Empty,

    /// [`Entry`] is dated outside the [`Timesheet`]'s [`Period`].
    #[display(
        "`Entry` work date `{work_date}` is outside of `{}..={}` period",
        period.start,
        period.end,
    )]
    OutOfPeriod {
        /// Work date of the [`Entry`].
        #[error(not(source))]
        work_date: Date,

        /// [`Period`] of the [`Timesheet`].
        #[error(not(source))]
        period: Period,
    },
}

/// Reviewer notes of a [`Timesheet`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Notes(String);

impl Notes {
    /// Maximum length of [`Notes`] in characters.
    pub const MAX_LEN: usize = 1000;

    /// Creates new [`Notes`] if the given `notes` are valid.
    #[must_use]
    pub fn new(notes: impl Into<String>) -> Option<Self> {
        let notes = notes.into();
        Self::check(&notes).then_some(Self(notes))
    }

    /// Checks whether the given `notes` are valid [`Notes`].
    fn check(notes: impl AsRef<str>) -> bool {
        let notes = notes.as_ref();
        !notes.trim().is_empty() && notes.chars().count() <= Self::MAX_LEN
    }
}

impl FromStr for Notes {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Notes`")
    }
}

/// Version of a [`Timesheet`], incremented on its every change.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    Eq,
    From,
    Into,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Version(i32);

impl Version {
    /// [`Version`] of a newly created [`Timesheet`].
    pub const INITIAL: Self = Self(1);

    /// Returns the [`Version`] following this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Checks this current [`Version`] against the `expected` one.
    ///
    /// # Errors
    ///
    /// With [`VersionConflict`] if the `expected` [`Version`] differs, or is
    /// absent while being `required`.
    pub fn check(
        self,
        expected: Option<Self>,
        required: bool,
    ) -> Result<(), VersionConflict> {
        match expected {
            Some(expected) if expected != self => {
                Err(VersionConflict::Mismatch {
                    expected,
                    actual: self,
                })
            }
            Some(_) => Ok(()),
            None if required => Err(VersionConflict::Required),
            None => Ok(()),
        }
    }
}

/// [`Timesheet`] was changed concurrently, or its [`Version`] was not
/// provided.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
pub enum VersionConflict {
    /// Expected [`Version`] is required, but wasn't provided.
    #[display("Expected `Timesheet` version is required")]
    Required,

    /// Expected [`Version`] doesn't match the current one.
    #[display("`Timesheet` version is `{actual}`, but `{expected}` expected")]
    Mismatch {
        /// Expected [`Version`].
        #[error(not(source))]
        expected: Version,

        /// Current [`Version`].
        #[error(not(source))]
        actual: Version,
    },
}

/// [`DateTime`] when a [`Timesheet`] was created.
pub type CreationDateTime = DateTimeOf<(Timesheet, unit::Creation)>;

/// [`DateTime`] when a [`Timesheet`] was submitted.
pub type SubmissionDateTime = DateTimeOf<(Timesheet, unit::Submission)>;

/// [`DateTime`] when a [`Timesheet`] was approved.
pub type ApprovalDateTime = DateTimeOf<(Timesheet, unit::Approval)>;

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, DateTime, Hours, Kilometers, Money, Pieces, Rate};

    use crate::domain::user;

    use super::{
        entry::{self, Label},
        EntryError, Notes, Period, Status, Timesheet, Version, VersionConflict,
    };

    fn date(day: u8) -> Date {
        Date::from_ymd(2025, 1, day).unwrap()
    }

    fn details(day: u8, hours: &str) -> entry::Details {
        entry::Details {
            work_date: date(day),
            project: Label::new("Forest").unwrap(),
            task: Label::new("Planting").unwrap(),
            hours: Hours::from_str(hours).unwrap(),
            km: Kilometers::ZERO,
            pieces: Pieces::ZERO,
            hour_rate: Rate::from_str("20").unwrap(),
            km_rate: Rate::ZERO,
            piece_rate: Rate::ZERO,
            comment: None,
        }
    }

    fn timesheet(entries: Vec<entry::Details>) -> Timesheet {
        Timesheet::new(
            user::Id::new(),
            Period::new(date(1), date(7)).unwrap(),
            entries,
            DateTime::now().coerce(),
        )
        .unwrap()
    }

    #[test]
    fn creates_draft_with_totals() {
        let t = timesheet(vec![details(2, "8")]);

        assert_eq!(t.status(), Status::Draft);
        assert_eq!(t.version(), Version::INITIAL);
        assert_eq!(t.entries()[0].pay(), Money::from_str("160.00").unwrap());
        assert_eq!(t.totals().pay, Money::from_str("160.00").unwrap());
    }

    #[test]
    fn rejects_inverted_period() {
        assert!(Period::new(date(7), date(1)).is_err());
        assert!(Period::new(date(1), date(1)).is_ok());
    }

    #[test]
    fn rejects_inacceptable_entries() {
        let period = Period::new(date(1), date(7)).unwrap();
        let now = DateTime::now().coerce();

        assert!(matches!(
            Timesheet::new(user::Id::new(), period, [details(8, "1")], now),
            Err(EntryError::OutOfPeriod { .. }),
        ));
        assert!(matches!(
            Timesheet::new(user::Id::new(), period, [details(2, "0")], now),
            Err(EntryError::Empty),
        ));
    }

    #[test]
    fn keeps_totals_in_sync_and_entries_ordered() {
        let mut t = timesheet(vec![details(5, "8")]);

        let early = t.add_entry(details(2, "4")).unwrap();
        assert_eq!(t.entries()[0].id, early);
        assert_eq!(t.totals().hours, Hours::from_str("12").unwrap());
        assert_eq!(t.totals().pay, Money::from_str("240").unwrap());

        t.edit_entry(early, details(6, "2")).unwrap();
        assert_eq!(t.entries()[1].id, early);
        assert_eq!(t.totals().pay, Money::from_str("200").unwrap());

        let removed = t.delete_entry(early).unwrap();
        assert_eq!(removed.id, early);
        assert_eq!(t.totals().pay, Money::from_str("160").unwrap());
        assert_eq!(t.version(), Version::from(4));
    }

    #[test]
    fn reports_missing_entry() {
        let mut t = timesheet(vec![details(2, "8")]);
        let missing = entry::Id::new();

        assert_eq!(
            t.delete_entry(missing).unwrap_err(),
            EntryError::NotExists(missing),
        );
        assert_eq!(t.version(), Version::INITIAL);
    }

    #[test]
    fn freezes_entries_once_submitted() {
        let mut t = timesheet(vec![details(2, "8")]);
        let id = t.entries()[0].id;
        t.submit(DateTime::now().coerce()).unwrap();

        assert_eq!(
            t.delete_entry(id).unwrap_err(),
            EntryError::NotDraft(Status::Submitted),
        );
        assert_eq!(
            t.add_entry(details(3, "1")).unwrap_err(),
            EntryError::NotDraft(Status::Submitted),
        );
        assert_eq!(
            t.edit_entry(id, details(3, "1")).unwrap_err(),
            EntryError::NotDraft(Status::Submitted),
        );
        assert_eq!(t.entries().len(), 1);
        assert_eq!(t.entries()[0].details, details(2, "8"));
        assert_eq!(t.totals().pay, Money::from_str("160.00").unwrap());
    }

    #[test]
    fn resubmits_with_refreshed_time() {
        let mut t = timesheet(vec![]);
        let first = DateTime::now().coerce();
        t.submit(first).unwrap();

        let second = (DateTime::now() + std::time::Duration::from_secs(1))
            .coerce();
        t.submit(second).unwrap();

        assert_eq!(t.status(), Status::Submitted);
        assert_eq!(t.submitted_at(), Some(second));
        assert_eq!(t.version(), Version::from(3));
    }

    #[test]
    fn reviews_keep_notes_unless_overwritten() {
        let mut t = timesheet(vec![]);

        t.send_back(Notes::new("Missing Monday")).unwrap();
        assert_eq!(t.status(), Status::Returned);
        assert_eq!(t.notes().unwrap().to_string(), "Missing Monday");
        assert!(t.approved_at().is_none());

        t.approve(DateTime::now().coerce(), None).unwrap();
        assert_eq!(t.status(), Status::Approved);
        assert_eq!(t.notes().unwrap().to_string(), "Missing Monday");
        assert!(t.approved_at().is_some());
    }

    #[test]
    fn recomputes_totals_on_restore() {
        let t = timesheet(vec![details(3, "1"), details(2, "2")]);
        let mut snapshot = super::Snapshot {
            id: t.id(),
            employee_id: t.employee_id(),
            period: t.period(),
            status: t.status(),
            entries: t.entries().to_vec(),
            notes: None,
            version: t.version(),
            created_at: t.created_at(),
            submitted_at: None,
            approved_at: None,
        };
        snapshot.entries.reverse();

        let restored = Timesheet::restore(snapshot);

        assert_eq!(restored.entries(), t.entries());
        assert_eq!(restored.totals(), t.totals());
    }

    #[test]
    fn checks_expected_version() {
        let current = Version::INITIAL.next();

        assert_eq!(current.check(None, false), Ok(()));
        assert_eq!(current.check(Some(current), true), Ok(()));
        assert_eq!(
            current.check(None, true),
            Err(VersionConflict::Required),
        );
        assert_eq!(
            current.check(Some(Version::INITIAL), false),
            Err(VersionConflict::Mismatch {
                expected: Version::INITIAL,
                actual: current,
            }),
        );
    }
}
