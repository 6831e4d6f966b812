//! [`Timesheet`]-related definitions.

use common::{Date, DateTime, Hours, Kilometers, Money, Pieces, Rate};
use derive_more::{Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLScalar};
use service::{
    domain::{self, timesheet::entry},
    read,
};
use uuid::Uuid;

use crate::{api, define_error, AsError, Context, Error};

/// Work of an employee recorded over a period.
#[derive(Clone, Debug, From, Into)]
pub struct Timesheet(domain::Timesheet);

/// Work of an employee recorded over a period.
#[graphql_object(context = Context)]
impl Timesheet {
    /// Unique identifier of this `Timesheet`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id().into()
    }

    /// `User` this `Timesheet` belongs to.
    #[must_use]
    pub fn employee(&self) -> api::User {
        #[expect(
            unsafe_code,
            reason = "`Timesheet` loaded from repository guarantees its \
                      employee existence"
        )]
        unsafe {
            api::User::new_unchecked(self.0.employee_id())
        }
    }

    /// First day of the period covered by this `Timesheet`.
    #[must_use]
    pub fn period_start(&self) -> Date {
        self.0.period().start()
    }

    /// Last day of the period covered by this `Timesheet`.
    #[must_use]
    pub fn period_end(&self) -> Date {
        self.0.period().end()
    }

    /// Current lifecycle status of this `Timesheet`.
    #[must_use]
    pub fn status(&self) -> Status {
        self.0.status().into()
    }

    /// `TimesheetEntry`s of this `Timesheet` ordered by their work date.
    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        self.0.entries().iter().cloned().map(Entry).collect()
    }

    /// Totals of all the `TimesheetEntry`s of this `Timesheet`.
    #[must_use]
    pub fn totals(&self) -> Totals {
        Totals(*self.0.totals())
    }

    /// Notes left by the last reviewer of this `Timesheet`.
    #[must_use]
    pub fn notes(&self) -> Option<String> {
        self.0.notes().map(ToString::to_string)
    }

    /// Version of this `Timesheet`, incremented on its every change.
    ///
    /// May be passed as `expectedVersion` to mutations to detect concurrent
    /// changes.
    #[must_use]
    pub fn version(&self) -> i32 {
        self.0.version().into()
    }

    /// `DateTime` when this `Timesheet` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at().coerce()
    }

    /// `DateTime` when this `Timesheet` was submitted the last time.
    #[must_use]
    pub fn submitted_at(&self) -> Option<DateTime> {
        self.0.submitted_at().map(|at| at.coerce())
    }

    /// `DateTime` when this `Timesheet` was approved the last time.
    #[must_use]
    pub fn approved_at(&self) -> Option<DateTime> {
        self.0.approved_at().map(|at| at.coerce())
    }
}

/// Unique identifier of a `Timesheet`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::timesheet::Id)]
#[into(domain::timesheet::Id)]
#[graphql(name = "TimesheetId", transparent)]
pub struct Id(Uuid);

/// Lifecycle status of a `Timesheet`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "TimesheetStatus")]
pub enum Status {
    /// Being filled by its employee.
    Draft,

    /// Handed over for a review.
    Submitted,

    /// Accepted by a reviewer.
    Approved,

    /// Sent back to its employee by a reviewer.
    Returned,
}

impl From<domain::timesheet::Status> for Status {
    fn from(status: domain::timesheet::Status) -> Self {
        use domain::timesheet::Status as S;

        match status {
            S::Draft => Self::Draft,
            S::Submitted => Self::Submitted,
            S::Approved => Self::Approved,
            S::Returned => Self::Returned,
        }
    }
}

impl From<Status> for domain::timesheet::Status {
    fn from(status: Status) -> Self {
        match status {
            Status::Draft => Self::Draft,
            Status::Submitted => Self::Submitted,
            Status::Approved => Self::Approved,
            Status::Returned => Self::Returned,
        }
    }
}

/// Work recorded in a [`Timesheet`] for a single day.
#[derive(Clone, Debug, From, Into)]
pub struct Entry(domain::timesheet::Entry);

/// Work recorded in a `Timesheet` for a single day.
#[graphql_object(name = "TimesheetEntry", context = Context)]
impl Entry {
    /// Unique identifier of this `TimesheetEntry`.
    #[must_use]
    pub fn id(&self) -> EntryId {
        self.0.id.into()
    }

    /// Day the work was done.
    #[must_use]
    pub fn work_date(&self) -> Date {
        self.0.details.work_date
    }

    /// Project the work was done for.
    #[must_use]
    pub fn project(&self) -> &str {
        self.0.details.project.as_ref()
    }

    /// Task of the project.
    #[must_use]
    pub fn task(&self) -> &str {
        self.0.details.task.as_ref()
    }

    /// Worked hours.
    #[must_use]
    pub fn hours(&self) -> Hours {
        self.0.details.hours
    }

    /// Travelled kilometers.
    #[must_use]
    pub fn km(&self) -> Kilometers {
        self.0.details.km
    }

    /// Number of produced pieces.
    #[must_use]
    pub fn pieces(&self) -> i32 {
        self.0.details.pieces.get()
    }

    /// Price of a single worked hour.
    #[must_use]
    pub fn hour_rate(&self) -> Rate {
        self.0.details.hour_rate
    }

    /// Price of a single travelled kilometer.
    #[must_use]
    pub fn km_rate(&self) -> Rate {
        self.0.details.km_rate
    }

    /// Price of a single produced piece.
    #[must_use]
    pub fn piece_rate(&self) -> Rate {
        self.0.details.piece_rate
    }

    /// Pay earned by this `TimesheetEntry`.
    #[must_use]
    pub fn pay(&self) -> Money {
        self.0.pay()
    }

    /// Free-form comment.
    #[must_use]
    pub fn comment(&self) -> Option<&str> {
        self.0.details.comment.as_ref().map(AsRef::as_ref)
    }
}

/// Unique identifier of a `TimesheetEntry`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(entry::Id)]
#[into(entry::Id)]
#[graphql(name = "TimesheetEntryId", transparent)]
pub struct EntryId(Uuid);

/// Totals of all the [`Entry`]s of a [`Timesheet`].
#[derive(Clone, Copy, Debug)]
pub struct Totals(domain::timesheet::Totals);

/// Totals of all the `TimesheetEntry`s of a `Timesheet`.
#[graphql_object(name = "TimesheetTotals", context = Context)]
impl Totals {
    /// Total worked hours.
    #[must_use]
    pub fn hours(&self) -> Hours {
        self.0.hours
    }

    /// Total travelled kilometers.
    #[must_use]
    pub fn km(&self) -> Kilometers {
        self.0.km
    }

    /// Total number of produced pieces.
    pub fn pieces(&self, ctx: &Context) -> Result<i32, Error> {
        i32::try_from(self.0.pieces)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }

    /// Total pay.
    #[must_use]
    pub fn pay(&self) -> Money {
        self.0.pay
    }
}

/// Work to record in a `Timesheet` for a single day.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "TimesheetEntryInput")]
pub struct EntryInput {
    /// Day the work was done.
    pub work_date: Date,

    /// Project the work was done for.
    pub project: Option<String>,

    /// Task of the project.
    pub task: Option<String>,

    /// Worked hours.
    pub hours: Option<Hours>,

    /// Travelled kilometers.
    pub km: Option<Kilometers>,

    /// Number of produced pieces.
    pub pieces: Option<i32>,

    /// Price of a single worked hour.
    pub hour_rate: Option<Rate>,

    /// Price of a single travelled kilometer.
    pub km_rate: Option<Rate>,

    /// Price of a single produced piece.
    pub piece_rate: Option<Rate>,

    /// Free-form comment.
    pub comment: Option<String>,
}

impl EntryInput {
    /// Converts this [`EntryInput`] into [`entry::Details`].
    ///
    /// Missing quantities and rates are zero, blank comments are omitted.
    ///
    /// # Errors
    ///
    /// If any of the provided values is out of its allowed range.
    pub fn into_details(self) -> Result<entry::Details, Error> {
        let Self {
            work_date,
            project,
            task,
            hours,
            km,
            pieces,
            hour_rate,
            km_rate,
            piece_rate,
            comment,
        } = self;

        let label = |l: Option<String>| {
            entry::Label::new(l.as_deref().unwrap_or_default().trim())
                .ok_or_else(|| Error::from(InputError::InvalidLabel))
        };
        let pieces = pieces
            .map(Pieces::new)
            .unwrap_or(Some(Pieces::ZERO))
            .ok_or_else(|| Error::from(InputError::InvalidPieces))?;
        let comment = comment
            .filter(|c| !c.trim().is_empty())
            .map(|c| {
                entry::Comment::new(c)
                    .ok_or_else(|| Error::from(InputError::InvalidComment))
            })
            .transpose()?;

        Ok(entry::Details {
            work_date,
            project: label(project)?,
            task: label(task)?,
            hours: hours.unwrap_or_default(),
            km: km.unwrap_or_default(),
            pieces,
            hour_rate: hour_rate.unwrap_or_default(),
            km_rate: km_rate.unwrap_or_default(),
            piece_rate: piece_rate.unwrap_or_default(),
            comment,
        })
    }
}

/// Parses reviewer notes of a [`Timesheet`].
///
/// Blank notes are treated as absent, so they don't overwrite the existing
/// ones.
///
/// # Errors
///
/// If the provided notes are too long.
pub fn notes(
    notes: Option<String>,
) -> Result<Option<domain::timesheet::Notes>, Error> {
    notes
        .filter(|n| !n.trim().is_empty())
        .map(|n| {
            domain::timesheet::Notes::new(n)
                .ok_or_else(|| InputError::InvalidNotes.into())
        })
        .transpose()
}

/// Builds a [`read::timesheet::Filter`] out of the GraphQL arguments.
#[must_use]
pub fn filter(
    from: Option<Date>,
    to: Option<Date>,
    status: Option<Status>,
) -> read::timesheet::Filter {
    read::timesheet::Filter {
        period_from: from,
        period_to: to,
        status: status.map(Into::into),
    }
}

pub mod list {
    //! Definitions related to [`Timesheet`] list.

    use service::read;

    use crate::{api, AsError, Context, Error};

    #[cfg(doc)]
    use super::Timesheet;

    /// [`Timesheet`] on a [`Page`] along with its employee.
    #[derive(Clone, Debug)]
    pub struct Item(read::timesheet::list::Item);

    /// `Timesheet` on a `TimesheetPage` along with its employee.
    #[juniper::graphql_object(name = "TimesheetListItem", context = Context)]
    impl Item {
        /// Listed `Timesheet`.
        #[must_use]
        pub fn timesheet(&self) -> api::Timesheet {
            self.0.timesheet.clone().into()
        }

        /// `User` owning the listed `Timesheet`.
        #[must_use]
        pub fn employee(&self) -> api::User {
            self.0.employee.clone().into()
        }
    }

    /// Page of the [`Timesheet`] list.
    #[derive(Clone, Debug)]
    pub struct Page(read::timesheet::list::Page);

    impl From<read::timesheet::list::Page> for Page {
        fn from(page: read::timesheet::list::Page) -> Self {
            Self(page)
        }
    }

    /// Page of the `Timesheet` list, ordered by the period start descending.
    #[juniper::graphql_object(name = "TimesheetPage", context = Context)]
    impl Page {
        /// `Timesheet`s on this `TimesheetPage`.
        #[must_use]
        pub fn items(&self) -> Vec<Item> {
            self.0.items.iter().cloned().map(Item).collect()
        }

        /// Number of this `TimesheetPage`, starting from `1`.
        pub fn page(&self, ctx: &Context) -> Result<i32, Error> {
            int(self.0.arguments.number(), ctx)
        }

        /// Maximum number of `Timesheet`s on this `TimesheetPage`.
        pub fn page_size(&self, ctx: &Context) -> Result<i32, Error> {
            int(self.0.arguments.size(), ctx)
        }

        /// Total number of `Timesheet`s in the whole list.
        pub fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            int(self.0.total_count, ctx)
        }

        /// Total number of `TimesheetPage`s in the whole list.
        pub fn page_count(&self, ctx: &Context) -> Result<i32, Error> {
            int(self.0.page_count(), ctx)
        }

        /// Indicator whether there is a `TimesheetPage` after this one.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.0.has_next_page()
        }

        /// Indicator whether there is a `TimesheetPage` before this one.
        #[must_use]
        pub fn has_previous_page(&self) -> bool {
            self.0.has_previous_page()
        }
    }

    /// Converts the provided number into a GraphQL `Int`.
    fn int<N>(n: N, ctx: &Context) -> Result<i32, Error>
    where
        i32: TryFrom<N, Error = std::num::TryFromIntError>,
    {
        i32::try_from(n)
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }
}

define_error! {
    enum InputError {
        #[code = "INVALID_LABEL"]
        #[status = BAD_REQUEST]
        #[message = "Project and task must not exceed 200 characters"]
        InvalidLabel,

        #[code = "INVALID_PIECES"]
        #[status = BAD_REQUEST]
        #[message = "Number of pieces must be within 0..=1000000 range"]
        InvalidPieces,

        #[code = "INVALID_COMMENT"]
        #[status = BAD_REQUEST]
        #[message = "Comment must not exceed 1000 characters"]
        InvalidComment,

        #[code = "INVALID_NOTES"]
        #[status = BAD_REQUEST]
        #[message = "Notes must not exceed 1000 characters"]
        InvalidNotes,
    }
}

impl AsError for domain::timesheet::EntryError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "TIMESHEET_NOT_DRAFT"]
                #[status = BAD_REQUEST]
                #[message = "`TimesheetEntry`s are only mutable while the \
                             `Timesheet` is a draft"]
                NotDraft,

                #[code = "ENTRY_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`TimesheetEntry` with the specified ID does not \
                             exist"]
                NotExists,

                #[code = "EMPTY_ENTRY"]
                #[status = BAD_REQUEST]
                #[message = "`TimesheetEntry` must record some hours, \
                             kilometers or pieces"]
                Empty,

                #[code = "WORK_DATE_OUT_OF_PERIOD"]
                #[status = BAD_REQUEST]
                #[message = "`TimesheetEntry` work date is outside of the \
                             `Timesheet` period"]
                OutOfPeriod,
            }
        }

        Some(
            match self {
                Self::NotDraft(_) => Error::NotDraft,
                Self::NotExists(_) => Error::NotExists,
                Self::Empty => Error::Empty,
                Self::OutOfPeriod { .. } => Error::OutOfPeriod,
            }
            .into(),
        )
    }
}

impl AsError for domain::timesheet::InvalidPeriod {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_PERIOD"]
                #[status = BAD_REQUEST]
                #[message = "`Timesheet` period must not start after its end"]
                InvalidPeriod,
            }
        }

        Some(Error::InvalidPeriod.into())
    }
}

impl AsError for domain::timesheet::InvalidTransition {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "INVALID_TRANSITION"]
                #[status = BAD_REQUEST]
                #[message = "`Timesheet` cannot be moved to the requested \
                             status from its current one"]
                InvalidTransition,
            }
        }

        Some(Error::InvalidTransition.into())
    }
}

impl AsError for domain::timesheet::VersionConflict {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "VERSION_REQUIRED"]
                #[status = BAD_REQUEST]
                #[message = "`expectedVersion` of the `Timesheet` must be \
                             specified"]
                Required,

                #[code = "VERSION_MISMATCH"]
                #[status = CONFLICT]
                #[message = "`Timesheet` has been changed concurrently"]
                Mismatch,
            }
        }

        Some(
            match self {
                Self::Required => Error::Required,
                Self::Mismatch { .. } => Error::Mismatch,
            }
            .into(),
        )
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, Hours, Kilometers, Money, Rate};
    use rstest::rstest;
    use service::domain::timesheet::{
        entry, EntryError, Status as DomainStatus, VersionConflict,
    };

    use crate::AsError as _;

    use super::{notes, EntryInput, Status};

    fn input() -> EntryInput {
        EntryInput {
            work_date: Date::from_ymd(2025, 1, 2).unwrap(),
            project: Some(" North ".to_owned()),
            task: None,
            hours: Some(Hours::from_str("8").unwrap()),
            km: None,
            pieces: None,
            hour_rate: Some(Rate::from_str("20").unwrap()),
            km_rate: None,
            piece_rate: None,
            comment: Some("   ".to_owned()),
        }
    }

    #[test]
    fn fills_missing_entry_values() {
        let details = input().into_details().unwrap();

        assert_eq!(details.project.to_string(), "North");
        assert_eq!(details.task.to_string(), "");
        assert_eq!(details.km, Kilometers::ZERO);
        assert_eq!(details.pieces.get(), 0);
        assert!(details.comment.is_none());
        assert_eq!(details.pay(), Money::from_str("160").unwrap());
    }

    #[rstest]
    #[case::negative_pieces(
        EntryInput { pieces: Some(-1), ..input() },
        "INVALID_PIECES",
    )]
    #[case::long_project(
        EntryInput { project: Some("x".repeat(201)), ..input() },
        "INVALID_LABEL",
    )]
    #[case::long_comment(
        EntryInput { comment: Some("x".repeat(1001)), ..input() },
        "INVALID_COMMENT",
    )]
    fn rejects_invalid_entries(#[case] input: EntryInput, #[case] code: &str) {
        let err = input.into_details().unwrap_err();

        assert_eq!(err.code, code);
        assert_eq!(err.status_code, http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ignores_blank_notes() {
        assert!(notes(None).unwrap().is_none());
        assert!(notes(Some(" \n".to_owned())).unwrap().is_none());
        assert_eq!(
            notes(Some("fix Monday".to_owned()))
                .unwrap()
                .map(|n| n.to_string()),
            Some("fix Monday".to_owned()),
        );
        assert_eq!(
            notes(Some("x".repeat(1001))).unwrap_err().code,
            "INVALID_NOTES",
        );
    }

    #[rstest]
    #[case(
        EntryError::NotDraft(DomainStatus::Approved),
        "TIMESHEET_NOT_DRAFT",
        400,
    )]
    #[case(EntryError::NotExists(entry::Id::new()), "ENTRY_NOT_EXISTS", 404)]
    #[case(EntryError::Empty, "EMPTY_ENTRY", 400)]
    fn maps_entry_errors(
        #[case] err: EntryError,
        #[case] code: &str,
        #[case] status: u16,
    ) {
        let err = err.as_error();

        assert_eq!(err.code, code);
        assert_eq!(err.status_code.as_u16(), status);
    }

    #[test]
    fn maps_version_conflicts() {
        let err = VersionConflict::Required.as_error();
        assert_eq!(err.code, "VERSION_REQUIRED");

        let err = VersionConflict::Mismatch {
            expected: 1.into(),
            actual: 2.into(),
        }
        .as_error();
        assert_eq!(err.code, "VERSION_MISMATCH");
        assert_eq!(err.status_code, http::StatusCode::CONFLICT);
    }

    #[test]
    fn mirrors_domain_statuses() {
        for status in DomainStatus::ALL.iter().copied() {
            assert_eq!(DomainStatus::from(Status::from(status)), status);
        }
    }
}
