//! [`Entry`] definitions.

use common::{Date, Hours, Kilometers, Money, Pieces, Quantity as _, Rate};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::Timesheet;

/// Line item of a work recorded in a [`Timesheet`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Entry {
    /// ID of this [`Entry`].
    pub id: Id,

    /// [`Details`] of the recorded work.
    pub details: Details,
}

impl Entry {
    /// Returns the pay for this [`Entry`].
    ///
    /// Always computed out of the current [`Details`], never cached.
    #[must_use]
    pub fn pay(&self) -> Money {
        self.details.pay()
    }
}

/// ID of an [`Entry`].
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

/// Recorded work of an [`Entry`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Details {
    /// [`Date`] the work was done at.
    pub work_date: Date,

    /// Project the work was done for.
    pub project: Label,

    /// Task of the project the work was done on.
    pub task: Label,

    /// Worked [`Hours`].
    pub hours: Hours,

    /// Travelled [`Kilometers`].
    pub km: Kilometers,

    /// Produced [`Pieces`].
    pub pieces: Pieces,

    /// [`Rate`] of a single worked hour.
    pub hour_rate: Rate,

    /// [`Rate`] of a single travelled kilometer.
    pub km_rate: Rate,

    /// [`Rate`] of a single produced piece.
    pub piece_rate: Rate,

    /// Free-form [`Comment`] to the work.
    pub comment: Option<Comment>,
}

impl Details {
    /// Computes the pay for these [`Details`]:
    /// `hours × hour_rate + km × km_rate + pieces × piece_rate`.
    #[must_use]
    pub fn pay(&self) -> Money {
        self.hour_rate.price(self.hours)
            + self.km_rate.price(self.km)
            + self.piece_rate.price(self.pieces)
    }

    /// Checks whether these [`Details`] record no work at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hours.is_zero() && self.km.is_zero() && self.pieces.is_zero()
    }
}

/// Project or task label of an [`Entry`].
///
/// May be empty.
#[derive(AsRef, Clone, Debug, Default, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Label(String);

impl Label {
    /// Maximum length of a [`Label`] in characters.
    pub const MAX_LEN: usize = 200;

    /// Creates a new [`Label`] if the given `label` is valid.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Option<Self> {
        let label = label.into();
        Self::check(&label).then_some(Self(label))
    }

    /// Checks whether the given `label` is a valid [`Label`].
    fn check(label: impl AsRef<str>) -> bool {
        let label = label.as_ref();
        label.trim() == label && label.chars().count() <= Self::MAX_LEN
    }
}

impl FromStr for Label {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Label`")
    }
}

/// Free-form comment to an [`Entry`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Comment(String);

impl Comment {
    /// Maximum length of a [`Comment`] in characters.
    pub const MAX_LEN: usize = 1000;

    /// Creates a new [`Comment`] if the given `comment` is valid.
    #[must_use]
    pub fn new(comment: impl Into<String>) -> Option<Self> {
        let comment = comment.into();
        Self::check(&comment).then_some(Self(comment))
    }

    /// Checks whether the given `comment` is a valid [`Comment`].
    fn check(comment: impl AsRef<str>) -> bool {
        let comment = comment.as_ref();
        !comment.trim().is_empty() && comment.chars().count() <= Self::MAX_LEN
    }
}

impl FromStr for Comment {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Comment`")
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, Hours, Kilometers, Money, Pieces, Rate};

    use super::{Comment, Details, Label};

    fn details(
        (hours, hour_rate): (&str, &str),
        (km, km_rate): (&str, &str),
        (pieces, piece_rate): (i32, &str),
    ) -> Details {
        Details {
            work_date: Date::from_ymd(2025, 1, 2).unwrap(),
            project: Label::new("Forest").unwrap(),
            task: Label::default(),
            hours: Hours::from_str(hours).unwrap(),
            km: Kilometers::from_str(km).unwrap(),
            pieces: Pieces::new(pieces).unwrap(),
            hour_rate: Rate::from_str(hour_rate).unwrap(),
            km_rate: Rate::from_str(km_rate).unwrap(),
            piece_rate: Rate::from_str(piece_rate).unwrap(),
            comment: None,
        }
    }

    #[test]
    fn pays_hours() {
        let d = details(("8", "20"), ("0", "0"), (0, "0"));

        assert_eq!(d.pay(), Money::from_str("160.00").unwrap());
        assert!(!d.is_empty());
    }

    #[test]
    fn pays_every_quantity_exactly() {
        let d = details(("7.5", "18.40"), ("12.3", "4.5"), (40, "0.35"));

        // 138.000 + 55.35 + 14.00
        assert_eq!(d.pay(), Money::from_str("207.35").unwrap());
    }

    #[test]
    fn detects_empty_work() {
        assert!(details(("0", "20"), ("0", "4"), (0, "1")).is_empty());
        assert!(!details(("0", "0"), ("0", "0"), (1, "0")).is_empty());
    }

    #[test]
    fn validates_texts() {
        assert!(Label::new("").is_some());
        assert!(Label::new(" padded ").is_none());
        assert!(Label::new("x".repeat(Label::MAX_LEN + 1)).is_none());

        assert!(Comment::new("   ").is_none());
        assert!(Comment::from_str("Rain delay").is_ok());
    }
}
