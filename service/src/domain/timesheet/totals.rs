//! [`Totals`] aggregation.

use common::{Hours, Kilometers, Money};

#[cfg(doc)]
use crate::domain::Timesheet;

use super::Entry;

/// Totals of all the [`Entry`]s of a [`Timesheet`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Totals {
    /// Total worked [`Hours`].
    pub hours: Hours,

    /// Total travelled [`Kilometers`].
    pub km: Kilometers,

    /// Total number of produced pieces.
    pub pieces: i64,

    /// Total pay.
    pub pay: Money,
}

impl Totals {
    /// Aggregates the provided [`Entry`]s into [`Totals`].
    #[must_use]
    pub fn aggregate<'e>(entries: impl IntoIterator<Item = &'e Entry>) -> Self {
        entries.into_iter().fold(Self::default(), |acc, e| Self {
            hours: acc.hours + e.details.hours,
            km: acc.km + e.details.km,
            pieces: acc.pieces + i64::from(e.details.pieces.get()),
            pay: acc.pay + e.pay(),
        })
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use common::{Date, Hours, Kilometers, Money, Pieces, Rate};

    use crate::domain::timesheet::{
        entry::{self, Details, Label},
        Entry,
    };

    use super::Totals;

    fn entry(hours: &str, km: &str, pieces: i32) -> Entry {
        Entry {
            id: entry::Id::new(),
            details: Details {
                work_date: Date::from_ymd(2025, 1, 1).unwrap(),
                project: Label::default(),
                task: Label::default(),
                hours: Hours::from_str(hours).unwrap(),
                km: Kilometers::from_str(km).unwrap(),
                pieces: Pieces::new(pieces).unwrap(),
                hour_rate: Rate::from_str("20").unwrap(),
                km_rate: Rate::from_str("0.5").unwrap(),
                piece_rate: Rate::from_str("2").unwrap(),
                comment: None,
            },
        }
    }

    #[test]
    fn aggregates_nothing_into_zeros() {
        assert_eq!(Totals::aggregate(&[]), Totals::default());
        assert_eq!(Totals::default().pay, Money::ZERO);
    }

    #[test]
    fn sums_every_quantity_and_pay() {
        let entries = [entry("8", "10", 0), entry("0.5", "0", 3)];

        let totals = Totals::aggregate(&entries);

        assert_eq!(totals.hours, Hours::from_str("8.5").unwrap());
        assert_eq!(totals.km, Kilometers::from_str("10").unwrap());
        assert_eq!(totals.pieces, 3);
        assert_eq!(totals.pay, entries.iter().map(Entry::pay).sum::<Money>());
        assert_eq!(totals.pay, Money::from_str("181").unwrap());
    }
}
