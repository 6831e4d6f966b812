//! Recorded work quantities.

use std::{fmt, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

define_decimal! {
    #[doc = "Worked hours."]
    struct Hours, scale = 2, max = 1_000_000;
}

define_decimal! {
    #[doc = "Travelled distance in kilometers."]
    struct Kilometers, scale = 2, max = 1_000_000_000;
}

/// Number of produced pieces.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Pieces(i32);

impl Pieces {
    /// Maximum number of [`Pieces`] recorded at once.
    pub const MAX: i32 = 1_000_000;

    /// Zero [`Pieces`].
    pub const ZERO: Self = Self(0);

    /// Creates new [`Pieces`] if the provided `count` is within
    /// `0..=`[`Pieces::MAX`] range.
    #[must_use]
    pub const fn new(count: i32) -> Option<Self> {
        if count < 0 || count > Self::MAX {
            None
        } else {
            Some(Self(count))
        }
    }

    /// Returns the count of these [`Pieces`].
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl fmt::Display for Pieces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Pieces {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Pieces` value")
    }
}

impl TryFrom<i32> for Pieces {
    type Error = &'static str;

    fn try_from(count: i32) -> Result<Self, Self::Error> {
        Self::new(count).ok_or("`Pieces` out of range")
    }
}

/// Quantity which may be priced with a [`Rate`].
///
/// [`Rate`]: crate::money::Rate
pub trait Quantity: Copy {
    /// Returns the exact amount of this [`Quantity`].
    fn amount(self) -> Decimal;

    /// Checks whether this [`Quantity`] is zero.
    fn is_zero(self) -> bool {
        self.amount().is_zero()
    }
}

impl Quantity for Hours {
    fn amount(self) -> Decimal {
        self.get()
    }
}

impl Quantity for Kilometers {
    fn amount(self) -> Decimal {
        self.get()
    }
}

impl Quantity for Pieces {
    fn amount(self) -> Decimal {
        self.0.into()
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Hours, Kilometers, Pieces, Quantity as _};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_negative_values() {
        assert!(Hours::from_str("-1").is_err());
        assert!(Hours::from_str("-0.01").is_err());
        assert!(Kilometers::new(decimal("-12.5")).is_none());
        assert!(Pieces::new(-1).is_none());
    }

    #[test]
    fn rejects_values_above_bound() {
        assert!(Hours::from_str("1000000").is_ok());
        assert!(Hours::from_str("1000000.01").is_err());
        assert!(Pieces::new(Pieces::MAX + 1).is_none());
    }

    #[test]
    fn rejects_over_precise_values() {
        assert!(Hours::from_str("0.001").is_err());
        assert!(Hours::from_str("0.00000000000001").is_err());
        assert!(Kilometers::new(Decimal::new(1, 28)).is_none());

        assert_eq!(Hours::from_str("1.500").unwrap().to_string(), "1.50");
        assert_eq!(Kilometers::from_str("2.10000").unwrap().get(), decimal("2.1"));
    }

    #[test]
    fn keeps_exact_representation() {
        assert_eq!(Hours::from_str("7.50").unwrap().to_string(), "7.50");
        assert_eq!(Kilometers::from_str("0").unwrap(), Kilometers::ZERO);
        assert_eq!(Hours::from_str("-0").unwrap(), Hours::ZERO);
        assert_eq!(Pieces::from_str(" 12 ").unwrap().get(), 12);
    }

    #[test]
    fn sums_without_bound() {
        let total: Hours = [Hours::from_str("1000000").unwrap(); 3]
            .into_iter()
            .sum();

        assert_eq!(total.get(), decimal("3000000"));
        assert!(Hours::new(total.get()).is_none());

        let total = Hours::from_str("1000000").unwrap()
            + Hours::from_str("0.01").unwrap();
        assert_eq!(total.get() - decimal("1000000"), decimal("0.01"));
    }

    #[test]
    fn exposes_amount() {
        assert_eq!(Pieces::new(3).unwrap().amount(), decimal("3"));
        assert!(Kilometers::ZERO.is_zero());
        assert!(!Hours::from_str("0.25").unwrap().is_zero());
    }
}
