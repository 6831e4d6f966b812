//! [`Money`]-related definitions.

use crate::quantity::Quantity;

define_decimal! {
    #[doc = "Non-negative amount of money, computed in exact decimals."]
    #[doc = ""]
    #[doc = "Its scale covers a product of a [`Rate`] and any [`Quantity`]."]
    struct Money, scale = 4;
}

define_decimal! {
    #[doc = "Price of a single unit of some [`Quantity`]."]
    struct Rate, scale = 2, max = 1_000_000_000;
}

impl Rate {
    /// Prices the provided [`Quantity`] with this [`Rate`].
    ///
    /// Both operands are non-negative, bounded and have at most 2 fractional
    /// digits, so the result always fits [`Money::SCALE`] without rounding.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn price<Q: Quantity>(self, quantity: Q) -> Money {
        let amount = quantity.amount();
        let pay = self
            .0
            .checked_mul(amount)
            .expect("bounded operands never overflow `Decimal`");
        debug_assert!(
            pay.is_zero() || pay.scale() == self.0.scale() + amount.scale(),
            "`Rate::price()` lost precision",
        );
        Money(pay)
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use crate::quantity::{Hours, Kilometers, Pieces};

    use super::{Money, Rate};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(Money::from_str("123.45").unwrap().get(), decimal("123.45"));
        assert_eq!(Rate::from_str("20").unwrap().get(), decimal("20"));

        assert!(Money::from_str("-1").is_err());
        assert!(Money::from_str("12USD").is_err());
        assert!(Money::from_str("").is_err());
        assert!(Rate::from_str("1000000000.5").is_err());
    }

    #[test]
    fn prices_quantities_exactly() {
        let hours = Hours::from_str("8").unwrap();
        let rate = Rate::from_str("20.00").unwrap();

        let pay = rate.price(hours);

        assert_eq!(pay.get(), decimal("160"));
        assert_eq!(pay.to_string(), "160.00");

        let km = Kilometers::from_str("0.1").unwrap();
        let km_rate = Rate::from_str("0.2").unwrap();
        assert_eq!(km_rate.price(km).get(), decimal("0.02"));

        let pieces = Pieces::new(3).unwrap();
        let piece_rate = Rate::from_str("1.10").unwrap();
        assert_eq!(piece_rate.price(pieces).to_string(), "3.30");
    }

    #[test]
    fn prices_smallest_amounts_exactly() {
        let pay = Rate::from_str("0.01")
            .unwrap()
            .price(Hours::from_str("0.01").unwrap());
        assert_eq!(pay.get(), decimal("0.0001"));
        assert!(!pay.get().is_zero());

        let pay = Rate::from_str("1000000000")
            .unwrap()
            .price(Kilometers::from_str("999999999.99").unwrap());
        assert_eq!(pay.get(), decimal("999999999990000000"));
    }

    #[test]
    fn rejects_over_precise_rates() {
        assert!(Rate::from_str("0.000000000000001").is_err());
        assert!(Rate::from_str("12.345").is_err());
        assert!(Money::from_str("0.00001").is_err());
        assert_eq!(Rate::from_str("12.340").unwrap().to_string(), "12.34");
    }

    #[test]
    fn sums_amounts() {
        let total: Money = ["0.1", "0.2", "0.3"]
            .into_iter()
            .map(|s| Money::from_str(s).unwrap())
            .sum();

        assert_eq!(total.get(), decimal("0.6"));
        assert_eq!(std::iter::empty::<Money>().sum::<Money>(), Money::ZERO);
    }
}
