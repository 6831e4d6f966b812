//! Non-negative exact decimal newtypes.

/// Defines a non-negative [`Decimal`] newtype with at most `scale` fractional
/// digits, optionally bounded from above.
///
/// Generated type provides:
/// - checked construction via `new()` and [`FromStr`];
/// - exact [`Add`] and [`Sum`] (sums are never bounded by `max`, only the
///   recorded values are);
/// - PostgreSQL `NUMERIC` and GraphQL string scalar representations.
///
/// [`Add`]: std::ops::Add
/// [`Decimal`]: rust_decimal::Decimal
/// [`FromStr`]: std::str::FromStr
/// [`Sum`]: std::iter::Sum
macro_rules! define_decimal {
    (
        $(#[doc = $doc:literal])*
        struct $name:ident, scale = $scale:literal $(, max = $max:literal)?;
    ) => {
        $(#[doc = $doc])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            ::derive_more::Display,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
        )]
        #[cfg_attr(
            feature = "postgres",
            derive(::postgres_types::FromSql, ::postgres_types::ToSql),
            postgres(transparent),
        )]
        #[cfg_attr(
            feature = "juniper",
            derive(::juniper::GraphQLScalar),
            graphql(
                to_output_with = $crate::decimal::juniper::to_output,
                from_input_with = $crate::decimal::juniper::from_input,
                parse_token(String),
            ),
        )]
        pub struct $name(::rust_decimal::Decimal);

        impl $name {
            #[doc = concat!("Zero [`", stringify!($name), "`].")]
            pub const ZERO: Self = Self(::rust_decimal::Decimal::ZERO);

            #[doc = concat!(
                "Maximum number of fractional digits of a [`",
                stringify!($name),
                "`].",
            )]
            pub const SCALE: u32 = $scale;

            #[doc = concat!(
                "Creates a new [`", stringify!($name), "`] if the provided ",
                "value is not negative, has at most `", stringify!($scale),
                "` significant fractional digits",
                $(" and doesn't exceed `", stringify!($max), "`",)?
                ".",
            )]
            #[must_use]
            pub fn new(value: ::rust_decimal::Decimal) -> Option<Self> {
                if value.is_zero() {
                    return Some(Self::ZERO);
                }
                if value.is_sign_negative()
                    || value.normalize().scale() > Self::SCALE
                {
                    return None;
                }
                $(
                    if value > ::rust_decimal::Decimal::from($max) {
                        return None;
                    }
                )?
                // Drops insignificant trailing zeros beyond `SCALE` only.
                Some(Self(value.round_dp(Self::SCALE)))
            }

            #[doc = concat!(
                "Returns the [`Decimal`] value of this [`",
                stringify!($name),
                "`].\n\n[`Decimal`]: rust_decimal::Decimal",
            )]
            #[must_use]
            pub const fn get(self) -> ::rust_decimal::Decimal {
                self.0
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = &'static str;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                ::rust_decimal::Decimal::from_str_exact(s.trim())
                    .ok()
                    .and_then(Self::new)
                    .ok_or(concat!("invalid `", stringify!($name), "` value"))
            }
        }

        impl ::std::ops::Add for $name {
            type Output = Self;

            fn add(self, rhs: Self) -> Self::Output {
                // Both operands have at most `SCALE` fractional digits, so the
                // sum needs no rounding unless it overflows `Decimal` entirely.
                Self(self.0.checked_add(rhs.0).expect("`Decimal` overflow"))
            }
        }

        impl ::std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                iter.fold(Self::ZERO, |acc, v| acc + v)
            }
        }
    };
}

#[cfg(feature = "juniper")]
pub(crate) mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::{fmt, str::FromStr};

    use juniper::{InputValue, ScalarValue, Value};

    /// Outputs a decimal scalar as its exact string representation.
    pub(crate) fn to_output<T, S>(value: &T) -> Value<S>
    where
        T: fmt::Display,
        S: ScalarValue,
    {
        Value::scalar(value.to_string())
    }

    /// Parses a decimal scalar from its string representation.
    pub(crate) fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        T: FromStr<Err = &'static str>,
        S: ScalarValue,
    {
        input
            .as_string_value()
            .ok_or_else(|| {
                format!(
                    "Cannot parse decimal input scalar from non-string \
                     value: {input}",
                )
            })
            .and_then(|s| {
                T::from_str(s).map_err(|e| {
                    format!("Cannot parse decimal input scalar: {e}")
                })
            })
    }
}
