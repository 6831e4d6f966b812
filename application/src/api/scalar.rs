//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper for `#[graphql(with = ..)]` attribute of newtypes wrapping a
/// validated domain string `D`.
///
/// Outputs `D` with its [`Display`] impl and parses it with its [`FromStr`]
/// impl, so the validation of `D` applies to every GraphQL input.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<D>(PhantomData<D>);

impl<D> Via<D> {
    /// Outputs the wrapped `D` as a string [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        D: fmt::Display,
        T: AsRef<D>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Parses a `T` wrapping `D` from a string [`InputValue`].
    ///
    /// # Errors
    ///
    /// If the [`InputValue`] is not a string, or `D` rejects it.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        D: FromStr,
        D::Err: fmt::Display,
        T: From<D> + GraphQLType<S, TypeInfo = ()>,
        S: ScalarValue,
    {
        let Some(s) = input.as_string_value() else {
            return Err(format!(
                "`{}` must be a string, found: {input}",
                name::<T, S>(),
            ));
        };
        s.parse::<D>().map(T::from).map_err(|e| {
            format!("`{}` cannot be \"{s}\": {e}", name::<T, S>())
        })
    }

    /// Parses the provided [`ScalarToken`] as a [`String`].
    ///
    /// # Errors
    ///
    /// If the token is not a string literal.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

/// Returns the GraphQL name of the `T` scalar.
fn name<T, S>() -> &'static str
where
    T: GraphQLType<S, TypeInfo = ()>,
    S: ScalarValue,
{
    T::name(&()).unwrap_or("scalar")
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue, Value};
    use service::domain;

    use crate::api::user;

    use super::Via;

    type Email = Via<domain::user::Email>;

    #[test]
    fn outputs_domain_string() {
        let email = user::Email::from(
            domain::user::Email::new("boss@example.com").unwrap(),
        );

        assert_eq!(
            Email::to_output::<_, DefaultScalarValue>(&email),
            Value::scalar("boss@example.com".to_owned()),
        );
    }

    #[test]
    fn validates_input_with_domain_type() {
        let input = InputValue::<DefaultScalarValue>::scalar("boss@example.com");
        let email: user::Email = Email::from_input(&input).unwrap();
        assert_eq!(email.to_string(), "boss@example.com");

        let input = InputValue::<DefaultScalarValue>::scalar("boss");
        let err = Email::from_input::<user::Email, _>(&input).unwrap_err();
        assert!(err.starts_with("`UserEmail` cannot be \"boss\""), "{err}");

        let input = InputValue::<DefaultScalarValue>::scalar(42);
        let err = Email::from_input::<user::Email, _>(&input).unwrap_err();
        assert!(err.contains("must be a string"), "{err}");
    }
}
