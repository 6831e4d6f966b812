//! [`User`] definitions.

pub mod session;

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Identity record of an employee, a manager or an administrator.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`]
    pub id: Id,

    /// [`Name`] of this [`User`].
    pub name: Name,

    /// [`Email`] of this [`User`].
    pub email: Email,

    /// [`Role`]s granted to this [`User`].
    pub roles: Roles,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`User`].
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

/// Full name of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.chars().count() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Email address of a [`User`], unique among all the [`User`]s.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    ///
    /// The `address` is lowercased, so lookups are case-insensitive.
    #[must_use]
    pub fn new(address: impl AsRef<str>) -> Option<Self> {
        let address = address.as_ref().to_lowercase();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 254 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

define_kind! {
    #[doc = "Role granted to a [`User`]."]
    enum Role {
        #[doc = "Records own timesheets."]
        Employee = 1,

        #[doc = "Reviews timesheets of employees (also known as crew lead)."]
        Manager = 2,

        #[doc = "Administers users and reviews timesheets."]
        Admin = 3,

        #[doc = "Has every privilege in the system."]
        SuperAdmin = 4,
    }
}

/// Set of [`Role`]s granted to a [`User`].
///
/// Never empty: a [`User`] without any explicit [`Role`] is an
/// [`Role::Employee`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Roles(Vec<Role>);

impl Roles {
    /// Creates a new [`Roles`] set out of the provided [`Role`]s.
    #[must_use]
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        let mut roles = roles.into_iter().collect::<Vec<_>>();
        roles.sort_unstable();
        roles.dedup();
        if roles.is_empty() {
            roles.push(Role::Employee);
        }
        Self(roles)
    }

    /// Checks whether the provided [`Role`] is granted.
    #[must_use]
    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Iterates over the granted [`Role`]s in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }
}

impl AsRef<[Role]> for Roles {
    fn as_ref(&self) -> &[Role] {
        &self.0
    }
}

impl FromIterator<Role> for Roles {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Email, Name, Role, Roles};

    #[test]
    fn normalizes_emails() {
        assert_eq!(
            Email::new("Jane.Doe@Example.com").unwrap().to_string(),
            "jane.doe@example.com",
        );

        assert!(Email::new("jane.doe").is_none());
        assert!(Email::new("jane doe@example.com").is_none());
        assert!(Email::new("@example.com").is_none());
    }

    #[test]
    fn rejects_untrimmed_names() {
        assert!(Name::new("Jane Doe").is_some());
        assert!(Name::new(" Jane").is_none());
        assert!(Name::new("").is_none());
    }

    #[test]
    fn defaults_roles_to_employee() {
        assert_eq!(Roles::new([]).as_ref(), &[Role::Employee]);
        assert_eq!(
            Roles::new([Role::SuperAdmin, Role::Manager, Role::Manager])
                .as_ref(),
            &[Role::Manager, Role::SuperAdmin],
        );
    }
}
