//! Authorization policy.

use derive_more::Display;

#[cfg(doc)]
use crate::domain::{Timesheet, User};
use crate::domain::user::{self, Role, Roles};

/// Authenticated [`User`] performing an operation.
///
/// Constructed per request out of a verified session and passed explicitly
/// into every operation requiring authorization.
#[derive(Clone, Debug)]
pub struct Actor {
    /// ID of the acting [`User`].
    pub user_id: user::Id,

    /// [`Roles`] of the acting [`User`].
    pub roles: Roles,
}

impl Actor {
    /// Checks whether this [`Actor`] may review (approve or return)
    /// [`Timesheet`]s of any employee.
    #[must_use]
    pub fn can_approve(&self) -> bool {
        [Role::Manager, Role::Admin, Role::SuperAdmin]
            .into_iter()
            .any(|r| self.roles.contains(r))
    }

    /// Checks whether this [`Actor`] may view and edit a [`Timesheet`] owned by
    /// the provided employee.
    #[must_use]
    pub fn can_access(&self, owner_id: user::Id) -> bool {
        self.user_id == owner_id || self.can_approve()
    }

    /// Checks whether this [`Actor`] may create other [`User`]s and issue
    /// sessions on their behalf.
    #[must_use]
    pub fn can_manage_users(&self) -> bool {
        self.roles.contains(Role::Admin) || self.roles.contains(Role::SuperAdmin)
    }

    /// Authorizes the provided [`Action`] upon a [`Timesheet`] owned by the
    /// provided employee.
    ///
    /// # Errors
    ///
    /// With [`Forbidden`] if the [`Action`] is not permitted to this [`Actor`].
    pub fn authorize(
        &self,
        action: Action,
        owner_id: user::Id,
    ) -> Result<(), Forbidden> {
        let permitted = match action {
            Action::View | Action::Edit | Action::Submit => {
                self.can_access(owner_id)
            }
            Action::Review => return self.authorize_review(),
        };
        if permitted {
            Ok(())
        } else {
            Err(Forbidden {
                user_id: self.user_id,
                action,
            })
        }
    }

    /// Authorizes [`Action::Review`] of any [`Timesheet`].
    ///
    /// Doesn't depend on the [`Timesheet`] owner, so may be checked before the
    /// [`Timesheet`] is even looked up.
    ///
    /// # Errors
    ///
    /// With [`Forbidden`] if this [`Actor`] doesn't review [`Timesheet`]s.
    pub fn authorize_review(&self) -> Result<(), Forbidden> {
        if self.can_approve() {
            Ok(())
        } else {
            Err(Forbidden {
                user_id: self.user_id,
                action: Action::Review,
            })
        }
    }
}

/// Action upon a [`Timesheet`] requiring authorization.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Action {
    /// Reading a [`Timesheet`] or exporting it.
    #[display("view")]
    View,

    /// Adding, editing or deleting entries of a [`Timesheet`].
    #[display("edit")]
    Edit,

    /// Submitting a [`Timesheet`] for a review.
    #[display("submit")]
    Submit,

    /// Approving or returning a [`Timesheet`].
    #[display("review")]
    Review,
}

/// [`Action`] is not permitted to an [`Actor`].
#[derive(Clone, Copy, Debug, Display, derive_more::Error, Eq, PartialEq)]
#[display("`User(id: {user_id})` is not permitted to {action} the `Timesheet`")]
pub struct Forbidden {
    /// ID of the [`User`] who was denied.
    #[error(not(source))]
    pub user_id: user::Id,

    /// Denied [`Action`].
    #[error(not(source))]
    pub action: Action,
}
