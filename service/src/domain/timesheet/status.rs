//! [`Status`] lifecycle of a [`Timesheet`].

use common::define_kind;
use derive_more::{Display, Error};

#[cfg(doc)]
use crate::domain::Timesheet;

define_kind! {
    #[doc = "Lifecycle status of a [`Timesheet`]."]
    enum Status {
        #[doc = "Being filled by its employee."]
        Draft = 0,

        #[doc = "Handed over for a review."]
        Submitted = 1,

        #[doc = "Accepted by a reviewer."]
        Approved = 2,

        #[doc = "Sent back to its employee by a reviewer."]
        Returned = 3,
    }
}

impl Status {
    /// Checks whether entries of a [`Timesheet`] in this [`Status`] may be
    /// added, edited or deleted.
    #[must_use]
    pub const fn allows_entry_changes(self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Performs the provided [`Transition`] out of this [`Status`].
    ///
    /// Submission and both reviews are currently accepted from any
    /// [`Status`]: re-submitting refreshes the submission time and a review
    /// doesn't require a prior submission.
    ///
    /// # Errors
    ///
    /// With [`InvalidTransition`] if the [`Transition`] is not allowed. No
    /// [`Transition`] is rejected yet: this is the single place to restrict
    /// them, e.g. reviews to [`Status::Submitted`] only.
    pub const fn transition(
        self,
        transition: Transition,
    ) -> Result<Self, InvalidTransition> {
        use Status as S;
        use Transition as T;

        match (self, transition) {
            (S::Draft | S::Submitted | S::Approved | S::Returned, T::Submit) => {
                Ok(S::Submitted)
            }
            (S::Draft | S::Submitted | S::Approved | S::Returned, T::Approve) => {
                Ok(S::Approved)
            }
            (S::Draft | S::Submitted | S::Approved | S::Returned, T::Return) => {
                Ok(S::Returned)
            }
        }
    }
}

/// Transition between [`Status`]es.
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum Transition {
    /// Submitting for a review.
    #[display("submit")]
    Submit,

    /// Approving after a review.
    #[display("approve")]
    Approve,

    /// Returning to the employee after a review.
    #[display("return")]
    Return,
}

/// [`Transition`] is not allowed out of the current [`Status`].
///
/// Reserved: [`Status::transition()`] accepts every [`Transition`] for now.
#[derive(Clone, Copy, Debug, Display, Error, Eq, PartialEq)]
#[display("cannot {transition} a `Timesheet` in `{from}` status")]
pub struct InvalidTransition {
    /// [`Status`] the [`Transition`] was attempted from.
    #[error(not(source))]
    pub from: Status,

    /// Attempted [`Transition`].
    #[error(not(source))]
    pub transition: Transition,
}
