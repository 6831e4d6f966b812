//! [`Timesheet`] read model definitions.

pub mod csv;

use common::Date;

use crate::domain::{timesheet::Status, Timesheet};

/// Filter of [`Timesheet`]s by their period and [`Status`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Filter {
    /// Earliest allowed start of a [`Timesheet`] period.
    pub period_from: Option<Date>,

    /// Latest allowed end of a [`Timesheet`] period.
    pub period_to: Option<Date>,

    /// Required [`Status`] of a [`Timesheet`].
    pub status: Option<Status>,
}

impl Filter {
    /// Checks whether the provided [`Timesheet`] satisfies this [`Filter`].
    #[must_use]
    pub fn matches(&self, timesheet: &Timesheet) -> bool {
        let period = timesheet.period();
        self.period_from.map_or(true, |from| period.start() >= from)
            && self.period_to.map_or(true, |to| period.end() <= to)
            && self.status.map_or(true, |s| timesheet.status() == s)
    }
}

pub mod mine {
    //! [`Timesheet`]s of a single employee.

    use crate::domain::user;
    #[cfg(doc)]
    use crate::domain::Timesheet;

    /// Selector of [`Timesheet`]s owned by a single employee.
    ///
    /// Selected [`Timesheet`]s are ordered by their period start descending.
    #[derive(Clone, Copy, Debug)]
    pub struct Selector {
        /// ID of the employee owning the [`Timesheet`]s.
        pub employee_id: user::Id,

        /// [`Filter`] to apply.
        ///
        /// [`Filter`]: super::Filter
        pub filter: super::Filter,
    }
}

pub mod list {
    //! Administrative list of [`Timesheet`]s.

    use common::define_pagination;

    use crate::domain::{user, Timesheet, User};

    define_pagination!(Item, Filter);

    /// [`Timesheet`] on a [`Page`] along with its employee.
    #[derive(Clone, Debug)]
    pub struct Item {
        /// Listed [`Timesheet`].
        pub timesheet: Timesheet,

        /// [`User`] owning the [`Timesheet`].
        pub employee: User,
    }

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// Period and status filter.
        pub timesheet: super::Filter,

        /// ID of the employee owning the listed [`Timesheet`]s.
        pub employee_id: Option<user::Id>,
    }

    impl Filter {
        /// Checks whether the provided [`Timesheet`] satisfies this
        /// [`Filter`].
        #[must_use]
        pub fn matches(&self, timesheet: &Timesheet) -> bool {
            self.timesheet.matches(timesheet)
                && self
                    .employee_id
                    .map_or(true, |id| timesheet.employee_id() == id)
        }
    }
}
