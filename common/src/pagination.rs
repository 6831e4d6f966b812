//! Abstractions for page-number pagination.

/// Requested page of a list.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Arguments {
    /// Number of the requested page, starting from `1`.
    number: u32,

    /// Maximum number of items on the requested page.
    size: u32,
}

impl Arguments {
    /// Default number of items on a page.
    pub const DEFAULT_SIZE: u32 = 20;

    /// Maximum number of items on a page.
    pub const MAX_SIZE: u32 = 200;

    /// Creates new [`Arguments`] out of the client-provided values.
    ///
    /// Out of range values are clamped rather than rejected: page number to
    /// `1..`, page size to `1..=`[`Arguments::MAX_SIZE`].
    #[must_use]
    pub fn new(number: Option<i32>, size: Option<i32>) -> Self {
        let number = number.map_or(1, |n| u32::try_from(n).unwrap_or(0));
        let size = size.map_or(Self::DEFAULT_SIZE, |s| {
            u32::try_from(s).unwrap_or(0)
        });
        Self {
            number: number.max(1),
            size: size.clamp(1, Self::MAX_SIZE),
        }
    }

    /// Returns number of the requested page, starting from `1`.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Returns maximum number of items on the requested page.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Returns number of items preceding the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.number - 1) * u64::from(self.size)
    }
}

impl Default for Arguments {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Page of a list.
#[derive(Clone, Debug)]
pub struct Page<I> {
    /// Items on this [`Page`].
    pub items: Vec<I>,

    /// [`Arguments`] this [`Page`] was selected with.
    pub arguments: Arguments,

    /// Total number of items in the whole list.
    pub total_count: u64,
}

impl<I> Page<I> {
    /// Creates a new [`Page`] out of the provided items.
    #[must_use]
    pub fn new(
        arguments: Arguments,
        items: impl IntoIterator<Item = impl Into<I>>,
        total_count: u64,
    ) -> Self {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            arguments,
            total_count,
        }
    }

    /// Creates an empty [`Page`] of an empty list.
    #[must_use]
    pub fn empty(arguments: Arguments) -> Self {
        Self {
            items: Vec::new(),
            arguments,
            total_count: 0,
        }
    }

    /// Returns total number of pages in the whole list.
    #[must_use]
    pub fn page_count(&self) -> u64 {
        self.total_count.div_ceil(u64::from(self.arguments.size()))
    }

    /// Indicates whether there is a page after this one.
    #[must_use]
    pub fn has_next_page(&self) -> bool {
        u64::from(self.arguments.number()) < self.page_count()
    }

    /// Indicates whether there is a page before this one.
    #[must_use]
    pub fn has_previous_page(&self) -> bool {
        self.arguments.number() > 1
    }

    /// Maps items of this [`Page`] with the provided function.
    #[must_use]
    pub fn map<T>(self, f: impl FnMut(I) -> T) -> Page<T> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            arguments: self.arguments,
            total_count: self.total_count,
        }
    }
}

/// Pagination selector.
#[derive(Clone, Debug)]
pub struct Selector<F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments,

    /// Additional filter being applied to the list.
    pub filter: F,
}

/// Defines pagination types.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($node:ty, $filter:ty) => {
        #[doc = "A [`Page`] of [`Node`]s."]
        pub type Page = $crate::pagination::Page<$node>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Page};

    #[test]
    fn clamps_arguments() {
        assert_eq!(
            Arguments::new(None, None),
            Arguments::new(Some(1), Some(20)),
        );
        assert_eq!(Arguments::new(Some(0), Some(0)).number(), 1);
        assert_eq!(Arguments::new(Some(-3), Some(0)).size(), 1);
        assert_eq!(Arguments::new(Some(2), Some(500)).size(), 200);
        assert_eq!(Arguments::new(Some(3), Some(25)).offset(), 50);
    }

    #[test]
    fn computes_neighbour_pages() {
        let first =
            Page::<u8>::new(Arguments::new(Some(1), Some(2)), [1_u8, 2], 5);
        assert_eq!(first.page_count(), 3);
        assert!(first.has_next_page());
        assert!(!first.has_previous_page());

        let last =
            Page::<u8>::new(Arguments::new(Some(3), Some(2)), [5_u8], 5);
        assert!(!last.has_next_page());
        assert!(last.has_previous_page());

        let empty = Page::<u8>::empty(Arguments::default());
        assert_eq!(empty.page_count(), 0);
        assert!(!empty.has_next_page());
    }
}
