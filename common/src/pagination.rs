//! Abstractions for offset pagination.
//!
//! Listing pages are addressed by a 1-based page number and a page size,
//! translating into a `LIMIT`/`OFFSET` range at the store level.

use derive_more::{Display, From, Into};

/// Number of a [`Page`], 1-based.
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PageNumber(i32);

impl PageNumber {
    /// The first [`PageNumber`].
    pub const FIRST: Self = Self(1);

    /// Creates a new [`PageNumber`], if the provided `number` is positive.
    #[must_use]
    pub fn new(number: i32) -> Option<Self> {
        (number >= 1).then_some(Self(number))
    }

    /// Returns this [`PageNumber`] as a plain number.
    #[must_use]
    pub fn get(self) -> i32 {
        self.0
    }
}

impl Default for PageNumber {
    fn default() -> Self {
        Self::FIRST
    }
}

/// Size of a [`Page`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PageSize(i32);

impl PageSize {
    /// Default [`PageSize`] of listing pages.
    pub const DEFAULT: Self = Self(10);

    /// Creates a new [`PageSize`], if the provided `size` is positive.
    #[must_use]
    pub fn new(size: i32) -> Option<Self> {
        (size >= 1).then_some(Self(size))
    }

    /// Returns this [`PageSize`] as a plain number.
    #[must_use]
    pub fn get(self) -> i32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Selector of a single [`Page`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Selector<F, S> {
    /// [`PageNumber`] of the requested [`Page`].
    pub number: PageNumber,

    /// [`PageSize`] of the requested [`Page`].
    pub size: PageSize,

    /// Additional filter being applied to the result.
    pub filter: F,

    /// Order the result is sorted in at the store level.
    pub sort: S,
}

impl<F, S> Selector<F, S> {
    /// Returns the `OFFSET` of the requested [`Page`].
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.number.get() - 1) * i64::from(self.size.get())
    }

    /// Returns the `LIMIT` of the requested [`Page`].
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.size.get())
    }
}

/// Single page of `I` items.
#[derive(Clone, Debug)]
pub struct Page<I> {
    /// Items on this [`Page`].
    pub items: Vec<I>,

    /// [`PageNumber`] of this [`Page`].
    pub number: PageNumber,

    /// [`PageSize`] this [`Page`] was requested with.
    pub size: PageSize,
}

/// Total count of items a paginated query matches.
#[derive(
    Clone, Copy, Debug, Default, Display, Eq, From, Hash, Into, PartialEq,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TotalCount(i32);

impl TotalCount {
    /// Indicates whether a [`Page`] with the provided [`PageNumber`] and
    /// [`PageSize`] is followed by another non-empty [`Page`].
    #[must_use]
    pub fn has_page_after(self, number: PageNumber, size: PageSize) -> bool {
        i64::from(number.get()) * i64::from(size.get()) < i64::from(self.0)
    }
}

#[cfg(test)]
mod spec {
    use super::{PageNumber, PageSize, Selector, TotalCount};

    #[test]
    fn page_number_is_positive() {
        assert!(PageNumber::new(0).is_none());
        assert!(PageNumber::new(-3).is_none());
        assert_eq!(PageNumber::new(1), Some(PageNumber::FIRST));
    }

    #[test]
    fn selector_range_covers_requested_page_only() {
        let selector = Selector {
            number: PageNumber::new(3).unwrap(),
            size: PageSize::new(20).unwrap(),
            filter: (),
            sort: (),
        };

        assert_eq!(selector.offset(), 40);
        assert_eq!(selector.limit(), 20);

        let first = Selector {
            number: PageNumber::FIRST,
            size: PageSize::new(20).unwrap(),
            filter: (),
            sort: (),
        };
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn total_count_detects_following_pages() {
        let total = TotalCount::from(21);
        let size = PageSize::new(10).unwrap();

        assert!(total.has_page_after(PageNumber::new(1).unwrap(), size));
        assert!(total.has_page_after(PageNumber::new(2).unwrap(), size));
        assert!(!total.has_page_after(PageNumber::new(3).unwrap(), size));
    }
}
