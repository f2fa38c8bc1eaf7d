//! [`Listing`]-related read definitions.

#[cfg(doc)]
use crate::domain::Listing;

pub mod list {
    //! Regular (non-promoted) [`Listing`]s list definitions.
    //!
    //! The regular slice excludes any actively promoted [`Listing`], so a
    //! promoted one never shows up twice on a page.

    use serde::{Deserialize, Serialize};

    use crate::domain::{Category, Listing};

    /// Node of a [`Page`].
    pub type Node = Listing;

    /// Single page of regular [`Listing`]s.
    pub type Page = common::pagination::Page<Node>;

    /// Selector of a [`Page`].
    pub type Selector = common::pagination::Selector<Filter, Sort>;

    /// Total count of regular [`Listing`]s matching a [`Filter`].
    pub type TotalCount = common::pagination::TotalCount;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug)]
    pub struct Filter {
        /// [`Category`] to select [`Listing`]s of.
        pub category: Category,

        /// Free-text query matched against titles and descriptions at the
        /// store level.
        pub search: Option<String>,
    }

    impl Filter {
        /// Creates a new [`Filter`] selecting all visible [`Listing`]s of
        /// the provided [`Category`].
        #[must_use]
        pub fn of(category: Category) -> Self {
            Self {
                category,
                search: None,
            }
        }
    }

    /// Store-level sort order of regular [`Listing`]s.
    #[derive(
        Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
    )]
    #[serde(rename_all = "snake_case")]
    pub enum Sort {
        /// Newest first.
        #[default]
        Newest,

        /// Cheapest first.
        PriceAsc,

        /// Most expensive first.
        PriceDesc,

        /// Newest model year first.
        YearDesc,

        /// Lowest mileage first.
        KmAsc,

        /// Highest rating first.
        RatingDesc,
    }

    impl Sort {
        /// Returns the `ORDER BY` expression of this [`Sort`] for the
        /// provided [`Category`].
        ///
        /// Sorts over fields a [`Category`] does not carry fall back to
        /// [`Sort::Newest`].
        #[must_use]
        pub fn order_by(self, category: Category) -> &'static str {
            const NEWEST: &str = "created_at DESC, id ASC";

            match self {
                Self::Newest => NEWEST,
                Self::PriceAsc => "price ASC NULLS LAST, id ASC",
                Self::PriceDesc => "price DESC NULLS LAST, id ASC",
                Self::YearDesc => match category {
                    Category::Car | Category::Laptop | Category::Property => {
                        "(attributes->>'year')::NUMERIC DESC NULLS LAST, \
                         id ASC"
                    }
                    Category::Job
                    | Category::Freelancer
                    | Category::Business
                    | Category::SecondhandItem
                    | Category::Project => NEWEST,
                },
                Self::KmAsc => match category {
                    Category::Car => {
                        "(attributes->>'km')::NUMERIC ASC NULLS LAST, id ASC"
                    }
                    Category::Property
                    | Category::Laptop
                    | Category::Job
                    | Category::Freelancer
                    | Category::Business
                    | Category::SecondhandItem
                    | Category::Project => NEWEST,
                },
                Self::RatingDesc => match category {
                    Category::Freelancer | Category::Business => {
                        "(attributes->>'rating')::NUMERIC DESC NULLS LAST, \
                         id ASC"
                    }
                    Category::Car
                    | Category::Property
                    | Category::Laptop
                    | Category::Job
                    | Category::SecondhandItem
                    | Category::Project => NEWEST,
                },
            }
        }
    }
}

pub mod promoted {
    //! Promoted [`Listing`]s slice definitions.

    use std::cmp::Ordering;

    use crate::domain::{Category, Listing};

    /// Maximum number of [`Listing`]s surfaced in the promoted slice of a
    /// single page load, no matter how many qualify.
    pub const SLICE_LIMIT: usize = 3;

    /// Selector of a [`Slice`].
    #[derive(Clone, Copy, Debug)]
    pub struct Selector {
        /// [`Category`] to select promoted [`Listing`]s of.
        pub category: Category,
    }

    /// Promoted [`Listing`]s of one page load, at most [`SLICE_LIMIT`] of
    /// them, in rotation order.
    #[derive(Clone, Debug, Default)]
    pub struct Slice(Vec<Listing>);

    impl Slice {
        /// Creates a new [`Slice`] from [`Listing`]s already in rotation
        /// order, keeping at most [`SLICE_LIMIT`] of them.
        #[must_use]
        pub fn new(items: impl IntoIterator<Item = Listing>) -> Self {
            Self(items.into_iter().take(SLICE_LIMIT).collect())
        }

        /// Returns the [`Listing`] occupying the top slot, if any.
        ///
        /// This is the single [`Listing`] whose impression is counted on a
        /// page load.
        #[must_use]
        pub fn top(&self) -> Option<&Listing> {
            self.0.first()
        }

        /// Number of [`Listing`]s in this [`Slice`].
        #[must_use]
        pub fn len(&self) -> usize {
            self.0.len()
        }

        /// Indicates whether this [`Slice`] is empty.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.0.is_empty()
        }

        /// Consumes this [`Slice`], returning its [`Listing`]s in rotation
        /// order.
        #[must_use]
        pub fn into_vec(self) -> Vec<Listing> {
            self.0
        }
    }

    impl<'a> IntoIterator for &'a Slice {
        type Item = &'a Listing;
        type IntoIter = std::slice::Iter<'a, Listing>;

        fn into_iter(self) -> Self::IntoIter {
            self.0.iter()
        }
    }

    /// Fair rotation order of qualifying promoted [`Listing`]s.
    ///
    /// Least shown first, tie-broken by the longest time since (or never)
    /// occupying the top slot, with the ID as the final total-order
    /// tie-break:
    /// 1. `promotion_impressions` ascending;
    /// 2. `last_top_position_at` ascending, `None` sorting first;
    /// 3. `id` ascending.
    #[must_use]
    pub fn ordering(a: &Listing, b: &Listing) -> Ordering {
        a.promotion_impressions
            .cmp(&b.promotion_impressions)
            .then_with(|| {
                match (a.last_top_position_at, b.last_top_position_at) {
                    (None, None) => Ordering::Equal,
                    (None, Some(_)) => Ordering::Less,
                    (Some(_), None) => Ordering::Greater,
                    (Some(x), Some(y)) => x.cmp(&y),
                }
            })
            .then_with(|| a.id.cmp(&b.id))
    }
}

pub mod page {
    //! Combined page definitions.

    use common::{pagination::TotalCount, PageNumber, PageSize};
    use serde::Serialize;

    use crate::domain::Listing;

    /// One fully combined page load: the promoted slice ahead of the
    /// regular slice.
    #[derive(Clone, Debug, Serialize)]
    pub struct View {
        /// Combined [`Listing`]s, promoted ones first.
        pub items: Vec<Listing>,

        /// Number of leading promoted [`Listing`]s in `items`.
        pub promoted_count: usize,

        /// Total count of regular [`Listing`]s matching the query, for
        /// pagination.
        pub total_count: TotalCount,

        /// [`PageNumber`] of this [`View`].
        pub number: PageNumber,

        /// [`PageSize`] this [`View`] was requested with.
        pub size: PageSize,
    }

    impl View {
        /// Indicates whether a further page of regular [`Listing`]s exists.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.total_count.has_page_after(self.number, self.size)
        }
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::{
        listing::{Attributes, Id, UserId},
        Category, Listing, Status,
    };

    use super::{list::Sort, promoted};

    fn promoted_listing(
        impressions: i32,
        last_top: Option<DateTime>,
    ) -> Listing {
        Listing {
            id: Id::new(),
            user_id: UserId::from(uuid::Uuid::new_v4()),
            status: Status::Active,
            is_promoted: Some(true),
            promotion_end_date: Some(
                (DateTime::now() + std::time::Duration::from_secs(3600))
                    .coerce(),
            ),
            promotion_impressions: impressions.into(),
            last_top_position_at: last_top.map(DateTime::coerce),
            created_at: DateTime::now().coerce(),
            title: "listing".into(),
            description: String::new().into(),
            price: None,
            location: None,
            attributes: Attributes::default(),
            features: vec![],
        }
    }

    #[test]
    fn slice_caps_at_limit() {
        let slice = promoted::Slice::new(
            (0..10).map(|_| promoted_listing(0, None)),
        );
        assert_eq!(slice.len(), promoted::SLICE_LIMIT);
    }

    #[test]
    fn rotation_prefers_least_shown_then_never_topped() {
        let t0 = DateTime::from_unix_timestamp(1_600_000_000).unwrap();
        let t1 = DateTime::from_unix_timestamp(1_600_000_100).unwrap();

        let a = promoted_listing(5, Some(t0));
        let b = promoted_listing(2, Some(t1));
        let c = promoted_listing(2, None);
        let d = promoted_listing(2, Some(t0));

        let mut items = vec![a.clone(), b.clone(), c.clone(), d.clone()];
        items.sort_by(promoted::ordering);

        let ids = items.iter().map(|l| l.id).collect::<Vec<_>>();
        // Never-topped `c` outranks earlier-topped `d`, which outranks `b`;
        // `a` has more impressions and goes last.
        assert_eq!(ids, vec![c.id, d.id, b.id, a.id]);
    }

    #[test]
    fn rotation_breaks_full_ties_by_id() {
        let x = promoted_listing(1, None);
        let y = promoted_listing(1, None);

        let mut items = vec![y.clone(), x.clone()];
        items.sort_by(promoted::ordering);

        assert!(items[0].id < items[1].id);
    }

    #[test]
    fn unsupported_sorts_fall_back_to_newest() {
        assert_eq!(
            Sort::KmAsc.order_by(Category::Job),
            Sort::Newest.order_by(Category::Job),
        );
        assert_ne!(
            Sort::KmAsc.order_by(Category::Car),
            Sort::Newest.order_by(Category::Car),
        );
        assert_eq!(
            Sort::RatingDesc.order_by(Category::Freelancer),
            "(attributes->>'rating')::NUMERIC DESC NULLS LAST, id ASC",
        );
    }
}
