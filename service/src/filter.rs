//! In-memory narrowing and ordering of already-fetched [`Listing`]s.
//!
//! Works on the combined page, after promoted [`Listing`]s were prepended,
//! so its sort is distinct from the store-level one: it reorders whatever
//! the page already holds.

use rust_decimal::Decimal;

use crate::{domain::Listing, read::listing::list};

/// Conjunction of user-selected predicates over [`Listing`]s.
///
/// A [`Listing`] passes iff it satisfies every non-empty predicate. An empty
/// [`Criteria`] passes everything, and emptying any single predicate restores
/// the [`Listing`]s only that predicate excluded.
#[derive(Clone, Debug, Default)]
pub struct Criteria {
    /// Exact-match multi-select predicates.
    pub selections: Vec<Selection>,

    /// Inclusive numeric range predicates.
    pub ranges: Vec<Range>,

    /// Case-insensitive free-text query over title and description.
    pub search: Option<String>,

    /// Features at least one of which a [`Listing`] must carry.
    pub features: Vec<String>,
}

/// Exact-match multi-select predicate over a single field.
#[derive(Clone, Debug)]
pub struct Selection {
    /// Field the predicate applies to.
    pub field: String,

    /// Allowed values of the field.
    ///
    /// An empty selection means the predicate is off.
    pub values: Vec<String>,
}

/// Inclusive numeric range predicate over a single field.
#[derive(Clone, Copy, Debug)]
pub struct Range {
    /// Field the predicate applies to.
    pub field: &'static str,

    /// Lower bound, inclusive.
    pub min: Option<Decimal>,

    /// Upper bound, inclusive.
    pub max: Option<Decimal>,
}

impl Criteria {
    /// Indicates whether this [`Criteria`] has no active predicate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selections.iter().all(|s| s.values.is_empty())
            && self.ranges.iter().all(|r| r.min.is_none() && r.max.is_none())
            && self.search.as_ref().is_none_or(|s| s.trim().is_empty())
            && self.features.is_empty()
    }

    /// Indicates whether the provided [`Listing`] satisfies every active
    /// predicate of this [`Criteria`].
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        self.selections.iter().all(|s| s.matches(listing))
            && self.ranges.iter().all(|r| r.matches(listing))
            && self.search.as_ref().is_none_or(|q| searches(listing, q))
            && (self.features.is_empty()
                || self
                    .features
                    .iter()
                    .any(|wanted| has_feature(listing, wanted)))
    }

    /// Narrows the provided [`Listing`]s by this [`Criteria`] and orders the
    /// survivors by the provided [`list::Sort`].
    ///
    /// The sort is stable, so [`Listing`]s comparing equal keep their
    /// incoming relative order.
    #[must_use]
    pub fn apply(
        &self,
        items: &[Listing],
        sort: list::Sort,
    ) -> Vec<Listing> {
        let mut passed = items
            .iter()
            .filter(|l| self.matches(l))
            .cloned()
            .collect::<Vec<_>>();
        sort_items(&mut passed, sort);
        passed
    }
}

impl Selection {
    /// Indicates whether the provided [`Listing`] matches this [`Selection`].
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        if self.values.is_empty() {
            return true;
        }
        listing
            .text_field(&self.field)
            .is_some_and(|v| self.values.iter().any(|allowed| allowed == v))
    }
}

impl Range {
    /// Indicates whether the provided [`Listing`] falls into this [`Range`].
    ///
    /// A bounded [`Range`] over a field the [`Listing`] does not carry
    /// excludes it.
    #[must_use]
    pub fn matches(&self, listing: &Listing) -> bool {
        if self.min.is_none() && self.max.is_none() {
            return true;
        }
        let Some(value) = listing.numeric_field(self.field) else {
            return false;
        };
        self.min.is_none_or(|min| value >= min)
            && self.max.is_none_or(|max| value <= max)
    }
}

/// Indicates whether the provided query occurs in the title or description
/// of the provided [`Listing`], case-insensitively.
fn searches(listing: &Listing, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    listing.title.as_ref().to_lowercase().contains(&query)
        || listing.description.as_ref().to_lowercase().contains(&query)
}

/// Indicates whether the provided [`Listing`] carries the wanted feature.
///
/// The match is loose on purpose: either string containing the other counts,
/// case-insensitively, since submission forms and filter options word
/// features slightly differently (e.g. "sunroof" vs "panoramic sunroof").
fn has_feature(listing: &Listing, wanted: &str) -> bool {
    let wanted = wanted.to_lowercase();
    listing.features.iter().any(|f| {
        let f = f.as_ref().to_lowercase();
        f.contains(&wanted) || wanted.contains(&f)
    })
}

/// Stable in-memory counterpart of the store-level [`list::Sort`].
fn sort_items(items: &mut [Listing], sort: list::Sort) {
    use list::Sort as S;

    match sort {
        S::Newest => {
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        }
        S::PriceAsc => sort_by_field(items, "price", false),
        S::PriceDesc => sort_by_field(items, "price", true),
        S::YearDesc => sort_by_field(items, "year", true),
        S::KmAsc => sort_by_field(items, "km", false),
        S::RatingDesc => sort_by_field(items, "rating", true),
    }
}

/// Stable sort by a numeric field, with absent values last either way.
fn sort_by_field(items: &mut [Listing], field: &str, descending: bool) {
    items.sort_by(|a, b| {
        match (a.numeric_field(field), b.numeric_field(field)) {
            (Some(a), Some(b)) => {
                if descending {
                    b.cmp(&a)
                } else {
                    a.cmp(&b)
                }
            }
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        }
    });
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::{
        domain::{
            listing::{Attributes, Id, UserId},
            Listing, Status,
        },
        read::listing::list,
    };

    use super::{Criteria, Range, Selection};

    fn listing(title: &str, attributes: serde_json::Value) -> Listing {
        Listing {
            id: Id::new(),
            user_id: UserId::from(uuid::Uuid::new_v4()),
            status: Status::Active,
            is_promoted: None,
            promotion_end_date: None,
            promotion_impressions: 0.into(),
            last_top_position_at: None,
            created_at: DateTime::now().coerce(),
            title: title.into(),
            description: String::new().into(),
            price: None,
            location: None,
            attributes: Attributes::from(attributes),
            features: vec![],
        }
    }

    #[test]
    fn conjunction_requires_every_active_predicate() {
        let toyota = listing(
            "Toyota Corolla",
            serde_json::json!({"manufacturer": "Toyota", "year": 2019}),
        );
        let mazda = listing(
            "Mazda 3",
            serde_json::json!({"manufacturer": "Mazda", "year": 2015}),
        );

        let mut criteria = Criteria {
            selections: vec![Selection {
                field: "manufacturer".into(),
                values: vec!["Toyota".into()],
            }],
            ranges: vec![Range {
                field: "year",
                min: Some(2018.into()),
                max: None,
            }],
            ..Criteria::default()
        };
        assert!(criteria.matches(&toyota));
        assert!(!criteria.matches(&mazda));

        // Narrowing the range excludes the remaining match too.
        criteria.ranges[0].max = Some(2018.into());
        assert!(!criteria.matches(&toyota));
    }

    #[test]
    fn emptied_selection_restores_excluded_listings() {
        let toyota =
            listing("car", serde_json::json!({"manufacturer": "Toyota"}));
        let mazda =
            listing("car", serde_json::json!({"manufacturer": "Mazda"}));

        let mut criteria = Criteria {
            selections: vec![Selection {
                field: "manufacturer".into(),
                values: vec!["Toyota".into()],
            }],
            ..Criteria::default()
        };
        assert!(!criteria.matches(&mazda));

        criteria.selections[0].values.clear();
        assert!(criteria.matches(&toyota));
        assert!(criteria.matches(&mazda));
        assert!(criteria.is_empty());
    }

    #[test]
    fn bounded_range_excludes_listings_without_the_field() {
        let priced = listing("a", serde_json::json!({"km": 90_000}));
        let unpriced = listing("b", serde_json::json!({}));

        let criteria = Criteria {
            ranges: vec![Range {
                field: "km",
                min: None,
                max: Some(100_000.into()),
            }],
            ..Criteria::default()
        };
        assert!(criteria.matches(&priced));
        assert!(!criteria.matches(&unpriced));
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let exact = listing("a", serde_json::json!({"year": 2020}));
        let criteria = Criteria {
            ranges: vec![Range {
                field: "year",
                min: Some(2020.into()),
                max: Some(2020.into()),
            }],
            ..Criteria::default()
        };
        assert!(criteria.matches(&exact));
    }

    #[test]
    fn search_is_case_insensitive_over_title_and_description() {
        let mut l = listing("Toyota Corolla", serde_json::json!({}));
        l.description = "one owner, garage kept".into();

        let by_title = Criteria {
            search: Some("toyota".into()),
            ..Criteria::default()
        };
        assert!(by_title.matches(&l));

        let by_description = Criteria {
            search: Some("GARAGE".into()),
            ..Criteria::default()
        };
        assert!(by_description.matches(&l));

        let miss = Criteria {
            search: Some("mazda".into()),
            ..Criteria::default()
        };
        assert!(!miss.matches(&l));
    }

    #[test]
    fn feature_overlap_is_loose_both_ways() {
        let mut l = listing("car", serde_json::json!({}));
        l.features = vec!["Panoramic sunroof".into()];

        let narrower = Criteria {
            features: vec!["sunroof".into()],
            ..Criteria::default()
        };
        assert!(narrower.matches(&l));

        let wider = Criteria {
            features: vec!["huge panoramic sunroof".into()],
            ..Criteria::default()
        };
        assert!(wider.matches(&l));

        let unrelated = Criteria {
            features: vec!["tow hook".into()],
            ..Criteria::default()
        };
        assert!(!unrelated.matches(&l));
    }

    #[test]
    fn sort_is_stable_and_pushes_absent_values_last() {
        let cheap = {
            let mut l = listing("cheap", serde_json::json!({}));
            l.price = Some("10".parse().unwrap());
            l
        };
        let first_mid = {
            let mut l = listing("first mid", serde_json::json!({}));
            l.price = Some("50".parse().unwrap());
            l
        };
        let second_mid = {
            let mut l = listing("second mid", serde_json::json!({}));
            l.price = Some("50".parse().unwrap());
            l
        };
        let unpriced = listing("unpriced", serde_json::json!({}));

        let items = vec![
            unpriced.clone(),
            first_mid.clone(),
            cheap.clone(),
            second_mid.clone(),
        ];
        let sorted = Criteria::default().apply(&items, list::Sort::PriceAsc);

        let titles = sorted
            .iter()
            .map(|l| l.title.to_string())
            .collect::<Vec<_>>();
        assert_eq!(titles, ["cheap", "first mid", "second mid", "unpriced"]);
    }
}
