//! [`Favorite`] definitions.

use common::{DateTimeOf, Price};
use serde::{Deserialize, Serialize};

use super::{listing, Category, Listing};

/// [`Listing`] saved by a user, denormalized for display.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Favorite {
    /// ID of the account this [`Favorite`] belongs to.
    pub user_id: listing::UserId,

    /// Saved [`FavoriteItem`].
    pub item: FavoriteItem,

    /// [`DateTime`] this [`Favorite`] was saved at.
    ///
    /// [`DateTime`]: common::DateTime
    pub created_at: SavedDateTime,
}

/// Unique key of a [`Favorite`].
///
/// One account saves any [`Listing`] at most once.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Key {
    /// ID of the account the [`Favorite`] belongs to.
    pub user_id: listing::UserId,

    /// [`Category`] of the referenced [`Listing`].
    pub kind: Category,

    /// ID of the referenced [`Listing`].
    pub id: listing::Id,
}

/// Marker of a [`DateTime`] a [`Favorite`] was saved at.
///
/// [`DateTime`]: common::DateTime
#[derive(Clone, Copy, Debug)]
pub enum Saved {}

/// [`DateTime`] a [`Favorite`] was saved at.
///
/// [`DateTime`]: common::DateTime
pub type SavedDateTime = DateTimeOf<Saved>;

/// Reference to a [`Listing`] of any [`Category`], tagged with its kind.
///
/// Replaces the shape-by-convention favorite objects of the per-category
/// pages with one tagged union carrying a normalized label.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct FavoriteItem {
    /// [`Category`] of the referenced [`Listing`].
    pub kind: Category,

    /// ID of the referenced [`Listing`].
    pub id: listing::Id,

    /// Normalized display label of the referenced [`Listing`].
    pub label: String,

    /// [`Price`] of the referenced [`Listing`] at save time, if stated.
    pub price: Option<Price>,
}

impl FavoriteItem {
    /// Creates a new [`FavoriteItem`] referencing the provided [`Listing`].
    ///
    /// The label is normalized per [`Category`]: vehicles and laptops are
    /// labeled by manufacturer and model when present, everything else by
    /// title.
    #[must_use]
    pub fn of(kind: Category, listing: &Listing) -> Self {
        let label = match kind {
            Category::Car | Category::Laptop => {
                match (
                    listing.attributes.text("manufacturer"),
                    listing.attributes.text("model"),
                ) {
                    (Some(man), Some(model)) => format!("{man} {model}"),
                    (Some(one), None) | (None, Some(one)) => one.to_owned(),
                    (None, None) => listing.title.to_string(),
                }
            }
            Category::Property
            | Category::Job
            | Category::Freelancer
            | Category::Business
            | Category::SecondhandItem
            | Category::Project => listing.title.to_string(),
        };

        Self {
            kind,
            id: listing.id,
            label,
            price: listing.price,
        }
    }

    /// Returns the normalized display label of this [`FavoriteItem`].
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;

    use crate::domain::{
        listing::{Attributes, Id, UserId},
        Category, Listing, Status,
    };

    use super::FavoriteItem;

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
    fn car_label_prefers_manufacturer_and_model() {
        let car = listing(
            "great car",
            serde_json::json!({"manufacturer": "Toyota", "model": "Corolla"}),
        );
        let item = FavoriteItem::of(Category::Car, &car);
        assert_eq!(item.label(), "Toyota Corolla");
    }

    #[test]
    fn label_falls_back_to_title() {
        let job = listing("Backend engineer", serde_json::json!({}));
        let item = FavoriteItem::of(Category::Job, &job);
        assert_eq!(item.label(), "Backend engineer");

        let car = listing("great car", serde_json::json!({}));
        let item = FavoriteItem::of(Category::Car, &car);
        assert_eq!(item.label(), "great car");
    }
}
