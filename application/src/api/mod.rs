//! REST API definitions.

pub mod favorites;
pub mod listings;

use axum::extract::Path;

use crate::Error;

/// Resolves the [`Category`] a request path addresses.
///
/// Categories are addressed by their table names (`cars`, `properties` and
/// so on), matching the page URLs of the storefront.
///
/// [`Category`]: service::domain::Category
pub(crate) fn category(
    name: &str,
) -> Result<service::domain::Category, Error> {
    service::domain::Category::from_table(name)
        .ok_or_else(|| Error::not_found(&format!("unknown category `{name}`")))
}

/// Path parameters addressing a single listing.
#[derive(Debug, serde::Deserialize)]
pub struct ListingPath {
    /// Table name of the [`Category`].
    ///
    /// [`Category`]: service::domain::Category
    pub category: String,

    /// ID of the listing.
    pub id: service::domain::listing::Id,
}

/// Shortcut for a listing-addressing [`Path`] extractor.
pub type Listing = Path<ListingPath>;
