//! [`Command`] definition.

pub mod promote_listing;
pub mod record_impression;
pub mod toggle_favorite;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    promote_listing::PromoteListing, record_impression::RecordImpression,
    toggle_favorite::ToggleFavorite,
};
