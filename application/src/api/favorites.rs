//! Favorite-related API handlers.

use axum::{extract::Path, Extension, Json};
use serde::Serialize;
use service::{
    command::{toggle_favorite::Toggled, ToggleFavorite},
    domain::{listing, Favorite, FavoriteItem},
    query::favorites,
    Command as _,
};

use crate::error::AsError as _;
use crate::{Error, Service};

/// Returns all favorites saved by a user, newest first.
pub async fn list(
    Extension(service): Extension<Service>,
    Path(user_id): Path<listing::UserId>,
) -> Result<Json<Vec<Favorite>>, Error> {
    service
        .execute(favorites::List::by(
            service::read::favorite::list::Selector { user_id },
        ))
        .await
        .map(|list| Json(list.0))
        .map_err(|e| e.into_error())
}

/// Result of toggling a favorite.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Toggle {
    /// Indicator whether the favorite is saved after the toggle.
    pub saved: bool,
}

/// Saves a listing as a favorite, or removes it if already saved.
pub async fn toggle(
    Extension(service): Extension<Service>,
    Path(user_id): Path<listing::UserId>,
    Json(item): Json<FavoriteItem>,
) -> Result<Json<Toggle>, Error> {
    service
        .execute(ToggleFavorite { user_id, item })
        .await
        .map(|toggled| {
            Json(Toggle {
                saved: matches!(toggled, Toggled::Saved),
            })
        })
        .map_err(|e| e.into_error())
}
