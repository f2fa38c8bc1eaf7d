//! Listing-related API handlers.

use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use common::pagination::{PageNumber, PageSize};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use service::{
    command::{PromoteListing, RecordImpression},
    domain::{listing, Listing},
    query::listings::LoadPage,
    read::listing::list,
    Command as _,
};

use crate::error::AsError as _;
use crate::{Error, Service};

/// Query string of a listings page request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    /// 1-based page number to load.
    pub page: Option<i32>,

    /// Size of the page to load.
    pub page_size: Option<i32>,

    /// Store-level sort order of the regular slice.
    pub sort: Option<list::Sort>,

    /// Free-text search query.
    pub search: Option<String>,
}

/// One loaded listings page, promoted items first.
#[derive(Debug, Serialize)]
pub struct Page {
    /// [`Listing`]s of this [`Page`], promoted ones at the head.
    pub items: Vec<Listing>,

    /// Number of promoted [`Listing`]s at the head of `items`.
    pub promoted_count: usize,

    /// Total count of regular [`Listing`]s matching the request.
    pub total_count: i32,

    /// 1-based number of this [`Page`].
    pub page: i32,

    /// Size this [`Page`] was requested with.
    pub page_size: i32,

    /// Indicator whether a following non-empty [`Page`] exists.
    pub has_next_page: bool,
}

/// Loads one combined listings page of a category.
///
/// One call is one page load: it counts a single top-slot impression when
/// promoted [`Listing`]s are present.
pub async fn list(
    Extension(service): Extension<Service>,
    Path(category): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<Page>, Error> {
    let category = super::category(&category)?;

    let ListParams {
        page,
        page_size,
        sort,
        search,
    } = params;

    let number = match page {
        Some(n) => PageNumber::new(n)
            .ok_or_else(|| Error::bad_request(&"`page` must be positive"))?,
        None => PageNumber::FIRST,
    };
    let size = match page_size {
        Some(s) => PageSize::new(s).ok_or_else(|| {
            Error::bad_request(&"`page_size` must be positive")
        })?,
        None => PageSize::DEFAULT,
    };

    let view = service
        .execute(LoadPage {
            category,
            number,
            size,
            sort: sort.unwrap_or_default(),
            search: search.filter(|s| !s.trim().is_empty()),
        })
        .await
        .map_err(|e| e.into_error())?;

    Ok(Json(Page {
        has_next_page: view.has_next_page(),
        items: view.items,
        promoted_count: view.promoted_count,
        total_count: view.total_count.into(),
        page: view.number.get(),
        page_size: view.size.get(),
    }))
}

/// Body of a promotion request.
#[derive(Debug, Deserialize)]
pub struct Promotion {
    /// Moment the promotion lasts until, as an [RFC 3339] string.
    ///
    /// [RFC 3339]: https://tools.ietf.org/html/rfc3339
    pub end_date: listing::PromotionEndDateTime,
}

/// Promotes a listing until the provided end date.
pub async fn promote(
    Extension(service): Extension<Service>,
    Path(path): super::Listing,
    Json(promotion): Json<Promotion>,
) -> Result<StatusCode, Error> {
    let category = super::category(&path.category)?;

    service
        .execute(PromoteListing {
            category,
            id: path.id,
            end_date: promotion.end_date,
        })
        .await
        .map_err(|e| e.into_error())?;

    Ok(StatusCode::NO_CONTENT)
}

/// Records one top-slot impression of a promoted listing.
pub async fn impression(
    Extension(service): Extension<Service>,
    Path(path): super::Listing,
) -> Result<StatusCode, Error> {
    let category = super::category(&path.category)?;

    service
        .execute(RecordImpression {
            category,
            id: path.id,
        })
        .await
        .map_err(|e| e.into_error())?;

    Ok(StatusCode::NO_CONTENT)
}
