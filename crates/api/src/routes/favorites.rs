//! Favorites handlers.
//!
//! The listing is cached per user and page; toggling a favorite invalidates
//! only that user's entries.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;

use hifiy_core::ProductId;

use crate::cache::keys;
use crate::db::catalog::CatalogRepository;
use crate::error::Result;
use crate::middleware::Identity;
use crate::models::{ApiResponse, PageQuery, Pagination};
use crate::state::AppState;

/// `GET /favorites` - the caller's favorite products.
pub async fn index(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let now = Utc::now();
    let key = keys::favorites(identity.user_id.as_i64(), query.page(), query.limit());

    let (listing, source) = state
        .cache()
        .get_or_compute(&key, state.config().cache.favorites_ttl, || async {
            CatalogRepository::new(state.pool())
                .list_favorites(identity.user_id, query.page(), query.limit(), now)
                .await
        })
        .await?;

    let pagination = Pagination::build(
        &state.config().base_url,
        "/favorites",
        query.page(),
        query.limit(),
        listing.total,
    );

    Ok(Json(ApiResponse::paginated(
        source.message(),
        listing.products,
        pagination,
    )))
}

/// `POST /favorites/{product_id}` - mark a product as favorite.
///
/// Idempotent; re-adding an existing favorite succeeds.
pub async fn add(
    State(state): State<AppState>,
    identity: Identity,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    CatalogRepository::new(state.pool())
        .add_favorite(identity.user_id, product_id)
        .await?;

    state
        .cache()
        .invalidate_prefix(&keys::favorites_prefix(identity.user_id.as_i64()));

    Ok(Json(ApiResponse::message("added to favorites")))
}

/// `DELETE /favorites/{product_id}` - unmark a favorite.
pub async fn remove(
    State(state): State<AppState>,
    identity: Identity,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    CatalogRepository::new(state.pool())
        .remove_favorite(identity.user_id, product_id)
        .await?;

    state
        .cache()
        .invalidate_prefix(&keys::favorites_prefix(identity.user_id.as_i64()));

    Ok(Json(ApiResponse::message("removed from favorites")))
}
