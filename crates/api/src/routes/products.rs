//! Public product listing and detail handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use chrono::Utc;

use hifiy_core::ProductId;

use crate::cache::CacheSource;
use crate::db::catalog::CatalogRepository;
use crate::error::Result;
use crate::models::product::ProductListQuery;
use crate::models::{ApiResponse, Pagination};
use crate::state::AppState;

/// `GET /products` - paginated product listing.
///
/// Plain page/limit requests are served through the response cache; any
/// search, sort or filter parameter bypasses it.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
) -> Result<impl IntoResponse> {
    let now = Utc::now();

    let (listing, source) = if let Some(key) = query.cache_key() {
        state
            .cache()
            .get_or_compute(&key, state.config().cache.products_ttl, || async {
                CatalogRepository::new(state.pool())
                    .list_products(&query, now)
                    .await
            })
            .await?
    } else {
        let listing = CatalogRepository::new(state.pool())
            .list_products(&query, now)
            .await?;
        (listing, CacheSource::Origin)
    };

    let pagination = Pagination::build(
        &state.config().base_url,
        "/products",
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

/// `GET /products/{id}` - full product record.
pub async fn show(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    let detail = CatalogRepository::new(state.pool())
        .product_detail(product_id)
        .await?;

    Ok(Json(ApiResponse::ok("product detail", detail)))
}
