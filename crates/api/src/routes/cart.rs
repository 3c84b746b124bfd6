//! Cart handlers.
//!
//! Cart lines store the unit price quoted at add time; checkout reprices
//! everything fresh, so a stale cart price never leaks into an order.

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;

use hifiy_core::CartLineId;

use crate::db::cart::CartRepository;
use crate::db::catalog::CatalogRepository;
use crate::error::{AppError, Result};
use crate::middleware::Identity;
use crate::models::ApiResponse;
use crate::models::cart::AddToCartRequest;
use crate::pricing;
use crate::state::AppState;

/// `GET /cart` - the caller's cart lines.
pub async fn show(State(state): State<AppState>, identity: Identity) -> Result<impl IntoResponse> {
    let lines = CartRepository::new(state.pool())
        .list_lines(identity.user_id)
        .await?;

    Ok(Json(ApiResponse::ok("cart", lines)))
}

/// `POST /cart` - add a product to the cart.
///
/// Re-adding the same (product, variant, size) line increments its quantity.
pub async fn add(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<AddToCartRequest>,
) -> Result<impl IntoResponse> {
    if req.quantity == 0 {
        return Err(AppError::Validation("quantity must be at least 1".into()));
    }

    let line_pricing = CatalogRepository::new(state.pool())
        .pricing_for_line(req.product_id, req.size_id)
        .await?;
    let quote = pricing::quote(&line_pricing, req.quantity, Utc::now());

    CartRepository::new(state.pool())
        .add_line(
            identity.user_id,
            req.product_id,
            req.variant_id,
            req.size_id,
            req.quantity,
            quote.unit_price,
        )
        .await?;

    Ok(Json(ApiResponse::message("added to cart")))
}

/// `DELETE /cart/{id}` - remove one cart line.
pub async fn remove(
    State(state): State<AppState>,
    identity: Identity,
    Path(line_id): Path<CartLineId>,
) -> Result<impl IntoResponse> {
    CartRepository::new(state.pool())
        .remove_line(identity.user_id, line_id)
        .await?;

    Ok(Json(ApiResponse::message("removed from cart")))
}
