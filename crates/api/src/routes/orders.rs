//! Checkout and order history handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use hifiy_core::OrderId;

use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::Identity;
use crate::models::order::{CheckoutRequest, HistoryQuery};
use crate::models::{ApiResponse, Pagination};
use crate::services::CheckoutService;
use crate::state::AppState;

/// `POST /orders` - turn the caller's cart into an order.
pub async fn checkout(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    let receipt = CheckoutService::new(state.pool(), state.cache())
        .checkout(identity.user_id, &req)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("order created", receipt)),
    ))
}

/// `GET /user/history` - the caller's orders.
///
/// Without a `month` parameter this shows the month of the caller's most
/// recent order, not the current calendar month.
pub async fn history(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<HistoryQuery>,
) -> Result<impl IntoResponse> {
    if let Some(month) = query.month {
        if !(1..=12).contains(&month) {
            return Err(AppError::Validation(format!("invalid month: {month}")));
        }
    }

    let (entries, total) = OrderRepository::new(state.pool())
        .history(identity.user_id, &query)
        .await?;

    let pagination = Pagination::build(
        &state.config().base_url,
        "/user/history",
        query.page(),
        query.limit(),
        total,
    );

    Ok(Json(ApiResponse::paginated(
        "order history",
        entries,
        pagination,
    )))
}

/// `GET /user/order/{id}` - one of the caller's orders, with frozen lines.
pub async fn show(
    State(state): State<AppState>,
    identity: Identity,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse> {
    let detail = OrderRepository::new(state.pool())
        .detail(order_id, Some(identity.user_id))
        .await?;

    Ok(Json(ApiResponse::ok("order detail", detail)))
}
