//! Administrative handlers: order updates, product CRUD, user listing.
//!
//! Every handler here takes [`RequireAdmin`]; the role check happens in the
//! extractor, not the handler body.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use hifiy_core::{OrderId, ProductId};

use crate::cache::keys;
use crate::db::orders::OrderRepository;
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::order::{UpdateShippingRequest, UpdateStatusRequest};
use crate::models::product::{CreateProductRequest, UpdateProductRequest};
use crate::models::{ApiResponse, PageQuery, Pagination};
use crate::services::OrderService;
use crate::state::AppState;

/// `GET /admin/orders` - paginated listing of every order, newest first.
pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let (orders, total) = OrderRepository::new(state.pool())
        .list_all(query.page(), query.limit())
        .await?;

    let pagination = Pagination::build(
        &state.config().base_url,
        "/admin/orders",
        query.page(),
        query.limit(),
        total,
    );

    Ok(Json(ApiResponse::paginated("list all order", orders, pagination)))
}

/// `PUT /admin/orders/{id}/status` - move an order along its lifecycle.
pub async fn update_order_status(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(order_id): Path<OrderId>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse> {
    OrderService::new(state.pool())
        .update_status(order_id, req.status)
        .await?;

    Ok(Json(ApiResponse::message("order status updated")))
}

/// `PUT /admin/orders/{id}/shipping` - reassign an order's shipping option.
pub async fn update_order_shipping(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(order_id): Path<OrderId>,
    Json(req): Json<UpdateShippingRequest>,
) -> Result<impl IntoResponse> {
    OrderService::new(state.pool())
        .update_shipping(order_id, req.shipping_id)
        .await?;

    Ok(Json(ApiResponse::message("order shipping updated")))
}

/// `POST /admin/products` - create a product.
pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(req): Json<CreateProductRequest>,
) -> Result<impl IntoResponse> {
    let product_id = ProductRepository::new(state.pool()).create(&req).await?;

    state.cache().invalidate_prefix(keys::PRODUCTS);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("product created", product_id)),
    ))
}

/// `PUT /admin/products/{id}` - partial product update.
pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(product_id): Path<ProductId>,
    Json(req): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse> {
    ProductRepository::new(state.pool())
        .update(product_id, &req)
        .await?;

    state.cache().invalidate_prefix(keys::PRODUCTS);

    Ok(Json(ApiResponse::message("product updated")))
}

/// `DELETE /admin/products/{id}` - delete a product.
pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(product_id): Path<ProductId>,
) -> Result<impl IntoResponse> {
    ProductRepository::new(state.pool()).delete(product_id).await?;

    state.cache().invalidate_prefix(keys::PRODUCTS);

    Ok(Json(ApiResponse::message("product deleted")))
}

/// `GET /admin/users` - paginated user listing, cached.
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<PageQuery>,
) -> Result<impl IntoResponse> {
    let key = keys::admin_users(query.page(), query.limit());

    let (listing, source) = state
        .cache()
        .get_or_compute(&key, state.config().cache.users_ttl, || async {
            UserRepository::new(state.pool())
                .list(query.page(), query.limit())
                .await
        })
        .await?;

    let pagination = Pagination::build(
        &state.config().base_url,
        "/admin/users",
        query.page(),
        query.limit(),
        listing.total,
    );

    Ok(Json(ApiResponse::paginated(
        source.message(),
        listing.users,
        pagination,
    )))
}
