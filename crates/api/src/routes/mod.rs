//! HTTP route handlers for the API.
//!
//! # Route Structure
//!
//! The `/health` and `/health/ready` endpoints are registered directly on
//! the server router in `main.rs`, outside the application routes below.
//!
//! ```text
//! # Catalog (public)
//! GET    /products                   - Product listing (cached when unfiltered)
//! GET    /products/{id}              - Product detail
//!
//! # Cart (authenticated)
//! GET    /cart                       - Cart contents
//! POST   /cart                       - Add a product to the cart
//! DELETE /cart/{id}                  - Remove a cart line
//!
//! # Orders (authenticated)
//! POST   /orders                     - Checkout the cart
//! GET    /user/history               - Order history
//! GET    /user/order/{id}            - Order detail
//!
//! # Favorites (authenticated)
//! GET    /favorites                  - Favorite products (cached per user)
//! POST   /favorites/{product_id}     - Add a favorite
//! DELETE /favorites/{product_id}     - Remove a favorite
//!
//! # Profile (authenticated)
//! PUT    /user/profile               - Update contact details
//!
//! # Admin (admin role)
//! GET    /admin/orders               - All orders, paginated
//! PUT    /admin/orders/{id}/status   - Order status transition
//! PUT    /admin/orders/{id}/shipping - Reassign shipping
//! POST   /admin/products             - Create product
//! PUT    /admin/products/{id}        - Update product
//! DELETE /admin/products/{id}        - Delete product
//! GET    /admin/users                - User listing (cached)
//! ```

pub mod admin;
pub mod cart;
pub mod favorites;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

/// Create the public catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).post(cart::add))
        .route("/{id}", delete(cart::remove))
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::index))
        .route(
            "/{product_id}",
            post(favorites::add).delete(favorites::remove),
        )
}

/// Create the user-facing order and profile routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/history", get(orders::history))
        .route("/order/{id}", get(orders::show))
        .route("/profile", put(users::update_profile))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", get(admin::list_orders))
        .route("/orders/{id}/status", put(admin::update_order_status))
        .route("/orders/{id}/shipping", put(admin::update_order_shipping))
        .route("/products", post(admin::create_product))
        .route(
            "/products/{id}",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/users", get(admin::list_users))
}

/// Create the complete application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/favorites", favorite_routes())
        .nest("/user", user_routes())
        .nest("/admin", admin_routes())
        .route("/orders", post(orders::checkout))
}
