//! Database access for the Hifiy `PostgreSQL` database.
//!
//! One repository struct per concern, each borrowing the shared pool:
//!
//! - [`catalog`] - priced product reads (listings, detail, favorites)
//! - [`cart`] - per-user cart and its lines
//! - [`orders`] - order insert, history, detail, status updates
//! - [`products`] - admin product writes
//! - [`users`] - profile reads and the admin user listing
//!
//! Queries are runtime-checked (`sqlx::query`/`query_as`) with `FromRow`
//! structs; dynamic filters go through `sqlx::QueryBuilder`, which tracks
//! placeholder numbering itself. Raw string concatenation of user input is
//! not allowed in this module.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p hifiy-cli -- migrate
//! ```

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub mod cart;
pub mod catalog;
pub mod orders;
pub mod products;
pub mod users;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate invoice).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
