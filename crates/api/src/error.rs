//! Unified error handling for route handlers.
//!
//! Provides a unified `AppError` type mapping every layer's failures onto an
//! HTTP status and the standard response envelope. All route handlers return
//! `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{CheckoutError, OrderUpdateError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input shape or missing required field.
    #[error("validation error: {0}")]
    Validation(String),

    /// Checkout precondition or step failure.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),

    /// Administrative order update failure.
    #[error(transparent)]
    OrderUpdate(#[from] OrderUpdateError),

    /// Database operation failed.
    #[error("database error: {0}")]
    Database(#[from] RepositoryError),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required role.
    #[error("forbidden")]
    Forbidden,

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Checkout(err) => match err {
                CheckoutError::MissingReference
                | CheckoutError::EmptyCart
                | CheckoutError::IncompleteProfile => StatusCode::BAD_REQUEST,
                CheckoutError::Repository { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::OrderUpdate(err) => match err {
                OrderUpdateError::NotFound => StatusCode::NOT_FOUND,
                OrderUpdateError::InvalidTransition { .. } => StatusCode::CONFLICT,
                OrderUpdateError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Database(err) => match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message exposed to clients. Infrastructure details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "internal server error".to_owned(),
            Self::Checkout(CheckoutError::Repository { step, .. }) => {
                format!("checkout failed: could not {step}")
            }
            Self::OrderUpdate(OrderUpdateError::Repository(_)) => {
                "internal server error".to_owned()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = ?self, "request error");
        }

        let body = Json(json!({
            "success": false,
            "message": self.public_message(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use hifiy_core::OrderStatus;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("bad".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::NotFound("order 9".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("no identity".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(get_status(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            get_status(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_checkout_preconditions_are_client_errors() {
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::EmptyCart)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::IncompleteProfile)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Checkout(CheckoutError::MissingReference)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_order_update_mapping() {
        assert_eq!(
            get_status(AppError::OrderUpdate(OrderUpdateError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::OrderUpdate(OrderUpdateError::InvalidTransition {
                from: OrderStatus::Done,
                to: OrderStatus::Shipped,
            })),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_details_are_not_exposed() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "secret table detail".into(),
        ));
        assert_eq!(err.public_message(), "internal server error");
    }
}
