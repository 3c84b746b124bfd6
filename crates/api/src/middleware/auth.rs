//! Authentication extractors.
//!
//! The edge gateway verifies the caller's token and forwards the verified
//! claims as plain headers. These extractors read them back; they never see
//! or validate the token itself.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use hifiy_core::UserId;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Role names as forwarded by the gateway.
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const USER: &str = "user";
}

/// The authenticated caller.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(identity: Identity) -> impl IntoResponse {
///     format!("user {}", identity.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: UserId,
    pub role: String,
}

impl Identity {
    /// Whether the caller carries the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == roles::ADMIN
    }
}

/// Error returned when authentication headers are missing or malformed.
pub enum AuthRejection {
    /// No verified identity on the request.
    Unauthorized,
    /// Identity present but lacking the required role.
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "authentication required"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "admin role required"),
        };

        (
            status,
            axum::Json(json!({ "success": false, "message": message })),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from_parts(parts).ok_or(AuthRejection::Unauthorized)
    }
}

/// Extractor that additionally requires the admin role.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_handler(RequireAdmin(identity): RequireAdmin) -> impl IntoResponse {
///     format!("admin {}", identity.user_id)
/// }
/// ```
pub struct RequireAdmin(pub Identity);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = identity_from_parts(parts).ok_or(AuthRejection::Unauthorized)?;
        if !identity.is_admin() {
            return Err(AuthRejection::Forbidden);
        }
        Ok(Self(identity))
    }
}

fn identity_from_parts(parts: &Parts) -> Option<Identity> {
    let user_id = parts
        .headers
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()?
        .parse::<i64>()
        .ok()?;

    let role = parts
        .headers
        .get(USER_ROLE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(roles::USER)
        .to_owned();

    Some(Identity {
        user_id: UserId::from(user_id),
        role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with(headers: &[(&str, &str)]) -> Parts {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_identity_from_headers() {
        let parts = parts_with(&[(USER_ID_HEADER, "42"), (USER_ROLE_HEADER, "admin")]);
        let identity = identity_from_parts(&parts).unwrap();
        assert_eq!(identity.user_id, UserId::from(42));
        assert!(identity.is_admin());
    }

    #[test]
    fn test_role_defaults_to_user() {
        let parts = parts_with(&[(USER_ID_HEADER, "7")]);
        let identity = identity_from_parts(&parts).unwrap();
        assert_eq!(identity.role, roles::USER);
        assert!(!identity.is_admin());
    }

    #[test]
    fn test_missing_or_malformed_user_id() {
        assert!(identity_from_parts(&parts_with(&[])).is_none());
        assert!(identity_from_parts(&parts_with(&[(USER_ID_HEADER, "abc")])).is_none());
    }
}
