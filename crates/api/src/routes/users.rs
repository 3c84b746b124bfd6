//! Profile handlers.

use axum::{Json, extract::State, response::IntoResponse};

use crate::cache::keys;
use crate::db::users::UserRepository;
use crate::error::Result;
use crate::middleware::Identity;
use crate::models::ApiResponse;
use crate::models::user::UpdateProfileRequest;
use crate::state::AppState;

/// `PUT /user/profile` - update the caller's contact details.
///
/// The admin user listing shows these fields, so its cached pages are
/// invalidated here.
pub async fn update_profile(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse> {
    UserRepository::new(state.pool())
        .update_profile(identity.user_id, &req)
        .await?;

    state.cache().invalidate_prefix(keys::ADMIN_USERS);

    Ok(Json(ApiResponse::message("profile updated")))
}
