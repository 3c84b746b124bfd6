//! Profile and user listing models.

use chrono::{DateTime, Utc};
use hifiy_core::UserId;
use serde::{Deserialize, Serialize};

/// A user's stored contact details, used as the checkout fallback.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: UserId,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// One user in the admin listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// A page of users plus the total count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPage {
    pub users: Vec<UserSummary>,
    pub total: i64,
}

/// Payload of `PUT /user/profile`. Absent fields are left unchanged.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}
