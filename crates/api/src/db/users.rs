//! Profile reads and the admin user listing.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use hifiy_core::UserId;

use super::RepositoryError;
use crate::models::user::{Profile, UpdateProfileRequest, UserPage, UserSummary};

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a user's stored contact details.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn get_profile(&self, user_id: UserId) -> Result<Profile, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct ProfileRow {
            id: i64,
            username: Option<String>,
            phone: Option<String>,
            address: Option<String>,
        }

        let row: Option<ProfileRow> =
            sqlx::query_as("SELECT id, username, phone, address FROM profile WHERE id = $1")
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;
        let row = row.ok_or(RepositoryError::NotFound)?;

        Ok(Profile {
            id: UserId::new(row.id),
            name: row.username,
            phone: row.phone,
            address: row.address,
        })
    }

    /// Update the provided profile fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn update_profile(
        &self,
        user_id: UserId,
        req: &UpdateProfileRequest,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE profile
            SET username = COALESCE($1, username),
                phone = COALESCE($2, phone),
                address = COALESCE($3, address),
                updated_at = NOW()
            WHERE id = $4
            ",
        )
        .bind(&req.username)
        .bind(&req.phone)
        .bind(&req.address)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Paginated user listing for the admin view.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list(&self, page: u32, limit: u32) -> Result<UserPage, RepositoryError> {
        #[derive(sqlx::FromRow)]
        struct UserRow {
            id: i64,
            username: String,
            email: String,
            role: String,
            created_at: DateTime<Utc>,
        }

        let rows: Vec<UserRow> = sqlx::query_as(
            r"
            SELECT id, username, email, role, created_at
            FROM profile
            ORDER BY id
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(i64::from(limit))
        .bind(i64::from(page - 1) * i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM profile")
            .fetch_one(self.pool)
            .await?;

        Ok(UserPage {
            users: rows
                .into_iter()
                .map(|r| UserSummary {
                    id: UserId::new(r.id),
                    username: r.username,
                    email: r.email,
                    role: r.role,
                    created_at: r.created_at,
                })
                .collect(),
            total,
        })
    }
}
