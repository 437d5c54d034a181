/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     first_name VARCHAR(100) NOT NULL,
///     last_name VARCHAR(100) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     profile_image VARCHAR(512),
///     password_reset_token VARCHAR(64),
///     password_reset_expires TIMESTAMPTZ,
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The password hash and reset-token fields never serialize into API
/// responses; they exist only for the auth flows.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

/// Role attached to a user account
///
/// Admins bypass ownership and membership checks everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

/// User account row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    pub first_name: String,

    pub last_name: String,

    /// Email address, unique across all users
    pub email: String,

    /// Argon2id password hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,

    /// Optional profile image path (resolved by upstream file handling)
    pub profile_image: Option<String>,

    /// SHA-256 hex digest of the active password-reset token, never serialized
    #[serde(skip_serializing)]
    pub password_reset_token: Option<String>,

    /// Expiry of the active password-reset token, never serialized
    #[serde(skip_serializing)]
    pub password_reset_expires: Option<DateTime<Utc>>,

    /// Soft-disable flag; inactive users cannot authenticate
    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,

    /// Argon2id hash, not the plaintext password
    pub password_hash: String,
}

/// Input for updating a user's profile
///
/// Only the fields listed here are reachable through a profile update;
/// role, password, and reset fields have dedicated operations. `None`
/// leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub profile_image: Option<Option<String>>,
}

impl UpdateUser {
    /// True when no field is set, i.e. the update would be a no-op
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.profile_image.is_none()
    }
}

/// Minimal user projection embedded in project/task responses
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub profile_image: Option<String>,
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, password_hash, role, \
     profile_image, password_reset_token, password_reset_expires, is_active, \
     created_at, updated_at";

impl User {
    /// Creates a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique-constraint violation if the email is taken.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        data: CreateUser,
    ) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, last_name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.email)
        .bind(data.password_hash)
        .fetch_one(executor)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    pub async fn find_by_id(
        executor: impl PgExecutor<'_>,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Finds a user by email address
    pub async fn find_by_email(
        executor: impl PgExecutor<'_>,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(executor)
        .await
    }

    /// Filters a candidate id list down to ids that exist
    ///
    /// Used when resolving requested member ids against real users.
    pub async fn find_existing_ids(
        executor: impl PgExecutor<'_>,
        ids: &[Uuid],
    ) -> Result<Vec<Uuid>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    /// Applies a partial profile update
    ///
    /// Builds the UPDATE dynamically so absent fields are left untouched.
    /// Returns the updated row, or `None` if the user doesn't exist.
    pub async fn update_profile(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        if data.is_empty() {
            return Self::find_by_id(executor, id).await;
        }

        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.first_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", first_name = ${}", bind_count));
        }
        if data.last_name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", last_name = ${}", bind_count));
        }
        if data.email.is_some() {
            bind_count += 1;
            query.push_str(&format!(", email = ${}", bind_count));
        }
        if data.profile_image.is_some() {
            bind_count += 1;
            query.push_str(&format!(", profile_image = ${}", bind_count));
        }

        query.push_str(&format!(" WHERE id = $1 RETURNING {USER_COLUMNS}"));

        let mut q = sqlx::query_as::<_, User>(&query).bind(id);

        if let Some(first_name) = data.first_name {
            q = q.bind(first_name);
        }
        if let Some(last_name) = data.last_name {
            q = q.bind(last_name);
        }
        if let Some(email) = data.email {
            q = q.bind(email);
        }
        if let Some(profile_image) = data.profile_image {
            q = q.bind(profile_image);
        }

        q.fetch_optional(executor).await
    }

    /// Changes a user's role
    pub async fn update_role(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        role: UserRole,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(executor)
        .await
    }

    /// Flips the soft-disable flag
    pub async fn set_active(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        is_active: bool,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET is_active = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_active)
        .fetch_optional(executor)
        .await
    }

    /// Replaces the password hash
    pub async fn set_password_hash(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(executor)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Stores a password-reset token digest with its expiry
    pub async fn set_reset_token(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        digest: &str,
        expires: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token = $2, password_reset_expires = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(digest)
        .bind(expires)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Finds the user holding an unexpired reset-token digest
    pub async fn find_by_reset_digest(
        executor: impl PgExecutor<'_>,
        digest: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            WHERE password_reset_token = $1 AND password_reset_expires > NOW()
            "#
        ))
        .bind(digest)
        .fetch_optional(executor)
        .await
    }

    /// Sets a new password and clears the reset-token fields in one statement
    pub async fn complete_password_reset(
        executor: impl PgExecutor<'_>,
        id: Uuid,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_token = NULL,
                password_reset_expires = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Hard-deletes a user; owned projects and memberships cascade
    pub async fn delete(executor: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists users newest-first with pagination
    pub async fn list(
        executor: impl PgExecutor<'_>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS} FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
    }

    /// Counts all users
    pub async fn count(executor: impl PgExecutor<'_>) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(executor)
            .await?;

        Ok(count)
    }

    /// Minimal projection for embedding in other responses
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            profile_image: self.profile_image.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_user_empty() {
        let update = UpdateUser::default();
        assert!(update.is_empty());

        let update = UpdateUser {
            first_name: Some("Ada".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: UserRole::User,
            profile_image: None,
            password_reset_token: Some("digest".to_string()),
            password_reset_expires: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password_reset_token").is_none());
        assert_eq!(json["email"], "ada@example.com");
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(
            serde_json::to_value(UserRole::Admin).unwrap(),
            serde_json::json!("admin")
        );
        assert_eq!(
            serde_json::to_value(UserRole::User).unwrap(),
            serde_json::json!("user")
        );
    }

    // Integration tests for database operations live in taskhub-api/tests/.
}
