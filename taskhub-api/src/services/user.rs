/// User management service
///
/// Listing, lookup, profile updates, role changes, activation, and
/// deletion. Profile updates go through the explicit `UpdateUser`
/// allow-list; role, password, and reset fields each have their own
/// operation and are unreachable from a profile update.
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use taskhub_shared::{
    auth::policy::Actor,
    models::user::{UpdateUser, User, UserRole},
    pagination::{Page, PageParams},
};

use crate::error::{ApiError, ApiResult};

/// Lists users newest-first with pagination
pub async fn find_all(pool: &PgPool, params: &PageParams) -> ApiResult<Page<User>> {
    let total = User::count(pool).await?;
    let users = User::list(pool, params.limit(), params.offset()).await?;

    Ok(Page::new(users, total, params.page(), params.limit()))
}

/// Fetches a single user
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> ApiResult<User> {
    User::find_by_id(pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Applies a partial profile update
pub async fn update(pool: &PgPool, id: Uuid, data: UpdateUser) -> ApiResult<User> {
    User::update_profile(pool, id, data)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Changes a user's role
///
/// Re-verifies at call time that the actor row still exists and is an
/// admin; a token minted before a demotion must not change roles.
pub async fn update_role(
    pool: &PgPool,
    actor: &Actor,
    id: Uuid,
    role: UserRole,
) -> ApiResult<User> {
    let acting_user = User::find_by_id(pool, actor.id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("Only admins can change roles".to_string()))?;

    if acting_user.role != UserRole::Admin {
        return Err(ApiError::Forbidden(
            "Only admins can change roles".to_string(),
        ));
    }

    let user = User::update_role(pool, id, role)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %id, role = ?role, "User role changed");
    Ok(user)
}

/// Flips the soft-disable flag on an account
pub async fn toggle_active_status(pool: &PgPool, id: Uuid, is_active: bool) -> ApiResult<User> {
    let user = User::set_active(pool, id, is_active)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %id, is_active, "User active status changed");
    Ok(user)
}

/// Hard-deletes a user; owned projects and memberships cascade
pub async fn delete(pool: &PgPool, id: Uuid) -> ApiResult<()> {
    if !User::delete(pool, id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    info!(user_id = %id, "User deleted");
    Ok(())
}
