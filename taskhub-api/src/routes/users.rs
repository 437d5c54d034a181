/// User management endpoints
///
/// Listing, role changes, activation, and deletion are admin-gated here
/// at the HTTP layer; profile updates additionally allow the user acting
/// on their own account.
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use taskhub_shared::{
    auth::policy::Actor,
    models::user::{UpdateUser, User, UserRole},
    pagination::{Page, PageParams},
};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{double_option, success, SuccessResponse},
    services,
};

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    /// Absent = untouched, `null` = cleared, string = replaced
    #[serde(default, deserialize_with = "double_option")]
    pub profile_image: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub role: UserRole,
}

#[derive(Debug, Deserialize)]
pub struct ToggleActiveRequest {
    pub is_active: bool,
}

fn require_admin(actor: &Actor) -> ApiResult<()> {
    if !actor.is_admin() {
        return Err(ApiError::Forbidden(
            "Admin access required".to_string(),
        ));
    }
    Ok(())
}

/// GET /api/users — admin only
pub async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<SuccessResponse<Page<User>>>> {
    require_admin(&actor)?;

    let page = services::user::find_all(&state.db, &params).await?;
    Ok(success(page))
}

/// GET /api/users/:id
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<User>>> {
    let user = services::user::find_by_id(&state.db, id).await?;
    Ok(success(user))
}

/// PATCH /api/users/:id — self or admin
pub async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<SuccessResponse<User>>> {
    if actor.id != id && !actor.is_admin() {
        return Err(ApiError::Forbidden(
            "You can only update your own profile".to_string(),
        ));
    }

    payload.validate().map_err(ApiError::from_validation_errors)?;

    let user = services::user::update(
        &state.db,
        id,
        UpdateUser {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            profile_image: payload.profile_image,
        },
    )
    .await?;

    Ok(success(user))
}

/// PATCH /api/users/:id/role — admin only
pub async fn update_role(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<SuccessResponse<User>>> {
    // The service re-verifies the actor's live role
    let user = services::user::update_role(&state.db, &actor, id, payload.role).await?;
    Ok(success(user))
}

/// PATCH /api/users/:id/active — admin only
pub async fn toggle_active(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ToggleActiveRequest>,
) -> ApiResult<Json<SuccessResponse<User>>> {
    require_admin(&actor)?;

    let user = services::user::toggle_active_status(&state.db, id, payload.is_active).await?;
    Ok(success(user))
}

/// DELETE /api/users/:id — admin only
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<SuccessResponse<serde_json::Value>>> {
    require_admin(&actor)?;

    services::user::delete(&state.db, id).await?;
    Ok(success(json!({ "message": "User deleted" })))
}
