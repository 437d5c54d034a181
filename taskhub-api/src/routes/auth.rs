/// Authentication endpoints
///
/// Registration, login, token refresh, and the password lifecycle. The
/// forgot-password response is identical whether or not the email is
/// registered, so the endpoint cannot be used to probe for accounts.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use validator::Validate;

use taskhub_shared::{auth::policy::Actor, models::user::User};

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{success, SuccessResponse},
    services,
};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100, message = "First name must be 1-100 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name must be 1-100 characters"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub new_password: String,
}

/// User plus issued tokens, returned by register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: User,
    pub access_token: String,
    pub refresh_token: String,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<SuccessResponse<AuthResponse>>)> {
    payload.validate().map_err(ApiError::from_validation_errors)?;

    let (user, tokens) = services::auth::register(
        &state.db,
        state.jwt_secret(),
        services::auth::RegisterInput {
            first_name: payload.first_name,
            last_name: payload.last_name,
            email: payload.email,
            password: payload.password,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        success(AuthResponse {
            user,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<SuccessResponse<AuthResponse>>> {
    payload.validate().map_err(ApiError::from_validation_errors)?;

    let (user, tokens) =
        services::auth::login(&state.db, state.jwt_secret(), &payload.email, &payload.password)
            .await?;

    Ok(success(AuthResponse {
        user,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

/// POST /api/auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<SuccessResponse<serde_json::Value>>> {
    let access_token = services::auth::refresh(&payload.refresh_token, state.jwt_secret())?;

    Ok(success(json!({ "access_token": access_token })))
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<Json<SuccessResponse<serde_json::Value>>> {
    payload.validate().map_err(ApiError::from_validation_errors)?;

    services::auth::forgot_password(
        &state.db,
        &state.mailer,
        &state.config.reset_url_base,
        &payload.email,
    )
    .await?;

    Ok(success(json!({
        "message": "If that email is registered, a reset link has been sent"
    })))
}

/// POST /api/auth/reset-password/:token
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> ApiResult<Json<SuccessResponse<User>>> {
    payload.validate().map_err(ApiError::from_validation_errors)?;

    let user = services::auth::reset_password(&state.db, &token, &payload.password).await?;

    Ok(success(user))
}

/// GET /api/auth/profile
pub async fn profile(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
) -> ApiResult<Json<SuccessResponse<User>>> {
    let user = services::user::find_by_id(&state.db, actor.id).await?;
    Ok(success(user))
}

/// PATCH /api/auth/update-password
pub async fn update_password(
    State(state): State<AppState>,
    Extension(actor): Extension<Actor>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> ApiResult<Json<SuccessResponse<serde_json::Value>>> {
    payload.validate().map_err(ApiError::from_validation_errors)?;

    services::auth::update_password(
        &state.db,
        actor.id,
        &payload.current_password,
        &payload.new_password,
    )
    .await?;

    Ok(success(json!({ "message": "Password updated" })))
}
