/// Authentication service
///
/// Registration, login, token refresh, and the password lifecycle
/// (forgot/reset/update). Password-reset flows never reveal whether an
/// email is registered, and the raw reset token exists only in the email;
/// the database holds its SHA-256 digest.
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use taskhub_shared::{
    auth::{
        jwt::{self, Claims, TokenType},
        password,
        reset::{digest_token, generate_reset_token},
    },
    email::{password_reset_email, Mailer},
    models::user::{CreateUser, User},
};

use crate::error::{ApiError, ApiResult};

/// Input for registering a new account
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone, serde::Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

fn issue_tokens(user: &User, secret: &str) -> ApiResult<TokenPair> {
    let access = Claims::new(user.id, user.role, TokenType::Access);
    let refresh = Claims::new(user.id, user.role, TokenType::Refresh);

    Ok(TokenPair {
        access_token: jwt::create_token(&access, secret)?,
        refresh_token: jwt::create_token(&refresh, secret)?,
    })
}

/// Registers a new account with the default `user` role
///
/// # Errors
///
/// `Conflict` when the email is already registered.
pub async fn register(
    pool: &PgPool,
    secret: &str,
    input: RegisterInput,
) -> ApiResult<(User, TokenPair)> {
    if User::find_by_email(pool, &input.email).await?.is_some() {
        return Err(ApiError::Conflict("Email already exists".to_string()));
    }

    let password_hash = password::hash_password(&input.password)?;

    // A concurrent insert still trips the unique constraint, which the
    // sqlx error conversion maps to the same Conflict.
    let user = User::create(
        pool,
        CreateUser {
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            password_hash,
        },
    )
    .await?;

    info!(user_id = %user.id, "User registered");

    let tokens = issue_tokens(&user, secret)?;
    Ok((user, tokens))
}

/// Verifies credentials and issues tokens
///
/// # Errors
///
/// `Unauthenticated` for an unknown email or wrong password (same
/// message for both), `Forbidden` for deactivated accounts.
pub async fn login(
    pool: &PgPool,
    secret: &str,
    email: &str,
    plain_password: &str,
) -> ApiResult<(User, TokenPair)> {
    let user = User::find_by_email(pool, email)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("Invalid email or password".to_string()))?;

    if !password::verify_password(plain_password, &user.password_hash)? {
        return Err(ApiError::Unauthenticated(
            "Invalid email or password".to_string(),
        ));
    }

    if !user.is_active {
        return Err(ApiError::Forbidden("User account is inactive".to_string()));
    }

    let tokens = issue_tokens(&user, secret)?;
    Ok((user, tokens))
}

/// Exchanges a refresh token for a new access token
pub fn refresh(refresh_token: &str, secret: &str) -> ApiResult<String> {
    Ok(jwt::refresh_access_token(refresh_token, secret)?)
}

/// Starts the password-reset flow
///
/// Always succeeds from the caller's perspective, whether or not the
/// email is registered. When it is, a reset token is stored (digest
/// only) and the email is dispatched in the background.
pub async fn forgot_password(
    pool: &PgPool,
    mailer: &Mailer,
    reset_url_base: &str,
    email: &str,
) -> ApiResult<()> {
    let Some(user) = User::find_by_email(pool, email).await? else {
        info!("Password reset requested for unknown email");
        return Ok(());
    };

    let token = generate_reset_token();
    User::set_reset_token(pool, user.id, &token.digest, token.expires).await?;

    let message = password_reset_email(&user.email, reset_url_base, &token.raw);
    let mailer = mailer.clone();
    tokio::spawn(async move {
        mailer.send(message).await;
    });

    info!(user_id = %user.id, "Password reset token issued");
    Ok(())
}

/// Redeems a reset token and sets a new password
///
/// # Errors
///
/// `Validation` when the token is unknown or expired.
pub async fn reset_password(pool: &PgPool, raw_token: &str, new_password: &str) -> ApiResult<User> {
    let digest = digest_token(raw_token);

    let user = User::find_by_reset_digest(pool, &digest)
        .await?
        .ok_or_else(|| ApiError::Validation("Invalid or expired reset token".to_string()))?;

    let password_hash = password::hash_password(new_password)?;
    User::complete_password_reset(pool, user.id, &password_hash).await?;

    info!(user_id = %user.id, "Password reset completed");

    User::find_by_id(pool, user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

/// Changes a logged-in user's password after verifying the current one
pub async fn update_password(
    pool: &PgPool,
    user_id: Uuid,
    current_password: &str,
    new_password: &str,
) -> ApiResult<()> {
    let user = User::find_by_id(pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !password::verify_password(current_password, &user.password_hash)? {
        return Err(ApiError::Unauthenticated(
            "Current password is incorrect".to_string(),
        ));
    }

    let password_hash = password::hash_password(new_password)?;
    User::set_password_hash(pool, user_id, &password_hash).await?;

    info!(user_id = %user_id, "Password updated");
    Ok(())
}
