/// Application state and router builder
///
/// # Router layout
///
/// ```text
/// /
/// ├── /health                        # Health check (public)
/// └── /api/
///     ├── /auth/                     # Authentication
///     │   ├── POST  /register
///     │   ├── POST  /login
///     │   ├── POST  /refresh
///     │   ├── POST  /forgot-password
///     │   ├── POST  /reset-password/:token
///     │   ├── GET   /profile              (authenticated)
///     │   └── PATCH /update-password      (authenticated)
///     ├── /users/                    # User management (authenticated)
///     ├── /projects/                 # Projects + history (authenticated)
///     └── /tasks/                    # Tasks + history (authenticated)
/// ```
///
/// The authentication layer validates the Bearer token, re-loads the user
/// row (so role changes and deactivation take effect immediately), and
/// injects an `Actor` into request extensions.
use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskhub_shared::{
    auth::{jwt, policy::Actor},
    email::Mailer,
    models::user::User,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; `Arc` keeps the
/// clones cheap.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound mail client (possibly disabled)
    pub mailer: Mailer,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config, mailer: Mailer) -> Self {
        Self {
            db,
            config: Arc::new(config),
            mailer,
        }
    }

    /// JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Public auth endpoints
    let auth_public = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route("/reset-password/:token", post(routes::auth::reset_password));

    // Auth endpoints that require a logged-in user
    let auth_protected = Router::new()
        .route("/profile", get(routes::auth::profile))
        .route("/update-password", patch(routes::auth::update_password))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let user_routes = Router::new()
        .route("/", get(routes::users::list_users))
        .route("/:id", get(routes::users::get_user))
        .route("/:id", patch(routes::users::update_user))
        .route("/:id", delete(routes::users::delete_user))
        .route("/:id/role", patch(routes::users::update_role))
        .route("/:id/active", patch(routes::users::toggle_active))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let project_routes = Router::new()
        .route("/", post(routes::projects::create_project))
        .route("/", get(routes::projects::list_projects))
        .route("/:id", get(routes::projects::get_project))
        .route("/:id", patch(routes::projects::update_project))
        .route("/:id", delete(routes::projects::delete_project))
        .route("/:id/status", patch(routes::projects::update_status))
        .route("/:id/history", get(routes::projects::get_history))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let task_routes = Router::new()
        .route("/", post(routes::tasks::create_task))
        .route("/", get(routes::tasks::list_tasks))
        .route("/:id", get(routes::tasks::get_task))
        .route("/:id", patch(routes::tasks::update_task))
        .route("/:id", delete(routes::tasks::delete_task))
        .route("/:id/status", patch(routes::tasks::update_status))
        .route("/:id/history", get(routes::tasks::get_history))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_public.merge(auth_protected))
        .nest("/users", user_routes)
        .nest("/projects", project_routes)
        .nest("/tasks", task_routes);

    Router::new()
        .merge(health_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// JWT authentication middleware
///
/// Extracts and validates the Bearer token, re-loads the user row, and
/// rejects inactive accounts before injecting `Actor` into extensions.
async fn auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::Unauthenticated("No authentication token, access denied".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        ApiError::Unauthenticated("Invalid authentication token format".to_string())
    })?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    // The token's role may be stale; authorize against the live row
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthenticated("User not found".to_string()))?;

    if !user.is_active {
        return Err(ApiError::Forbidden("User account is inactive".to_string()));
    }

    req.extensions_mut().insert(Actor::new(user.id, user.role));

    Ok(next.run(req).await)
}
