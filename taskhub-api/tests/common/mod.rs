/// Common test utilities for integration tests
///
/// Tests run against a real PostgreSQL database named by `DATABASE_URL`.
/// When the variable is unset, `TestContext::new` returns `None` and the
/// test skips itself, so the unit suite stays runnable without a database.
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use sqlx::PgPool;
use tower::Service as _;
use uuid::Uuid;

use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig};
use taskhub_shared::auth::password::hash_password;
use taskhub_shared::email::Mailer;
use taskhub_shared::models::user::{CreateUser, User, UserRole};

pub const TEST_JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";

/// Test context holding the database, router, and created users
pub struct TestContext {
    pub db: PgPool,
    pub app: axum::Router,
    created_users: Vec<Uuid>,
}

impl TestContext {
    /// Creates a test context, or `None` when no database is configured
    pub async fn new() -> Option<Self> {
        let url = std::env::var("DATABASE_URL").ok()?;

        let db = PgPool::connect(&url).await.expect("database unreachable");

        // Path relative to the crate's Cargo.toml
        sqlx::migrate!("../taskhub-shared/migrations")
            .run(&db)
            .await
            .expect("migrations failed");

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url,
                max_connections: 5,
            },
            jwt: JwtConfig {
                secret: TEST_JWT_SECRET.to_string(),
            },
            email: None,
            reset_url_base: "http://localhost/api/auth/reset-password".to_string(),
        };

        let state = AppState::new(db.clone(), config, Mailer::disabled());
        let app = build_router(state);

        Some(Self {
            db,
            app,
            created_users: Vec::new(),
        })
    }

    /// Creates a user directly in the database and logs them in
    ///
    /// Returns the user row and a valid access token.
    pub async fn create_user(&mut self, role: UserRole) -> (User, String) {
        let email = format!("test-{}@example.com", Uuid::new_v4());
        let password_hash = hash_password("correct-horse-battery").unwrap();

        let user = User::create(
            &self.db,
            CreateUser {
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                email,
                password_hash,
            },
        )
        .await
        .unwrap();

        let user = if role == UserRole::Admin {
            User::update_role(&self.db, user.id, UserRole::Admin)
                .await
                .unwrap()
                .unwrap()
        } else {
            user
        };

        self.created_users.push(user.id);

        let claims = taskhub_shared::auth::jwt::Claims::new(
            user.id,
            user.role,
            taskhub_shared::auth::jwt::TokenType::Access,
        );
        let token = taskhub_shared::auth::jwt::create_token(&claims, TEST_JWT_SECRET).unwrap();

        (user, token)
    }

    /// Sends a JSON request through the router
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let mut app = self.app.clone();
        let response = app.call(request).await.unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    /// Deletes every user this context created; owned data cascades
    pub async fn cleanup(&self) {
        for user_id in &self.created_users {
            let _ = User::delete(&self.db, *user_id).await;
        }
    }
}

/// Skips the test when no database is configured
#[macro_export]
macro_rules! require_db {
    () => {
        match common::TestContext::new().await {
            Some(ctx) => ctx,
            None => {
                eprintln!("DATABASE_URL not set, skipping integration test");
                return;
            }
        }
    };
}
