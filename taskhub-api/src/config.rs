/// Configuration management for the API server
///
/// Configuration is loaded from environment variables into a typed
/// struct; required variables fail fast at startup.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `JWT_SECRET`: Secret key for JWT signing, min 32 chars (required)
/// - `MAIL_API_URL` / `MAIL_API_KEY` / `MAIL_FROM`: Outbound mail API
///   (optional; email delivery is disabled when unset)
/// - `RESET_URL_BASE`: Base URL for password-reset links
///   (default: http://localhost:8080/api/auth/reset-password)
/// - `RUST_LOG`: Log level filter
use serde::{Deserialize, Serialize};
use std::env;

use taskhub_shared::email::EmailConfig;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT configuration
    pub jwt: JwtConfig,

    /// Outbound mail configuration, if any
    #[serde(skip)]
    pub email: Option<MailConfig>,

    /// Base URL used to build password-reset links
    pub reset_url_base: String,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    pub secret: String,
}

/// Outbound mail API configuration
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if required variables are missing or have
    /// invalid values.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let api_host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let api_port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let email = match (env::var("MAIL_API_URL"), env::var("MAIL_API_KEY")) {
            (Ok(api_url), Ok(api_key)) => Some(MailConfig {
                api_url,
                api_key,
                from: env::var("MAIL_FROM")
                    .unwrap_or_else(|_| "no-reply@taskhub.local".to_string()),
            }),
            _ => None,
        };

        let reset_url_base = env::var("RESET_URL_BASE").unwrap_or_else(|_| {
            format!("http://localhost:{}/api/auth/reset-password", api_port)
        });

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            email,
            reset_url_base,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Converts the mail section into the shared email config, if set
    pub fn email_config(&self) -> Option<EmailConfig> {
        self.email.as_ref().map(|mail| EmailConfig {
            api_url: mail.api_url.clone(),
            api_key: mail.api_key.clone(),
            from: mail.from.clone(),
        })
    }
}
