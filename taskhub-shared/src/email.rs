/// Outbound transactional email
///
/// Email delivery goes through an HTTP mail API (any provider with a
/// `POST /send`-style JSON endpoint). Delivery is fire-and-forget: the
/// caller gets a boolean, failures are logged, and nothing user-facing
/// ever depends on the send succeeding.
///
/// When no mail API is configured the mailer runs disabled and `send`
/// logs the skip and reports `false`.
use serde::Serialize;
use tracing::{info, warn};

/// Error type for mailer construction
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// HTTP client could not be built
    #[error("Failed to build email client: {0}")]
    ClientError(String),
}

/// Configuration for the outbound mail API
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// Mail API endpoint (e.g. "https://api.mailprovider.example/v1/send")
    pub api_url: String,

    /// Bearer token for the mail API
    pub api_key: String,

    /// From address for all outgoing mail
    pub from: String,
}

/// An email ready for dispatch
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

/// HTTP mail client
///
/// Cheap to clone; holds a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct Mailer {
    inner: Option<MailerInner>,
}

#[derive(Debug, Clone)]
struct MailerInner {
    client: reqwest::Client,
    config: EmailConfig,
}

impl Mailer {
    /// Creates a mailer backed by the configured mail API
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| EmailError::ClientError(e.to_string()))?;

        Ok(Self {
            inner: Some(MailerInner { client, config }),
        })
    }

    /// Creates a disabled mailer that logs and drops every message
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Whether a mail API is configured
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Dispatches a message, returning whether delivery was accepted
    ///
    /// Never returns an error: delivery failures are logged and reported
    /// as `false` so callers can stay fire-and-forget.
    pub async fn send(&self, message: EmailMessage) -> bool {
        let Some(inner) = &self.inner else {
            info!(to = %message.to, "Email delivery disabled, skipping send");
            return false;
        };

        let request = SendRequest {
            from: &inner.config.from,
            to: &message.to,
            subject: &message.subject,
            html: &message.html,
        };

        let result = inner
            .client
            .post(&inner.config.api_url)
            .bearer_auth(&inner.config.api_key)
            .json(&request)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                info!(to = %message.to, subject = %message.subject, "Email dispatched");
                true
            }
            Ok(response) => {
                warn!(
                    to = %message.to,
                    status = %response.status(),
                    "Mail API rejected message"
                );
                false
            }
            Err(e) => {
                warn!(to = %message.to, error = %e, "Email sending failed");
                false
            }
        }
    }
}

/// Builds the password-reset email containing the raw reset token
///
/// The link is valid for one hour; the token itself is never stored.
pub fn password_reset_email(to: &str, reset_url_base: &str, raw_token: &str) -> EmailMessage {
    let reset_url = format!("{}/{}", reset_url_base.trim_end_matches('/'), raw_token);

    EmailMessage {
        to: to.to_string(),
        subject: "Password Reset Request".to_string(),
        html: format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2>Password Reset Request</h2>
  <p>You are receiving this email because you (or someone else) has requested the reset of your password.</p>
  <p>Please click the link below to reset your password:</p>
  <p><a href="{reset_url}">Reset Password</a></p>
  <p>If you did not request this, please ignore this email and your password will remain unchanged.</p>
  <p>The link is valid for 1 hour.</p>
</div>"#
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_mailer() {
        let mailer = Mailer::disabled();
        assert!(!mailer.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_mailer_drops_messages() {
        let mailer = Mailer::disabled();
        let sent = mailer
            .send(EmailMessage {
                to: "user@example.com".to_string(),
                subject: "Hello".to_string(),
                html: "<p>Hi</p>".to_string(),
            })
            .await;
        assert!(!sent);
    }

    #[test]
    fn test_password_reset_email_contains_token_link() {
        let message =
            password_reset_email("user@example.com", "https://app.example/reset", "abc123");

        assert_eq!(message.to, "user@example.com");
        assert!(message.html.contains("https://app.example/reset/abc123"));
        assert!(message.subject.contains("Password Reset"));
    }

    #[test]
    fn test_reset_url_trailing_slash_normalized() {
        let message =
            password_reset_email("user@example.com", "https://app.example/reset/", "tok");
        assert!(message.html.contains("reset/tok"));
        assert!(!message.html.contains("reset//tok"));
    }
}
