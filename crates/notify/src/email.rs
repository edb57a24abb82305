//! Alert email delivery via SMTP.
//!
//! [`Mailer`] wraps the `lettre` async SMTP transport to send plain-text
//! alert emails to the configured recipient list. Addresses and transport
//! settings are validated when the mailer is constructed, not at send
//! time. Sends are bounded by a timeout so a degraded mail server cannot
//! stall the sender worker indefinitely.

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for alert delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// A recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The send did not complete within the configured timeout.
    #[error("Email send timed out after {0:?}")]
    Timeout(Duration),

    /// The configuration is unusable (e.g. empty recipient list).
    #[error("Email configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// EmailConfig
// ---------------------------------------------------------------------------

/// Default SMTP port (STARTTLS).
const DEFAULT_SMTP_PORT: u16 = 587;

/// Default bound on a single SMTP send.
const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;

/// Configuration for SMTP alert delivery.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP server hostname.
    pub smtp_host: String,
    /// SMTP server port (defaults to 587).
    pub smtp_port: u16,
    /// RFC 5322 "From" address.
    pub from_address: String,
    /// Alert recipients.
    pub recipients: Vec<String>,
    /// Optional SMTP username.
    pub smtp_user: Option<String>,
    /// Optional SMTP password.
    pub smtp_password: Option<String>,
    /// Upper bound on a single send.
    pub send_timeout: Duration,
}

impl EmailConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `SMTP_HOST` is not set, signalling that alert
    /// email delivery is not configured.
    ///
    /// | Variable            | Required | Default |
    /// |---------------------|----------|---------|
    /// | `SMTP_HOST`         | yes      | —       |
    /// | `SMTP_PORT`         | no       | `587`   |
    /// | `SMTP_FROM`         | yes      | —       |
    /// | `SMTP_TO`           | yes      | —       | (comma-separated)
    /// | `SMTP_USER`         | no       | —       |
    /// | `SMTP_PASSWORD`     | no       | —       |
    /// | `SMTP_TIMEOUT_SECS` | no       | `30`    |
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM").unwrap_or_default(),
            recipients: std::env::var("SMTP_TO")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            send_timeout: Duration::from_secs(
                std::env::var("SMTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_SEND_TIMEOUT_SECS),
            ),
        })
    }
}

// ---------------------------------------------------------------------------
// Mailer
// ---------------------------------------------------------------------------

/// Subject prefix on every outbound alert email.
const SUBJECT_TAG: &str = "[Tempdog]";

/// Sends alert emails over SMTP to a fixed recipient list.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
    send_timeout: Duration,
}

impl Mailer {
    /// Build a mailer from validated configuration.
    ///
    /// Fails when the sender or any recipient address does not parse, or
    /// the recipient list is empty.
    pub fn new(config: &EmailConfig) -> Result<Self, NotifyError> {
        if config.recipients.is_empty() {
            return Err(NotifyError::Config("recipient list is empty".into()));
        }

        let from: Mailbox = config.from_address.parse()?;
        let recipients = config
            .recipients
            .iter()
            .map(|r| r.parse())
            .collect::<Result<Vec<Mailbox>, _>>()?;

        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);

        if let (Some(user), Some(pass)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), pass.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            recipients,
            send_timeout: config.send_timeout,
        })
    }

    /// Send a plain-text alert email to every configured recipient.
    pub async fn send(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(format!("{SUBJECT_TAG} {subject}"))
            .header(ContentType::TEXT_PLAIN);

        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }

        let email = builder
            .body(body.to_string())
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        match tokio::time::timeout(self.send_timeout, self.transport.send(email)).await {
            Ok(result) => {
                result?;
                tracing::info!(subject, "Alert email sent");
                Ok(())
            }
            Err(_) => Err(NotifyError::Timeout(self.send_timeout)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.org".into(),
            smtp_port: 587,
            from_address: "tempdog@example.org".into(),
            recipients: vec!["ops@example.org".into()],
            smtp_user: None,
            smtp_password: None,
            send_timeout: Duration::from_secs(30),
        }
    }

    #[test]
    fn mailer_accepts_valid_config() {
        assert!(Mailer::new(&config()).is_ok());
    }

    #[test]
    fn mailer_rejects_empty_recipient_list() {
        let mut cfg = config();
        cfg.recipients.clear();
        assert!(matches!(Mailer::new(&cfg), Err(NotifyError::Config(_))));
    }

    #[test]
    fn mailer_rejects_unparseable_recipient() {
        let mut cfg = config();
        cfg.recipients = vec!["not-an-email".into()];
        assert!(matches!(Mailer::new(&cfg), Err(NotifyError::Address(_))));
    }

    #[test]
    fn notify_error_display_build() {
        let err = NotifyError::Build("missing body".to_string());
        assert_eq!(err.to_string(), "Email build error: missing body");
    }
}
