//! Outbound mail.
//!
//! With SMTP configured, mail goes out through lettre. Otherwise it is logged
//! so the reset flow still works in development.

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Serialize;
use serde_json::Value;

use common::{AppError, AppResult, MailConfig};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Template used for password reset mails
pub const PASSWORD_RESET_TEMPLATE: &str = "password-reset";

/// A rendered-on-send mail message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingMail {
    pub recipient: String,
    pub subject: String,
    pub template_name: String,
    pub template_data: Value,
}

impl OutgoingMail {
    /// Plain-text body for the mail's template.
    pub fn render_text(&self) -> String {
        let field = |key: &str| {
            self.template_data
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        match self.template_name.as_str() {
            PASSWORD_RESET_TEMPLATE => format!(
                "Hello {},\n\n\
                 You have requested a password reset. Follow this link within the next hour:\n\n\
                 {}\n\n\
                 If you did not request this, you can ignore this email.\n",
                field("name"),
                field("reset_url"),
            ),
            _ => self.template_data.to_string(),
        }
    }
}

/// Mail capability used by the account service.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> AppResult<()>;
}

/// SMTP delivery via lettre.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(host: &str, config: &MailConfig) -> AppResult<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
            .map_err(|e| AppError::internal(format!("SMTP relay setup failed: {}", e)))?
            .port(config.smtp_port);

        if let (Some(username), Some(password)) = (&config.smtp_username, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = config
            .from_address
            .parse()
            .map_err(|_| AppError::internal(format!("Invalid MAIL_FROM: {}", config.from_address)))?;

        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        let to: Mailbox = mail
            .recipient
            .parse()
            .map_err(|_| AppError::validation(format!("Invalid recipient: {}", mail.recipient)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(mail.render_text())
            .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::internal(format!("SMTP send failed: {}", e)))?;

        tracing::info!(to = %mail.recipient, subject = %mail.subject, "Email sent");
        Ok(())
    }
}

/// Development fallback: logs the mail instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> AppResult<()> {
        tracing::warn!("SMTP not configured - logging email instead of sending");
        tracing::info!(
            "=== EMAIL (not sent) ===\n\
             To: {}\n\
             Subject: {}\n\
             Body:\n{}\n\
             ========================",
            mail.recipient,
            mail.subject,
            mail.render_text()
        );
        Ok(())
    }
}

/// Pick the SMTP mailer when a host is configured, the logger otherwise.
pub fn mailer_from_config(config: &MailConfig) -> AppResult<Arc<dyn Mailer>> {
    match &config.smtp_host {
        Some(host) => Ok(Arc::new(SmtpMailer::new(host, config)?)),
        None => Ok(Arc::new(LogMailer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reset_mail() -> OutgoingMail {
        OutgoingMail {
            recipient: "wes@example.com".into(),
            subject: "Password Reset".into(),
            template_name: PASSWORD_RESET_TEMPLATE.into(),
            template_data: json!({
                "name": "Wes",
                "reset_url": "http://localhost:7777/account/reset/abc123",
            }),
        }
    }

    #[test]
    fn test_reset_template_contains_link() {
        let body = reset_mail().render_text();
        assert!(body.starts_with("Hello Wes,"));
        assert!(body.contains("http://localhost:7777/account/reset/abc123"));
    }

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        assert!(LogMailer.send(reset_mail()).await.is_ok());
    }

    #[test]
    fn test_unconfigured_smtp_falls_back_to_logging() {
        assert!(mailer_from_config(&MailConfig::default()).is_ok());
    }
}
