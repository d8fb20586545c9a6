//! Outbound email over SMTP.

use std::sync::Arc;

use futures::future::BoxFuture;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::info;

use crate::config::EmailConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

pub trait Mailer: Send + Sync {
    fn send(&self, email: Email) -> BoxFuture<'_, Result<(), EmailError>>;
}

/// Sends HTML mail through a STARTTLS relay.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(
        host: &str,
        port: u16,
        credentials: Credentials,
        from: Mailbox,
    ) -> Result<Self, SmtpError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?
            .port(port)
            .credentials(credentials)
            .build();

        Ok(Self { transport, from })
    }
}

impl Mailer for SmtpMailer {
    fn send(&self, email: Email) -> BoxFuture<'_, Result<(), EmailError>> {
        Box::pin(async move {
            let to: Mailbox = email
                .to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(email.to.clone()))?;

            let message = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(email.subject.as_str())
                .header(ContentType::TEXT_HTML)
                .body(email.html)?;

            let response = self.transport.send(message).await?;
            info!(
                to = %email.to,
                subject = %email.subject,
                code = %response.code(),
                "Email sent"
            );
            Ok(())
        })
    }
}

/// Stands in for SMTP when no credentials are configured: records what would
/// have been sent.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: Email) -> BoxFuture<'_, Result<(), EmailError>> {
        Box::pin(async move {
            info!(
                to = %email.to,
                subject = %email.subject,
                "Skipping email sending: SMTP credentials not provided"
            );
            Ok(())
        })
    }
}

/// Picks the SMTP mailer when credentials exist, the logging one otherwise.
pub fn from_config(config: &EmailConfig) -> Result<Arc<dyn Mailer>, EmailError> {
    let Some(smtp) = &config.smtp_credentials else {
        info!("SMTP credentials not provided, emails will only be logged");
        return Ok(Arc::new(LogMailer));
    };

    let from_address = smtp
        .username
        .parse()
        .map_err(|_| EmailError::InvalidAddress(smtp.username.clone()))?;
    let from = Mailbox::new(Some(config.sender_name.clone()), from_address);

    let credentials = Credentials::new(
        smtp.username.clone(),
        smtp.password.expose_secret().to_string(),
    );

    let mailer = SmtpMailer::new(&config.smtp_host, config.smtp_port, credentials, from)?;
    Ok(Arc::new(mailer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SmtpCredentials;
    use secrecy::SecretString;

    fn email_config(smtp_credentials: Option<SmtpCredentials>) -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.gmail.com".into(),
            smtp_port: 587,
            smtp_credentials,
            admin_email: "admin@vrindavan.com".into(),
            sender_name: "Vrindavan Ras Desh".into(),
        }
    }

    #[tokio::test]
    async fn test_log_mailer_always_succeeds() {
        let mailer = from_config(&email_config(None)).expect("log mailer");
        mailer
            .send(Email {
                to: "devotee@example.com".into(),
                subject: "Order Received - #VRD12345678001".into(),
                html: "<p>Jai Shri Radhe!</p>".into(),
            })
            .await
            .expect("logged");
    }

    #[tokio::test]
    async fn test_invalid_sender_address_is_rejected() {
        let result = from_config(&email_config(Some(SmtpCredentials {
            username: "not an address".into(),
            password: SecretString::from("app-password".to_string()),
        })));
        assert!(matches!(result, Err(EmailError::InvalidAddress(_))));
    }
}
