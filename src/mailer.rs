//! Optional SMTP forwarding of alert notifications.
//!
//! The pipeline never calls the mailer; a forwarder task subscribes to the
//! [`Notifier`](crate::notifier::Notifier) like any other client and mails
//! each alert it observes. Delivery failures are logged and never affect
//! ingestion.

use crate::notifier::{Notification, Notifier};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, thiserror::Error)]
pub enum MailerError {
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("email build error: {0}")]
    Build(#[from] lettre::error::Error),
}

/// SMTP settings, read from the environment. `from_env` returns `None`
/// unless both `SMTP_HOST` and `ALERT_EMAIL_TO` are set, signalling that
/// alert forwarding is not configured.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub from_address: String,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub alert_recipient: String,
}

impl EmailConfig {
    pub fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("SMTP_HOST").ok()?;
        let alert_recipient = std::env::var("ALERT_EMAIL_TO").ok()?;
        Some(Self {
            smtp_host,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            from_address: std::env::var("SMTP_FROM")
                .unwrap_or_else(|_| "alerts@fleet-telemetry.local".to_string()),
            smtp_user: std::env::var("SMTP_USER").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            alert_recipient,
        })
    }
}

/// Sends plain-text alert emails over async SMTP.
pub struct Mailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipient: Mailbox,
}

impl Mailer {
    pub fn new(config: &EmailConfig) -> Result<Self, MailerError> {
        let mut builder =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port);
        if let (Some(user), Some(password)) = (&config.smtp_user, &config.smtp_password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: config.from_address.parse()?,
            recipient: config.alert_recipient.parse()?,
        })
    }

    pub async fn send_alert(&self, body: &str) -> Result<(), MailerError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.recipient.clone())
            .subject("Vehicle Alert")
            .body(body.to_string())?;
        self.transport.send(email).await?;
        Ok(())
    }
}

/// Subscribe to the notifier and mail every alert notification. Runs until
/// the notifier is dropped.
pub async fn run_alert_forwarder(notifier: Arc<Notifier>, mailer: Mailer) {
    let mut rx = notifier.subscribe();
    loop {
        match rx.recv().await {
            Ok(Notification::Alert { message }) => {
                if let Err(e) = mailer.send_alert(&message).await {
                    warn!("Alert email delivery failed: {}", e);
                }
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                warn!("Alert mailer lagged, skipped {} notifications", skipped);
            }
            Err(RecvError::Closed) => {
                info!("Notifier closed, stopping alert mailer");
                break;
            }
        }
    }
}
