//! Outcome notification by email

use crate::config::NotificationConfig;
use crate::error::NotificationError;
use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

/// Subject line of every outcome email
pub const NOTIFICATION_SUBJECT: &str = "Assignment Submission Notification";

/// Delivers the outcome text to the submitter
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one plain-text message to `address` with `status_text` as body
    ///
    /// # Errors
    ///
    /// Returns a [`NotificationError`] if the message cannot be built or the
    /// delivery service fails. The caller treats this as fatal.
    async fn notify(&self, address: &str, status_text: &str) -> Result<(), NotificationError>;
}

/// Build the outcome email: single recipient, fixed subject, plain-text body
pub fn build_message(
    from: &str,
    to: &str,
    status_text: &str,
) -> Result<Message, NotificationError> {
    let from: Mailbox = parse_mailbox(from)?;
    let to: Mailbox = parse_mailbox(to)?;

    Message::builder()
        .from(from)
        .to(to)
        .subject(NOTIFICATION_SUBJECT)
        .header(ContentType::TEXT_PLAIN)
        .body(status_text.to_string())
        .map_err(|e| NotificationError::Build(e.to_string()))
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address
        .parse()
        .map_err(|e: lettre::address::AddressError| NotificationError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// [`Notifier`] delivering through an SMTP relay
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpNotifier {
    /// Create an SMTP notifier from configuration
    pub fn from_config(config: &NotificationConfig) -> Result<Self, NotificationError> {
        // Sender is checked once, up front
        parse_mailbox(&config.from_address)?;

        let builder = if config.smtp_starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
                .map_err(|e| NotificationError::Transport(e.to_string()))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };
        let builder = builder.port(config.smtp_port);
        let builder = match (&config.smtp_username, &config.smtp_password) {
            (Some(user), Some(pass)) => {
                builder.credentials(Credentials::new(user.clone(), pass.clone()))
            }
            _ => builder,
        };

        info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            starttls = config.smtp_starttls,
            "email notifier initialized"
        );

        Ok(Self {
            mailer: builder.build(),
            from: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, address: &str, status_text: &str) -> Result<(), NotificationError> {
        let email = build_message(&self.from, address, status_text)?;
        debug!(to = address, "sending outcome email");

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotificationError::Delivery(e.to_string()))?;

        info!(to = address, "outcome email sent");
        Ok(())
    }
}
