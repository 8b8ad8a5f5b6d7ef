//! Bounded-time mail delivery.
//!
//! One send attempt per event, wrapped in a [`DELIVERY_TIMEOUT`] deadline.
//! A deadline expiry is reported as [`DeliveryOutcome::TimedOut`] and is not
//! an error; any other transport failure is.
//!
//! # Testability
//!
//! The transport is injected through [`MailDelivery::with_transport`], so
//! tests can use a mock that records, fails, or never completes.

use super::DeliveryOutcome;
use super::transport::{EmailTransport, build_transport};
use crate::config::MailerConfig;
use crate::error::{ConfigError, NotifyError};
use crate::event::Event;
use crate::recipients::ResolvedRecipients;
use crate::template::RenderedMessage;
use lettre::Message;
use lettre::message::{Mailbox, Mailboxes};
use lettre::message::header::ContentType;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

/// Hard limit on one delivery attempt.
///
/// Expiry drops the in-flight send future; whether the remote side aborts
/// is up to the transport.
pub const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends rendered notifications through a configured transport.
pub struct MailDelivery {
    transport: Arc<dyn EmailTransport>,
    from: Mailbox,
    reply_to: Option<Mailbox>,
    timeout: Duration,
}

fn parse_mailbox(field: &str, value: &str) -> Result<Mailbox, ConfigError> {
    value.parse().map_err(|e| ConfigError::InvalidMailer {
        field: field.to_string(),
        message: format!("'{}': {}", value, e),
    })
}

impl MailDelivery {
    /// Build the delivery from the mailer settings.
    ///
    /// Must be called inside a Tokio runtime when `delivery_method` is smtp.
    pub fn from_config(config: &MailerConfig) -> Result<Self, ConfigError> {
        let transport = build_transport(config)?;
        Self::with_transport(transport, config)
    }

    /// Build the delivery around an existing transport.
    pub fn with_transport(
        transport: Arc<dyn EmailTransport>,
        config: &MailerConfig,
    ) -> Result<Self, ConfigError> {
        let from = parse_mailbox("mail_from", &config.mail_from)?;
        let reply_to = config
            .reply_to
            .as_deref()
            .map(|addr| parse_mailbox("reply_to", addr))
            .transpose()?;

        Ok(Self {
            transport,
            from,
            reply_to,
            timeout: DELIVERY_TIMEOUT,
        })
    }

    /// Assemble the HTML message, one `To` per mailbox in the resolved entries.
    fn build_message(
        &self,
        recipients: &ResolvedRecipients,
        rendered: &RenderedMessage,
    ) -> Result<Message, NotifyError> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(rendered.subject.clone())
            .header(ContentType::TEXT_HTML);

        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.clone());
        }

        // An entry is an RFC 5322 address list; quoted display names may hold commas.
        for entry in recipients.entries() {
            let mailboxes = entry
                .parse::<Mailboxes>()
                .map_err(|e| NotifyError::InvalidAddress {
                    address: entry.clone(),
                    message: e.to_string(),
                })?;
            for mailbox in mailboxes {
                builder = builder.to(mailbox);
            }
        }

        builder
            .body(rendered.body_html.clone())
            .map_err(|e| NotifyError::BuildFailed(e.to_string()))
    }

    /// Send one notification for `event`.
    ///
    /// # Returns
    ///
    /// * `Ok(DeliveryOutcome::Sent)` - Transport accepted the message
    /// * `Ok(DeliveryOutcome::TimedOut)` - Deadline expired first
    /// * `Err(NotifyError)` - Any other failure, not retried
    pub async fn deliver(
        &self,
        event: &Event,
        recipients: &ResolvedRecipients,
        rendered: &RenderedMessage,
    ) -> Result<DeliveryOutcome, NotifyError> {
        let message = self.build_message(recipients, rendered)?;

        let span = tracing::info_span!(
            "send_email",
            client = %event.client.name,
            check = %event.check.name,
        );

        match tokio::time::timeout(self.timeout, self.transport.send_email(message))
            .instrument(span)
            .await
        {
            Ok(Ok(())) => Ok(DeliveryOutcome::Sent {
                label: event.label(),
                recipients: recipients.to_string(),
            }),
            Ok(Err(error)) => {
                tracing::error!(error = %error, "Mail transport failed");
                Err(NotifyError::SendFailed(error))
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Mail delivery timed out"
                );
                Ok(DeliveryOutcome::TimedOut {
                    action: event.action,
                    label: event.label(),
                })
            }
        }
    }
}

impl std::fmt::Debug for MailDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailDelivery")
            .field("from", &self.from.to_string())
            .field("reply_to", &self.reply_to.as_ref().map(|m| m.to_string()))
            .field("timeout", &self.timeout)
            .finish()
    }
}
