//! Mail delivery for scheduled-mailer.
//!
//! # Architecture
//!
//! ```text
//! filter.rs -> recipients.rs -> template.rs -> notify/ -> SMTP relay | sendmail
//! ```
//!
//! - `transport`: the `EmailTransport` seam and the lettre-backed transports
//! - `email`: one bounded-time delivery attempt

pub mod email;
pub mod transport;

use crate::event::Action;
use std::fmt;

pub use email::{DELIVERY_TIMEOUT, MailDelivery};
pub use transport::{EmailTransport, SendmailTransport, SmtpTransport, build_transport};

/// Result of a delivery attempt that did not fail.
///
/// `Display` renders the operator status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Transport accepted the message.
    Sent { label: String, recipients: String },
    /// Deadline expired before the transport answered.
    TimedOut { action: Action, label: String },
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, DeliveryOutcome::Sent { .. })
    }
}

impl fmt::Display for DeliveryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryOutcome::Sent { label, recipients } => {
                write!(f, "mail -- sent alert for {} to {}", label, recipients)
            }
            DeliveryOutcome::TimedOut { action, label } => write!(
                f,
                "mail -- timed out while attempting to {} an incident -- {}",
                action, label
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sent_status_line() {
        let outcome = DeliveryOutcome::Sent {
            label: "db-01/check_disk".to_string(),
            recipients: "a@x.com, b@x.com".to_string(),
        };
        assert!(outcome.is_sent());
        assert_eq!(
            outcome.to_string(),
            "mail -- sent alert for db-01/check_disk to a@x.com, b@x.com"
        );
    }

    #[test]
    fn timed_out_status_line() {
        let outcome = DeliveryOutcome::TimedOut {
            action: Action::Create,
            label: "db-01/check_disk".to_string(),
        };
        assert!(!outcome.is_sent());
        assert_eq!(
            outcome.to_string(),
            "mail -- timed out while attempting to create an incident -- db-01/check_disk"
        );
    }
}
