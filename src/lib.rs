//! scheduled-mailer - Mail handler for monitoring events with day-of-week
//! subscription schedules.

pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod handler;
pub mod notify;
pub mod recipients;
pub mod template;

// Re-export commonly used types
pub use cli::LogFormat;
pub use event::{Action, Event};
pub use filter::{FilterResult, check_occurrence};
pub use handler::{AbortReason, HandlerOutcome, MailHandler};
pub use notify::{DELIVERY_TIMEOUT, DeliveryOutcome, EmailTransport, MailDelivery};
pub use recipients::{LocalWeekday, ResolvedRecipients, WeekdayProvider, resolve_recipients};
pub use template::{NotificationRenderer, RenderedMessage, redact_passwords, status_text};
