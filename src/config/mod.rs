//! Settings loading and validation for scheduled-mailer.
//!
//! The settings document is shared with the rest of the monitoring
//! pipeline; the mailer only reads its own named section.

mod env;
mod secret;
mod types;

pub use env::resolve_env_vars;
pub use secret::SecretString;
pub use types::{
    DEFAULT_SECTION, DEFAULT_SETTINGS_PATH, DeliveryMethod, MailerConfig, Settings,
    SmtpAuthentication, SubscriptionConfig,
};

#[cfg(test)]
mod tests;
