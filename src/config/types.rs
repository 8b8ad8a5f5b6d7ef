//! Mailer settings types and loading.

use super::secret::SecretString;
use crate::error::ConfigError;
use chrono::Weekday;
use lettre::message::Mailbox;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

/// Default settings document path.
pub const DEFAULT_SETTINGS_PATH: &str = "/etc/sensu/config.json";

/// Default name of the mailer section inside the settings document.
pub const DEFAULT_SECTION: &str = "scheduled_mailer";

/// The whole settings document, of which the mailer reads one section.
#[derive(Debug, Clone)]
pub struct Settings {
    root: Value,
}

impl Settings {
    /// Load a settings document. `.yaml`/`.yml` files are read as YAML,
    /// everything else as JSON.
    ///
    /// # Errors
    /// Returns [`ConfigError::LoadError`] if the file cannot be read.
    /// Returns [`ConfigError::ValidationError`] if the content does not parse.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadError(format!("{}: {}", path.display(), e)))?;

        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml" | "yml")
        );
        let root: Value = if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| ConfigError::ValidationError(e.to_string()))?
        } else {
            serde_json::from_str(&content)
                .map_err(|e| ConfigError::ValidationError(e.to_string()))?
        };

        Ok(Self { root })
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Extract and deserialize the named mailer section.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingSection`] if the section is absent.
    /// Returns [`ConfigError::ValidationError`] if its fields are malformed.
    pub fn mailer(&self, section: &str) -> Result<MailerConfig, ConfigError> {
        let value = self
            .root
            .get(section)
            .ok_or_else(|| ConfigError::MissingSection {
                name: section.to_string(),
            })?;

        MailerConfig::deserialize(value)
            .map_err(|e| ConfigError::ValidationError(format!("{}: {}", section, e)))
    }
}

/// How the rendered mail leaves the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    #[default]
    Smtp,
    Sendmail,
}

/// SMTP authentication mechanism used when a username is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpAuthentication {
    #[default]
    Plain,
    Login,
    Xoauth2,
}

/// One day-of-week subscription schedule.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionConfig {
    pub mail_to: String,
    /// Days on which this subscription receives mail, 0 = Sunday .. 6 = Saturday.
    #[serde(deserialize_with = "deserialize_days_of_week")]
    pub days_of_week: BTreeSet<u8>,
}

impl SubscriptionConfig {
    pub fn is_active_on(&self, weekday: Weekday) -> bool {
        // num_days_from_sunday is always 0..=6
        self.days_of_week
            .contains(&(weekday.num_days_from_sunday() as u8))
    }
}

/// Accepts `[1, 2]` as well as `["1", "2"]`.
fn deserialize_days_of_week<'de, D>(deserializer: D) -> Result<BTreeSet<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDay {
        Number(i64),
        Text(String),
    }

    Vec::<RawDay>::deserialize(deserializer)?
        .into_iter()
        .map(|day| {
            let number = match day {
                RawDay::Number(n) => n,
                RawDay::Text(s) => s
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| D::Error::custom(format!("invalid day of week '{}'", s)))?,
            };
            u8::try_from(number)
                .ok()
                .filter(|d| *d <= 6)
                .ok_or_else(|| {
                    D::Error::custom(format!("day of week {} out of range 0-6", number))
                })
        })
        .collect()
}

/// Mailer section of the settings document.
#[derive(Debug, Clone, Deserialize)]
pub struct MailerConfig {
    pub mail_from: String,
    /// Default mailing list, used when the client has no override.
    #[serde(default)]
    pub mail_to: Option<String>,
    #[serde(default)]
    pub reply_to: Option<String>,
    #[serde(default = "default_admin_gui")]
    pub admin_gui: String,
    #[serde(default = "default_smtp_address")]
    pub smtp_address: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default = "default_smtp_domain")]
    pub smtp_domain: String,
    /// Supports `${ENV_VAR}` substitution.
    #[serde(default)]
    pub smtp_username: Option<String>,
    /// Supports `${ENV_VAR}` substitution.
    #[serde(default)]
    pub smtp_password: Option<SecretString>,
    #[serde(default)]
    pub smtp_authentication: SmtpAuthentication,
    /// Only the string `"false"` turns opportunistic STARTTLS off.
    #[serde(default)]
    pub smtp_enable_starttls_auto: Option<Value>,
    #[serde(default)]
    pub delivery_method: DeliveryMethod,
    #[serde(default)]
    pub sendmail_location: Option<String>,
    #[serde(default)]
    pub subscriptions: Option<HashMap<String, SubscriptionConfig>>,
}

fn default_admin_gui() -> String {
    "http://localhost:8080/".to_string()
}

fn default_smtp_address() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    25
}

fn default_smtp_domain() -> String {
    "localhost.localdomain".to_string()
}

impl MailerConfig {
    pub fn starttls_auto(&self) -> bool {
        !matches!(&self.smtp_enable_starttls_auto, Some(Value::String(s)) if s == "false")
    }

    /// Check every setting, collecting all problems.
    ///
    /// # Errors
    /// Returns a `Vec<ConfigError>` with one `InvalidMailer` per problem.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();

        if let Err(e) = self.mail_from.parse::<Mailbox>() {
            errors.push(ConfigError::InvalidMailer {
                field: "mail_from".to_string(),
                message: format!("'{}': {}", self.mail_from, e),
            });
        }

        if let Some(reply_to) = &self.reply_to
            && let Err(e) = reply_to.parse::<Mailbox>()
        {
            errors.push(ConfigError::InvalidMailer {
                field: "reply_to".to_string(),
                message: format!("'{}': {}", reply_to, e),
            });
        }

        if self.smtp_username.is_some() && self.smtp_password.is_none() {
            errors.push(ConfigError::InvalidMailer {
                field: "smtp_password".to_string(),
                message: "required when smtp_username is set".to_string(),
            });
        }

        if self.smtp_password.is_some() && self.smtp_username.is_none() {
            tracing::warn!("smtp_password set without smtp_username, authentication disabled");
        }

        if self.sendmail_location.is_some() && self.delivery_method != DeliveryMethod::Sendmail {
            tracing::warn!("sendmail_location ignored, delivery_method is not sendmail");
        }

        if let Some(subscriptions) = &self.subscriptions {
            let mut names: Vec<_> = subscriptions.keys().collect();
            names.sort();
            for name in names {
                if subscriptions[name].mail_to.trim().is_empty() {
                    errors.push(ConfigError::InvalidMailer {
                        field: format!("subscriptions.{}.mail_to", name),
                        message: "must not be empty".to_string(),
                    });
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
