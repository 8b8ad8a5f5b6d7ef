//! Mail transports.
//!
//! The delivery layer only sees [`EmailTransport`]; production wraps the
//! lettre SMTP or sendmail transport built from the mailer settings, tests
//! inject a mock.

use crate::config::{DeliveryMethod, MailerConfig, SmtpAuthentication, resolve_env_vars};
use crate::error::ConfigError;
use async_trait::async_trait;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::transport::smtp::extension::ClientId;
use lettre::{AsyncSendmailTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

/// Async mail transport abstraction.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Hand one message to the transport.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Message accepted
    /// * `Err(String)` - Error message describing the failure
    async fn send_email(&self, message: Message) -> Result<(), String>;
}

/// SMTP relay transport.
pub struct SmtpTransport {
    inner: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpTransport {
    pub fn new(transport: AsyncSmtpTransport<Tokio1Executor>) -> Self {
        Self { inner: transport }
    }
}

#[async_trait]
impl EmailTransport for SmtpTransport {
    async fn send_email(&self, message: Message) -> Result<(), String> {
        self.inner
            .send(message)
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

/// Local MTA transport, pipes the message into a sendmail binary.
pub struct SendmailTransport {
    inner: AsyncSendmailTransport<Tokio1Executor>,
}

impl SendmailTransport {
    pub fn new(transport: AsyncSendmailTransport<Tokio1Executor>) -> Self {
        Self { inner: transport }
    }
}

#[async_trait]
impl EmailTransport for SendmailTransport {
    async fn send_email(&self, message: Message) -> Result<(), String> {
        self.inner.send(message).await.map_err(|e| e.to_string())
    }
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidMailer {
        field: field.to_string(),
        message: message.into(),
    }
}

fn mechanism(authentication: SmtpAuthentication) -> Mechanism {
    match authentication {
        SmtpAuthentication::Plain => Mechanism::Plain,
        SmtpAuthentication::Login => Mechanism::Login,
        SmtpAuthentication::Xoauth2 => Mechanism::Xoauth2,
    }
}

/// Build the transport selected by `delivery_method`.
///
/// # Errors
/// Returns [`ConfigError::InvalidMailer`] when credentials reference an
/// undefined environment variable, a username has no password, or TLS
/// parameters cannot be built.
pub fn build_transport(config: &MailerConfig) -> Result<Arc<dyn EmailTransport>, ConfigError> {
    match config.delivery_method {
        DeliveryMethod::Smtp => Ok(Arc::new(SmtpTransport::new(build_smtp(config)?))),
        DeliveryMethod::Sendmail => {
            let transport = match &config.sendmail_location {
                Some(location) => AsyncSendmailTransport::<Tokio1Executor>::new_with_command(location),
                None => AsyncSendmailTransport::<Tokio1Executor>::new(),
            };
            Ok(Arc::new(SendmailTransport::new(transport)))
        }
    }
}

fn build_smtp(config: &MailerConfig) -> Result<AsyncSmtpTransport<Tokio1Executor>, ConfigError> {
    let host = &config.smtp_address;

    // Opportunistic: upgrade with STARTTLS when the server offers it.
    let tls = if config.starttls_auto() {
        let parameters = TlsParameters::new(host.clone())
            .map_err(|e| invalid("smtp_address", format!("TLS configuration error: {}", e)))?;
        Tls::Opportunistic(parameters)
    } else {
        Tls::None
    };

    let builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        .port(config.smtp_port)
        .hello_name(ClientId::Domain(config.smtp_domain.clone()))
        .tls(tls);

    let builder = match &config.smtp_username {
        Some(username) => {
            let username = resolve_env_vars(username)
                .map_err(|e| invalid("smtp_username", e.to_string()))?;
            let password = config
                .smtp_password
                .as_ref()
                .ok_or_else(|| invalid("smtp_password", "required when smtp_username is set"))
                .and_then(|p| {
                    resolve_env_vars(p.expose())
                        .map_err(|e| invalid("smtp_password", e.to_string()))
                })?;

            builder
                .credentials(Credentials::new(username, password))
                .authentication(vec![mechanism(config.smtp_authentication)])
        }
        None => builder,
    };

    tracing::debug!(
        host = %host,
        port = config.smtp_port,
        domain = %config.smtp_domain,
        starttls_auto = config.starttls_auto(),
        authenticated = config.smtp_username.is_some(),
        "SMTP transport configured"
    );

    Ok(builder.build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_SECTION, Settings};
    use serde_json::json;
    use serial_test::serial;

    fn make_config(mailer: serde_json::Value) -> MailerConfig {
        Settings::from_value(json!({ "scheduled_mailer": mailer }))
            .mailer(DEFAULT_SECTION)
            .unwrap()
    }

    // Building the SMTP pool spawns onto the current runtime.
    #[tokio::test]
    async fn builds_default_smtp_transport() {
        let config = make_config(json!({"mail_from": "sensu@example.com"}));
        assert!(build_transport(&config).is_ok());
    }

    #[tokio::test]
    async fn builds_smtp_transport_without_starttls() {
        let config = make_config(json!({
            "mail_from": "sensu@example.com",
            "smtp_enable_starttls_auto": "false"
        }));
        assert!(build_transport(&config).is_ok());
    }

    #[tokio::test]
    async fn builds_authenticated_transport() {
        for mechanism in ["plain", "login", "xoauth2"] {
            let config = make_config(json!({
                "mail_from": "sensu@example.com",
                "smtp_username": "mailer",
                "smtp_password": "secret",
                "smtp_authentication": mechanism
            }));
            assert!(build_transport(&config).is_ok(), "mechanism {}", mechanism);
        }
    }

    #[tokio::test]
    async fn username_without_password_rejected() {
        let config = make_config(json!({
            "mail_from": "sensu@example.com",
            "smtp_username": "mailer"
        }));
        match build_transport(&config) {
            Err(ConfigError::InvalidMailer { field, .. }) => assert_eq!(field, "smtp_password"),
            other => panic!("Expected InvalidMailer, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    #[serial]
    async fn undefined_credential_variable_rejected() {
        // SAFETY: Test marked #[serial] to prevent parallel execution with other env var tests
        unsafe { std::env::remove_var("SCHEDULED_MAILER_SMTP_PASS_UNSET") };

        let config = make_config(json!({
            "mail_from": "sensu@example.com",
            "smtp_username": "mailer",
            "smtp_password": "${SCHEDULED_MAILER_SMTP_PASS_UNSET}"
        }));
        match build_transport(&config) {
            Err(ConfigError::InvalidMailer { field, message }) => {
                assert_eq!(field, "smtp_password");
                assert!(message.contains("SCHEDULED_MAILER_SMTP_PASS_UNSET"));
            }
            other => panic!("Expected InvalidMailer, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn builds_sendmail_transport() {
        let config = make_config(json!({
            "mail_from": "sensu@example.com",
            "delivery_method": "sendmail",
            "sendmail_location": "/usr/sbin/sendmail"
        }));
        assert!(build_transport(&config).is_ok());
    }
}
