//! Tests for settings loading, defaults and validation.

use super::*;
use crate::error::ConfigError;
use chrono::Weekday;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load_mailer(fixture: &str, section: &str) -> Result<MailerConfig, ConfigError> {
    Settings::load(&fixture_path(fixture))?.mailer(section)
}

// ============================================================
// Loading
// ============================================================

#[test]
fn load_full_json_section() {
    let config = load_mailer("settings_valid.json", DEFAULT_SECTION).unwrap();

    assert_eq!(config.mail_from, "sensu@example.com");
    assert_eq!(config.mail_to.as_deref(), Some("oncall@example.com"));
    assert_eq!(config.reply_to.as_deref(), Some("noreply@example.com"));
    assert_eq!(config.admin_gui, "https://uchiwa.example.com/");
    assert_eq!(config.smtp_address, "smtp.example.com");
    assert_eq!(config.smtp_port, 587);
    assert_eq!(config.smtp_domain, "example.com");
    assert_eq!(config.smtp_username.as_deref(), Some("mailer"));
    assert_eq!(config.smtp_password.as_ref().unwrap().expose(), "secret");
    assert_eq!(config.smtp_authentication, SmtpAuthentication::Login);
    assert!(!config.starttls_auto());
    assert_eq!(config.delivery_method, DeliveryMethod::Smtp);

    let subscriptions = config.subscriptions.as_ref().unwrap();
    assert_eq!(subscriptions.len(), 2);
    let ops = &subscriptions["ops"];
    assert_eq!(ops.mail_to, "ops@example.com");
    assert_eq!(ops.days_of_week.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);

    assert!(config.validate().is_ok());
}

#[test]
fn minimal_section_gets_defaults() {
    let config = load_mailer("settings_valid.json", "mailer_minimal").unwrap();

    assert!(config.mail_to.is_none());
    assert!(config.reply_to.is_none());
    assert_eq!(config.admin_gui, "http://localhost:8080/");
    assert_eq!(config.smtp_address, "localhost");
    assert_eq!(config.smtp_port, 25);
    assert_eq!(config.smtp_domain, "localhost.localdomain");
    assert_eq!(config.smtp_authentication, SmtpAuthentication::Plain);
    assert_eq!(config.delivery_method, DeliveryMethod::Smtp);
    assert!(config.starttls_auto());
    assert!(config.subscriptions.is_none());
}

#[test]
fn string_days_of_week_accepted() {
    let config = load_mailer("settings_valid.json", DEFAULT_SECTION).unwrap();
    let weekend = &config.subscriptions.unwrap()["weekend"];

    assert!(weekend.is_active_on(Weekday::Sun));
    assert!(weekend.is_active_on(Weekday::Sat));
    assert!(!weekend.is_active_on(Weekday::Wed));
}

#[test]
fn load_yaml_settings() {
    let config = load_mailer("settings_valid.yaml", DEFAULT_SECTION).unwrap();

    assert_eq!(config.delivery_method, DeliveryMethod::Sendmail);
    assert_eq!(config.sendmail_location.as_deref(), Some("/usr/sbin/sendmail"));
    assert!(config.subscriptions.unwrap()["dba"].is_active_on(Weekday::Thu));
}

#[test]
fn missing_section_reported_by_name() {
    match load_mailer("settings_valid.json", "handler_mailer") {
        Err(ConfigError::MissingSection { name }) => assert_eq!(name, "handler_mailer"),
        other => panic!("Expected MissingSection, got {:?}", other),
    }
}

#[test]
fn load_nonexistent_file_returns_load_error() {
    match Settings::load(std::path::Path::new("/nonexistent/sensu/config.json")) {
        Err(ConfigError::LoadError(msg)) => assert!(msg.contains("/nonexistent/sensu/config.json")),
        other => panic!("Expected LoadError, got {:?}", other),
    }
}

#[test]
fn load_malformed_json_returns_validation_error() {
    assert!(matches!(
        Settings::load(&fixture_path("settings_malformed.json")),
        Err(ConfigError::ValidationError(_))
    ));
}

#[test]
fn out_of_range_day_rejected() {
    match load_mailer("settings_bad_day.json", DEFAULT_SECTION) {
        Err(ConfigError::ValidationError(msg)) => {
            assert!(msg.contains("out of range"), "unexpected message: {}", msg)
        }
        other => panic!("Expected ValidationError, got {:?}", other),
    }
}

#[test]
fn unknown_delivery_method_rejected() {
    let settings = Settings::from_value(serde_json::json!({
        "scheduled_mailer": {"mail_from": "a@example.com", "delivery_method": "carrier_pigeon"}
    }));
    assert!(matches!(
        settings.mailer(DEFAULT_SECTION),
        Err(ConfigError::ValidationError(_))
    ));
}

// ============================================================
// STARTTLS flag
// ============================================================

#[test]
fn starttls_only_disabled_by_false_string() {
    let cases = [
        (serde_json::json!("false"), false),
        (serde_json::json!("true"), true),
        (serde_json::json!(true), true),
        (serde_json::json!(false), true),
        (serde_json::json!("no"), true),
    ];

    for (flag, expected) in cases {
        let settings = Settings::from_value(serde_json::json!({
            "scheduled_mailer": {"mail_from": "a@example.com", "smtp_enable_starttls_auto": flag}
        }));
        let config = settings.mailer(DEFAULT_SECTION).unwrap();
        assert_eq!(config.starttls_auto(), expected, "flag {:?}", flag);
    }
}

// ============================================================
// Validation
// ============================================================

#[test]
fn validate_collects_all_errors() {
    let config = load_mailer("settings_invalid.json", DEFAULT_SECTION).unwrap();
    let errors = config.validate().unwrap_err();

    let fields: Vec<String> = errors
        .iter()
        .map(|e| match e {
            ConfigError::InvalidMailer { field, .. } => field.clone(),
            other => panic!("Expected InvalidMailer, got {:?}", other),
        })
        .collect();

    assert_eq!(
        fields,
        vec![
            "mail_from",
            "reply_to",
            "smtp_password",
            "subscriptions.ops.mail_to"
        ]
    );
}

#[test]
fn debug_output_hides_password() {
    let config = load_mailer("settings_valid.json", DEFAULT_SECTION).unwrap();
    let debug = format!("{:?}", config);
    assert!(debug.contains("[REDACTED]"));
    assert!(!debug.contains("\"secret\""));
}
