//! Environment variable substitution for SMTP credentials.

use crate::error::ConfigError;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static ENV_VAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));

/// Replaces every `${VAR_NAME}` in `value` with the variable's value.
///
/// All undefined variables are reported together.
pub fn resolve_env_vars(value: &str) -> Result<String, ConfigError> {
    let mut missing = Vec::new();

    let resolved = ENV_VAR_REGEX.replace_all(value, |caps: &Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| {
            missing.push(caps[1].to_string());
            String::new()
        })
    });

    if missing.is_empty() {
        Ok(resolved.into_owned())
    } else {
        Err(ConfigError::ValidationError(format!(
            "undefined environment variable{}: {}",
            if missing.len() > 1 { "s" } else { "" },
            missing.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn plain_value_unchanged() {
        assert_eq!(resolve_env_vars("mailer@example.com").unwrap(), "mailer@example.com");
    }

    #[test]
    #[serial]
    fn substitutes_defined_variable() {
        // SAFETY: Test marked #[serial] to prevent parallel execution with other env var tests
        unsafe { std::env::set_var("SCHEDULED_MAILER_TEST_PASS", "p4ss") };

        let resolved = resolve_env_vars("${SCHEDULED_MAILER_TEST_PASS}").unwrap();
        assert_eq!(resolved, "p4ss");

        let resolved = resolve_env_vars("prefix-${SCHEDULED_MAILER_TEST_PASS}-suffix").unwrap();
        assert_eq!(resolved, "prefix-p4ss-suffix");

        unsafe { std::env::remove_var("SCHEDULED_MAILER_TEST_PASS") };
    }

    #[test]
    #[serial]
    fn reports_all_undefined_variables() {
        // SAFETY: Test marked #[serial] to prevent parallel execution with other env var tests
        unsafe {
            std::env::remove_var("SCHEDULED_MAILER_MISSING_A");
            std::env::remove_var("SCHEDULED_MAILER_MISSING_B");
        }

        let err = resolve_env_vars("${SCHEDULED_MAILER_MISSING_A}:${SCHEDULED_MAILER_MISSING_B}")
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("variables"));
        assert!(message.contains("SCHEDULED_MAILER_MISSING_A"));
        assert!(message.contains("SCHEDULED_MAILER_MISSING_B"));
    }
}
