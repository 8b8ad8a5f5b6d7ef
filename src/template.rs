//! Notification rendering: subject line and HTML body.
//!
//! The body is one fixed layout rendered with minijinja, then its newlines
//! are turned into `<br>` so the layout survives HTML mail clients.
//! Passwords passed on a check's command line are redacted from the output
//! and command before they are embedded.
//!
//! # Example
//!
//! ```ignore
//! use scheduled_mailer::template::NotificationRenderer;
//!
//! let renderer = NotificationRenderer::new("http://localhost:8080/");
//! let message = renderer.render(&event)?;
//! println!("{}", message.subject);
//! ```

use crate::error::TemplateError;
use crate::event::{Action, Event};
use chrono::{DateTime, Local};
use minijinja::{Environment, UndefinedBehavior, context};
use regex::Regex;
use std::sync::LazyLock;

/// Marker that replaces a redacted password.
pub const REDACTED_MARKER: &str = "<password redacted>";

const BODY_TEMPLATE: &str = "{{ output }}
Admin GUI: {{ admin_gui }}
Host: {{ client }}
{% if timestamp %}Timestamp: {{ timestamp }}
{% endif %}Address:  {{ address }}
Check Name:  {{ check }}
Command:  {{ command }}
Status:  {{ status }}
Occurrences:  {{ occurrences }}
{% if playbook %}Playbook:  {{ playbook }}{% endif %}";

static PASSWORD_FLAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(^|\s)(-p|-P|--password)\s+\S+").expect("valid regex")
});

/// Rendered notification ready for the mail transport.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMessage {
    pub subject: String,
    /// HTML body, newlines already converted to `<br>`.
    pub body_html: String,
}

/// Replace the value following `-p`, `-P` or `--password` with
/// [`REDACTED_MARKER`].
pub fn redact_passwords(text: &str) -> String {
    PASSWORD_FLAG_REGEX
        .replace_all(text, format!("${{1}}${{2}} {}", REDACTED_MARKER).as_str())
        .into_owned()
}

/// Human name of a check exit status.
pub fn status_text(status: i64) -> &'static str {
    match status {
        0 => "OK",
        1 => "WARNING",
        2 => "CRITICAL",
        _ => "UNKNOWN",
    }
}

fn action_label(action: Action) -> &'static str {
    match action {
        Action::Resolve => "RESOLVED",
        Action::Create | Action::Flapping => "ALERT",
    }
}

/// Builds the subject and body of a notification.
pub struct NotificationRenderer {
    env: Environment<'static>,
    admin_gui: String,
}

impl NotificationRenderer {
    /// `admin_gui` is the dashboard URL linked from every mail.
    pub fn new(admin_gui: impl Into<String>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);

        Self {
            env,
            admin_gui: admin_gui.into(),
        }
    }

    /// `"<ALERT|RESOLVED> - <client>/<check>: <status or notification>"`.
    pub fn subject(&self, event: &Event) -> String {
        let detail = event
            .check
            .notification
            .as_deref()
            .unwrap_or_else(|| status_text(event.check.status));

        format!(
            "{} - {}: {}",
            action_label(event.action),
            event.label(),
            detail
        )
    }

    /// Render the body before newline conversion.
    fn render_text(&self, event: &Event) -> Result<String, TemplateError> {
        let timestamp = event
            .check
            .issued
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|dt| {
                // Local, like the weekday used for subscription schedules
                dt.with_timezone(&Local)
                    .format("%Y-%m-%d %H:%M:%S %z")
                    .to_string()
            });

        self.env
            .render_str(
                BODY_TEMPLATE,
                context! {
                    output => redact_passwords(&event.check.output),
                    admin_gui => &self.admin_gui,
                    client => &event.client.name,
                    timestamp => timestamp,
                    address => &event.client.address,
                    check => &event.check.name,
                    command => redact_passwords(&event.check.command),
                    status => status_text(event.check.status),
                    occurrences => event.occurrences(),
                    playbook => &event.check.playbook,
                },
            )
            .map_err(|e| TemplateError::RenderFailed {
                message: e.to_string(),
            })
    }

    pub fn render(&self, event: &Event) -> Result<RenderedMessage, TemplateError> {
        let body = self.render_text(event)?;

        tracing::trace!(body_len = body.len(), "Notification rendered");
        Ok(RenderedMessage {
            subject: self.subject(event),
            body_html: body.replace('\n', "<br>"),
        })
    }
}

impl std::fmt::Debug for NotificationRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRenderer")
            .field("admin_gui", &self.admin_gui)
            .finish()
    }
}
