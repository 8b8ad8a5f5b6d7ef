//! Recipient resolution.
//!
//! The base list is the client's `mail_to` override, or the mailer's default
//! list. Every subscription named by the check that is scheduled for today
//! is appended to it. Subscriptions only ever add addresses.

use crate::config::MailerConfig;
use crate::event::Event;
use chrono::{Datelike, Local, Weekday};
use std::fmt;

/// Source of the current weekday.
pub trait WeekdayProvider: Send + Sync {
    fn today(&self) -> Weekday;
}

/// Weekday of the local wall clock at call time.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalWeekday;

impl WeekdayProvider for LocalWeekday {
    fn today(&self) -> Weekday {
        Local::now().weekday()
    }
}

/// A fixed day, for tests and replays.
impl WeekdayProvider for Weekday {
    fn today(&self) -> Weekday {
        *self
    }
}

/// Recipients found for one event, in resolution order.
///
/// Each entry is one configured `mail_to` value, an address list that may
/// hold several mailboxes. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRecipients {
    entries: Vec<String>,
}

impl ResolvedRecipients {
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

impl fmt::Display for ResolvedRecipients {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.entries.join(", "))
    }
}

/// Compute the recipients for `event`.
///
/// Returns `None` when neither an override, a default list nor a scheduled
/// subscription yields an address. Duplicates are kept.
pub fn resolve_recipients(
    event: &Event,
    config: &MailerConfig,
    weekday: &dyn WeekdayProvider,
) -> Option<ResolvedRecipients> {
    let mut entries: Vec<String> = non_blank(event.client.mail_to.as_deref())
        .or_else(|| non_blank(config.mail_to.as_deref()))
        .map(str::to_string)
        .into_iter()
        .collect();

    if let Some(subscriptions) = &config.subscriptions {
        let today = weekday.today();
        for subscriber in &event.check.subscribers {
            let Some(subscription) = subscriptions.get(subscriber) else {
                continue;
            };
            if !subscription.is_active_on(today) {
                tracing::debug!(subscriber = %subscriber, day = %today, "Subscription not scheduled today");
                continue;
            }
            let mail_to = subscription.mail_to.trim();
            if !mail_to.is_empty() {
                entries.push(mail_to.to_string());
            }
        }
    }

    if entries.is_empty() {
        None
    } else {
        Some(ResolvedRecipients { entries })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
