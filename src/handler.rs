//! Event handling pipeline.
//!
//! ```text
//! filter.rs -> recipients.rs -> template.rs -> notify/
//! ```
//!
//! Each stage can stop the run: a repeated occurrence or an empty recipient
//! list aborts before anything is rendered or sent.

use crate::config::MailerConfig;
use crate::error::HandlerError;
use crate::event::Event;
use crate::filter::{FilterResult, check_occurrence};
use crate::notify::{DeliveryOutcome, MailDelivery};
use crate::recipients::{LocalWeekday, WeekdayProvider, resolve_recipients};
use crate::template::NotificationRenderer;
use std::fmt;
use tracing::Instrument;

/// Why a run stopped without sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// `create` with an occurrence count other than 1.
    RepeatedOccurrence,
    /// Neither an override, a default list nor a scheduled subscription.
    NoRecipients,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::RepeatedOccurrence => f.write_str("only handling first occurrence"),
            AbortReason::NoRecipients => f.write_str("no recipients found"),
        }
    }
}

/// How a handler run ended, short of a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    Aborted(AbortReason),
    Delivered(DeliveryOutcome),
}

impl HandlerOutcome {
    /// The single line written to stdout for this run.
    pub fn status_line(&self, event: &Event) -> String {
        match self {
            HandlerOutcome::Aborted(reason) => format!("{}: {}", reason, event.label()),
            HandlerOutcome::Delivered(outcome) => outcome.to_string(),
        }
    }
}

/// Runs one event through the filter, resolver, renderer and delivery.
pub struct MailHandler {
    config: MailerConfig,
    renderer: NotificationRenderer,
    delivery: MailDelivery,
    weekday: Box<dyn WeekdayProvider>,
}

impl MailHandler {
    /// Handler using the local wall-clock weekday.
    pub fn new(config: MailerConfig, delivery: MailDelivery) -> Self {
        let renderer = NotificationRenderer::new(config.admin_gui.clone());
        Self {
            config,
            renderer,
            delivery,
            weekday: Box::new(LocalWeekday),
        }
    }

    /// Replace the weekday source.
    pub fn with_weekday(mut self, weekday: impl WeekdayProvider + 'static) -> Self {
        self.weekday = Box::new(weekday);
        self
    }

    /// Handle one event.
    ///
    /// # Returns
    ///
    /// * `Ok(HandlerOutcome::Aborted)` - Suppressed or no recipients, nothing sent
    /// * `Ok(HandlerOutcome::Delivered)` - Sent, or timed out
    /// * `Err(HandlerError)` - Rendering or transport failure
    pub async fn handle(&self, event: &Event) -> Result<HandlerOutcome, HandlerError> {
        let span = tracing::info_span!(
            "handle_event",
            client = %event.client.name,
            check = %event.check.name,
            action = %event.action,
        );

        self.run(event).instrument(span).await
    }

    async fn run(&self, event: &Event) -> Result<HandlerOutcome, HandlerError> {
        if check_occurrence(event) == FilterResult::Suppressed {
            tracing::info!(occurrences = event.occurrences(), "Repeated occurrence, not mailing");
            return Ok(HandlerOutcome::Aborted(AbortReason::RepeatedOccurrence));
        }

        let Some(recipients) = resolve_recipients(event, &self.config, self.weekday.as_ref()) else {
            tracing::warn!("No recipients resolved");
            return Ok(HandlerOutcome::Aborted(AbortReason::NoRecipients));
        };

        let rendered = self.renderer.render(event)?;
        tracing::debug!(subject = %rendered.subject, recipients = %recipients, "Notification rendered");

        let outcome = self.delivery.deliver(event, &recipients, &rendered).await?;
        tracing::info!(sent = outcome.is_sent(), recipients = %recipients, "Delivery attempt complete");

        Ok(HandlerOutcome::Delivered(outcome))
    }
}

impl fmt::Debug for MailHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailHandler")
            .field("renderer", &self.renderer)
            .field("delivery", &self.delivery)
            .finish()
    }
}
