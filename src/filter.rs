//! First-occurrence filter.
//!
//! A new alert condition is mailed once, when it first fires. Repeats of a
//! `create` are dropped; every other action goes through.

use crate::event::{Action, Event};

/// Result of the occurrence check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterResult {
    /// Event continues down the pipeline.
    Pass,
    /// Repeated occurrence of a `create`, nothing further happens.
    Suppressed,
}

/// Decide whether an event continues.
pub fn check_occurrence(event: &Event) -> FilterResult {
    if event.action != Action::Create {
        return FilterResult::Pass;
    }

    let occurrences = event.occurrences();
    if occurrences == 1 {
        FilterResult::Pass
    } else {
        tracing::debug!(
            client = %event.client.name,
            check = %event.check.name,
            occurrences,
            "Repeated occurrence, suppressing"
        );
        FilterResult::Suppressed
    }
}
