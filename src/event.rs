//! Incoming event model.
//!
//! One event arrives per invocation from the monitoring pipeline, as JSON.
//! It is parsed once and only read afterwards.

use crate::error::EventError;
use serde::Deserialize;
use std::fmt;
use std::io::Read;

/// What the pipeline is doing with the incident.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Create,
    Resolve,
    Flapping,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Resolve => "resolve",
            Action::Flapping => "flapping",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The monitored host.
#[derive(Debug, Clone, Deserialize)]
pub struct Client {
    pub name: String,
    #[serde(default)]
    pub address: String,
    /// Per-client recipient override.
    #[serde(default)]
    pub mail_to: Option<String>,
}

/// The check result that triggered the event.
#[derive(Debug, Clone, Deserialize)]
pub struct Check {
    pub name: String,
    /// Exit status: 0 OK, 1 WARNING, 2 CRITICAL, anything else UNKNOWN.
    #[serde(default)]
    pub status: i64,
    #[serde(default)]
    pub output: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub playbook: Option<String>,
    /// Replaces the status text in the subject line.
    #[serde(default)]
    pub notification: Option<String>,
    #[serde(default)]
    pub subscribers: Vec<String>,
    #[serde(default)]
    pub occurrences: Option<i64>,
    /// Unix timestamp of the check execution.
    #[serde(default)]
    pub issued: Option<i64>,
}

/// A single alert event.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub client: Client,
    pub check: Check,
    #[serde(default)]
    pub action: Action,
    /// Event-level occurrence count, used when the check carries none.
    #[serde(default)]
    pub occurrences: Option<i64>,
}

impl Event {
    /// Parse an event from a JSON string.
    pub fn from_json(input: &str) -> Result<Self, EventError> {
        serde_json::from_str(input).map_err(|e| EventError::InvalidJson(e.to_string()))
    }

    /// Read and parse an event from any reader (stdin in production).
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, EventError> {
        let mut input = String::new();
        reader
            .read_to_string(&mut input)
            .map_err(|e| EventError::ReadFailed(e.to_string()))?;
        Self::from_json(&input)
    }

    /// Number of consecutive occurrences of this condition.
    ///
    /// Absent counts are treated as a first occurrence.
    pub fn occurrences(&self) -> i64 {
        self.check.occurrences.or(self.occurrences).unwrap_or(1)
    }

    /// `client/check` label used in status lines and logs.
    pub fn label(&self) -> String {
        format!("{}/{}", self.client.name, self.check.name)
    }
}
