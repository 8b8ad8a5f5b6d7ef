//! Command-line interface for scheduled-mailer using clap.
//!
//! The event itself arrives on stdin; flags only locate the settings.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::config::{DEFAULT_SECTION, DEFAULT_SETTINGS_PATH};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format for log aggregation.
    Json,
}

/// Mail an alert to its client's recipients and today's scheduled subscribers.
#[derive(Parser, Debug)]
#[command(name = "scheduled-mailer")]
#[command(version)]
#[command(about = "Mail an alert to its client's recipients and today's scheduled subscribers")]
pub struct Cli {
    /// Path to the settings document (JSON, or YAML by extension).
    #[arg(short = 'c', long = "config", default_value = DEFAULT_SETTINGS_PATH, env = "SENSU_CONFIG_FILE")]
    pub config: PathBuf,

    /// Name of the mailer section in the settings document.
    #[arg(short = 'j', long = "json-config", default_value = DEFAULT_SECTION)]
    pub json_config: String,

    /// Read the event from a file instead of stdin.
    #[arg(long = "event")]
    pub event: Option<PathBuf>,

    /// Validate the mailer settings and exit.
    #[arg(long = "validate")]
    pub validate: bool,

    /// Log format: text or json.
    #[arg(long = "log-format", value_enum, default_value_t = LogFormat::Text, env = "LOG_FORMAT")]
    pub log_format: LogFormat,
}
