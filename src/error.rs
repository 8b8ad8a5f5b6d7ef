//! Centralized error types for scheduled-mailer using thiserror.
//!
//! Expected aborts (a repeated occurrence, no recipients) are not errors:
//! they are reported through [`crate::handler::HandlerOutcome`]. Everything
//! here ends the invocation with a failure.

use thiserror::Error;

/// Errors related to settings loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load settings file: {0}")]
    LoadError(String),
    #[error("invalid configuration: {0}")]
    ValidationError(String),
    #[error("settings section '{name}' not found")]
    MissingSection { name: String },
    #[error("invalid mailer setting '{field}': {message}")]
    InvalidMailer { field: String, message: String },
}

/// Errors related to reading the incoming event.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("failed to read event: {0}")]
    ReadFailed(String),
    #[error("invalid event JSON: {0}")]
    InvalidJson(String),
}

/// Errors related to notification rendering.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("template render failed: {message}")]
    RenderFailed { message: String },
}

/// Errors related to building and sending the mail.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("invalid address '{address}': {message}")]
    InvalidAddress { address: String, message: String },
    #[error("failed to build email: {0}")]
    BuildFailed(String),
    #[error("failed to send notification: {0}")]
    SendFailed(String),
}

/// Errors that abort a handler run.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("notify error: {0}")]
    Notify(#[from] NotifyError),
}
