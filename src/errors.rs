/*!
 * Error types for the epubtrans application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use serde::Serialize;
use thiserror::Error;

/// Errors produced by a single call to a translation backend.
///
/// The retry layer classifies these into [`FailureKind`]s by variant and
/// status code only, so providers must pick variants from the response they
/// actually observed rather than encoding guesses into the message.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error establishing or maintaining a connection (includes timeouts)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String,
    },

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// The API answered, but not with usable translated text
    #[error("Unusable response: {0}")]
    UnusableResponse(String),
}

/// Terminal failure categories for a node translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Retryable backend/transport issue
    Transient,
    /// Retryable; backend answered but the content could not be used
    ResponseFormat,
    /// Non-retryable; bad model name or parameters
    Configuration,
}

impl FailureKind {
    /// Classify a provider error into a failure kind.
    ///
    /// Server-side (5xx) and transport errors are transient; client-side
    /// (4xx) errors mean the request itself was bad, which only a config
    /// change can fix.
    pub fn from_provider_error(error: &ProviderError) -> Self {
        match error {
            ProviderError::ConnectionError(_) => Self::Transient,
            ProviderError::ApiError { status_code, .. } if *status_code >= 500 => Self::Transient,
            ProviderError::ApiError { .. } => Self::Configuration,
            ProviderError::ParseError(_) => Self::Transient,
            ProviderError::UnusableResponse(_) => Self::ResponseFormat,
        }
    }

    /// Whether another attempt can change the outcome
    pub fn is_retryable(self) -> bool {
        self != Self::Configuration
    }

    /// Stable identifier used in reports
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::ResponseFormat => "response_format",
            Self::Configuration => "configuration",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Fatal application errors that terminate the run with a non-zero exit.
///
/// Node-level translation failures never appear here; they are contained in
/// the report. These variants are for damage the pipeline cannot work around.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed chapter markup (unbalanced or truncated tree)
    #[error("Malformed chapter markup: {0}")]
    Structural(String),

    /// Error reading or unpacking the input EPUB
    #[error("EPUB read error: {0}")]
    EpubRead(String),

    /// Failure to persist the transformed EPUB or the report
    #[error("Failed to write {target}: {detail}")]
    Persistence {
        /// What was being written
        target: String,
        /// Underlying cause
        detail: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}
