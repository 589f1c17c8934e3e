//! Error types for the SEO dashboard.
//!
//! This module provides structured error handling with:
//! - `AppError`: Domain-specific errors for dashboard operations
//! - `FetchErrorKind`: Why live page data could not be obtained
//! - `CommandError`: Wrapper for command-layer errors (serializable)
//! - `Result<T>`: Type alias for Results using AppError

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// FETCH FAILURE TAXONOMY
// ============================================================================

/// Reason a live fetch failed and simulated data is shown instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchErrorKind {
    /// The target refused automated cross-origin access (401/403/429/451, bot walls).
    Cors,
    /// Connection, DNS or TLS failure.
    Network,
    /// The response could not be decoded as an HTML document.
    Parsing,
    /// The request did not complete within the configured timeout.
    Timeout,
}

impl FetchErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchErrorKind::Cors => "cors",
            FetchErrorKind::Network => "network",
            FetchErrorKind::Parsing => "parsing",
            FetchErrorKind::Timeout => "timeout",
        }
    }

    /// Short explanation shown next to simulated data.
    pub fn explanation(&self) -> &'static str {
        match self {
            FetchErrorKind::Cors => "the site refused automated access",
            FetchErrorKind::Network => "the site could not be reached",
            FetchErrorKind::Parsing => "the response was not a readable HTML page",
            FetchErrorKind::Timeout => "the site took too long to respond",
        }
    }

    /// Classify an HTTP status that blocks analysis, if any.
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            401 | 403 | 429 | 451 => Some(FetchErrorKind::Cors),
            _ => None,
        }
    }
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&reqwest::Error> for FetchErrorKind {
    fn from(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchErrorKind::Timeout
        } else if e.is_decode() || e.is_body() {
            FetchErrorKind::Parsing
        } else if let Some(kind) = e.status().and_then(|s| Self::from_status(s.as_u16())) {
            kind
        } else {
            FetchErrorKind::Network
        }
    }
}

// ============================================================================
// DOMAIN ERROR TYPE
// ============================================================================

/// Domain-specific errors for dashboard operations.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid or malformed URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Caller supplied an unusable value
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Live fetch failed
    #[error("Fetch failed ({kind}): {message}")]
    Fetch { kind: FetchErrorKind, message: String },

    /// Job not found
    #[error("Job not found: {0}")]
    JobNotFound(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Job was cancelled
    #[error("Job cancelled")]
    Cancelled,

    /// Generic error with context
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Create a fetch error
    pub fn fetch(kind: FetchErrorKind, msg: impl Into<String>) -> Self {
        Self::Fetch {
            kind,
            message: msg.into(),
        }
    }

    /// Create an input validation error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The fetch failure kind, when this error came from a live fetch.
    pub fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            Self::Fetch { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        Self::fetch(FetchErrorKind::from(&e), e.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

/// Result type alias using AppError.
pub type Result<T> = std::result::Result<T, AppError>;

// ============================================================================
// COMMAND ERROR
// ============================================================================

/// Wrapper for errors returned from dashboard commands.
/// This type is serializable and can be sent to the frontend.
#[derive(Debug)]
pub struct CommandError(pub anyhow::Error);

impl std::error::Error for CommandError {}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for CommandError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{:#}", self.0))
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(error: anyhow::Error) -> Self {
        Self(error)
    }
}

impl From<AppError> for CommandError {
    fn from(error: AppError) -> Self {
        Self(error.into())
    }
}
