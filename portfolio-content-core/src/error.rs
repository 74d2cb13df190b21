//! # error: failure taxonomy for content fetches
//!
//! Two layers of error live here:
//! - [`SourceError`] is what a [`crate::contract::ContentSource`] reports: raw transport or
//!   HTTP status facts, with no opinion about what they mean to a reader of the page.
//! - [`ContentError`] is what the gateway hands to callers: the failure classified into
//!   an [`ErrorKind`], tagged with the gateway operation that produced it.
//!
//! Every gateway operation returns `Result<_, ContentError>`. Nothing is swallowed; the
//! binding layer decides how to present a failure (see [`ContentError::user_message`]).

use serde::Serialize;
use thiserror::Error;

/// Classified failure kinds surfaced by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The space, environment or content type does not exist (HTTP 404).
    NotFound,
    /// The content service throttled the request (HTTP 429).
    RateLimited,
    /// The content service could not be reached.
    Network,
    /// No response arrived within the configured bound.
    Timeout,
    /// The response did not match the expected entry schema.
    Schema,
    /// The query was rejected locally before being sent.
    InvalidQuery,
    /// Anything else, including unexpected HTTP statuses.
    Unknown,
}

impl ErrorKind {
    /// Short, stable code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "E_CONTENT_NOT_FOUND",
            ErrorKind::RateLimited => "E_CONTENT_RATE_LIMITED",
            ErrorKind::Network => "E_CONTENT_NETWORK",
            ErrorKind::Timeout => "E_CONTENT_TIMEOUT",
            ErrorKind::Schema => "E_CONTENT_SCHEMA",
            ErrorKind::InvalidQuery => "E_CONTENT_QUERY",
            ErrorKind::Unknown => "E_CONTENT_UNKNOWN",
        }
    }
}

/// Raw failure reported by a content source, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// Non-2xx response from the remote service.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    /// Connection could not be established (refused, DNS, TLS handshake).
    #[error("connection failed: {0}")]
    Connect(String),

    /// The transport gave up waiting for a response.
    #[error("request timed out")]
    Timeout,

    /// The response body was not a valid entry collection.
    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

impl SourceError {
    /// Maps the raw failure onto the gateway taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SourceError::Http { status: 404, .. } => ErrorKind::NotFound,
            SourceError::Http { status: 429, .. } => ErrorKind::RateLimited,
            SourceError::Http { .. } => ErrorKind::Unknown,
            SourceError::Connect(_) => ErrorKind::Network,
            SourceError::Timeout => ErrorKind::Timeout,
            SourceError::Decode(_) => ErrorKind::Schema,
            SourceError::Other(_) => ErrorKind::Unknown,
        }
    }
}

/// A classified gateway failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} failed [{}]: {detail}", .kind.code())]
pub struct ContentError {
    kind: ErrorKind,
    operation: &'static str,
    detail: String,
    retry_after_secs: Option<u64>,
}

impl ContentError {
    pub fn new(kind: ErrorKind, operation: &'static str, detail: impl Into<String>) -> Self {
        Self {
            kind,
            operation,
            detail: detail.into(),
            retry_after_secs: None,
        }
    }

    /// Classifies a source failure for the given operation.
    pub fn from_source(operation: &'static str, err: &SourceError) -> Self {
        let retry_after_secs = match err {
            SourceError::Http {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        };
        Self {
            kind: err.kind(),
            operation,
            detail: err.to_string(),
            retry_after_secs,
        }
    }

    pub fn schema(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Schema, operation, detail)
    }

    pub fn timeout(operation: &'static str, after: std::time::Duration) -> Self {
        Self::new(
            ErrorKind::Timeout,
            operation,
            format!("no response after {}s", after.as_secs_f64()),
        )
    }

    pub fn invalid_query(operation: &'static str, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidQuery, operation, detail)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn retry_after_secs(&self) -> Option<u64> {
        self.retry_after_secs
    }

    /// Concise message for display next to the affected page section.
    pub fn user_message(&self) -> String {
        match self.kind {
            ErrorKind::NotFound => "The requested content could not be found.".to_string(),
            ErrorKind::RateLimited => match self.retry_after_secs {
                Some(secs) => format!(
                    "Too many requests to the content service. Please try again in {} seconds.",
                    secs
                ),
                None => "Too many requests to the content service. Please try again shortly."
                    .to_string(),
            },
            ErrorKind::Network => {
                "Unable to reach the content service. Please check your connection.".to_string()
            }
            ErrorKind::Timeout => "The content service took too long to respond.".to_string(),
            ErrorKind::Schema => {
                "The content service returned data in an unexpected format.".to_string()
            }
            ErrorKind::InvalidQuery => format!("Invalid content filter: {}", self.detail),
            ErrorKind::Unknown => "Something went wrong while loading content.".to_string(),
        }
    }
}
