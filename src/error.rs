//! Error types for SDK operations

use thiserror::Error;

/// Result type alias for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

/// Errors raised by collections, gateways and the transport
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SdkError {
    /// Lookup or delete by a name (or id) the collection does not hold
    #[error("No {kind} exists with name: {name}")]
    NotFound { kind: String, name: String },

    /// The server answered, but the status or body reports a failure
    #[error("{}", format_request_failed(.status, .detail))]
    RequestFailed { status: Option<u16>, detail: String },

    /// The request never reached the server (connect, TLS, timeout)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A required service address or setting is missing or invalid
    #[error("Configuration error: {0}")]
    Configuration(String),
}

fn format_request_failed(status: &Option<u16>, detail: &str) -> String {
    match status {
        Some(status) => format!("Request failed with status {}: {}", status, detail),
        None => format!("Request failed: {}", detail),
    }
}

impl SdkError {
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn request_failed(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            detail: detail.into(),
        }
    }

    /// Creation refused locally: the collection already holds `name`
    pub fn already_exists(kind: &str, name: &str) -> Self {
        Self::request_failed(None, format!("{} already exists: {}", kind, name))
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Transport failures are usually worth retrying; application failures are not.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// HTTP status attached to the error, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RequestFailed { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SdkError {
    fn from(error: reqwest::Error) -> Self {
        // Include the source chain
        let mut message = error.to_string();
        let mut source = std::error::Error::source(&error);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Transport(message)
    }
}

impl From<url::ParseError> for SdkError {
    fn from(error: url::ParseError) -> Self {
        Self::Configuration(format!("Invalid URL: {}", error))
    }
}
