//! Client error types

use std::sync::Arc;

use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (transport)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid response format
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Authentication required (401); carries the backend message if any
    #[error("Authentication required{}", .0.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Unauthorized(Option<String>),

    /// Permission denied
    #[error("Permission denied: {0}")]
    Forbidden(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error, raised client-side before any request is sent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business-rule failure reported by the backend
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Local I/O error (storage, image files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The same mutation is already in flight
    #[error("{0} is already in progress")]
    Busy(&'static str),

    /// Error of a request shared by several cache readers
    #[error(transparent)]
    Shared(Arc<ClientError>),
}

impl From<Arc<ClientError>> for ClientError {
    fn from(e: Arc<ClientError>) -> Self {
        Arc::try_unwrap(e).unwrap_or_else(Self::Shared)
    }
}

impl ClientError {
    /// The message the backend put in the response body, if any
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } => Some(message),
            Self::Unauthorized(message) => message.as_deref(),
            Self::Shared(inner) => inner.backend_message(),
            _ => None,
        }
    }

    /// Backend message when present, otherwise `fallback`
    pub fn user_message(&self, fallback: &str) -> String {
        self.backend_message()
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback)
            .to_string()
    }

    /// Whether this is an authorization failure
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Unauthorized(_) => true,
            Self::Shared(inner) => inner.is_unauthorized(),
            _ => false,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
