//! Error types for the ad admin API client.
//!
//! # Design
//! The adapter itself knows exactly one failure, [`ApiError`]: the server
//! answered with a status outside 200–299. Its `Display` is the bare message
//! so callers can show it to the user as-is. Everything else the workspace
//! can fail with is collected in [`ClientError`].

use thiserror::Error;

/// Message used when a failed response carries neither `message` nor
/// `detail`.
pub const FALLBACK_MESSAGE: &str = "API error";

/// A non-2xx response, reduced to one human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The request never produced a response (connection refused, DNS, TLS...).
///
/// Wraps the transport's own error without altering it; `source()` and
/// [`TransportError::into_inner`] give it back.
#[derive(Debug, Error)]
#[error("transport failure: {0}")]
pub struct TransportError(#[source] Box<dyn std::error::Error + Send + Sync>);

impl TransportError {
    pub fn new(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self(err.into())
    }

    pub fn into_inner(self) -> Box<dyn std::error::Error + Send + Sync> {
        self.0
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err)
    }
}

/// Errors returned by [`ApiClient`](crate::ApiClient) and
/// [`AdminClient`](crate::AdminClient).
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server rejected the request.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A successful payload did not match the expected shape.
    #[error("unexpected response payload: {0}")]
    Decode(#[source] serde_json::Error),

    /// A request payload could not be serialized to JSON.
    #[error("could not encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("could not encode query string: {0}")]
    Query(#[from] serde_urlencoded::ser::Error),
}

impl ClientError {
    /// The server's message, when the failure came from the server.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            ClientError::Api(err) => Some(&err.message),
            _ => None,
        }
    }
}
