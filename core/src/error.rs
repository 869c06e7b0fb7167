//! Error types for envelope requests.
//!
//! # Design
//! Errors synthesized from a received response carry the `RawResponse` so the
//! caller can inspect what the server sent. Transport and timeout errors
//! happen before a complete response exists and carry none.

use std::error::Error as StdError;
use std::fmt;

use crate::http::RawResponse;

/// Failure reported by the underlying connection layer (DNS, connect, reset).
///
/// Displays exactly as the wrapped error does.
#[derive(Debug)]
pub struct TransportError(Box<dyn StdError + Send + Sync>);

impl TransportError {
    pub fn new<E>(source: E) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync>>,
    {
        Self(source.into())
    }

    pub fn get_ref(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StdError for TransportError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.0.source()
    }
}

/// Every way a single envelope request can fail.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The connection layer failed; passed through unmodified.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The configured timeout elapsed and the request was aborted.
    #[error("Request timed out")]
    Timeout,

    /// The outgoing payload could not be encoded as JSON.
    #[error("Error serializing request payload: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("Client received an empty response from the server")]
    EmptyResponse { response: Box<RawResponse> },

    #[error("Error parsing response as JSON: {}", response.body)]
    Json {
        response: Box<RawResponse>,
        #[source]
        source: serde_json::Error,
    },

    /// The body is JSON but does not follow the envelope shape.
    #[error("Invalid response: {}", response.body)]
    InvalidResponse { response: Box<RawResponse> },

    /// The server answered with `meta.status == "error"`.
    #[error("{message}")]
    Server {
        message: String,
        response: Box<RawResponse>,
    },

    #[error("Unknown status: {status}")]
    UnknownStatus {
        status: String,
        response: Box<RawResponse>,
    },
}

impl ApiError {
    /// The response this error was derived from, if one was received.
    pub fn response(&self) -> Option<&RawResponse> {
        match self {
            ApiError::EmptyResponse { response }
            | ApiError::Json { response, .. }
            | ApiError::InvalidResponse { response }
            | ApiError::Server { response, .. }
            | ApiError::UnknownStatus { response, .. } => Some(response.as_ref()),
            ApiError::Transport(_) | ApiError::Timeout | ApiError::Serialization(_) => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(body: &str) -> Box<RawResponse> {
        Box::new(RawResponse {
            status: 500,
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    #[test]
    fn transport_error_displays_source_verbatim() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        let err = ApiError::from(TransportError::new(io));
        assert_eq!(err.to_string(), "connection refused");
        assert!(err.response().is_none());
    }

    #[test]
    fn timeout_has_fixed_message_and_no_response() {
        assert_eq!(ApiError::Timeout.to_string(), "Request timed out");
        assert!(ApiError::Timeout.response().is_none());
        assert!(ApiError::Timeout.is_timeout());
    }

    #[test]
    fn response_errors_expose_response() {
        let err = ApiError::Server {
            message: "nope".to_string(),
            response: response("{}"),
        };
        assert_eq!(err.to_string(), "nope");
        assert_eq!(err.response().map(|r| r.status), Some(500));
    }

    #[test]
    fn invalid_response_embeds_raw_body() {
        let err = ApiError::InvalidResponse {
            response: response(r#"{"meta":{}}"#),
        };
        assert_eq!(err.to_string(), r#"Invalid response: {"meta":{}}"#);
    }
}
