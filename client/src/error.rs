//! Errors raised while constructing a `Requester`.
//!
//! Failures of an individual request are `envelope_core::ApiError` and are
//! delivered through the completion callback instead.

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The rustls client configuration could not be built.
    #[error("TLS configuration failed: {0}")]
    Tls(#[from] rustls::Error),

    /// A `ClientConfig` could not be read.
    #[error("invalid client configuration: {0}")]
    Config(#[from] serde_json::Error),
}
