//! Async request issuer for APIs that wrap every response in a `meta.status`
//! envelope.
//!
//! # Overview
//! `request(timeout, secure)` builds a [`Requester`]. Each call to
//! [`Requester::issue`] sends one HTTP request and delivers exactly one
//! [`Outcome`] to its callback: a `NormalizedResult` with the data and
//! pagination cursors, or a classified `ApiError`. [`Requester::send`] is the
//! same call as a future.
//!
//! # Design
//! - Timeout and TLS are fixed at construction; nothing is configured per
//!   call.
//! - The network sits behind the [`Transport`] trait. [`HyperTransport`] is
//!   the default; tests swap in scripted transports.
//! - Response classification lives in `envelope-core` and never sees a
//!   socket.

pub mod config;
pub mod error;
pub mod request;
pub mod requester;
pub mod transport;

pub use config::ClientConfig;
pub use envelope_core::{
    ApiError, HttpMethod, NormalizedResult, Outcome, PageMeta, RawResponse, RequestDescriptor,
};
pub use error::ClientError;
pub use requester::{request, Requester};
pub use transport::{EventSender, HyperTransport, Transport};
