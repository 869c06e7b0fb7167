//! I/O-free core of the envelope API client.
//!
//! # Overview
//! Classifies HTTP responses that follow the `meta.status` envelope
//! convention into a `NormalizedResult` or an `ApiError`, and folds the raw
//! transport events of one exchange into exactly one delivered outcome. The
//! network lives in `envelope-client`; everything here is deterministic.
//!
//! # Design
//! - `normalize` is an ordered classification over the body text, testable
//!   without a server.
//! - `Exchange` consumes `TransportEvent`s and settles on the first terminal
//!   one.
//! - `Completion` guards the caller's callback so it runs at most once, even
//!   if events race in from several threads.

pub mod envelope;
pub mod error;
pub mod exchange;
pub mod http;
pub mod normalize;
pub mod once;

pub use envelope::{extract_cursor, NormalizedResult, PageMeta};
pub use error::{ApiError, TransportError};
pub use exchange::{Abort, Exchange, Outcome, TransportEvent};
pub use http::{HttpMethod, RawResponse, RequestDescriptor, ResponseHead};
pub use normalize::{classify, is_truthy, normalize, Classification};
pub use once::Completion;
