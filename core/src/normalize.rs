//! Classify a received body under the envelope convention.
//!
//! # Design
//! `classify` is a flat, ordered list of checks over the body text. The first
//! check that matches decides the outcome, so the order below is the
//! contract:
//!
//! 1. empty body
//! 2. body is not JSON
//! 3. no object `meta`, or falsy `meta.status`
//! 4. `meta.status == "ok"`
//! 5. `meta.status == "error"`
//! 6. any other status
//!
//! `normalize` attaches the `RawResponse` to whichever error comes out.
//! HTTP status codes play no part; the envelope alone decides.

use serde_json::{Map, Value};
use tracing::debug;

use crate::envelope::{extract_cursor, NormalizedResult, PageMeta};
use crate::error::ApiError;
use crate::http::RawResponse;

/// Tagged outcome of classifying a body, independent of any response.
#[derive(Debug)]
pub enum Classification {
    Empty,
    NotJson(serde_json::Error),
    InvalidEnvelope,
    Success(NormalizedResult),
    ServerError { message: String },
    UnknownStatus { status: String },
}

pub fn classify(body: &str) -> Classification {
    if body.is_empty() {
        return Classification::Empty;
    }

    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => return Classification::NotJson(e),
    };

    let Some((envelope, status)) = envelope_status(&parsed) else {
        return Classification::InvalidEnvelope;
    };

    match status.as_str() {
        Some("ok") => Classification::Success(success(envelope)),
        Some("error") => match server_message(envelope) {
            Some(message) => Classification::ServerError { message },
            None => Classification::InvalidEnvelope,
        },
        _ => Classification::UnknownStatus {
            status: js_string(status),
        },
    }
}

/// Turn a complete response into the caller-facing result.
pub fn normalize(response: RawResponse) -> Result<NormalizedResult, ApiError> {
    let classification = classify(&response.body);
    debug!(
        status = response.status,
        outcome = classification.label(),
        "classified response"
    );

    let response = Box::new(response);
    match classification {
        Classification::Success(result) => Ok(result),
        Classification::Empty => Err(ApiError::EmptyResponse { response }),
        Classification::NotJson(source) => Err(ApiError::Json { response, source }),
        Classification::InvalidEnvelope => Err(ApiError::InvalidResponse { response }),
        Classification::ServerError { message } => Err(ApiError::Server { message, response }),
        Classification::UnknownStatus { status } => {
            Err(ApiError::UnknownStatus { status, response })
        }
    }
}

impl Classification {
    fn label(&self) -> &'static str {
        match self {
            Classification::Empty => "empty",
            Classification::NotJson(_) => "not_json",
            Classification::InvalidEnvelope => "invalid_envelope",
            Classification::Success(_) => "ok",
            Classification::ServerError { .. } => "server_error",
            Classification::UnknownStatus { .. } => "unknown_status",
        }
    }
}

/// The envelope object and its `meta.status`, if `meta` is an object and the
/// status is truthy.
fn envelope_status(parsed: &Value) -> Option<(&Map<String, Value>, &Value)> {
    let envelope = parsed.as_object()?;
    let status = envelope.get("meta")?.as_object()?.get("status")?;
    is_truthy(status).then_some((envelope, status))
}

fn success(envelope: &Map<String, Value>) -> NormalizedResult {
    let data = envelope
        .get("object")
        .or_else(|| envelope.get("objects"))
        .cloned();
    let meta = envelope.get("meta").and_then(Value::as_object);
    NormalizedResult {
        data,
        meta: PageMeta {
            next: extract_cursor(meta.and_then(|m| m.get("next"))),
            previous: extract_cursor(meta.and_then(|m| m.get("previous"))),
        },
    }
}

fn server_message(envelope: &Map<String, Value>) -> Option<String> {
    let message = envelope.get("error")?.as_object()?.get("message")?;
    is_truthy(message).then(|| js_string(message))
}

/// JavaScript truthiness for a JSON value.
/// JavaScript truthiness: `null`, `false`, `0` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Strings render bare; everything else renders as its JSON text.
fn js_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
