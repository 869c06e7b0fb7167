//! Event-driven state machine for one request/response exchange.
//!
//! # Design
//! The transport reports what happens on the wire as `TransportEvent`s and
//! the exchange folds them into a single result. Body chunks are appended in
//! the order they are handed in; the body is decoded and normalized only at
//! `End`. The first terminal event (`End`, `Error`, `TimedOut`) settles the
//! exchange; anything after that is logged and dropped.

use bytes::Bytes;
use tracing::{trace, warn};

use crate::envelope::NormalizedResult;
use crate::error::{ApiError, TransportError};
use crate::http::{RawResponse, ResponseHead};
use crate::normalize::normalize;
use crate::once::Completion;

/// Result delivered to the caller of one request.
pub type Outcome = Result<NormalizedResult, ApiError>;

/// Something the transport observed during an exchange.
#[derive(Debug)]
pub enum TransportEvent {
    /// Status line and headers arrived.
    Response(ResponseHead),
    /// A chunk of the response body.
    Data(Bytes),
    /// The response body is complete.
    End,
    /// The connection layer failed.
    Error(TransportError),
    /// The configured timeout elapsed.
    TimedOut,
}

impl TransportEvent {
    fn label(&self) -> &'static str {
        match self {
            TransportEvent::Response(_) => "response",
            TransportEvent::Data(_) => "data",
            TransportEvent::End => "end",
            TransportEvent::Error(_) => "error",
            TransportEvent::TimedOut => "timeout",
        }
    }
}

/// Cancels the in-flight transport work when the timer fires.
pub trait Abort {
    fn abort(&self);
}

impl<F: Fn()> Abort for F {
    fn abort(&self) {
        self()
    }
}

enum State {
    AwaitingHead,
    Receiving { head: ResponseHead, body: Vec<u8> },
    Settled,
}

pub struct Exchange<A> {
    state: State,
    abort: A,
    completion: Completion<Outcome>,
}

impl<A: Abort> Exchange<A> {
    pub fn new(abort: A, completion: Completion<Outcome>) -> Self {
        Self {
            state: State::AwaitingHead,
            abort,
            completion,
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self.state, State::Settled)
    }

    pub fn handle(&mut self, event: TransportEvent) {
        let state = std::mem::replace(&mut self.state, State::Settled);
        match (state, event) {
            (State::Settled, event) => {
                trace!(event = event.label(), "ignoring event after completion");
            }
            (_, TransportEvent::TimedOut) => {
                warn!("request timed out, aborting");
                self.abort.abort();
                self.settle(Err(ApiError::Timeout));
            }
            (_, TransportEvent::Error(e)) => {
                warn!(error = %e, "transport error");
                self.settle(Err(ApiError::Transport(e)));
            }
            (State::AwaitingHead, TransportEvent::Response(head)) => {
                self.state = State::Receiving {
                    head,
                    body: Vec::new(),
                };
            }
            (State::Receiving { head, mut body }, TransportEvent::Data(chunk)) => {
                body.extend_from_slice(&chunk);
                self.state = State::Receiving { head, body };
            }
            (State::Receiving { head, body }, TransportEvent::End) => {
                let response = RawResponse {
                    status: head.status,
                    headers: head.headers,
                    body: String::from_utf8_lossy(&body).into_owned(),
                };
                self.settle(normalize(response));
            }
            (State::AwaitingHead, TransportEvent::End) => {
                let e = TransportError::new("connection closed before a response was received");
                warn!(error = %e, "transport error");
                self.settle(Err(ApiError::Transport(e)));
            }
            (state, event) => {
                trace!(event = event.label(), "ignoring out-of-order event");
                self.state = state;
            }
        }
    }

    fn settle(&mut self, outcome: Outcome) {
        self.state = State::Settled;
        self.completion.complete(outcome);
    }
}
