//! Issue one request and deliver exactly one outcome.
//!
//! # Design
//! `issue` spawns two tasks per call. The transport task performs the HTTP
//! exchange and reports events over a channel. The driver task owns the
//! `Exchange`, pulls events in order, and races them against the timeout.
//! On timeout the driver aborts the transport task. A third task watches the
//! driver and reports a transport error if it dies before settling. The
//! caller's callback is wrapped in a `Completion`, so no path can deliver
//! twice.

use std::sync::Arc;
use std::time::Duration;

use envelope_core::{
    is_truthy, Abort, ApiError, Completion, Exchange, Outcome, RequestDescriptor, TransportError,
    TransportEvent,
};
use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;
use tracing::{debug, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::request::build_request;
use crate::transport::{channel, HyperTransport, Transport};

/// Build a `Requester` over the default hyper transport.
///
/// ```ignore
/// let requester = envelope_client::request(Some(Duration::from_secs(3)), true)?;
/// let desc = RequestDescriptor::new(HttpMethod::Get, "api.example.com", "/v1/widgets")
///     .with_auth(format!("{api_key}:"));
/// let page = requester.send(&desc, None::<&()>).await?;
/// ```
pub fn request(timeout: Option<Duration>, secure: bool) -> Result<Requester, ClientError> {
    Requester::new(ClientConfig::new(timeout, secure))
}

/// Issues envelope requests with a fixed timeout and transport.
#[derive(Debug)]
pub struct Requester<T = HyperTransport> {
    config: ClientConfig,
    transport: Arc<T>,
}

impl<T> Clone for Requester<T> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            transport: Arc::clone(&self.transport),
        }
    }
}

impl Requester<HyperTransport> {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = HyperTransport::new(config.secure)?;
        Ok(Self::with_transport(config, transport))
    }
}

impl<T: Transport> Requester<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            config,
            transport: Arc::new(transport),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a request and call `on_complete` exactly once with its outcome.
    ///
    /// `payload`, when given and not JSON-falsy, is sent as the JSON request
    /// body. Must be
    /// called from within a tokio runtime; outside one, `on_complete`
    /// receives a transport error immediately.
    pub fn issue<P, F>(&self, descriptor: &RequestDescriptor, payload: Option<&P>, on_complete: F)
    where
        P: Serialize + ?Sized,
        F: FnOnce(Outcome) + Send + 'static,
    {
        let completion = Completion::new(on_complete);
        let span = info_span!(
            "request",
            id = %Uuid::new_v4(),
            method = %descriptor.method,
            host = %descriptor.hostname,
            path = %descriptor.path
        );

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                completion.complete(Err(ApiError::Transport(TransportError::new(e))));
                return;
            }
        };

        // Falsy payloads (`null`, `false`, `0`, `""`) send no body.
        let body = match payload.map(serde_json::to_value).transpose() {
            Ok(value) => value.filter(is_truthy).map(|value| value.to_string()),
            Err(e) => {
                completion.complete(Err(ApiError::Serialization(e)));
                return;
            }
        };

        let request = match build_request(descriptor, body, self.config.scheme()) {
            Ok(request) => request,
            Err(e) => {
                completion.complete(Err(ApiError::Transport(TransportError::new(e))));
                return;
            }
        };

        let deadline = self.config.timeout.map(|timeout| Instant::now() + timeout);
        let (events, receiver) = channel();
        let transport = runtime.spawn(
            self.transport
                .dispatch(request, events)
                .instrument(span.clone()),
        );
        let abort = transport.abort_handle();
        let abort_on_timeout = abort.clone();
        let watch = completion.clone();
        let exchange = Exchange::new(move || abort_on_timeout.abort(), completion);
        let driver = runtime.spawn(drive(exchange, receiver, deadline).instrument(span.clone()));

        // A driver that panics (e.g. no timer on the runtime) drops its
        // exchange unsettled; report that instead of going silent.
        runtime.spawn(
            async move {
                if let Err(e) = driver.await {
                    warn!(error = %e, "request driver failed");
                    abort.abort();
                    watch.complete(Err(ApiError::Transport(TransportError::new(e))));
                }
            }
            .instrument(span),
        );
    }

    /// `issue` as a future.
    pub async fn send<P>(&self, descriptor: &RequestDescriptor, payload: Option<&P>) -> Outcome
    where
        P: Serialize + ?Sized,
    {
        let (tx, rx) = oneshot::channel();
        self.issue(descriptor, payload, move |outcome| {
            let _ = tx.send(outcome);
        });
        rx.await.unwrap_or_else(|_| {
            Err(ApiError::Transport(TransportError::new(
                "request task ended without an outcome",
            )))
        })
    }
}

async fn drive<A: Abort>(
    mut exchange: Exchange<A>,
    mut events: mpsc::UnboundedReceiver<TransportEvent>,
    deadline: Option<Instant>,
) {
    let timer = async move {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(timer);

    while !exchange.is_settled() {
        tokio::select! {
            biased;
            event = events.recv() => {
                let event = event.unwrap_or_else(|| {
                    TransportEvent::Error(TransportError::new(
                        "transport closed before the response completed",
                    ))
                });
                exchange.handle(event);
            }
            () = &mut timer => exchange.handle(TransportEvent::TimedOut),
        }
    }
    debug!("exchange settled");
}
