//! The seam between a `Requester` and the network.
//!
//! A [`Transport`] starts one HTTP exchange and reports what it sees as
//! [`TransportEvent`]s on an [`EventSender`]. It never interprets the body;
//! the `Exchange` on the other side of the channel does that.

mod hyper;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use envelope_core::TransportEvent;
use http_body_util::Full;
use tokio::sync::mpsc;

pub use self::hyper::HyperTransport;

/// Request type handed to a transport.
pub type OutboundRequest = http::Request<Full<Bytes>>;

/// Work that drives one exchange to completion.
///
/// The requester runs it on its own task so a timeout can abort it.
pub type DispatchFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

pub trait Transport: Send + Sync + 'static {
    fn dispatch(&self, request: OutboundRequest, events: EventSender) -> DispatchFuture;
}

/// Sending half of an exchange's event channel.
#[derive(Debug, Clone)]
pub struct EventSender(mpsc::UnboundedSender<TransportEvent>);

impl EventSender {
    /// Report an event. Returns `false` once the exchange stopped listening,
    /// at which point the transport should stop producing.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.0.send(event).is_ok()
    }
}

pub(crate) fn channel() -> (EventSender, mpsc::UnboundedReceiver<TransportEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender(tx), rx)
}
