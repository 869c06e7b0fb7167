//! Default transport over hyper_util's legacy client.
//!
//! Plaintext and TLS are fixed when the transport is built: a plaintext
//! transport never touches rustls, and a TLS transport only dials `https`.

use std::sync::Arc;

use bytes::Bytes;
use envelope_core::{ResponseHead, TransportError, TransportEvent};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use ::hyper::body::Incoming;
use ::hyper::Response;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use rustls::ClientConfig;

use super::{DispatchFuture, EventSender, OutboundRequest, Transport};
use crate::error::ClientError;

#[derive(Clone)]
enum Connector {
    Plain(Client<HttpConnector, Full<Bytes>>),
    Tls(Client<HttpsConnector<HttpConnector>, Full<Bytes>>),
}

/// HTTP/1.1 transport with optional rustls TLS and Mozilla root certificates.
///
/// Idle connections are not kept, so every request dials its own connection.
#[derive(Clone)]
pub struct HyperTransport {
    connector: Connector,
}

impl std::fmt::Debug for HyperTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HyperTransport")
            .field("secure", &self.is_secure())
            .finish_non_exhaustive()
    }
}

impl HyperTransport {
    pub fn new(secure: bool) -> Result<Self, ClientError> {
        if secure {
            Self::tls()
        } else {
            Ok(Self::plaintext())
        }
    }

    pub fn plaintext() -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(HttpConnector::new());
        Self {
            connector: Connector::Plain(client),
        }
    }

    pub fn tls() -> Result<Self, ClientError> {
        let connector = HttpsConnectorBuilder::new()
            .with_tls_config(default_tls_config()?)
            .https_only()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new())
            .pool_max_idle_per_host(0)
            .build(connector);
        Ok(Self {
            connector: Connector::Tls(client),
        })
    }

    pub fn is_secure(&self) -> bool {
        matches!(self.connector, Connector::Tls(_))
    }
}

impl Transport for HyperTransport {
    fn dispatch(&self, request: OutboundRequest, events: EventSender) -> DispatchFuture {
        let response = match &self.connector {
            Connector::Plain(client) => client.request(request),
            Connector::Tls(client) => client.request(request),
        };
        Box::pin(async move {
            match response.await {
                Ok(response) => stream_response(response, events).await,
                Err(e) => {
                    events.emit(TransportEvent::Error(TransportError::new(e)));
                }
            }
        })
    }
}

/// Ring crypto with the bundled webpki root store.
fn default_tls_config() -> Result<ClientConfig, ClientError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    Ok(ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth())
}

async fn stream_response(response: Response<Incoming>, events: EventSender) {
    let (parts, mut body) = response.into_parts();
    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| Some((name.to_string(), value.to_str().ok()?.to_string())))
        .collect();
    let head = ResponseHead {
        status: parts.status.as_u16(),
        headers,
    };
    if !events.emit(TransportEvent::Response(head)) {
        return;
    }

    while let Some(frame) = body.frame().await {
        match frame {
            Ok(frame) => {
                // Trailers carry nothing the envelope needs.
                let Ok(chunk) = frame.into_data() else {
                    continue;
                };
                if !events.emit(TransportEvent::Data(chunk)) {
                    return;
                }
            }
            Err(e) => {
                events.emit(TransportEvent::Error(TransportError::new(e)));
                return;
            }
        }
    }

    events.emit(TransportEvent::End);
}
