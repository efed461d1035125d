//! One-shot WebSocket exchanges with the dashboard backend.
//!
//! The backend serves Kubernetes node and Jupyter kernel-spec snapshots
//! over WebSocket endpoints. Every request opens a fresh socket, writes a
//! single JSON message, reads a single JSON reply, and closes. Each phase
//! is bounded by the configured timeout.
//!
//! A failed request on the backend side is answered with an
//! `{"ErrorMessage": "...", "Valid": true}` envelope instead of the
//! expected payload; that envelope surfaces as [`Error::Backend`].

use std::future::Future;
use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{ErrorMessage, KernelSpec, NodeMap};

/// Backend endpoint serving Kubernetes node snapshots.
pub const NODES_ENDPOINT: &str = "api/k8s-nodes";

/// Backend endpoint serving Jupyter kernel specs.
pub const KERNEL_SPEC_ENDPOINT: &str = "api/kernelspec";

/// Close code used when the stream ends without a close frame.
const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code used when a close frame carries no status.
const NO_STATUS: u16 = 1005;

/// Client for the dashboard backend's WebSocket endpoints.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: Url,
    timeout: Duration,
}

impl BackendClient {
    /// Create a client for the backend at `base_url`.
    ///
    /// `http`/`https` URLs are rewritten to `ws`/`wss`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Error> {
        let mut url = Url::parse(base_url)?;
        let ws_scheme = match url.scheme() {
            "ws" | "http" => "ws",
            "wss" | "https" => "wss",
            other => {
                return Err(Error::WebSocketConnect(format!(
                    "unsupported backend scheme '{other}'"
                )));
            }
        };
        url.set_scheme(ws_scheme).map_err(|()| {
            Error::WebSocketConnect(format!("cannot use scheme '{ws_scheme}' for {base_url}"))
        })?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }

        Ok(Self {
            base_url: url,
            timeout,
        })
    }

    /// The backend base URL (always `ws://` or `wss://`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Request the current Kubernetes nodes. When `spoof` is set, the
    /// backend fabricates them instead of querying the cluster.
    pub async fn request_nodes(&self, spoof: bool) -> Result<NodeMap, Error> {
        let message = json!({ "op": "request-nodes", "spoof-nodes": spoof });
        self.exchange(NODES_ENDPOINT, &message).await
    }

    /// Request the Jupyter kernel specs known to the backend.
    pub async fn request_kernel_specs(&self) -> Result<Vec<KernelSpec>, Error> {
        let message = json!({ "op": "request-kernel-specs" });
        self.exchange(KERNEL_SPEC_ENDPOINT, &message).await
    }

    // ── Private helpers ──────────────────────────────────────────────

    async fn exchange<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        message: &serde_json::Value,
    ) -> Result<T, Error> {
        let url = self.base_url.join(endpoint)?;
        debug!(%url, "opening backend websocket");

        let (mut ws, _response) = self
            .bounded(connect_async(url.as_str()))
            .await?
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        self.bounded(ws.send(Message::text(message.to_string())))
            .await?
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        let reply = self.bounded(read_reply(&mut ws)).await??;
        trace!(bytes = reply.len(), "received backend reply");

        if let Err(e) = ws.close(None).await {
            debug!(error = %e, "backend websocket close failed (non-fatal)");
        }

        decode_reply(&reply)
    }

    async fn bounded<F: Future>(&self, fut: F) -> Result<F::Output, Error> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            })
    }
}

/// Read frames until the first data frame arrives.
async fn read_reply<S>(ws: &mut S) -> Result<Vec<u8>, Error>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = ws.next().await {
        match frame.map_err(|e| Error::WebSocketConnect(e.to_string()))? {
            Message::Text(text) => return Ok(text.as_bytes().to_vec()),
            Message::Binary(data) => return Ok(data.to_vec()),
            Message::Close(frame) => {
                return Err(Error::WebSocketClosed {
                    code: frame.as_ref().map_or(NO_STATUS, |f| u16::from(f.code)),
                    reason: frame.map(|f| f.reason.to_string()).unwrap_or_default(),
                });
            }
            Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
        }
    }

    Err(Error::WebSocketClosed {
        code: ABNORMAL_CLOSURE,
        reason: "stream ended before a reply arrived".into(),
    })
}

fn decode_reply<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    let deserialization = |e: serde_json::Error| Error::Deserialization {
        message: e.to_string(),
        body: String::from_utf8_lossy(bytes).into_owned(),
    };

    let value: serde_json::Value = serde_json::from_slice(bytes).map_err(deserialization)?;

    if let Ok(envelope) = ErrorMessage::deserialize(&value) {
        if envelope.valid {
            return Err(Error::Backend {
                message: envelope.error_message,
            });
        }
    }

    serde_json::from_value(value).map_err(deserialization)
}
