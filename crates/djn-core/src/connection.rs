// ── Cluster Gateway connection ──
//
// One connection is shared by every provider. A live connection builds a
// `GatewayClient` and probes the gateway before reporting success; a
// spoofed one waits a fixed delay and never touches the network.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use djn_api::{GatewayClient, TransportConfig};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::config::DashboardConfig;
use crate::error::CoreError;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected { address: String },
    Failed { address: String, reason: String },
}

enum ConnectionMode {
    Live { transport: TransportConfig },
    Spoofed { delay: Duration },
}

// ── GatewayConnection ────────────────────────────────────────────

/// The (possibly absent) connection to the Cluster Gateway.
///
/// Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct GatewayConnection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    mode: ConnectionMode,
    state: watch::Sender<ConnectionState>,
    /// Populated only while a live connection is up.
    client: ArcSwapOption<GatewayClient>,
    /// Serializes connect/disconnect so concurrent callers see one attempt.
    connect_lock: Mutex<()>,
}

impl GatewayConnection {
    /// A connection that talks to a real gateway.
    pub fn live(transport: TransportConfig) -> Self {
        Self::with_mode(ConnectionMode::Live { transport })
    }

    /// A stand-in that always succeeds after `delay`.
    pub fn spoofed(delay: Duration) -> Self {
        Self::with_mode(ConnectionMode::Spoofed { delay })
    }

    pub fn from_config(config: &DashboardConfig) -> Self {
        if config.spoof_cluster {
            Self::spoofed(config.spoof_connect_delay)
        } else {
            Self::live(config.transport())
        }
    }

    fn with_mode(mode: ConnectionMode) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(ConnectionInner {
                mode,
                state,
                client: ArcSwapOption::empty(),
                connect_lock: Mutex::new(()),
            }),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Connect to the gateway at `address`.
    ///
    /// A no-op if already connected to the same address. On failure the
    /// state becomes [`Failed`](ConnectionState::Failed) and the error is
    /// returned; there is no automatic retry. A spoofed connection accepts
    /// any address, including an empty one.
    pub async fn connect(&self, address: &str) -> Result<(), CoreError> {
        let address = address.trim();
        if address.is_empty() && !self.is_spoofed() {
            return Err(CoreError::EmptyGatewayAddress);
        }

        let _guard = self.inner.connect_lock.lock().await;

        let already = matches!(
            &*self.inner.state.borrow(),
            ConnectionState::Connected { address: current } if current == address
        );
        if already {
            debug!(address, "already connected to Cluster Gateway");
            return Ok(());
        }

        self.inner.state.send_replace(ConnectionState::Connecting);

        match &self.inner.mode {
            ConnectionMode::Spoofed { delay } => {
                info!(address, "connecting to spoofed Cluster Gateway");
                tokio::time::sleep(*delay).await;
                self.inner.client.store(None);
            }
            ConnectionMode::Live { transport } => {
                let client = match Self::dial(address, transport).await {
                    Ok(client) => client,
                    Err(reason) => {
                        warn!(address, %reason, "failed to connect to Cluster Gateway");
                        self.inner.client.store(None);
                        self.inner.state.send_replace(ConnectionState::Failed {
                            address: address.to_owned(),
                            reason: reason.clone(),
                        });
                        return Err(CoreError::ConnectionFailed {
                            address: address.to_owned(),
                            reason,
                        });
                    }
                };
                self.inner.client.store(Some(Arc::new(client)));
            }
        }

        self.inner.state.send_replace(ConnectionState::Connected {
            address: address.to_owned(),
        });
        info!(address, spoofed = self.is_spoofed(), "connected to Cluster Gateway");
        Ok(())
    }

    /// Drop the connection. Providers' poll loops notice on their next tick.
    pub async fn disconnect(&self) {
        let _guard = self.inner.connect_lock.lock().await;
        self.inner.client.store(None);
        self.inner.state.send_replace(ConnectionState::Disconnected);
        debug!("disconnected from Cluster Gateway");
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        matches!(
            *self.inner.state.borrow(),
            ConnectionState::Connected { .. }
        )
    }

    pub fn is_spoofed(&self) -> bool {
        matches!(self.inner.mode, ConnectionMode::Spoofed { .. })
    }

    /// Address of the connected gateway, if any.
    pub fn address(&self) -> Option<String> {
        match &*self.inner.state.borrow() {
            ConnectionState::Connected { address } => Some(address.clone()),
            _ => None,
        }
    }

    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// The live gateway client. Always `None` for spoofed connections.
    pub fn client(&self) -> Option<Arc<GatewayClient>> {
        self.inner.client.load_full()
    }

    // ── Private helpers ──────────────────────────────────────────

    async fn dial(address: &str, transport: &TransportConfig) -> Result<GatewayClient, String> {
        let client = GatewayClient::new(address, transport).map_err(|e| e.to_string())?;
        let id = client.ping().await.map_err(|e| e.to_string())?;
        debug!(gateway_id = %id.id, url = %client.base_url(), "Cluster Gateway answered probe");
        Ok(client)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn spoofed_connect_waits_then_succeeds() {
        let conn = GatewayConnection::spoofed(Duration::from_secs(1));
        let started = tokio::time::Instant::now();

        conn.connect("gateway:8080").await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert!(conn.is_connected());
        assert!(conn.is_spoofed());
        assert!(conn.client().is_none());
        assert_eq!(conn.address().as_deref(), Some("gateway:8080"));
    }

    #[tokio::test(start_paused = true)]
    async fn reconnecting_to_same_address_is_a_no_op() {
        let conn = GatewayConnection::spoofed(Duration::from_secs(1));
        conn.connect("gateway:8080").await.unwrap();

        let started = tokio::time::Instant::now();
        conn.connect("gateway:8080").await.unwrap();
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn empty_address_is_rejected_when_live() {
        let conn = GatewayConnection::live(TransportConfig::default());
        let err = conn.connect("   ").await.unwrap_err();
        assert!(matches!(err, CoreError::EmptyGatewayAddress));
        assert!(!conn.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn spoofed_connect_accepts_any_address() {
        let conn = GatewayConnection::spoofed(Duration::from_secs(1));
        conn.connect("").await.unwrap();
        assert!(conn.is_connected());
        assert_eq!(conn.address().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn live_connect_probes_gateway() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "gw-1" })))
            .expect(1)
            .mount(&server)
            .await;

        let conn = GatewayConnection::live(TransportConfig::default());
        conn.connect(&server.uri()).await.unwrap();

        assert!(conn.is_connected());
        assert!(conn.client().is_some());
    }

    #[tokio::test]
    async fn live_connect_failure_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/id"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let conn = GatewayConnection::live(TransportConfig::default());
        let err = conn.connect(&server.uri()).await.unwrap_err();

        assert!(matches!(err, CoreError::ConnectionFailed { .. }));
        assert!(!conn.is_connected());
        assert!(conn.client().is_none());
        assert!(matches!(
            *conn.state().borrow(),
            ConnectionState::Failed { .. }
        ));
    }

    #[tokio::test]
    async fn disconnect_clears_state() {
        let conn = GatewayConnection::spoofed(Duration::ZERO);
        conn.connect("gateway:8080").await.unwrap();
        conn.disconnect().await;

        assert!(!conn.is_connected());
        assert!(conn.address().is_none());
    }
}
