// ── Runtime configuration for the dashboard core ──
//
// Built by `djn-config` from TOML/env, or constructed directly by
// embedders and tests.

use std::time::Duration;

use djn_api::TransportConfig;

/// Everything the providers need to run.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Use synthetic fetch adapters and a spoofed gateway connection.
    pub spoof_cluster: bool,
    /// Poll interval of the kernel provider.
    pub kernel_query_interval: Duration,
    /// Poll interval of the node provider.
    pub node_query_interval: Duration,
    /// Poll interval of the kernel-spec provider.
    pub kernel_spec_query_interval: Duration,
    /// Per-request timeout for gateway and backend calls.
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
    /// WebSocket base URL of the dashboard backend (nodes, kernel specs).
    pub backend_url: String,
    /// Ask the backend to fabricate Kubernetes nodes.
    pub backend_spoof_nodes: bool,
    /// Simulated dial latency of the spoofed connection.
    pub spoof_connect_delay: Duration,
    /// Upper bound of the simulated latency of spoofed fetches.
    pub spoof_max_fetch_delay: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            spoof_cluster: true,
            kernel_query_interval: Duration::from_secs(5),
            node_query_interval: Duration::from_secs(10),
            kernel_spec_query_interval: Duration::from_secs(30),
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
            backend_url: "ws://localhost:9995".into(),
            backend_spoof_nodes: false,
            spoof_connect_delay: Duration::from_secs(1),
            spoof_max_fetch_delay: Duration::from_millis(1500),
        }
    }
}

impl DashboardConfig {
    /// HTTP transport settings for the gateway client.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            timeout: self.timeout,
            accept_invalid_certs: self.accept_invalid_certs,
        }
    }
}
