// ── Cluster dashboard façade ──
//
// Owns the shared gateway connection and the three resource providers.
// Spoof mode swaps every fetcher for a synthetic generator; live mode
// reads kernels from the gateway and nodes/specs from the backend.

use std::sync::Arc;

use djn_api::BackendClient;
use djn_api::models as wire;
use tracing::{info, warn};

use crate::config::DashboardConfig;
use crate::connection::GatewayConnection;
use crate::convert::migration_result;
use crate::error::CoreError;
use crate::fetch::Fetcher;
use crate::fetch::gateway::{BackendKernelSpecs, BackendNodes, GatewayKernels};
use crate::fetch::spoof::{SpoofedKernelSpecs, SpoofedKernels, SpoofedNodes};
use crate::model::{Kernel, KernelSpec, KubernetesNode, MigrationRequest, MigrationResult};
use crate::provider::ResourceProvider;
use crate::sink::ErrorSink;

/// Kernels, nodes and kernel specs of one cluster behind one connection.
///
/// Cheaply cloneable via `Arc<DashboardInner>`.
#[derive(Clone)]
pub struct ClusterDashboard {
    inner: Arc<DashboardInner>,
}

struct DashboardInner {
    config: DashboardConfig,
    connection: GatewayConnection,
    kernels: ResourceProvider<Kernel>,
    nodes: ResourceProvider<KubernetesNode>,
    kernel_specs: ResourceProvider<KernelSpec>,
}

impl ClusterDashboard {
    /// Build the connection and providers. Nothing connects or polls until
    /// [`start()`](Self::start).
    pub fn new(config: DashboardConfig, error_sink: Arc<dyn ErrorSink>) -> Result<Self, CoreError> {
        let connection = GatewayConnection::from_config(&config);

        let (kernels, nodes, specs): (
            Arc<dyn Fetcher<Kernel>>,
            Arc<dyn Fetcher<KubernetesNode>>,
            Arc<dyn Fetcher<KernelSpec>>,
        ) = if config.spoof_cluster {
            (
                Arc::new(SpoofedKernels::new().with_max_delay(config.spoof_max_fetch_delay)),
                Arc::new(SpoofedNodes::new().with_max_delay(config.spoof_max_fetch_delay)),
                Arc::new(SpoofedKernelSpecs),
            )
        } else {
            let backend = BackendClient::new(&config.backend_url, config.timeout)?;
            (
                Arc::new(GatewayKernels::new(connection.clone())),
                Arc::new(BackendNodes::new(
                    backend.clone(),
                    config.backend_spoof_nodes,
                )),
                Arc::new(BackendKernelSpecs::new(backend)),
            )
        };

        let inner = DashboardInner {
            kernels: ResourceProvider::new(
                kernels,
                connection.clone(),
                Arc::clone(&error_sink),
                config.kernel_query_interval,
            ),
            nodes: ResourceProvider::new(
                nodes,
                connection.clone(),
                Arc::clone(&error_sink),
                config.node_query_interval,
            ),
            kernel_specs: ResourceProvider::new(
                specs,
                connection.clone(),
                error_sink,
                config.kernel_spec_query_interval,
            ),
            connection,
            config,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    // ── Lifecycle ────────────────────────────────────────────────

    /// Connect to the gateway without starting any poll loop.
    pub async fn connect(&self, address: &str) -> Result<(), CoreError> {
        self.inner.connection.connect(address).await
    }

    /// Connect once, then start polling every resource kind.
    ///
    /// All or nothing: if any provider fails to start, the loops already
    /// started are stopped again before the error is returned.
    pub async fn start(&self, address: &str) -> Result<(), CoreError> {
        self.connect(address).await?;
        if let Err(e) = self.start_providers(address).await {
            warn!(address, error = %e, "failed to start cluster dashboard; stopping pollers");
            self.stop().await;
            return Err(e);
        }
        info!(
            address,
            spoofed = self.inner.config.spoof_cluster,
            "cluster dashboard started"
        );
        Ok(())
    }

    async fn start_providers(&self, address: &str) -> Result<(), CoreError> {
        self.inner.kernels.start(address).await?;
        self.inner.nodes.start(address).await?;
        self.inner.kernel_specs.start(address).await
    }

    /// Stop every poll loop. The connection stays up.
    pub async fn stop(&self) {
        tokio::join!(
            self.inner.kernels.stop(),
            self.inner.nodes.stop(),
            self.inner.kernel_specs.stop(),
        );
        info!("cluster dashboard stopped");
    }

    /// Stop polling and drop the connection.
    pub async fn shutdown(&self) {
        self.stop().await;
        self.inner.connection.disconnect().await;
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn is_connected(&self) -> bool {
        self.inner.connection.is_connected()
    }

    pub fn gateway_address(&self) -> Option<String> {
        self.inner.connection.address()
    }

    pub fn kernels(&self) -> &ResourceProvider<Kernel> {
        &self.inner.kernels
    }

    pub fn nodes(&self) -> &ResourceProvider<KubernetesNode> {
        &self.inner.nodes
    }

    pub fn kernel_specs(&self) -> &ResourceProvider<KernelSpec> {
        &self.inner.kernel_specs
    }

    pub fn connection(&self) -> &GatewayConnection {
        &self.inner.connection
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    // ── Migration ────────────────────────────────────────────────

    /// Ask the gateway to move one kernel replica to another node.
    ///
    /// Refused outright when the cluster is spoofed or not connected.
    pub async fn migrate_kernel_replica(
        &self,
        request: &MigrationRequest,
    ) -> Result<MigrationResult, CoreError> {
        if self.inner.connection.is_spoofed() {
            warn!("ignoring migration request against a spoofed cluster");
            return Err(CoreError::RequestIgnoredSpoofed);
        }
        let client = self
            .inner
            .connection
            .client()
            .ok_or(CoreError::Disconnected)?;
        let target = request
            .target_replica
            .clone()
            .ok_or_else(|| CoreError::InvalidArgument {
                message: "migration request has no target replica".into(),
            })?;

        let body = wire::MigrationRequest {
            target_replica: target.clone().into(),
        };
        let response = client.migrate_kernel_replica(&body).await?;
        let result = migration_result(target, response);

        info!(
            kernel_id = %result.kernel_id,
            replica_id = result.replica_id,
            node_id = result.node_id.as_deref().unwrap_or("unknown"),
            "replica migrated"
        );
        Ok(result)
    }
}
