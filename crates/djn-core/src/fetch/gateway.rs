// ── Live fetch adapters ──
//
// Kernels come from the Cluster Gateway over HTTP; nodes and kernel specs
// come from the dashboard backend over WebSocket.

use djn_api::BackendClient;
use futures_util::future::BoxFuture;
use tracing::debug;

use super::{FetchError, Fetcher};
use crate::connection::GatewayConnection;
use crate::convert::nodes_from_map;
use crate::model::{Kernel, KernelSpec, KubernetesNode};

/// Lists active kernels through the shared gateway connection.
pub struct GatewayKernels {
    connection: GatewayConnection,
}

impl GatewayKernels {
    pub fn new(connection: GatewayConnection) -> Self {
        Self { connection }
    }
}

impl Fetcher<Kernel> for GatewayKernels {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<Kernel>, FetchError>> {
        Box::pin(async move {
            let client = self.connection.client().ok_or(FetchError::NotConnected)?;
            let list = client.list_kernels().await?;
            debug!(count = list.kernels.len(), "gateway returned kernels");
            Ok(list.kernels.into_iter().map(Kernel::from).collect())
        })
    }
}

/// Requests Kubernetes nodes from the dashboard backend.
pub struct BackendNodes {
    client: BackendClient,
    spoof_nodes: bool,
}

impl BackendNodes {
    /// `spoof_nodes` asks the backend to fabricate nodes instead of
    /// querying Kubernetes.
    pub fn new(client: BackendClient, spoof_nodes: bool) -> Self {
        Self {
            client,
            spoof_nodes,
        }
    }
}

impl Fetcher<KubernetesNode> for BackendNodes {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<KubernetesNode>, FetchError>> {
        Box::pin(async move {
            let map = self.client.request_nodes(self.spoof_nodes).await?;
            Ok(nodes_from_map(map))
        })
    }
}

/// Requests Jupyter kernel specs from the dashboard backend, sorted by name.
pub struct BackendKernelSpecs {
    client: BackendClient,
}

impl BackendKernelSpecs {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

impl Fetcher<KernelSpec> for BackendKernelSpecs {
    fn fetch(&self) -> BoxFuture<'_, Result<Vec<KernelSpec>, FetchError>> {
        Box::pin(async move {
            let mut specs: Vec<KernelSpec> = self
                .client
                .request_kernel_specs()
                .await?
                .into_iter()
                .map(KernelSpec::from)
                .collect();
            specs.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(specs)
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use djn_api::TransportConfig;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::model::KernelStatus;

    #[tokio::test]
    async fn kernels_require_a_live_connection() {
        let connection = GatewayConnection::live(TransportConfig::default());
        let fetcher = GatewayKernels::new(connection);

        let result = fetcher.fetch().await;
        assert!(matches!(result, Err(FetchError::NotConnected)));
    }

    #[tokio::test]
    async fn kernels_are_fetched_and_converted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "gw" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/kernels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kernels": [
                    { "kernelId": "k-1", "numReplicas": 3, "status": "busy", "aggregateBusyStatus": "busy" },
                    { "kernelId": "k-2", "numReplicas": 3, "status": "idle", "aggregateBusyStatus": "idle" }
                ]
            })))
            .mount(&server)
            .await;

        let connection = GatewayConnection::live(TransportConfig {
            timeout: Duration::from_secs(5),
            accept_invalid_certs: false,
        });
        connection.connect(&server.uri()).await.unwrap();

        let kernels = GatewayKernels::new(connection).fetch().await.unwrap();
        assert_eq!(kernels.len(), 2);
        assert_eq!(kernels[0].status, KernelStatus::Busy);
        assert_eq!(kernels[1].kernel_id, "k-2");
    }
}
