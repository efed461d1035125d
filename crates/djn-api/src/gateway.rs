// Cluster Gateway HTTP client
//
// Wraps `reqwest::Client` with gateway URL construction and status/body
// handling. The gateway is addressed as `host:port` by operators; a
// missing scheme defaults to plain HTTP.

use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::{GatewayId, KernelList, MigrationRequest, MigrationResponse};
use crate::transport::TransportConfig;

/// HTTP client for the Cluster Gateway.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl GatewayClient {
    /// Create a client for the gateway at `address` (`host:port` or a full URL).
    pub fn new(address: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let base_url = normalize_address(address)?;
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, transport.timeout_secs()))
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, timeout_secs: u64) -> Self {
        Self {
            http,
            base_url,
            timeout_secs,
        }
    }

    /// The gateway base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ask the gateway for its identifier. Used as a reachability probe.
    pub async fn ping(&self) -> Result<GatewayId, Error> {
        let url = self.base_url.join("api/id")?;
        debug!(%url, "probing cluster gateway");
        self.get(url).await
    }

    /// List the currently active distributed kernels.
    pub async fn list_kernels(&self) -> Result<KernelList, Error> {
        let url = self.base_url.join("api/kernels")?;
        self.get(url).await
    }

    /// Ask the gateway to migrate one replica of a kernel.
    pub async fn migrate_kernel_replica(
        &self,
        request: &MigrationRequest,
    ) -> Result<MigrationResponse, Error> {
        let url = self.base_url.join("api/migrate")?;
        debug!(
            kernel_id = %request.target_replica.kernel_id,
            replica_id = request.target_replica.replica_id,
            "requesting replica migration"
        );
        let resp = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.parse(resp).await
    }

    // ── Private helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        trace!(%url, "GET");
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        self.parse(resp).await
    }

    async fn parse<T: DeserializeOwned>(&self, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(Error::Gateway {
                status: status.as_u16(),
                message: if body.is_empty() {
                    status.canonical_reason().unwrap_or("unknown").to_owned()
                } else {
                    body
                },
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    fn map_send_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(err)
        }
    }
}

/// Turn an operator-entered gateway address into a base URL ending in `/`.
pub(crate) fn normalize_address(address: &str) -> Result<Url, Error> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(Error::EmptyAddress);
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_owned()
    } else {
        format!("http://{trimmed}")
    };

    let mut url = Url::parse(&with_scheme)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
