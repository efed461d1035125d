use thiserror::Error;

/// Top-level error type for the `djn-api` crate.
///
/// Covers every failure mode across both remote surfaces: the Cluster
/// Gateway's HTTP API and the dashboard backend's WebSocket endpoints.
/// `djn-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Addressing ──────────────────────────────────────────────────
    /// The gateway address was empty.
    #[error("Cluster Gateway address cannot be empty")]
    EmptyAddress,

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Building the HTTP client failed.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Cluster Gateway ─────────────────────────────────────────────
    /// Non-success status from the Cluster Gateway.
    #[error("Cluster Gateway error (HTTP {status}): {message}")]
    Gateway { status: u16, message: String },

    // ── Dashboard backend ───────────────────────────────────────────
    /// The backend answered with an `ErrorMessage` envelope.
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// WebSocket closed before a reply arrived.
    #[error("WebSocket closed (code {code}): {reason}")]
    WebSocketClosed { code: u16, reason: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if the remote end could not be reached at all.
    pub fn is_unreachable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect(),
            Self::WebSocketConnect(_) => true,
            _ => false,
        }
    }
}
