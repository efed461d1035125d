// ── Core error types ──
//
// User-facing errors from djn-core. Consumers never match on HTTP status
// codes or WebSocket close frames directly; the `From<djn_api::Error>`
// impl translates transport-layer errors into dashboard-level variants.

use thiserror::Error;

use crate::fetch::FetchError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to Cluster Gateway at {address}: {reason}")]
    ConnectionFailed { address: String, reason: String },

    #[error("Cluster Gateway address cannot be empty")]
    EmptyGatewayAddress,

    #[error("Not connected to the Cluster Gateway")]
    Disconnected,

    #[error("Request ignored: the Cluster Gateway connection is spoofed")]
    RequestIgnoredSpoofed,

    #[error("Cluster Gateway request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Failed to fetch {kind}: {source}")]
    Fetch {
        kind: &'static str,
        #[source]
        source: FetchError,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Cluster Gateway error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<djn_api::Error> for CoreError {
    fn from(err: djn_api::Error) -> Self {
        match err {
            djn_api::Error::EmptyAddress => CoreError::EmptyGatewayAddress,
            djn_api::Error::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            djn_api::Error::Gateway { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            other => CoreError::Api {
                message: other.to_string(),
                status: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_status_is_preserved() {
        let err: CoreError = djn_api::Error::Gateway {
            status: 503,
            message: "draining".into(),
        }
        .into();
        assert!(matches!(
            err,
            CoreError::Api {
                status: Some(503),
                ..
            }
        ));
    }

    #[test]
    fn empty_address_maps_to_dedicated_variant() {
        let err: CoreError = djn_api::Error::EmptyAddress.into();
        assert!(matches!(err, CoreError::EmptyGatewayAddress));
    }
}
