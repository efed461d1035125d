//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use djn_config::ConfigError;
use djn_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REFUSED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the Cluster Gateway at {address}")]
    #[diagnostic(
        code(djn::connection_failed),
        help(
            "Check that the gateway is running and reachable.\n\
             Reason: {reason}\n\
             Try: djn --spoof kernels list"
        )
    )]
    ConnectionFailed { address: String, reason: String },

    #[error("Not connected to the Cluster Gateway")]
    #[diagnostic(code(djn::disconnected))]
    Disconnected,

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(djn::timeout),
        help("Increase the timeout with --timeout or check gateway responsiveness.")
    )]
    Timeout { seconds: u64 },

    // ── Requests ─────────────────────────────────────────────────────
    #[error("Migration requests are ignored by a spoofed cluster")]
    #[diagnostic(
        code(djn::spoofed),
        help("Re-run with --live to migrate replicas on a real cluster.")
    )]
    Spoofed,

    #[error("{message}")]
    #[diagnostic(code(djn::fetch_failed), help("Cause: {detail}"))]
    FetchFailed { message: String, detail: String },

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(djn::not_found),
        help("Run: djn {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("API error: {message}")]
    #[diagnostic(code(djn::api_error))]
    Api { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(djn::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(djn::config),
        help("Inspect the resolved configuration with: djn config show")
    )]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to render TOML: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Disconnected => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Spoofed => exit_code::REFUSED,
            Self::Validation { .. } | Self::Config(ConfigError::Validation { .. }) => {
                exit_code::USAGE
            }
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { address, reason } => {
                CliError::ConnectionFailed { address, reason }
            }
            CoreError::EmptyGatewayAddress => CliError::Validation {
                field: "gateway".into(),
                reason: "address must not be empty".into(),
            },
            CoreError::Disconnected => CliError::Disconnected,
            CoreError::RequestIgnoredSpoofed => CliError::Spoofed,
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::InvalidArgument { message } => CliError::Validation {
                field: "argument".into(),
                reason: message,
            },
            err @ (CoreError::Fetch { .. } | CoreError::Api { .. }) => CliError::Api {
                message: err.to_string(),
            },
        }
    }
}
