//! Configuration for the cluster dashboard.
//!
//! A flat TOML file in the platform config directory, overlaid with
//! `DJN_`-prefixed environment variables, translated into
//! [`djn_core::DashboardConfig`]. Durations are humantime strings
//! (`"5s"`, `"1m 30s"`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use djn_core::DashboardConfig;

/// Gateway address used when neither the config nor the command line
/// names one.
pub const DEFAULT_GATEWAY_ADDRESS: &str = "127.0.0.1:9000";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config struct ──────────────────────────────────────────────

/// Contents of `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Cluster Gateway address (`host:port` or URL).
    #[serde(default)]
    pub gateway_address: Option<String>,

    /// Use synthetic data instead of a real cluster.
    #[serde(default = "default_true")]
    pub spoof_cluster: bool,

    #[serde(default = "default_kernel_interval")]
    pub kernel_query_interval: String,

    #[serde(default = "default_node_interval")]
    pub node_query_interval: String,

    #[serde(default = "default_kernel_spec_interval")]
    pub kernel_spec_query_interval: String,

    /// Per-request timeout for gateway and backend calls.
    #[serde(default = "default_timeout")]
    pub timeout: String,

    #[serde(default)]
    pub insecure: bool,

    /// WebSocket base URL of the dashboard backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Ask the backend to fabricate Kubernetes nodes.
    #[serde(default)]
    pub backend_spoof_nodes: bool,

    #[serde(default = "default_spoof_connect_delay")]
    pub spoof_connect_delay: String,

    #[serde(default = "default_spoof_fetch_delay")]
    pub spoof_max_fetch_delay: String,

    /// Default CLI output format.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gateway_address: None,
            spoof_cluster: true,
            kernel_query_interval: default_kernel_interval(),
            node_query_interval: default_node_interval(),
            kernel_spec_query_interval: default_kernel_spec_interval(),
            timeout: default_timeout(),
            insecure: false,
            backend_url: default_backend_url(),
            backend_spoof_nodes: false,
            spoof_connect_delay: default_spoof_connect_delay(),
            spoof_max_fetch_delay: default_spoof_fetch_delay(),
            output: default_output(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_kernel_interval() -> String {
    "5s".into()
}
fn default_node_interval() -> String {
    "10s".into()
}
fn default_kernel_spec_interval() -> String {
    "30s".into()
}
fn default_timeout() -> String {
    "30s".into()
}
fn default_backend_url() -> String {
    "ws://localhost:9995".into()
}
fn default_spoof_connect_delay() -> String {
    "1s".into()
}
fn default_spoof_fetch_delay() -> String {
    "1500ms".into()
}
fn default_output() -> String {
    "table".into()
}

impl Config {
    /// The configured gateway address, or [`DEFAULT_GATEWAY_ADDRESS`].
    pub fn gateway_address(&self) -> &str {
        self.gateway_address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .unwrap_or(DEFAULT_GATEWAY_ADDRESS)
    }

    /// Translate into the core runtime config, parsing and validating
    /// every duration.
    pub fn to_dashboard_config(&self) -> Result<DashboardConfig, ConfigError> {
        Ok(DashboardConfig {
            spoof_cluster: self.spoof_cluster,
            kernel_query_interval: interval("kernel_query_interval", &self.kernel_query_interval)?,
            node_query_interval: interval("node_query_interval", &self.node_query_interval)?,
            kernel_spec_query_interval: interval(
                "kernel_spec_query_interval",
                &self.kernel_spec_query_interval,
            )?,
            timeout: interval("timeout", &self.timeout)?,
            accept_invalid_certs: self.insecure,
            backend_url: self.backend_url.clone(),
            backend_spoof_nodes: self.backend_spoof_nodes,
            spoof_connect_delay: duration("spoof_connect_delay", &self.spoof_connect_delay)?,
            spoof_max_fetch_delay: duration("spoof_max_fetch_delay", &self.spoof_max_fetch_delay)?,
        })
    }
}

fn duration(field: &str, value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("'{value}' is not a duration ({e})"),
    })
}

/// Like [`duration`], but zero is rejected.
fn interval(field: &str, value: &str) -> Result<Duration, ConfigError> {
    let d = duration(field, value)?;
    if d.is_zero() {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(d)
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "djn", "djn").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("djn");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the Config from `path` + environment. A missing file is not an
/// error; defaults fill every absent key.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("DJN_"))
        .extract()?;
    Ok(config)
}

/// Load config, falling back to defaults if anything goes wrong.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_defaults() {
        let dash = Config::default().to_dashboard_config().unwrap();
        let expected = DashboardConfig::default();

        assert!(dash.spoof_cluster);
        assert_eq!(dash.kernel_query_interval, expected.kernel_query_interval);
        assert_eq!(dash.node_query_interval, expected.node_query_interval);
        assert_eq!(
            dash.kernel_spec_query_interval,
            expected.kernel_spec_query_interval
        );
        assert_eq!(dash.timeout, expected.timeout);
        assert_eq!(dash.spoof_connect_delay, expected.spoof_connect_delay);
        assert_eq!(dash.spoof_max_fetch_delay, expected.spoof_max_fetch_delay);
        assert_eq!(dash.backend_url, expected.backend_url);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.kernel_query_interval, "5s");
        assert!(cfg.gateway_address.is_none());
        assert_eq!(cfg.gateway_address(), DEFAULT_GATEWAY_ADDRESS);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
gateway_address = "gateway.cluster:8079"
spoof_cluster = false
node_query_interval = "1m"
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.gateway_address(), "gateway.cluster:8079");
        assert!(!cfg.spoof_cluster);

        let dash = cfg.to_dashboard_config().unwrap();
        assert_eq!(dash.node_query_interval, Duration::from_secs(60));
        assert_eq!(dash.kernel_query_interval, Duration::from_secs(5));
    }

    #[test]
    fn zero_interval_names_the_field() {
        let cfg = Config {
            kernel_query_interval: "0s".into(),
            ..Config::default()
        };
        let err = cfg.to_dashboard_config().unwrap_err();
        assert!(
            matches!(&err, ConfigError::Validation { field, .. } if field == "kernel_query_interval")
        );
    }

    #[test]
    fn garbage_duration_names_the_field() {
        let cfg = Config {
            timeout: "soon".into(),
            ..Config::default()
        };
        let err = cfg.to_dashboard_config().unwrap_err();
        assert!(err.to_string().contains("timeout"));
    }

    #[test]
    fn zero_spoof_delay_is_allowed() {
        let cfg = Config {
            spoof_connect_delay: "0s".into(),
            ..Config::default()
        };
        let dash = cfg.to_dashboard_config().unwrap();
        assert_eq!(dash.spoof_connect_delay, Duration::ZERO);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            gateway_address: Some("localhost:8079".into()),
            spoof_cluster: false,
            ..Config::default()
        };

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.gateway_address, cfg.gateway_address);
        assert!(!loaded.spoof_cluster);
    }
}
