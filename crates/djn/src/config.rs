//! CLI configuration: the shared `djn_config` file plus `GlobalOpts`
//! flag overrides.

use std::path::PathBuf;

use clap::ValueEnum;

use djn_core::DashboardConfig;

use crate::cli::{GlobalOpts, OutputFormat};
use crate::error::CliError;

pub use djn_config::{Config, config_path, load_config_from, save_config_to};

/// Everything a command needs once flags and file are merged.
pub struct Resolved {
    pub gateway_address: String,
    pub dashboard: DashboardConfig,
    pub output: OutputFormat,
}

/// Path of the config file in effect (`--config` or the platform default).
pub fn active_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config file in effect.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(load_config_from(&active_path(global))?)
}

/// Apply flag overrides (flag > env > file > default).
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let mut cfg = load(global)?;

    if global.spoof {
        cfg.spoof_cluster = true;
    }
    if global.live {
        cfg.spoof_cluster = false;
    }
    if global.insecure {
        cfg.insecure = true;
    }
    if let Some(ref timeout) = global.timeout {
        cfg.timeout.clone_from(timeout);
    }
    if let Some(ref gateway) = global.gateway {
        cfg.gateway_address = Some(gateway.clone());
    }

    let output = match global.output {
        Some(format) => format,
        None => OutputFormat::from_str(&cfg.output, true).map_err(|_| CliError::Validation {
            field: "output".into(),
            reason: format!(
                "expected table, json, json-compact, yaml or plain, got '{}'",
                cfg.output
            ),
        })?,
    };

    Ok(Resolved {
        gateway_address: cfg.gateway_address().to_owned(),
        dashboard: cfg.to_dashboard_config()?,
        output,
    })
}
