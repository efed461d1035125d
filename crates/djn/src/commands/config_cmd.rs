//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

fn parse_bool(key: &str, value: &str) -> Result<bool, CliError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(CliError::Validation {
            field: key.into(),
            reason: format!("expected true or false, got '{value}'"),
        }),
    }
}

/// Apply `key = value` to `cfg`.
fn set_value(cfg: &mut Config, key: &str, value: &str) -> Result<(), CliError> {
    let value = value.trim();
    match key {
        "gateway_address" => cfg.gateway_address = Some(value.to_owned()),
        "spoof_cluster" => cfg.spoof_cluster = parse_bool(key, value)?,
        "insecure" => cfg.insecure = parse_bool(key, value)?,
        "backend_spoof_nodes" => cfg.backend_spoof_nodes = parse_bool(key, value)?,
        "kernel_query_interval" => value.clone_into(&mut cfg.kernel_query_interval),
        "node_query_interval" => value.clone_into(&mut cfg.node_query_interval),
        "kernel_spec_query_interval" => value.clone_into(&mut cfg.kernel_spec_query_interval),
        "timeout" => value.clone_into(&mut cfg.timeout),
        "backend_url" => value.clone_into(&mut cfg.backend_url),
        "spoof_connect_delay" => value.clone_into(&mut cfg.spoof_connect_delay),
        "spoof_max_fetch_delay" => value.clone_into(&mut cfg.spoof_max_fetch_delay),
        "output" => value.clone_into(&mut cfg.output),
        other => {
            return Err(CliError::Validation {
                field: "key".into(),
                reason: format!("unknown config key '{other}'"),
            });
        }
    }
    // Reject values the dashboard would refuse later.
    cfg.to_dashboard_config()?;
    Ok(())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let format = global.output.unwrap_or(OutputFormat::Table);
            let out = match format {
                OutputFormat::Table | OutputFormat::Plain => toml::to_string_pretty(&cfg)?,
                other => output::render_single(other, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::active_path(global).display().to_string(), false);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let path = config::active_path(global);
            let mut cfg = config::load(global)?;
            set_value(&mut cfg, &key, &value)?;
            config::save_config_to(&cfg, &path)?;
            if !global.quiet {
                eprintln!("Set {key} in {}", path.display());
            }
            Ok(())
        }
    }
}
