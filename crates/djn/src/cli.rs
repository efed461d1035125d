//! Clap derive structures for the `djn` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// djn -- watch and steer a distributed Jupyter kernel cluster
#[derive(Debug, Parser)]
#[command(
    name = "djn",
    version,
    about = "Inspect kernels, nodes and kernel specs of a distributed Jupyter cluster",
    long_about = "Connects to a Cluster Gateway and lists (or live-watches) active kernels,\n\
        Kubernetes nodes and available kernel specs. Runs against a spoofed\n\
        cluster unless --live or `spoof_cluster = false` is set.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Cluster Gateway address (host:port or URL)
    #[arg(long, short = 'g', global = true)]
    pub gateway: Option<String>,

    /// Use a spoofed cluster with synthetic data
    #[arg(long, global = true, conflicts_with = "live")]
    pub spoof: bool,

    /// Talk to a real Cluster Gateway
    #[arg(long, global = true)]
    pub live: bool,

    /// Path to an alternative config file
    #[arg(long, env = "DJN_CONFIG_FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Output format (defaults to the config file's `output`)
    #[arg(long, short = 'o', global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout, e.g. "10s"
    #[arg(long, global = true)]
    pub timeout: Option<String>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one identifier per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Active kernels
    #[command(alias = "k")]
    Kernels(ResourceArgs),

    /// Kubernetes nodes
    #[command(alias = "n")]
    Nodes(ResourceArgs),

    /// Available kernel specs
    #[command(alias = "ks")]
    Specs(ResourceArgs),

    /// Migrate one kernel replica to another node
    Migrate(MigrateArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Resource commands ────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ResourceArgs {
    #[command(subcommand)]
    pub command: ResourceCommand,
}

#[derive(Debug, Subcommand)]
pub enum ResourceCommand {
    /// List every record
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record by id
    Get {
        /// Kernel id, node id or kernel spec name
        id: String,
    },
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Keep running and re-render on every refresh (Ctrl-C to stop)
    #[arg(long, short = 'w')]
    pub watch: bool,
}

// ── Migrate ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Kernel whose replica should move
    pub kernel_id: String,

    /// Replica to move
    pub replica_id: i32,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// Set a configuration value
    Set {
        /// Config key, e.g. "gateway_address" or "kernel_query_interval"
        key: String,

        /// Value to set
        value: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
