//! Command dispatch and the list/get/watch plumbing shared by every
//! resource command.

pub mod config_cmd;
pub mod kernels;
pub mod migrate;
pub mod nodes;
pub mod specs;

use std::sync::Arc;

use chrono::Local;
use serde::Serialize;
use tabled::Tabled;
use tokio::sync::mpsc;

use djn_core::{
    ChannelErrorSink, ClusterDashboard, ErrorReport, PollState, RefreshOutcome, Resource,
    ResourceProvider, Snapshot,
};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::config::Resolved;
use crate::error::CliError;
use crate::output;

/// A dashboard plus the receiving end of its error sink.
pub struct Session {
    pub dashboard: ClusterDashboard,
    pub address: String,
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    reports: mpsc::UnboundedReceiver<ErrorReport>,
}

impl Session {
    pub fn new(resolved: Resolved, global: &GlobalOpts) -> Result<Self, CliError> {
        let (sink, reports) = ChannelErrorSink::new();
        let dashboard = ClusterDashboard::new(resolved.dashboard, Arc::new(sink))?;
        Ok(Self {
            dashboard,
            address: resolved.gateway_address,
            output: resolved.output,
            color: output::should_color(global.color),
            quiet: global.quiet,
            reports,
        })
    }

    pub async fn connect(&self) -> Result<(), CliError> {
        self.dashboard.connect(&self.address).await?;
        Ok(())
    }
}

pub async fn dispatch(cmd: Command, session: &mut Session) -> Result<(), CliError> {
    match cmd {
        Command::Kernels(args) => kernels::handle(args, session).await,
        Command::Nodes(args) => nodes::handle(args, session).await,
        Command::Specs(args) => specs::handle(args, session).await,
        Command::Migrate(args) => migrate::handle(args, session).await,
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}

// ── Shared resource plumbing ─────────────────────────────────────────

/// Connect, refresh once and return the fresh snapshot.
pub async fn fetch_once<T: Resource>(
    session: &mut Session,
    provider: &ResourceProvider<T>,
) -> Result<Snapshot<T>, CliError> {
    session.connect().await?;
    match provider.refresh_now().await {
        RefreshOutcome::Failed => {
            let report = session.reports.try_recv().ok();
            Err(CliError::FetchFailed {
                message: report.as_ref().map_or_else(
                    || format!("Failed to fetch {}", T::PLURAL),
                    |r| r.message.clone(),
                ),
                detail: report.map(|r| r.error).unwrap_or_default(),
            })
        }
        outcome => {
            tracing::debug!(kind = T::KIND, ?outcome, "refresh finished");
            Ok(provider.list())
        }
    }
}

/// Look one record up by id after a fresh fetch.
pub async fn fetch_one<T: Resource>(
    session: &mut Session,
    provider: &ResourceProvider<T>,
    id: &str,
) -> Result<Arc<T>, CliError> {
    fetch_once(session, provider).await?;
    provider.get(id).ok_or_else(|| CliError::NotFound {
        resource_type: T::KIND.into(),
        identifier: id.into(),
        list_command: format!("{} list", command_name::<T>()),
    })
}

/// Poll `provider` and re-render on every published snapshot until
/// Ctrl-C or the poll loop ends.
pub async fn watch<T, R>(
    session: &mut Session,
    provider: &ResourceProvider<T>,
    to_row: impl Fn(&Arc<T>) -> R,
    id_fn: impl Fn(&Arc<T>) -> String,
) -> Result<(), CliError>
where
    T: Resource + Serialize,
    R: Tabled,
{
    let subscription = format!("djn-watch-{}", command_name::<T>());
    let (tx, mut snapshots) = mpsc::unbounded_channel::<Snapshot<T>>();
    provider.subscribe(subscription.clone(), move |snap: &Snapshot<T>| {
        let _ = tx.send(Arc::clone(snap));
    });

    provider.start(&session.address).await?;
    let mut poll_state = provider.poll_state();
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            res = &mut ctrl_c => break res.map_err(CliError::from),
            Some(snap) = snapshots.recv() => {
                let title = format!(
                    "{} · {} · {}",
                    T::PLURAL,
                    snap.len(),
                    Local::now().format("%H:%M:%S")
                );
                let body = match output::render_list(session.output, snap.as_slice(), &to_row, &id_fn) {
                    Ok(body) => body,
                    Err(e) => break Err(e),
                };
                if session.output == OutputFormat::Table {
                    output::print_output(&output::heading(&title, session.color), session.quiet);
                }
                output::print_output(&body, session.quiet);
            }
            Some(report) = session.reports.recv() => {
                eprintln!(
                    "[{}] {}: {}",
                    report.at.with_timezone(&chrono::Local).format("%H:%M:%S"),
                    report.message,
                    report.error
                );
            }
            _ = poll_state.wait_for(|s| *s == PollState::Stopped) => {
                break Err(CliError::Disconnected);
            }
        }
    };

    provider.unsubscribe(&subscription);
    provider.stop().await;
    result
}

fn command_name<T: Resource>() -> &'static str {
    match T::KIND {
        "kernel" => "kernels",
        "node" => "nodes",
        _ => "specs",
    }
}
