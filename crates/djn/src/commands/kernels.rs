//! Kernel command handlers.

use std::sync::Arc;

use tabled::Tabled;

use djn_core::Kernel;

use crate::cli::{ResourceArgs, ResourceCommand};
use crate::error::CliError;
use crate::output;

use super::Session;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct KernelRow {
    #[tabled(rename = "Kernel ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Busy")]
    busy: String,
    #[tabled(rename = "Replicas")]
    replicas: String,
    #[tabled(rename = "Nodes")]
    nodes: String,
}

impl From<&Arc<Kernel>> for KernelRow {
    fn from(k: &Arc<Kernel>) -> Self {
        let mut nodes: Vec<&str> = k.replicas.iter().map(|r| r.node_id.as_str()).collect();
        nodes.sort_unstable();
        nodes.dedup();
        Self {
            id: k.kernel_id.clone(),
            status: k.status.to_string(),
            busy: k.aggregate_busy_status.to_string(),
            replicas: k.num_replicas.to_string(),
            nodes: nodes.join(", "),
        }
    }
}

fn detail(k: &Arc<Kernel>) -> String {
    let mut pairs = vec![
        ("Kernel ID", k.kernel_id.clone()),
        ("Status", k.status.to_string()),
        ("Aggregate", k.aggregate_busy_status.to_string()),
        ("Replicas", k.num_replicas.to_string()),
    ];
    pairs.extend(k.replicas.iter().map(|r| {
        (
            "",
            format!("replica {} · {} on {}", r.replica_id, r.pod_id, r.node_id),
        )
    }));
    output::detail_block(&pairs)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ResourceArgs, session: &mut Session) -> Result<(), CliError> {
    let provider = session.dashboard.kernels().clone();
    match args.command {
        ResourceCommand::List(list) if list.watch => {
            super::watch(
                session,
                &provider,
                |k| KernelRow::from(k),
                |k| k.kernel_id.clone(),
            )
            .await
        }
        ResourceCommand::List(_) => {
            let snap = super::fetch_once(session, &provider).await?;
            let out = output::render_list(
                session.output,
                snap.as_slice(),
                |k| KernelRow::from(k),
                |k| k.kernel_id.clone(),
            )?;
            output::print_output(&out, session.quiet);
            Ok(())
        }
        ResourceCommand::Get { id } => {
            let kernel = super::fetch_one(session, &provider, &id).await?;
            let out = output::render_single(session.output, &kernel, detail, |k| {
                k.kernel_id.clone()
            })?;
            output::print_output(&out, session.quiet);
            Ok(())
        }
    }
}
