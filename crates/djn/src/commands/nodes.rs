//! Kubernetes node command handlers.

use std::sync::Arc;

use tabled::Tabled;

use djn_core::KubernetesNode;

use crate::cli::{ResourceArgs, ResourceCommand};
use crate::error::CliError;
use crate::output;

use super::Session;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    id: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Pods")]
    pods: usize,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory (GB)")]
    memory: String,
    #[tabled(rename = "GPUs")]
    gpus: String,
    #[tabled(rename = "vGPUs")]
    vgpus: String,
    #[tabled(rename = "Age")]
    age: String,
}

impl From<&Arc<KubernetesNode>> for NodeRow {
    fn from(n: &Arc<KubernetesNode>) -> Self {
        Self {
            id: n.node_id.clone(),
            ip: n.ip.clone(),
            pods: n.pods.len(),
            cpu: usage(n.allocated_cpu, n.capacity_cpu),
            memory: usage(n.allocated_memory, n.capacity_memory),
            gpus: usage(n.allocated_gpus, n.capacity_gpus),
            vgpus: usage(n.allocated_vgpus, n.capacity_vgpus),
            age: format_age(n.age_secs),
        }
    }
}

fn usage(allocated: f64, capacity: f64) -> String {
    format!("{allocated:.1} / {capacity:.1}")
}

/// Compact age, e.g. `3d4h`, `12m`, `45s`.
fn format_age(secs: u64) -> String {
    let (d, h, m) = (secs / 86_400, (secs % 86_400) / 3600, (secs % 3600) / 60);
    match (d, h, m) {
        (0, 0, 0) => format!("{secs}s"),
        (0, 0, m) => format!("{m}m"),
        (0, h, m) => format!("{h}h{m}m"),
        (d, h, _) => format!("{d}d{h}h"),
    }
}

fn detail(n: &Arc<KubernetesNode>) -> String {
    let mut pairs = vec![
        ("Node", n.node_id.clone()),
        ("IP", n.ip.clone()),
        ("Age", format_age(n.age_secs)),
        ("CPU", usage(n.allocated_cpu, n.capacity_cpu)),
        ("Memory (GB)", usage(n.allocated_memory, n.capacity_memory)),
        ("GPUs", usage(n.allocated_gpus, n.capacity_gpus)),
        ("vGPUs", usage(n.allocated_vgpus, n.capacity_vgpus)),
        ("Pods", n.pods.len().to_string()),
    ];
    pairs.extend(n.pods.iter().map(|p| {
        (
            "",
            format!("{} · {} · {} · {}", p.pod_name, p.pod_phase, p.pod_ip, format_age(p.pod_age_secs)),
        )
    }));
    output::detail_block(&pairs)
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: ResourceArgs, session: &mut Session) -> Result<(), CliError> {
    let provider = session.dashboard.nodes().clone();
    match args.command {
        ResourceCommand::List(list) if list.watch => {
            super::watch(
                session,
                &provider,
                |n| NodeRow::from(n),
                |n| n.node_id.clone(),
            )
            .await
        }
        ResourceCommand::List(_) => {
            let snap = super::fetch_once(session, &provider).await?;
            let out = output::render_list(
                session.output,
                snap.as_slice(),
                |n| NodeRow::from(n),
                |n| n.node_id.clone(),
            )?;
            output::print_output(&out, session.quiet);
            Ok(())
        }
        ResourceCommand::Get { id } => {
            let node = super::fetch_one(session, &provider, &id).await?;
            let out =
                output::render_single(session.output, &node, detail, |n| n.node_id.clone())?;
            output::print_output(&out, session.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_is_compact() {
        assert_eq!(format_age(45), "45s");
        assert_eq!(format_age(12 * 60 + 5), "12m");
        assert_eq!(format_age(3 * 3600 + 7 * 60), "3h7m");
        assert_eq!(format_age(2 * 86_400 + 5 * 3600), "2d5h");
    }
}
