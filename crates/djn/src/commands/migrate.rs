//! Replica migration handler.

use owo_colors::OwoColorize;

use djn_core::{MigrationRequest, MigrationResult};

use crate::cli::MigrateArgs;
use crate::error::CliError;
use crate::output;

use super::Session;

fn detail(r: &MigrationResult) -> String {
    output::detail_block(&[
        ("Kernel", r.kernel_id.clone()),
        ("Replica", r.replica_id.to_string()),
        ("Pod", r.pod_id.clone().unwrap_or_else(|| "-".into())),
        ("Node", r.node_id.clone().unwrap_or_else(|| "-".into())),
    ])
}

pub async fn handle(args: MigrateArgs, session: &mut Session) -> Result<(), CliError> {
    session.connect().await?;
    let request = MigrationRequest::new(args.kernel_id, args.replica_id);
    let result = session.dashboard.migrate_kernel_replica(&request).await?;

    if !session.quiet {
        let msg = format!(
            "Migrated replica {} of kernel {}",
            result.replica_id, result.kernel_id
        );
        if session.color {
            eprintln!("{}", msg.green());
        } else {
            eprintln!("{msg}");
        }
    }
    let out = output::render_single(session.output, &result, detail, |r| {
        r.node_id.clone().unwrap_or_default()
    })?;
    output::print_output(&out, session.quiet);
    Ok(())
}
