//! Kernel spec command handlers.

use std::sync::Arc;

use tabled::Tabled;

use djn_core::KernelSpec;

use crate::cli::{ResourceArgs, ResourceCommand};
use crate::error::CliError;
use crate::output;

use super::Session;

#[derive(Tabled)]
struct SpecRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Display Name")]
    display_name: String,
    #[tabled(rename = "Language")]
    language: String,
    #[tabled(rename = "Provisioner")]
    provisioner: String,
}

impl From<&Arc<KernelSpec>> for SpecRow {
    fn from(s: &Arc<KernelSpec>) -> Self {
        Self {
            name: s.name.clone(),
            display_name: s.display_name.clone(),
            language: s.language.clone(),
            provisioner: s
                .kernel_provisioner
                .as_ref()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
        }
    }
}

fn detail(s: &Arc<KernelSpec>) -> String {
    let mut pairs = vec![
        ("Name", s.name.clone()),
        ("Display Name", s.display_name.clone()),
        ("Language", s.language.clone()),
        ("Interrupt Mode", s.interrupt_mode.clone()),
    ];
    if let Some(ref p) = s.kernel_provisioner {
        pairs.push(("Provisioner", p.name.clone()));
        pairs.push(("Gateway", p.gateway.clone()));
    }
    pairs.push(("Argv", s.argv.join(" ")));
    output::detail_block(&pairs)
}

pub async fn handle(args: ResourceArgs, session: &mut Session) -> Result<(), CliError> {
    let provider = session.dashboard.kernel_specs().clone();
    match args.command {
        ResourceCommand::List(list) if list.watch => {
            super::watch(
                session,
                &provider,
                |s| SpecRow::from(s),
                |s| s.name.clone(),
            )
            .await
        }
        ResourceCommand::List(_) => {
            let snap = super::fetch_once(session, &provider).await?;
            let out = output::render_list(
                session.output,
                snap.as_slice(),
                |s| SpecRow::from(s),
                |s| s.name.clone(),
            )?;
            output::print_output(&out, session.quiet);
            Ok(())
        }
        ResourceCommand::Get { id } => {
            let spec = super::fetch_one(session, &provider, &id).await?;
            let out = output::render_single(session.output, &spec, detail, |s| s.name.clone())?;
            output::print_output(&out, session.quiet);
            Ok(())
        }
    }
}
