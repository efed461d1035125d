// ── Jupyter kernel spec domain types ──

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelSpec {
    pub name: String,
    pub display_name: String,
    pub language: String,
    pub interrupt_mode: String,
    pub kernel_provisioner: Option<KernelProvisioner>,
    pub argv: Vec<String>,
}

/// Provisioner that launches kernels of a spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelProvisioner {
    pub name: String,
    /// Gateway address the provisioner hands kernels to.
    pub gateway: String,
}
