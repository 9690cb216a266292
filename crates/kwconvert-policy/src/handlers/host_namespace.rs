//! Host IPC, network and PID namespace sharing

use kwconvert_core::types::criteria;
use kwconvert_core::{Criterion, Result};
use serde_json::{json, Value};

use super::{parse_bool, unexpected_criterion, PolicyHandler};
use crate::module;

/// Builds `host-namespaces-psp` settings.
///
/// Every axis defaults to allowed. A criterion on an axis with value `true`
/// means sharing that namespace is denied, so the flag is the negated literal.
#[derive(Debug, Default)]
pub struct HostNamespaceHandler;

impl HostNamespaceHandler {
    pub fn new() -> Self {
        Self
    }
}

impl PolicyHandler for HostNamespaceHandler {
    fn module(&self) -> &str {
        module::HOST_NAMESPACES_PSP
    }

    fn build_settings(&self, criteria: &[&Criterion]) -> Result<Value> {
        let mut allow_ipc = true;
        let mut allow_network = true;
        let mut allow_pid = true;

        for criterion in criteria {
            let allowed = !parse_bool(&criterion.value)?;
            match criterion.name.as_str() {
                criteria::SHARE_IPC_WITH_HOST => allow_ipc = allowed,
                criteria::SHARE_NET_WITH_HOST => allow_network = allowed,
                criteria::SHARE_PID_WITH_HOST => allow_pid = allowed,
                _ => return Err(unexpected_criterion(criterion)),
            }
        }

        Ok(json!({
            "allow_host_ipc": allow_ipc,
            "allow_host_network": allow_network,
            "allow_host_pid": allow_pid,
        }))
    }
}
