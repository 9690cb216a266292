//! Custom rule bridge
//!
//! Rules carrying a custom-path criterion cannot be expressed with the
//! registry's modules. They bypass validation and policy synthesis entirely
//! and are handed, whole, to a bridge that emits a different artifact.

use kwconvert_core::{AdmissionRule, Error, Result};

/// Artifact produced by a bridge for one rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomArtifact {
    /// Source rule id
    pub rule_id: u32,
    /// Artifact kind, e.g. `rego`
    pub kind: String,
    /// Suggested file name
    pub file_name: String,
    /// Artifact body
    pub content: String,
}

/// Converter for rules the policy engine does not handle
pub trait CustomRuleBridge: Send + Sync {
    /// Bridge name used in logs and summaries
    fn name(&self) -> &str;

    /// Convert a full rule into an artifact
    fn convert(&self, rule: &AdmissionRule) -> Result<CustomArtifact>;
}

/// Bridge used when no code generator is configured; every custom rule is skipped
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCustomRuleBridge;

impl CustomRuleBridge for NoCustomRuleBridge {
    fn name(&self) -> &str {
        "none"
    }

    fn convert(&self, _rule: &AdmissionRule) -> Result<CustomArtifact> {
        Err(Error::custom_rule(
            "custom criteria require a custom rule bridge, none is configured",
        ))
    }
}
