//! Single-module policies

use kwconvert_core::{AdmissionRule, ConversionConfig, Error, Result};
use std::collections::BTreeSet;
use tracing::debug;

use super::{build_rules, policy_name, split_rule, PolicyBuilder};
use crate::policy::{
    ClusterAdmissionPolicy, ClusterAdmissionPolicySpec, ObjectMeta, Policy,
    CLUSTER_ADMISSION_POLICY_KIND, KUBEWARDEN_API_VERSION,
};
use crate::registry::CriterionRegistry;

/// Builds a `ClusterAdmissionPolicy` for rules whose checks all map to one module
#[derive(Debug, Clone, Copy)]
pub struct SinglePolicyBuilder<'a> {
    registry: &'a CriterionRegistry,
}

impl<'a> SinglePolicyBuilder<'a> {
    pub fn new(registry: &'a CriterionRegistry) -> Self {
        Self { registry }
    }
}

impl PolicyBuilder for SinglePolicyBuilder<'_> {
    fn build(&self, rule: &AdmissionRule, config: &ConversionConfig) -> Result<Policy> {
        let split = split_rule(self.registry, rule)?;

        let mut handler = None;
        let mut resources = BTreeSet::new();
        for criterion in &split.criteria {
            let current = self.registry.handler_for(criterion)?;
            let first = *handler.get_or_insert(current);
            if first.module() != current.module() {
                return Err(Error::grouping(format!(
                    "criteria map to more than one module: {} and {}",
                    first.module(),
                    current.module()
                )));
            }
            resources.insert(current.applicable_resource());
        }

        // split_rule guarantees at least one enforceable criterion
        let handler = handler.ok_or(Error::NoEnforceablePolicy)?;
        let settings = handler.build_settings(&split.criteria)?;

        debug!(
            rule_id = rule.id,
            module = handler.module(),
            criteria = split.criteria.len(),
            "Built single policy"
        );

        Ok(Policy::Single(ClusterAdmissionPolicy {
            api_version: KUBEWARDEN_API_VERSION.to_string(),
            kind: CLUSTER_ADMISSION_POLICY_KIND.to_string(),
            metadata: ObjectMeta {
                name: policy_name(rule),
            },
            spec: ClusterAdmissionPolicySpec {
                policy_server: config.policy_server.clone(),
                module: handler.module().to_string(),
                mode: config.resolve_mode(rule.mode.as_deref()),
                background_audit: config.background_audit,
                rules: build_rules(&resources),
                settings,
                context_aware_resources: handler.context_aware_resources(),
                namespace_selector: split.namespace_selector,
            },
        }))
    }
}
