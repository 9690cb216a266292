//! Policy groups for rules spanning several modules

use kwconvert_core::{AdmissionRule, ConversionConfig, Criterion, Error, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

use super::{build_rules, policy_name, split_rule, PolicyBuilder};
use crate::handlers::PolicyHandler;
use crate::module::member_name;
use crate::policy::{
    ClusterAdmissionPolicyGroup, ClusterAdmissionPolicyGroupSpec, ObjectMeta, Policy,
    PolicyGroupMember, CLUSTER_ADMISSION_POLICY_GROUP_KIND, KUBEWARDEN_API_VERSION,
};
use crate::registry::CriterionRegistry;

/// Criteria routed to one module
struct ModuleGroup<'r> {
    handler: Arc<dyn PolicyHandler>,
    criteria: Vec<&'r Criterion>,
}

/// Builds a `ClusterAdmissionPolicyGroup` with one member per distinct module.
///
/// Members are named after their module and combined with `&&`, so the group
/// rejects a request only when every member does, matching a rule whose
/// criteria must all hold.
#[derive(Debug, Clone, Copy)]
pub struct GroupPolicyBuilder<'a> {
    registry: &'a CriterionRegistry,
}

impl<'a> GroupPolicyBuilder<'a> {
    pub fn new(registry: &'a CriterionRegistry) -> Self {
        Self { registry }
    }

    fn group_by_module<'r>(
        &self,
        criteria: &[&'r Criterion],
    ) -> Result<BTreeMap<String, ModuleGroup<'r>>> {
        let mut groups: BTreeMap<String, ModuleGroup<'r>> = BTreeMap::new();

        for criterion in criteria {
            let handler = self
                .registry
                .handler_for(criterion)
                .map_err(|e| Error::grouping(e.to_string()))?;
            let name = member_name(handler.module());

            let group = groups.entry(name.clone()).or_insert_with(|| ModuleGroup {
                handler: Arc::clone(handler),
                criteria: Vec::new(),
            });

            if group.handler.module() != handler.module() {
                return Err(Error::grouping(format!(
                    "modules {} and {} share the member name {}",
                    group.handler.module(),
                    handler.module(),
                    name
                )));
            }

            group.criteria.push(criterion);
        }

        Ok(groups)
    }
}

impl PolicyBuilder for GroupPolicyBuilder<'_> {
    fn build(&self, rule: &AdmissionRule, config: &ConversionConfig) -> Result<Policy> {
        let split = split_rule(self.registry, rule)?;
        let groups = self.group_by_module(&split.criteria)?;

        let mut members = BTreeMap::new();
        let mut resources = BTreeSet::new();

        for (name, group) in groups {
            let settings = group.handler.build_settings(&group.criteria)?;
            resources.insert(group.handler.applicable_resource());

            members.insert(
                name,
                PolicyGroupMember {
                    module: group.handler.module().to_string(),
                    settings,
                    context_aware_resources: group.handler.context_aware_resources(),
                },
            );
        }

        // BTreeMap iteration is sorted by member name
        let expression = members
            .keys()
            .map(|name| format!("{}()", name))
            .collect::<Vec<_>>()
            .join(" && ");

        debug!(
            rule_id = rule.id,
            members = members.len(),
            expression = %expression,
            "Built policy group"
        );

        Ok(Policy::Group(ClusterAdmissionPolicyGroup {
            api_version: KUBEWARDEN_API_VERSION.to_string(),
            kind: CLUSTER_ADMISSION_POLICY_GROUP_KIND.to_string(),
            metadata: ObjectMeta {
                name: policy_name(rule),
            },
            spec: ClusterAdmissionPolicyGroupSpec {
                policy_server: config.policy_server.clone(),
                mode: config.resolve_mode(rule.mode.as_deref()),
                background_audit: config.background_audit,
                rules: build_rules(&resources),
                message: format!(
                    "violate NeuVector rule (id={}), comment {}",
                    rule.id, rule.comment
                ),
                expression,
                policies: members,
                namespace_selector: split.namespace_selector,
            },
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module;
    use kwconvert_core::types::{criteria, ops};
    use serde_json::json;

    fn build(rule: &AdmissionRule) -> Result<ClusterAdmissionPolicyGroup> {
        let config = ConversionConfig::default();
        let registry = CriterionRegistry::new(&config);
        match GroupPolicyBuilder::new(&registry).build(rule, &config)? {
            Policy::Group(group) => Ok(group),
            Policy::Single(_) => panic!("expected a policy group"),
        }
    }

    #[test]
    fn test_labels_and_annotations() {
        let rule = AdmissionRule::deny(
            1001,
            vec![
                Criterion::new(criteria::ANNOTATIONS, ops::CONTAINS_ANY, "bad1,bad2"),
                Criterion::new(criteria::LABELS, ops::CONTAINS_ANY, "bad1=value1*,bad2=value2"),
            ],
        )
        .with_comment("no bad metadata");
        let group = build(&rule).unwrap();

        assert_eq!(group.kind, "ClusterAdmissionPolicyGroup");
        assert_eq!(group.spec.expression, "annotations() && labels()");
        assert_eq!(
            group.spec.message,
            "violate NeuVector rule (id=1001), comment no bad metadata"
        );
        assert_eq!(group.spec.policies.len(), 2);
        assert_eq!(group.spec.policies["labels"].module, module::LABELS);
        assert_eq!(
            group.spec.policies["annotations"].settings,
            json!({"criteria": "doesNotContainAnyOf", "values": ["bad1", "bad2"]})
        );
    }

    #[test]
    fn test_same_module_criteria_share_a_member() {
        let rule = AdmissionRule::deny(
            1002,
            vec![
                Criterion::new(criteria::SHARE_PID_WITH_HOST, ops::EQUAL, "true"),
                Criterion::new(criteria::RUN_AS_ROOT, ops::EQUAL, "true"),
                Criterion::new(criteria::SHARE_NET_WITH_HOST, ops::EQUAL, "true"),
            ],
        );
        let group = build(&rule).unwrap();

        assert_eq!(
            group.spec.expression,
            "container_running_as_user() && host_namespaces_psp()"
        );
        assert_eq!(
            group.spec.policies["host_namespaces_psp"].settings,
            json!({"allow_host_ipc": true, "allow_host_network": false, "allow_host_pid": false})
        );
    }

    #[test]
    fn test_resources_merged_and_sorted() {
        let rule = AdmissionRule::deny(
            1003,
            vec![
                Criterion::new(criteria::RUN_AS_PRIVILEGED, ops::EQUAL, "true"),
                Criterion::new(criteria::STORAGE_CLASS_NAME, ops::NOT_CONTAINS_ANY, "fast"),
            ],
        );
        let group = build(&rule).unwrap();
        assert_eq!(group.spec.rules.len(), 4);
        assert_eq!(group.spec.rules[0].resources, vec!["persistentvolumeclaims"]);
        assert_eq!(group.spec.rules[1].resources, vec!["pods"]);
    }

    #[test]
    fn test_context_aware_member() {
        let rule = AdmissionRule::deny(
            1004,
            vec![
                Criterion::new(criteria::CVE_HIGH_COUNT, ops::BIGGER_EQUAL_THAN, "1"),
                Criterion::new(criteria::IMAGE, ops::CONTAINS_ANY, "busybox"),
            ],
        );
        let group = build(&rule).unwrap();
        assert_eq!(
            group.spec.policies["image_cve_policy"].context_aware_resources.len(),
            1
        );
        assert!(group.spec.policies["trusted_repos"]
            .context_aware_resources
            .is_empty());
    }

    #[test]
    fn test_namespace_gate() {
        let rule = AdmissionRule::deny(
            1005,
            vec![
                Criterion::new(criteria::NAMESPACE, ops::CONTAINS_ANY, "dev"),
                Criterion::new(criteria::RUN_AS_ROOT, ops::EQUAL, "true"),
                Criterion::new(criteria::ALLOW_PRIV_ESCALATION, ops::EQUAL, "true"),
            ],
        );
        let group = build(&rule).unwrap();
        assert_eq!(group.spec.policies.len(), 2);
        assert!(group.spec.namespace_selector.is_some());
    }

    #[test]
    fn test_member_failure_aborts_group() {
        let rule = AdmissionRule::deny(
            1006,
            vec![
                Criterion::new(criteria::RUN_AS_ROOT, ops::EQUAL, "true"),
                Criterion::new(criteria::CVE_HIGH_COUNT, ops::BIGGER_EQUAL_THAN, "lots"),
            ],
        );
        assert!(matches!(build(&rule), Err(Error::HandlerBuild(_))));
    }
}
