//! Kubewarden policy objects produced by the builders
//!
//! The structs mirror the `policies.kubewarden.io/v1` custom resources closely
//! enough that `serde_yaml` renders them as applyable manifests. Field order
//! follows the order Kubernetes tooling prints them in.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// API version of every generated policy
pub const KUBEWARDEN_API_VERSION: &str = "policies.kubewarden.io/v1";

/// Kind of a single-module policy
pub const CLUSTER_ADMISSION_POLICY_KIND: &str = "ClusterAdmissionPolicy";

/// Kind of a policy group
pub const CLUSTER_ADMISSION_POLICY_GROUP_KIND: &str = "ClusterAdmissionPolicyGroup";

/// A generated policy, either a single policy or a policy group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Policy {
    Single(ClusterAdmissionPolicy),
    Group(ClusterAdmissionPolicyGroup),
}

impl Policy {
    /// Object name
    pub fn name(&self) -> &str {
        match self {
            Self::Single(policy) => &policy.metadata.name,
            Self::Group(group) => &group.metadata.name,
        }
    }

    /// Resource kind
    pub fn kind(&self) -> &str {
        match self {
            Self::Single(policy) => &policy.kind,
            Self::Group(group) => &group.kind,
        }
    }

    /// Effective mode
    pub fn mode(&self) -> &str {
        match self {
            Self::Single(policy) => &policy.spec.mode,
            Self::Group(group) => &group.spec.mode,
        }
    }

    /// Admission rules the policy registers for
    pub fn rules(&self) -> &[RuleWithOperations] {
        match self {
            Self::Single(policy) => &policy.spec.rules,
            Self::Group(group) => &group.spec.rules,
        }
    }

    /// Namespace gate, if any
    pub fn namespace_selector(&self) -> Option<&LabelSelector> {
        match self {
            Self::Single(policy) => policy.spec.namespace_selector.as_ref(),
            Self::Group(group) => group.spec.namespace_selector.as_ref(),
        }
    }

    /// Whether this is a policy group
    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group(_))
    }

    /// Single policy view
    pub fn as_single(&self) -> Option<&ClusterAdmissionPolicy> {
        match self {
            Self::Single(policy) => Some(policy),
            Self::Group(_) => None,
        }
    }

    /// Policy group view
    pub fn as_group(&self) -> Option<&ClusterAdmissionPolicyGroup> {
        match self {
            Self::Group(group) => Some(group),
            Self::Single(_) => None,
        }
    }
}

impl From<ClusterAdmissionPolicy> for Policy {
    fn from(policy: ClusterAdmissionPolicy) -> Self {
        Self::Single(policy)
    }
}

impl From<ClusterAdmissionPolicyGroup> for Policy {
    fn from(group: ClusterAdmissionPolicyGroup) -> Self {
        Self::Group(group)
    }
}

/// Object metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
}

/// `ClusterAdmissionPolicy` resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAdmissionPolicy {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ClusterAdmissionPolicySpec,
}

/// Spec of a single policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAdmissionPolicySpec {
    pub policy_server: String,
    pub module: String,
    pub mode: String,
    pub background_audit: bool,
    pub rules: Vec<RuleWithOperations>,
    pub settings: Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_aware_resources: Vec<ContextAwareResource>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<LabelSelector>,
}

/// `ClusterAdmissionPolicyGroup` resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAdmissionPolicyGroup {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: ClusterAdmissionPolicyGroupSpec,
}

/// Spec of a policy group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAdmissionPolicyGroupSpec {
    pub policy_server: String,
    pub mode: String,
    pub background_audit: bool,
    pub rules: Vec<RuleWithOperations>,
    pub message: String,
    pub expression: String,

    /// Members keyed by member name; the map keeps them sorted
    pub policies: BTreeMap<String, PolicyGroupMember>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<LabelSelector>,
}

/// One module invocation inside a policy group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyGroupMember {
    pub module: String,
    pub settings: Value,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context_aware_resources: Vec<ContextAwareResource>,
}

/// Kubernetes resource a policy is allowed to read at evaluation time
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextAwareResource {
    pub api_version: String,
    pub kind: String,
}

impl ContextAwareResource {
    pub fn new(api_version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            api_version: api_version.into(),
            kind: kind.into(),
        }
    }
}

/// Admission operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Operation {
    Create,
    Update,
    Delete,
    Connect,
}

/// Admission rule: which operations on which resources the policy sees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleWithOperations {
    pub api_groups: Vec<String>,
    pub api_versions: Vec<String>,
    pub resources: Vec<String>,
    pub operations: Vec<Operation>,
}

impl RuleWithOperations {
    pub fn new(api_group: &str, resources: &[&str], operations: &[Operation]) -> Self {
        Self {
            api_groups: vec![api_group.to_string()],
            api_versions: vec!["v1".to_string()],
            resources: resources.iter().map(|r| r.to_string()).collect(),
            operations: operations.to_vec(),
        }
    }
}

/// Label selector restricted to match expressions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    pub match_expressions: Vec<LabelSelectorRequirement>,
}

/// Selector operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// A single selector requirement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_single() -> ClusterAdmissionPolicy {
        ClusterAdmissionPolicy {
            api_version: KUBEWARDEN_API_VERSION.to_string(),
            kind: CLUSTER_ADMISSION_POLICY_KIND.to_string(),
            metadata: ObjectMeta {
                name: "neuvector-rule-1001-conversion".to_string(),
            },
            spec: ClusterAdmissionPolicySpec {
                policy_server: "default".to_string(),
                module: "registry://example/module:v1".to_string(),
                mode: "protect".to_string(),
                background_audit: true,
                rules: vec![RuleWithOperations::new(
                    "",
                    &["pods"],
                    &[Operation::Create, Operation::Update],
                )],
                settings: json!({}),
                context_aware_resources: Vec::new(),
                namespace_selector: None,
            },
        }
    }

    #[test]
    fn test_single_policy_field_names() {
        let value = serde_json::to_value(Policy::from(sample_single())).unwrap();
        assert_eq!(value["apiVersion"], "policies.kubewarden.io/v1");
        assert_eq!(value["spec"]["policyServer"], "default");
        assert_eq!(value["spec"]["backgroundAudit"], true);
        assert_eq!(value["spec"]["rules"][0]["apiGroups"], json!([""]));
        assert_eq!(value["spec"]["rules"][0]["operations"], json!(["CREATE", "UPDATE"]));
        assert!(value["spec"].get("namespaceSelector").is_none());
        assert!(value["spec"].get("contextAwareResources").is_none());
    }

    #[test]
    fn test_untagged_round_trip_keeps_variant() {
        let policy = Policy::from(sample_single());
        let yaml = serde_yaml::to_string(&policy).unwrap();
        let parsed: Policy = serde_yaml::from_str(&yaml).unwrap();
        assert!(!parsed.is_group());
        assert_eq!(parsed, policy);
    }

    #[test]
    fn test_selector_serialization() {
        let selector = LabelSelector {
            match_expressions: vec![LabelSelectorRequirement {
                key: "kubernetes.io/metadata.name".to_string(),
                operator: SelectorOperator::NotIn,
                values: vec!["kube-system".to_string()],
            }],
        };
        let value = serde_json::to_value(selector).unwrap();
        assert_eq!(value["matchExpressions"][0]["operator"], "NotIn");
    }
}
