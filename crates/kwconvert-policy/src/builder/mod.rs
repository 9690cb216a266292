//! Policy builders
//!
//! Both builders share the pieces in this module: the policy name, admission
//! rules derived from the modules' target resources, and the namespace gate
//! built from the rule's namespace criterion.

use kwconvert_core::types::ops;
use kwconvert_core::{AdmissionRule, ConversionConfig, Criterion, Error, Result};
use std::collections::BTreeSet;

use crate::handlers::ApplicableResource;
use crate::policy::{
    LabelSelector, LabelSelectorRequirement, Operation, Policy, RuleWithOperations,
    SelectorOperator,
};
use crate::registry::CriterionRegistry;

pub mod group;
pub mod single;

pub use group::GroupPolicyBuilder;
pub use single::SinglePolicyBuilder;

/// Label every namespace carries with its own name
pub const NAMESPACE_NAME_LABEL: &str = "kubernetes.io/metadata.name";

/// Assembles a policy object for a validated rule
pub trait PolicyBuilder {
    /// Build the policy; any failure rejects the whole rule
    fn build(&self, rule: &AdmissionRule, config: &ConversionConfig) -> Result<Policy>;
}

/// Deterministic policy name for a rule
pub fn policy_name(rule: &AdmissionRule) -> String {
    format!("neuvector-rule-{}-conversion", rule.id)
}

/// Admission rules for a set of target resources, in resource order
pub fn build_rules(resources: &BTreeSet<ApplicableResource>) -> Vec<RuleWithOperations> {
    resources
        .iter()
        .flat_map(|resource| match resource {
            ApplicableResource::Pvc => pvc_rules(),
            ApplicableResource::Workload => workload_rules(),
        })
        .collect()
}

fn pvc_rules() -> Vec<RuleWithOperations> {
    vec![RuleWithOperations::new(
        "",
        &["persistentvolumeclaims"],
        &[Operation::Create],
    )]
}

fn workload_rules() -> Vec<RuleWithOperations> {
    let create_update = [Operation::Create, Operation::Update];
    vec![
        RuleWithOperations::new("", &["pods"], &create_update),
        RuleWithOperations::new(
            "apps",
            &["deployments", "replicasets", "daemonsets", "statefulsets"],
            &create_update,
        ),
        RuleWithOperations::new("batch", &["jobs", "cronjobs"], &create_update),
    ]
}

/// Namespace gate for a namespace criterion.
///
/// `containsAny` denies in the listed namespaces, so the policy only runs
/// there (`In`). `notContainsAny` denies everywhere else (`NotIn`).
pub fn namespace_selector(criterion: &Criterion) -> Result<LabelSelector> {
    let operator = match criterion.operator.as_str() {
        ops::CONTAINS_ANY => SelectorOperator::In,
        ops::NOT_CONTAINS_ANY => SelectorOperator::NotIn,
        other => return Err(Error::UnsupportedOperator(other.to_string())),
    };

    let values: Vec<String> = criterion
        .values()
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect();
    if values.is_empty() {
        return Err(Error::handler("namespace criterion has no values"));
    }

    Ok(LabelSelector {
        match_expressions: vec![LabelSelectorRequirement {
            key: NAMESPACE_NAME_LABEL.to_string(),
            operator,
            values,
        }],
    })
}

/// A rule split into its namespace gate and the criteria that become checks
#[derive(Debug)]
pub(crate) struct SplitRule<'r> {
    pub namespace_selector: Option<LabelSelector>,
    pub criteria: Vec<&'r Criterion>,
}

/// Separate the namespace criterion from the enforceable ones
pub(crate) fn split_rule<'r>(
    registry: &CriterionRegistry,
    rule: &'r AdmissionRule,
) -> Result<SplitRule<'r>> {
    let mut namespace = None;
    let mut criteria = Vec::new();

    for criterion in &rule.criteria {
        let scoped = registry
            .lookup(&criterion.name)
            .map(|mapping| mapping.namespace_scoped)
            .unwrap_or(false);

        if scoped {
            if namespace.is_some() {
                return Err(Error::MultipleNamespaceSelectors);
            }
            namespace = Some(criterion);
        } else {
            criteria.push(criterion);
        }
    }

    if criteria.is_empty() {
        return Err(Error::NoEnforceablePolicy);
    }

    Ok(SplitRule {
        namespace_selector: namespace.map(namespace_selector).transpose()?,
        criteria,
    })
}
