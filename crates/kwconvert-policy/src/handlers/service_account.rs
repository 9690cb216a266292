//! Service accounts bound to high risk roles

use kwconvert_core::{Criterion, Error, Result};
use serde::Serialize;
use serde_json::{json, Value};

use super::{list_values, single, PolicyHandler};
use crate::module;

/// RBAC permission set the module blocks service accounts from holding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRule {
    pub api_groups: Vec<&'static str>,
    pub resources: Vec<&'static str>,
    pub verbs: Vec<&'static str>,
}

fn block(api_group: &'static str, resources: &[&'static str], verbs: &[&'static str]) -> BlockRule {
    BlockRule {
        api_groups: vec![api_group],
        resources: resources.to_vec(),
        verbs: verbs.to_vec(),
    }
}

/// Expand a risk category into the permissions it stands for
pub fn block_rules_for(category: &str) -> Option<Vec<BlockRule>> {
    let rules = match category {
        "risky_role_view_secret" => vec![block("", &["secrets"], &["list", "get"])],
        "risky_role_any_action_workload" => vec![
            block("", &["pods", "pods/log"], &["*"]),
            block(
                "apps",
                &["deployments", "statefulsets", "daemonsets", "replicasets"],
                &["*"],
            ),
            block("batch", &["jobs", "cronjobs"], &["*"]),
            block("autoscaling", &["horizontalpodautoscalers"], &["*"]),
        ],
        "risky_role_any_action_rbac" => vec![block(
            "rbac.authorization.k8s.io",
            &["roles", "rolebindings"],
            &["*"],
        )],
        "risky_role_create_pod" => vec![block("", &["pods"], &["create"])],
        "risky_role_exec_into_container" => vec![block("", &["pods/exec"], &["create"])],
        _ => return None,
    };

    Some(rules)
}

/// Builds `high-risk-service-account` settings
#[derive(Debug, Default)]
pub struct HighRiskServiceAccountHandler;

impl HighRiskServiceAccountHandler {
    pub fn new() -> Self {
        Self
    }
}

impl PolicyHandler for HighRiskServiceAccountHandler {
    fn module(&self) -> &str {
        module::HIGH_RISK_SERVICE_ACCOUNT
    }

    fn build_settings(&self, criteria: &[&Criterion]) -> Result<Value> {
        let criterion = single(criteria)?;
        let mut block_rules: Vec<BlockRule> = Vec::new();

        for category in list_values(criterion)? {
            let rules = block_rules_for(&category).ok_or_else(|| {
                Error::handler(format!("unknown risky role category: {}", category))
            })?;

            for rule in rules {
                if !block_rules.contains(&rule) {
                    block_rules.push(rule);
                }
            }
        }

        Ok(json!({ "blockRules": block_rules }))
    }
}
