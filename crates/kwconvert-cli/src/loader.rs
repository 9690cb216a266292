//! Rule file loading
//!
//! Two export dialects are accepted:
//! - JSON from the REST API: `{"rules": [...]}`
//! - YAML custom resources: one or more documents carrying `spec.rules`
//!
//! Older exports do not keep rule ids. Those rules get synthetic ids counting
//! up from [`RESERVED_RULE_ID_MAX`] in input order.

use kwconvert_core::{AdmissionRule, Criterion, Error, Result, RuleType, RESERVED_RULE_ID_MAX};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Input file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputDialect {
    /// JSON REST export
    RestExport,
    /// YAML custom resources
    CustomResource,
}

impl InputDialect {
    /// Pick the dialect from the file extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Self::CustomResource,
            _ => Self::RestExport,
        }
    }
}

/// Criterion as exported; null lists are common in REST exports
#[derive(Debug, Deserialize)]
struct RawCriterion {
    #[serde(default)]
    name: String,
    #[serde(default)]
    op: String,
    #[serde(default)]
    value: String,
    #[serde(default)]
    sub_criteria: Option<Vec<RawCriterion>>,
}

impl From<RawCriterion> for Criterion {
    fn from(raw: RawCriterion) -> Self {
        let sub_criteria = raw
            .sub_criteria
            .unwrap_or_default()
            .into_iter()
            .map(Criterion::from)
            .collect();
        Criterion::new(raw.name, raw.op, raw.value).with_sub_criteria(sub_criteria)
    }
}

fn criteria_from(raw: Option<Vec<RawCriterion>>) -> Vec<Criterion> {
    raw.unwrap_or_default().into_iter().map(Criterion::from).collect()
}

#[derive(Debug, Deserialize)]
struct RestExport {
    #[serde(default)]
    rules: Option<Vec<RestRule>>,
}

#[derive(Debug, Deserialize)]
struct RestRule {
    #[serde(default)]
    id: Option<u32>,
    #[serde(default)]
    comment: String,
    #[serde(default)]
    criteria: Option<Vec<RawCriterion>>,
    #[serde(default)]
    disable: bool,
    #[serde(default)]
    rule_type: Option<String>,
    #[serde(default)]
    rule_mode: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomResource {
    #[serde(default)]
    spec: Option<CustomResourceSpec>,
}

#[derive(Debug, Default, Deserialize)]
struct CustomResourceSpec {
    #[serde(default)]
    rules: Option<Vec<NativeRule>>,
}

#[derive(Debug, Deserialize)]
struct NativeRule {
    #[serde(default, alias = "conversion_id_ref")]
    id: Option<u32>,
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    comment: Option<String>,
    #[serde(default)]
    criteria: Option<Vec<RawCriterion>>,
    #[serde(default)]
    disabled: Option<bool>,
    #[serde(default)]
    rule_mode: Option<String>,
}

/// Hands out synthetic ids for rules exported without one
#[derive(Debug)]
struct RuleIds {
    next: u32,
}

impl RuleIds {
    fn new() -> Self {
        Self {
            next: RESERVED_RULE_ID_MAX,
        }
    }

    fn resolve(&mut self, id: Option<u32>) -> u32 {
        match id {
            Some(id) => id,
            None => {
                let id = self.next;
                self.next += 1;
                id
            }
        }
    }
}

fn rule_type_from(value: Option<String>) -> RuleType {
    match value {
        Some(value) if !value.is_empty() => RuleType::from(value),
        _ => RuleType::Deny,
    }
}

fn mode_from(value: Option<String>) -> Option<String> {
    value.filter(|mode| !mode.is_empty())
}

/// Parse a JSON REST export
pub fn parse_rest_export(content: &str) -> Result<Vec<AdmissionRule>> {
    let export: RestExport = serde_json::from_str(content)
        .map_err(|e| Error::input(format!("failed to decode JSON rules: {}", e)))?;

    let mut ids = RuleIds::new();
    let rules = export
        .rules
        .unwrap_or_default()
        .into_iter()
        .map(|rule| AdmissionRule {
            id: ids.resolve(rule.id),
            criteria: criteria_from(rule.criteria),
            rule_type: rule_type_from(rule.rule_type),
            disabled: rule.disable,
            mode: mode_from(rule.rule_mode),
            comment: rule.comment,
        })
        .collect();

    Ok(rules)
}

/// Parse one or more YAML custom resource documents
pub fn parse_custom_resources(content: &str) -> Result<Vec<AdmissionRule>> {
    let mut ids = RuleIds::new();
    let mut rules = Vec::new();

    for (index, document) in serde_yaml::Deserializer::from_str(content).enumerate() {
        let resource = match serde_yaml::Value::deserialize(document) {
            Ok(serde_yaml::Value::Null) => continue,
            Ok(value) => serde_yaml::from_value::<CustomResource>(value),
            Err(e) => Err(e),
        }
        .map_err(|e| Error::input(format!("failed to decode YAML document {}: {}", index, e)))?;

        let native = resource.spec.unwrap_or_default().rules.unwrap_or_default();
        debug!(document = index, rules = native.len(), "Parsed custom resource document");

        rules.extend(native.into_iter().map(|rule| AdmissionRule {
            id: ids.resolve(rule.id),
            criteria: criteria_from(rule.criteria),
            rule_type: rule_type_from(rule.action),
            disabled: rule.disabled.unwrap_or(false),
            mode: mode_from(rule.rule_mode),
            comment: rule.comment.unwrap_or_default(),
        }));
    }

    Ok(rules)
}

/// Load rules from a file, picking the dialect from its extension
pub fn load_rules(path: &Path) -> Result<Vec<AdmissionRule>> {
    let content = std::fs::read_to_string(path)?;
    let dialect = InputDialect::from_path(path);

    let rules = match dialect {
        InputDialect::RestExport => parse_rest_export(&content)?,
        InputDialect::CustomResource => parse_custom_resources(&content)?,
    };

    info!(
        path = %path.display(),
        dialect = ?dialect,
        rules = rules.len(),
        "Loaded admission rules"
    );
    Ok(rules)
}
