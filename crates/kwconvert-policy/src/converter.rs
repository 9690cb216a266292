//! Rule conversion orchestration

use kwconvert_core::{AdmissionRule, ConversionConfig, Result};
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::custom::{CustomArtifact, CustomRuleBridge, NoCustomRuleBridge};
use crate::factory::PolicyFactory;
use crate::meta::MetaCriterionExpander;
use crate::policy::Policy;
use crate::registry::CriterionRegistry;
use crate::validator::RuleValidator;

/// Counter of processed rules, labelled by outcome
pub const RULES_TOTAL_METRIC: &str = "kwconvert_rules_total";

const MSG_RULE_CONVERTED: &str = "rule converted successfully";

/// Outcome status of one rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStatus {
    Ok,
    Skipped,
}

impl fmt::Display for SummaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::Skipped => f.write_str("Skipped"),
        }
    }
}

/// Result line for one input rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub id: u32,
    pub status: SummaryStatus,
    pub notes: String,
}

impl SummaryEntry {
    fn ok(id: u32, notes: impl Into<String>) -> Self {
        Self {
            id,
            status: SummaryStatus::Ok,
            notes: notes.into(),
        }
    }

    fn skipped(id: u32, notes: impl Into<String>) -> Self {
        Self {
            id,
            status: SummaryStatus::Skipped,
            notes: notes.into(),
        }
    }
}

/// What became of a single rule
#[derive(Debug, Clone, PartialEq)]
pub enum RuleOutcome {
    /// Converted into a policy
    Converted(Policy),
    /// Handed to the custom rule bridge
    Diverted(CustomArtifact),
}

/// Outcome of a batch
#[derive(Debug, Clone, Default)]
pub struct ConversionResult {
    /// Generated policies, in input order
    pub policies: Vec<Policy>,
    /// Artifacts from the custom rule bridge
    pub diverted: Vec<CustomArtifact>,
    /// One entry per input rule, in input order
    pub summary: Vec<SummaryEntry>,
}

impl ConversionResult {
    /// Number of skipped rules
    pub fn skipped(&self) -> usize {
        self.summary
            .iter()
            .filter(|entry| entry.status == SummaryStatus::Skipped)
            .count()
    }
}

/// Converts admission rules into Kubewarden policies
pub struct RuleConverter {
    config: ConversionConfig,
    registry: CriterionRegistry,
    expander: MetaCriterionExpander,
    bridge: Box<dyn CustomRuleBridge>,
}

impl RuleConverter {
    /// Create a converter; custom rules are skipped until a bridge is set
    pub fn new(config: ConversionConfig) -> Result<Self> {
        config.validate()?;
        let registry = CriterionRegistry::new(&config);

        Ok(Self {
            config,
            registry,
            expander: MetaCriterionExpander::new(),
            bridge: Box::new(NoCustomRuleBridge),
        })
    }

    /// Use a custom rule bridge
    pub fn with_bridge(mut self, bridge: Box<dyn CustomRuleBridge>) -> Self {
        self.bridge = bridge;
        self
    }

    /// Conversion configuration
    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// Criterion registry
    pub fn registry(&self) -> &CriterionRegistry {
        &self.registry
    }

    /// Convert one rule.
    ///
    /// Meta-criteria are expanded first. Rules with a custom criterion then go
    /// to the bridge; everything else is validated and built.
    pub fn convert_rule(&self, rule: &AdmissionRule) -> Result<RuleOutcome> {
        let rule = self.expander.expand_rule(rule)?;

        if rule.has_custom_criterion() {
            debug!(rule_id = rule.id, bridge = self.bridge.name(), "Diverting custom rule");
            return self.bridge.convert(&rule).map(RuleOutcome::Diverted);
        }

        RuleValidator::new(&self.registry).validate(&rule)?;

        PolicyFactory::new(&self.registry)
            .generate(&rule, &self.config)
            .map(RuleOutcome::Converted)
    }

    /// Convert a batch; failures are recorded per rule and never stop the batch
    pub fn convert_rules(&self, rules: &[AdmissionRule]) -> ConversionResult {
        let mut result = ConversionResult::default();

        for rule in rules {
            match self.convert_rule(rule) {
                Ok(RuleOutcome::Converted(policy)) => {
                    debug!(rule_id = rule.id, policy = policy.name(), "Rule converted");
                    metrics::counter!(RULES_TOTAL_METRIC, "status" => "converted").increment(1);
                    result.summary.push(SummaryEntry::ok(rule.id, MSG_RULE_CONVERTED));
                    result.policies.push(policy);
                }
                Ok(RuleOutcome::Diverted(artifact)) => {
                    metrics::counter!(RULES_TOTAL_METRIC, "status" => "diverted").increment(1);
                    result.summary.push(SummaryEntry::ok(
                        rule.id,
                        format!(
                            "{} artifact {} generated (no policy for custom rule)",
                            artifact.kind, artifact.file_name
                        ),
                    ));
                    result.diverted.push(artifact);
                }
                Err(e) => {
                    if e.is_rule_scoped() {
                        warn!(rule_id = rule.id, reason = %e, "Rule skipped");
                    } else {
                        error!(rule_id = rule.id, error = %e, "Rule failed unexpectedly");
                    }
                    metrics::counter!(RULES_TOTAL_METRIC, "status" => "skipped").increment(1);
                    result.summary.push(SummaryEntry::skipped(rule.id, e.to_string()));
                }
            }
        }

        info!(
            rules = rules.len(),
            policies = result.policies.len(),
            diverted = result.diverted.len(),
            skipped = result.skipped(),
            "Conversion finished"
        );

        result
    }
}

impl fmt::Debug for RuleConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleConverter")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("bridge", &self.bridge.name())
            .finish()
    }
}
