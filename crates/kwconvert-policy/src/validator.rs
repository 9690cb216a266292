//! Rule and criterion eligibility checks

use kwconvert_core::{AdmissionRule, Error, Result, RuleType, RESERVED_RULE_ID_MAX};

use crate::registry::CriterionRegistry;

/// Checks a rule against the registry before any policy is built.
///
/// Checks run in a fixed order and the first failure rejects the whole rule:
/// reserved id, rule type, disabled flag, then each criterion in order.
#[derive(Debug, Clone, Copy)]
pub struct RuleValidator<'a> {
    registry: &'a CriterionRegistry,
}

impl<'a> RuleValidator<'a> {
    pub fn new(registry: &'a CriterionRegistry) -> Self {
        Self { registry }
    }

    /// Validate an expanded rule
    pub fn validate(&self, rule: &AdmissionRule) -> Result<()> {
        if rule.id < RESERVED_RULE_ID_MAX {
            return Err(Error::LegacyOnlyRule { id: rule.id });
        }

        if rule.rule_type != RuleType::Deny {
            return Err(Error::UnsupportedRuleType(rule.rule_type.to_string()));
        }

        if rule.disabled {
            return Err(Error::RuleDisabled);
        }

        for criterion in &rule.criteria {
            // Custom criteria are handled by the custom rule bridge
            if criterion.is_custom() {
                continue;
            }

            let mapping = self
                .registry
                .lookup(&criterion.name)
                .filter(|mapping| !mapping.unsupported && mapping.handler().is_some())
                .ok_or_else(|| Error::UnsupportedCriterion(criterion.name.clone()))?;

            if !mapping.supports_operator(&criterion.operator) {
                return Err(Error::UnsupportedOperator(criterion.operator.clone()));
            }
        }

        Ok(())
    }
}
