//! Builder selection

use kwconvert_core::{AdmissionRule, ConversionConfig, Result};
use std::collections::BTreeSet;
use tracing::debug;

use crate::builder::{GroupPolicyBuilder, PolicyBuilder, SinglePolicyBuilder};
use crate::policy::Policy;
use crate::registry::CriterionRegistry;

/// Picks the builder for a rule and runs it
#[derive(Debug, Clone, Copy)]
pub struct PolicyFactory<'a> {
    registry: &'a CriterionRegistry,
}

impl<'a> PolicyFactory<'a> {
    pub fn new(registry: &'a CriterionRegistry) -> Self {
        Self { registry }
    }

    /// Whether the rule needs a policy group.
    ///
    /// A single policy runs one module, so a group is needed as soon as the
    /// non-namespace criteria reach more than one module, or when any of them
    /// fans out to several modules by itself. Counting is per module rather
    /// than per criterion because criteria sharing a module merge into one
    /// settings object, e.g. `cveHighCount` with `imageScanned`.
    pub fn requires_group(&self, rule: &AdmissionRule) -> bool {
        let mut modules = BTreeSet::new();

        for criterion in &rule.criteria {
            match self.registry.lookup(&criterion.name) {
                Some(mapping) if mapping.namespace_scoped => continue,
                Some(mapping) if mapping.one_to_many => return true,
                Some(mapping) => {
                    modules.insert(mapping.module().unwrap_or(mapping.name));
                }
                None => {
                    modules.insert(criterion.name.as_str());
                }
            }
        }

        modules.len() > 1
    }

    /// Builder for the rule
    pub fn builder(&self, rule: &AdmissionRule) -> Box<dyn PolicyBuilder + 'a> {
        if self.requires_group(rule) {
            debug!(rule_id = rule.id, "Using policy group builder");
            Box::new(GroupPolicyBuilder::new(self.registry))
        } else {
            debug!(rule_id = rule.id, "Using single policy builder");
            Box::new(SinglePolicyBuilder::new(self.registry))
        }
    }

    /// Build the policy for a validated rule
    pub fn generate(&self, rule: &AdmissionRule, config: &ConversionConfig) -> Result<Policy> {
        self.builder(rule).build(rule, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kwconvert_core::types::{criteria, ops};
    use kwconvert_core::Criterion;

    fn registry() -> CriterionRegistry {
        CriterionRegistry::new(&ConversionConfig::default())
    }

    fn rule(criteria: Vec<Criterion>) -> AdmissionRule {
        AdmissionRule::deny(1001, criteria)
    }

    #[test]
    fn test_single_criterion() {
        let registry = registry();
        let factory = PolicyFactory::new(&registry);
        let r = rule(vec![Criterion::new(criteria::RUN_AS_ROOT, ops::EQUAL, "true")]);
        assert!(!factory.requires_group(&r));
    }

    #[test]
    fn test_two_modules() {
        let registry = registry();
        let factory = PolicyFactory::new(&registry);
        let r = rule(vec![
            Criterion::new(criteria::RUN_AS_ROOT, ops::EQUAL, "true"),
            Criterion::new(criteria::RUN_AS_PRIVILEGED, ops::EQUAL, "true"),
        ]);
        assert!(factory.requires_group(&r));
    }

    #[test]
    fn test_two_criteria_same_module() {
        let registry = registry();
        let factory = PolicyFactory::new(&registry);
        let r = rule(vec![
            Criterion::new(criteria::SHARE_IPC_WITH_HOST, ops::EQUAL, "true"),
            Criterion::new(criteria::SHARE_NET_WITH_HOST, ops::EQUAL, "true"),
        ]);
        assert!(!factory.requires_group(&r));
    }

    #[test]
    fn test_namespace_not_counted() {
        let registry = registry();
        let factory = PolicyFactory::new(&registry);
        let ns = Criterion::new(criteria::NAMESPACE, ops::CONTAINS_ANY, "dev");

        assert!(!factory.requires_group(&rule(vec![ns.clone()])));
        assert!(!factory.requires_group(&rule(vec![
            ns,
            Criterion::new(criteria::USER, ops::CONTAINS_ANY, "bob"),
        ])));
    }

    #[test]
    fn test_one_to_many() {
        let registry = registry();
        let factory = PolicyFactory::new(&registry);
        let r = rule(vec![Criterion::new(criteria::PSP_COMPLIANCE, ops::EQUAL, "true")]);
        assert!(factory.requires_group(&r));
    }
}
