//! Meta-criterion expansion
//!
//! A meta-criterion names a fixed bundle of atomic criteria. Rules are expanded
//! before validation so the bundle goes through the same checks as criteria
//! written by hand.

use kwconvert_core::types::{criteria, ops};
use kwconvert_core::{AdmissionRule, Criterion, Error, Result};
use std::collections::HashMap;
use tracing::debug;

/// A composite criterion and the atomic criteria it stands for
#[derive(Debug, Clone)]
pub struct MetaCriterion {
    name: &'static str,
    supported_ops: &'static [&'static str],
    bundle: &'static [&'static str],
}

impl MetaCriterion {
    /// Pod security best practices: no host namespaces, no privileged or
    /// root containers, no privilege escalation
    pub fn psp_best_practice() -> Self {
        Self {
            name: criteria::PSP_COMPLIANCE,
            supported_ops: &[ops::EQUAL],
            bundle: &[
                criteria::SHARE_IPC_WITH_HOST,
                criteria::SHARE_NET_WITH_HOST,
                criteria::SHARE_PID_WITH_HOST,
                criteria::RUN_AS_PRIVILEGED,
                criteria::RUN_AS_ROOT,
                criteria::ALLOW_PRIV_ESCALATION,
            ],
        }
    }

    /// Meta-criterion name
    pub fn name(&self) -> &str {
        self.name
    }

    /// Whether the operator is accepted
    pub fn supports_operator(&self, operator: &str) -> bool {
        self.supported_ops.contains(&operator)
    }

    /// The atomic criteria, always in the same order
    pub fn expand(&self) -> Vec<Criterion> {
        self.bundle
            .iter()
            .map(|name| Criterion::new(*name, ops::EQUAL, "true"))
            .collect()
    }
}

/// Expands meta-criteria inside rules
#[derive(Debug, Clone)]
pub struct MetaCriterionExpander {
    metas: HashMap<&'static str, MetaCriterion>,
}

impl MetaCriterionExpander {
    pub fn new() -> Self {
        let metas = [MetaCriterion::psp_best_practice()]
            .into_iter()
            .map(|meta| (meta.name, meta))
            .collect();

        Self { metas }
    }

    /// Whether the name is a meta-criterion
    pub fn is_meta(&self, name: &str) -> bool {
        self.metas.contains_key(name)
    }

    /// Atomic criteria a meta-criterion name stands for
    pub fn bundle(&self, name: &str) -> Option<Vec<Criterion>> {
        self.metas.get(name).map(MetaCriterion::expand)
    }

    /// Expand one criterion. Atomic criteria come back unchanged.
    pub fn expand(&self, criterion: &Criterion) -> Result<Vec<Criterion>> {
        match self.metas.get(criterion.name.as_str()) {
            Some(meta) => {
                if !meta.supports_operator(&criterion.operator) {
                    return Err(Error::UnsupportedOperator(criterion.operator.clone()));
                }
                Ok(meta.expand())
            }
            None => Ok(vec![criterion.clone()]),
        }
    }

    /// Copy of the rule with every meta-criterion replaced by its bundle
    pub fn expand_rule(&self, rule: &AdmissionRule) -> Result<AdmissionRule> {
        let mut expanded = Vec::with_capacity(rule.criteria.len());

        for criterion in &rule.criteria {
            let atoms = self.expand(criterion)?;
            if self.is_meta(&criterion.name) {
                debug!(
                    rule_id = rule.id,
                    criterion = %criterion.name,
                    expanded = atoms.len(),
                    "Expanded meta-criterion"
                );
            }
            expanded.extend(atoms);
        }

        Ok(AdmissionRule {
            criteria: expanded,
            ..rule.clone()
        })
    }
}

impl Default for MetaCriterionExpander {
    fn default() -> Self {
        Self::new()
    }
}
