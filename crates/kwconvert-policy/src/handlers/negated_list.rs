//! Environment variables, labels and annotations
//!
//! The three target modules share one settings shape: a criteria keyword and
//! a value list. The keyword states what an accepted object looks like, so it
//! is the negation of the operator that made the source rule deny.

use kwconvert_core::types::ops;
use kwconvert_core::{Criterion, Error, Result};
use serde_json::{json, Value};

use super::{list_values, single, PolicyHandler};
use crate::module;

/// Target keyword for a source operator
fn negated_criteria(operator: &str) -> Option<&'static str> {
    match operator {
        ops::CONTAINS_ALL => Some("doesNotContainAllOf"),
        ops::CONTAINS_ANY => Some("doesNotContainAnyOf"),
        ops::CONTAINS_OTHER_THAN => Some("doesNotContainOtherThan"),
        ops::NOT_CONTAINS_ANY => Some("containsAnyOf"),
        _ => None,
    }
}

/// Builds settings for the list-matching modules
#[derive(Debug)]
pub struct NegatedListHandler {
    module: &'static str,
}

impl NegatedListHandler {
    /// `environment-variable-policy`
    pub fn env_vars() -> Self {
        Self {
            module: module::ENVIRONMENT_VARIABLE_POLICY,
        }
    }

    /// `labels`
    pub fn labels() -> Self {
        Self {
            module: module::LABELS,
        }
    }

    /// `annotations`
    pub fn annotations() -> Self {
        Self {
            module: module::ANNOTATIONS,
        }
    }
}

impl PolicyHandler for NegatedListHandler {
    fn module(&self) -> &str {
        self.module
    }

    fn build_settings(&self, criteria: &[&Criterion]) -> Result<Value> {
        let criterion = single(criteria)?;
        let keyword = negated_criteria(&criterion.operator).ok_or_else(|| {
            Error::handler(format!("unsupported criteria operator: {}", criterion.operator))
        })?;

        Ok(json!({
            "criteria": keyword,
            "values": list_values(criterion)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kwconvert_core::types::criteria;

    #[test]
    fn test_negation_table() {
        let cases = [
            (ops::CONTAINS_ALL, "doesNotContainAllOf"),
            (ops::CONTAINS_ANY, "doesNotContainAnyOf"),
            (ops::CONTAINS_OTHER_THAN, "doesNotContainOtherThan"),
            (ops::NOT_CONTAINS_ANY, "containsAnyOf"),
        ];

        for handler in [
            NegatedListHandler::env_vars(),
            NegatedListHandler::labels(),
            NegatedListHandler::annotations(),
        ] {
            for (op, keyword) in cases {
                let c = Criterion::new(criteria::LABELS, op, "a, b");
                let settings = handler.build_settings(&[&c]).unwrap();
                assert_eq!(settings, json!({"criteria": keyword, "values": ["a", "b"]}));
            }
        }
    }

    #[test]
    fn test_values_keep_patterns() {
        let c = Criterion::new(criteria::LABELS, ops::CONTAINS_ANY, "bad1=value1*,bad2=value2");
        let settings = NegatedListHandler::labels().build_settings(&[&c]).unwrap();
        assert_eq!(settings["values"], json!(["bad1=value1*", "bad2=value2"]));
    }

    #[test]
    fn test_one_criterion_only() {
        let a = Criterion::new(criteria::ENV_VARS, ops::CONTAINS_ANY, "A");
        let b = Criterion::new(criteria::ENV_VARS, ops::CONTAINS_ALL, "B");
        let err = NegatedListHandler::env_vars().build_settings(&[&a, &b]).unwrap_err();
        assert!(err.to_string().contains("only one criterion is allowed"));
    }

    #[test]
    fn test_unknown_operator() {
        let c = Criterion::new(criteria::ANNOTATIONS, ops::REGEX, "a.*");
        assert!(NegatedListHandler::annotations().build_settings(&[&c]).is_err());
    }
}
