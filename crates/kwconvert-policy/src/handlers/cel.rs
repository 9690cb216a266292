//! CEL validations for namespace, user and user group criteria

use kwconvert_core::types::{criteria, ops};
use kwconvert_core::{Criterion, Error, Result};
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};

use super::{list_values, unexpected_criterion, PolicyHandler};
use crate::module;

const USERNAME: &str = "request.userInfo.username";
const GROUPS: &str = "request.userInfo.groups";

/// One entry of the `validations` list understood by `cel-policy`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CelValidation {
    /// Acceptance condition
    pub expression: String,
    /// Shown to the user when the expression evaluates to false
    pub message: String,
}

/// Builds `cel-policy` settings.
///
/// Each criterion becomes one validation whose expression holds for requests
/// the source rule would have let through.
#[derive(Debug, Default)]
pub struct CelHandler;

impl CelHandler {
    pub fn new() -> Self {
        Self
    }

    fn validation(&self, criterion: &Criterion) -> Result<CelValidation> {
        match criterion.name.as_str() {
            criteria::NAMESPACE => namespace_validation(criterion),
            criteria::USER => user_validation(criterion),
            criteria::USER_GROUPS => groups_validation(criterion),
            _ => Err(unexpected_criterion(criterion)),
        }
    }
}

impl PolicyHandler for CelHandler {
    fn module(&self) -> &str {
        module::CEL_POLICY
    }

    fn build_settings(&self, criteria: &[&Criterion]) -> Result<Value> {
        if criteria.is_empty() {
            return Err(Error::handler("no criteria to build CEL validations from"));
        }

        let validations = criteria
            .iter()
            .map(|criterion| self.validation(criterion))
            .collect::<Result<Vec<_>>>()?;

        Ok(json!({ "validations": validations }))
    }
}

fn namespace_validation(criterion: &Criterion) -> Result<CelValidation> {
    let namespaces = quoted_list(&list_values(criterion)?)?;

    // Trailing newlines render as block scalars in the YAML output
    let validation = match criterion.operator.as_str() {
        ops::CONTAINS_ANY => CelValidation {
            expression: format!(
                "has(object.metadata.namespace) && !(object.metadata.namespace in [{}])\n",
                namespaces
            ),
            message: format!("Namespace must not be one of: {}.\n", namespaces),
        },
        ops::NOT_CONTAINS_ANY => CelValidation {
            expression: format!(
                "has(object.metadata.namespace) && (object.metadata.namespace in [{}])\n",
                namespaces
            ),
            message: format!("Namespace must be one of: {}.\n", namespaces),
        },
        other => return Err(unsupported_operator(criterion, other)),
    };

    Ok(validation)
}

fn user_validation(criterion: &Criterion) -> Result<CelValidation> {
    let validation = match criterion.operator.as_str() {
        ops::CONTAINS_ANY => {
            let (patterns, shown) = patterns(criterion)?;
            CelValidation {
                expression: format!("!({}.exists(p, {}.matches(p)))", patterns, USERNAME),
                message: format!("User must not be one of: {}.", shown),
            }
        }
        ops::NOT_CONTAINS_ANY => {
            let (patterns, shown) = patterns(criterion)?;
            CelValidation {
                expression: format!("{}.exists(p, {}.matches(p))", patterns, USERNAME),
                message: format!("User must be one of: {}.", shown),
            }
        }
        ops::REGEX => {
            let regex = regex_literal(criterion)?;
            CelValidation {
                expression: format!("!{}.matches({})", USERNAME, regex),
                message: format!("User must not match: {}.", regex),
            }
        }
        ops::NOT_REGEX => {
            let regex = regex_literal(criterion)?;
            CelValidation {
                expression: format!("{}.matches({})", USERNAME, regex),
                message: format!("User must match: {}.", regex),
            }
        }
        other => return Err(unsupported_operator(criterion, other)),
    };

    Ok(validation)
}

fn groups_validation(criterion: &Criterion) -> Result<CelValidation> {
    let validation = match criterion.operator.as_str() {
        ops::CONTAINS_ANY => {
            let (patterns, shown) = patterns(criterion)?;
            CelValidation {
                expression: format!(
                    "!{}.exists(g, {}.exists(p, g.matches(p)))",
                    GROUPS, patterns
                ),
                message: format!("User groups must not include any of: {}.", shown),
            }
        }
        ops::CONTAINS_ALL => {
            let (patterns, shown) = patterns(criterion)?;
            CelValidation {
                expression: format!(
                    "!{}.all(p, {}.exists(g, g.matches(p)))",
                    patterns, GROUPS
                ),
                message: format!("User groups must not include all of: {}.", shown),
            }
        }
        ops::NOT_CONTAINS_ANY => {
            let (patterns, shown) = patterns(criterion)?;
            CelValidation {
                expression: format!("{}.exists(g, {}.exists(p, g.matches(p)))", GROUPS, patterns),
                message: format!("User groups must include one of: {}.", shown),
            }
        }
        ops::CONTAINS_OTHER_THAN => {
            let (patterns, shown) = patterns(criterion)?;
            CelValidation {
                expression: format!("{}.all(g, {}.exists(p, g.matches(p)))", GROUPS, patterns),
                message: format!("User groups must only include: {}.", shown),
            }
        }
        ops::REGEX => {
            let regex = regex_literal(criterion)?;
            CelValidation {
                expression: format!("!{}.exists(g, g.matches({}))", GROUPS, regex),
                message: format!("User groups must not include a match for: {}.", regex),
            }
        }
        ops::NOT_REGEX => {
            let regex = regex_literal(criterion)?;
            CelValidation {
                expression: format!("{}.exists(g, g.matches({}))", GROUPS, regex),
                message: format!("User groups must include a match for: {}.", regex),
            }
        }
        other => return Err(unsupported_operator(criterion, other)),
    };

    Ok(validation)
}

/// Turn a wildcard value into an anchored regular expression.
///
/// Values without `?` or `*` match literally. Otherwise `.` is escaped,
/// `?` matches one character and `*` matches any run of characters.
pub fn wildcard_to_regex(value: &str) -> String {
    if !value.contains(['?', '*']) {
        return format!("^{}$", value);
    }

    let pattern = value
        .replace('.', "\\.")
        .replace('?', ".")
        .replace('*', ".*");

    format!("^{}$", pattern)
}

/// CEL list literal of anchored patterns plus the quoted source values for messages
fn patterns(criterion: &Criterion) -> Result<(String, String)> {
    let values = list_values(criterion)?;

    let patterns = values
        .iter()
        .map(|value| {
            let pattern = wildcard_to_regex(value);
            check_regex(criterion, &pattern)?;
            Ok(pattern)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok((serde_json::to_string(&patterns)?, quoted_list(&values)?))
}

/// Quoted CEL string literal holding the criterion value as a regular expression
fn regex_literal(criterion: &Criterion) -> Result<String> {
    let pattern = criterion.value.trim();
    if pattern.is_empty() {
        return Err(Error::handler(format!(
            "criterion {} has no values",
            criterion.name
        )));
    }

    check_regex(criterion, pattern)?;
    Ok(serde_json::to_string(pattern)?)
}

fn check_regex(criterion: &Criterion, pattern: &str) -> Result<()> {
    Regex::new(pattern).map(|_| ()).map_err(|e| {
        Error::handler(format!(
            "invalid pattern {:?} for criterion {}: {}",
            pattern, criterion.name, e
        ))
    })
}

/// `"a", "b"` rendering used both in expressions and messages
fn quoted_list(values: &[String]) -> Result<String> {
    let quoted = values
        .iter()
        .map(serde_json::to_string)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(quoted.join(", "))
}

fn unsupported_operator(criterion: &Criterion, operator: &str) -> Error {
    Error::handler(format!(
        "unsupported operator {} for criterion {}",
        operator, criterion.name
    ))
}
