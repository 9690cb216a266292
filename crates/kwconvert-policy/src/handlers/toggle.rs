//! Modules enabled with fixed settings

use kwconvert_core::{Criterion, Error, Result};
use serde_json::{json, Value};

use super::PolicyHandler;
use crate::module;

/// Handler for modules whose presence alone enforces the rule
#[derive(Debug, Clone)]
pub struct ToggleHandler {
    module: &'static str,
    settings: Value,
    required_value: Option<&'static str>,
}

impl ToggleHandler {
    /// `allow-privilege-escalation-psp`
    pub fn allow_privilege_escalation() -> Self {
        Self {
            module: module::ALLOW_PRIVILEGE_ESCALATION_PSP,
            settings: json!({ "default_allow_privilege_escalation": true }),
            required_value: None,
        }
    }

    /// `pod-privileged`
    pub fn pod_privileged() -> Self {
        Self {
            module: module::POD_PRIVILEGED,
            settings: json!({}),
            required_value: None,
        }
    }

    /// `container-running-as-user`, defaults to requiring a non-root user
    pub fn running_as_user() -> Self {
        Self {
            module: module::CONTAINER_RUNNING_AS_USER,
            settings: json!({}),
            required_value: None,
        }
    }

    /// `env-variable-secrets-scanner`
    ///
    /// The module can only detect secrets, so only rules that deny secrets
    /// (value `false`, "no secrets allowed") are convertible.
    pub fn env_var_secrets() -> Self {
        Self {
            module: module::ENV_VARIABLE_SECRETS_SCANNER,
            settings: json!({}),
            required_value: Some("false"),
        }
    }
}

impl PolicyHandler for ToggleHandler {
    fn module(&self) -> &str {
        self.module
    }

    fn build_settings(&self, criteria: &[&Criterion]) -> Result<Value> {
        if let Some(required) = self.required_value {
            for criterion in criteria {
                if criterion.value.trim() != required {
                    return Err(Error::handler(format!(
                        "{} supports only {} value, got: {}",
                        criterion.name, required, criterion.value
                    )));
                }
            }
        }

        Ok(self.settings.clone())
    }
}
