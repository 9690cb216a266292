//! Conversion configuration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Execution mode of a generated policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PolicyMode {
    /// Reject violating requests
    #[default]
    Protect,
    /// Only report violations
    Monitor,
}

impl fmt::Display for PolicyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Protect => f.write_str("protect"),
            Self::Monitor => f.write_str("monitor"),
        }
    }
}

impl FromStr for PolicyMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "protect" => Ok(Self::Protect),
            "monitor" => Ok(Self::Monitor),
            other => Err(Error::config(format!(
                "invalid mode: {}. Allowed values are \"protect\" or \"monitor\"",
                other
            ))),
        }
    }
}

/// Settings applied to every policy produced by a conversion run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionConfig {
    /// Name of the PolicyServer the generated policies bind to
    #[serde(default = "default_policy_server")]
    pub policy_server: String,

    /// Mode override; when unset the rule mode, then the default, applies
    #[serde(default)]
    pub mode: Option<PolicyMode>,

    /// Run the generated policies in background audit
    #[serde(default = "default_true")]
    pub background_audit: bool,

    /// Namespace holding vulnerability reports
    #[serde(default = "default_vul_report_namespace")]
    pub vul_report_namespace: String,

    /// Image architecture used when looking up vulnerability reports
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Output path, `-` for stdout
    #[serde(default = "default_output")]
    pub output: String,

    /// Print a summary table after conversion
    #[serde(default)]
    pub show_summary: bool,
}

impl ConversionConfig {
    /// Load configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot reject on its own
    pub fn validate(&self) -> Result<()> {
        if self.policy_server.trim().is_empty() {
            return Err(Error::config("policy server must not be empty"));
        }
        if self.platform.trim().is_empty() {
            return Err(Error::config("platform must not be empty"));
        }
        Ok(())
    }

    /// Effective mode for a rule: override, then rule mode, then default
    pub fn resolve_mode(&self, rule_mode: Option<&str>) -> String {
        if let Some(mode) = self.mode {
            return mode.to_string();
        }

        match rule_mode {
            Some(mode) if !mode.is_empty() => mode.to_string(),
            _ => PolicyMode::default().to_string(),
        }
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            policy_server: default_policy_server(),
            mode: None,
            background_audit: true,
            vul_report_namespace: default_vul_report_namespace(),
            platform: default_platform(),
            output: default_output(),
            show_summary: false,
        }
    }
}

fn default_policy_server() -> String {
    "default".to_string()
}

fn default_vul_report_namespace() -> String {
    "sbomscanner".to_string()
}

fn default_platform() -> String {
    "amd64".to_string()
}

fn default_output() -> String {
    "policies.yaml".to_string()
}

fn default_true() -> bool {
    true
}
