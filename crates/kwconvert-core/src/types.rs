//! Core types for kwconvert

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rule ids below this value belong to built-in rules and are never converted
pub const RESERVED_RULE_ID_MAX: u32 = 1000;

/// Criterion names used by the source admission rule format
pub mod criteria {
    pub const SHARE_IPC_WITH_HOST: &str = "shareIpcWithHost";
    pub const SHARE_NET_WITH_HOST: &str = "shareNetWithHost";
    pub const SHARE_PID_WITH_HOST: &str = "sharePidWithHost";
    pub const ALLOW_PRIV_ESCALATION: &str = "allowPrivEscalation";
    pub const RUN_AS_ROOT: &str = "runAsRoot";
    pub const RUN_AS_PRIVILEGED: &str = "runAsPrivileged";
    pub const STORAGE_CLASS_NAME: &str = "storageClassName";
    pub const ENV_VARS: &str = "envVars";
    pub const ENV_VAR_SECRETS: &str = "envVarSecrets";
    pub const IMAGE: &str = "image";
    pub const IMAGE_REGISTRY: &str = "imageRegistry";
    pub const NAMESPACE: &str = "namespace";
    pub const LABELS: &str = "labels";
    pub const ANNOTATIONS: &str = "annotations";
    pub const SA_BIND_RISKY_ROLE: &str = "saBindRiskyRole";
    pub const IMAGE_SCANNED: &str = "imageScanned";
    pub const CVE_HIGH_COUNT: &str = "cveHighCount";
    pub const CVE_MEDIUM_COUNT: &str = "cveMediumCount";
    pub const USER: &str = "user";
    pub const USER_GROUPS: &str = "userGroups";
    pub const RESOURCE_LIMIT: &str = "resourceLimit";
    pub const PSP_COMPLIANCE: &str = "pspCompliance";
    pub const CUSTOM_PATH: &str = "customPath";

    pub const CVE_HIGH_WITH_FIX_COUNT: &str = "cveHighWithFixCount";
    pub const CVE_NAMES: &str = "cveNames";
    pub const CVE_SCORE: &str = "cveScore";
    pub const IMAGE_COMPLIANCE: &str = "imageCompliance";
    pub const IMAGE_NO_OS: &str = "imageNoOS";
    pub const IMAGE_SIGNED: &str = "imageSigned";
    pub const IMAGE_VERIFIERS: &str = "imageVerifiers";
    pub const MODULES: &str = "modules";
    pub const MOUNT_VOLUMES: &str = "mountVolumes";
    pub const HAS_PSS_VIOLATION: &str = "hasPssViolation";

    /// Sub-criterion names carried by a resource limit criterion
    pub const CPU_LIMIT: &str = "cpuLimit";
    pub const CPU_REQUEST: &str = "cpuRequest";
    pub const MEMORY_LIMIT: &str = "memoryLimit";
    pub const MEMORY_REQUEST: &str = "memoryRequest";

    /// Whether a criterion name routes the rule to the custom rule bridge
    pub fn is_custom(name: &str) -> bool {
        name == CUSTOM_PATH || name.is_empty()
    }
}

/// Criterion operators used by the source admission rule format
pub mod ops {
    pub const EQUAL: &str = "=";
    pub const CONTAINS_ALL: &str = "containsAll";
    pub const CONTAINS_ANY: &str = "containsAny";
    pub const NOT_CONTAINS_ANY: &str = "notContainsAny";
    pub const CONTAINS_OTHER_THAN: &str = "containsOtherThan";
    pub const REGEX: &str = "regex";
    pub const NOT_REGEX: &str = "!regex";
    pub const BIGGER_EQUAL_THAN: &str = ">=";
    pub const BIGGER_THAN: &str = ">";
    pub const LESS_EQUAL_THAN: &str = "<=";
    /// Composite criteria carry their operators on the sub-criteria
    pub const NONE: &str = "";
}

/// Kind of an admission rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum RuleType {
    #[default]
    Deny,
    Exception,
    Other(String),
}

impl From<String> for RuleType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "deny" => Self::Deny,
            "exception" => Self::Exception,
            _ => Self::Other(value),
        }
    }
}

impl From<RuleType> for String {
    fn from(value: RuleType) -> Self {
        value.to_string()
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deny => f.write_str("deny"),
            Self::Exception => f.write_str("exception"),
            Self::Other(other) => f.write_str(other),
        }
    }
}

/// A single condition within an admission rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Criterion name
    pub name: String,

    /// Comparison operator
    #[serde(rename = "op", default)]
    pub operator: String,

    /// Raw value, often a comma separated list
    #[serde(default)]
    pub value: String,

    /// Nested conditions for composite criteria
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_criteria: Vec<Criterion>,
}

impl Criterion {
    /// Create a new criterion
    pub fn new(name: impl Into<String>, operator: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator: operator.into(),
            value: value.into(),
            sub_criteria: Vec::new(),
        }
    }

    /// Attach sub-criteria
    pub fn with_sub_criteria(mut self, sub_criteria: Vec<Criterion>) -> Self {
        self.sub_criteria = sub_criteria;
        self
    }

    /// Comma separated value, each item trimmed
    pub fn values(&self) -> Vec<String> {
        self.value.split(',').map(|v| v.trim().to_string()).collect()
    }

    /// Whether this criterion is the custom rule sentinel
    pub fn is_custom(&self) -> bool {
        criteria::is_custom(&self.name)
    }
}

/// An admission rule as exported from the source platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionRule {
    /// Rule identifier
    pub id: u32,

    /// Conditions, all of which must hold for the rule to match
    #[serde(default)]
    pub criteria: Vec<Criterion>,

    /// Rule kind
    #[serde(default)]
    pub rule_type: RuleType,

    /// Whether the rule is disabled
    #[serde(default)]
    pub disabled: bool,

    /// Rule mode (protect or monitor) when set on the rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    /// Free form comment
    #[serde(default)]
    pub comment: String,
}

impl AdmissionRule {
    /// Create an enabled deny rule
    pub fn deny(id: u32, criteria: Vec<Criterion>) -> Self {
        Self {
            id,
            criteria,
            rule_type: RuleType::Deny,
            disabled: false,
            mode: None,
            comment: String::new(),
        }
    }

    /// Set the rule mode
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Set the comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = comment.into();
        self
    }

    /// Set the rule type
    pub fn with_rule_type(mut self, rule_type: RuleType) -> Self {
        self.rule_type = rule_type;
        self
    }

    /// Mark the rule disabled
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Whether any criterion routes this rule to the custom rule bridge
    pub fn has_custom_criterion(&self) -> bool {
        self.criteria.iter().any(Criterion::is_custom)
    }
}
