//! Error types for kwconvert

/// Result type alias using kwconvert's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for kwconvert operations
///
/// The rule-scoped variants double as the skip reason recorded for a rule,
/// so their display strings are kept short and stable.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rule id falls in the range reserved for built-in rules
    #[error("neuvector environment only rule")]
    LegacyOnlyRule { id: u32 },

    /// Rule is not a deny rule
    #[error("only \"deny\" rule supported, got {0}")]
    UnsupportedRuleType(String),

    /// Rule is disabled in the source export
    #[error("rule is disabled")]
    RuleDisabled,

    /// Criterion is unknown or flagged unsupported
    #[error("unsupported criteria: {0}")]
    UnsupportedCriterion(String),

    /// Operator is not accepted for the criterion
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    /// More than one namespace criterion in a single rule
    #[error("rule skipped: contains multiple namespace selectors")]
    MultipleNamespaceSelectors,

    /// Nothing but namespace criteria remained
    #[error("rule skipped: contains only namespace selector without enforceable policy conditions")]
    NoEnforceablePolicy,

    /// A handler could not build settings for its criteria
    #[error("failed to build policy settings: {0}")]
    HandlerBuild(String),

    /// Criteria could not be grouped into policy group members
    #[error("failed to group criteria by module: {0}")]
    ModuleGrouping(String),

    /// The custom rule bridge rejected or failed on a diverted rule
    #[error("custom rule conversion failed: {0}")]
    CustomRule(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed input rule files
    #[error("input error: {0}")]
    Input(String),

    /// Filesystem errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization errors
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Create a new handler build error
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::HandlerBuild(msg.into())
    }

    /// Create a new module grouping error
    pub fn grouping(msg: impl Into<String>) -> Self {
        Self::ModuleGrouping(msg.into())
    }

    /// Create a new custom rule error
    pub fn custom_rule(msg: impl Into<String>) -> Self {
        Self::CustomRule(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new input error
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    /// Whether this error is scoped to a single rule and should not abort a batch
    pub fn is_rule_scoped(&self) -> bool {
        matches!(
            self,
            Self::LegacyOnlyRule { .. }
                | Self::UnsupportedRuleType(_)
                | Self::RuleDisabled
                | Self::UnsupportedCriterion(_)
                | Self::UnsupportedOperator(_)
                | Self::MultipleNamespaceSelectors
                | Self::NoEnforceablePolicy
                | Self::HandlerBuild(_)
                | Self::ModuleGrouping(_)
                | Self::CustomRule(_)
        )
    }
}
