//! Criterion registry: per-criterion translation metadata
//!
//! The registry is built once from the conversion configuration and is only
//! read afterwards. Handlers are shared between the criterion names that feed
//! the same module, which is what lets the builders group criteria by module.

use kwconvert_core::types::{criteria, ops};
use kwconvert_core::{ConversionConfig, Criterion, Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::handlers::{
    ApplicableResource, CelHandler, ContainerResourcesHandler, HighRiskServiceAccountHandler,
    HostNamespaceHandler, ImageCveHandler, NegatedListHandler, PolicyHandler, StorageClassHandler,
    ToggleHandler, TrustedReposHandler,
};
use crate::meta::MetaCriterionExpander;

/// Shape of a criterion value in the source rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// Scalar or boolean literal, used as is
    None,
    /// Comma separated list
    List,
    /// Comma separated `key=value` pairs, or sub-criteria
    Map,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("scalar"),
            Self::List => f.write_str("list"),
            Self::Map => f.write_str("map"),
        }
    }
}

/// Translation metadata for one criterion name
#[derive(Clone)]
pub struct CriterionMapping {
    /// Criterion name in the source rule format
    pub name: &'static str,

    /// Human readable name for the support matrix
    pub display_name: &'static str,

    /// Operators accepted for this criterion
    pub supported_ops: &'static [&'static str],

    /// Value shape
    pub value_shape: ValueShape,

    /// The criterion stands for several modules and always needs a policy group
    pub one_to_many: bool,

    /// Known but not convertible; listed for the support matrix only
    pub unsupported: bool,

    /// The criterion scopes a rule to namespaces instead of adding a check
    pub namespace_scoped: bool,

    handler: Option<Arc<dyn PolicyHandler>>,
}

impl fmt::Debug for CriterionMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriterionMapping")
            .field("name", &self.name)
            .field("module", &self.module())
            .field("supported_ops", &self.supported_ops)
            .field("value_shape", &self.value_shape)
            .field("one_to_many", &self.one_to_many)
            .field("unsupported", &self.unsupported)
            .field("namespace_scoped", &self.namespace_scoped)
            .finish()
    }
}

impl CriterionMapping {
    fn new(
        name: &'static str,
        display_name: &'static str,
        supported_ops: &'static [&'static str],
        value_shape: ValueShape,
        handler: Arc<dyn PolicyHandler>,
    ) -> Self {
        Self {
            name,
            display_name,
            supported_ops,
            value_shape,
            one_to_many: false,
            unsupported: false,
            namespace_scoped: false,
            handler: Some(handler),
        }
    }

    fn meta(name: &'static str, display_name: &'static str, supported_ops: &'static [&'static str]) -> Self {
        Self {
            name,
            display_name,
            supported_ops,
            value_shape: ValueShape::None,
            one_to_many: true,
            unsupported: false,
            namespace_scoped: false,
            handler: None,
        }
    }

    fn unsupported(name: &'static str, display_name: &'static str) -> Self {
        Self {
            name,
            display_name,
            supported_ops: &[],
            value_shape: ValueShape::None,
            one_to_many: false,
            unsupported: true,
            namespace_scoped: false,
            handler: None,
        }
    }

    fn namespace_scoped(mut self) -> Self {
        self.namespace_scoped = true;
        self
    }

    /// Target module, if the criterion converts directly
    pub fn module(&self) -> Option<&str> {
        self.handler.as_ref().map(|h| h.module())
    }

    /// Settings builder for this criterion
    pub fn handler(&self) -> Option<&Arc<dyn PolicyHandler>> {
        self.handler.as_ref()
    }

    /// Objects the target module validates
    pub fn applicable_resource(&self) -> Option<ApplicableResource> {
        self.handler.as_ref().map(|h| h.applicable_resource())
    }

    /// Whether the operator is accepted
    pub fn supports_operator(&self, operator: &str) -> bool {
        self.supported_ops.contains(&operator)
    }
}

/// One row of the support matrix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportEntry {
    pub name: String,
    pub display_name: String,
    pub supported: bool,
    pub value_shape: ValueShape,
    /// Target modules; several for meta-criteria, none for unsupported names
    pub modules: Vec<String>,
    pub operators: Vec<String>,
}

/// Registry of every criterion name the converter knows about
pub struct CriterionRegistry {
    mappings: HashMap<&'static str, CriterionMapping>,
}

impl CriterionRegistry {
    /// Build the registry for a conversion run
    pub fn new(config: &ConversionConfig) -> Self {
        let host_namespace: Arc<dyn PolicyHandler> = Arc::new(HostNamespaceHandler::new());
        let trusted_repos: Arc<dyn PolicyHandler> = Arc::new(TrustedReposHandler::new());
        let cel: Arc<dyn PolicyHandler> = Arc::new(CelHandler::new());
        let image_cve: Arc<dyn PolicyHandler> = Arc::new(ImageCveHandler::new(
            config.vul_report_namespace.clone(),
            config.platform.clone(),
        ));

        const EQUAL: &[&str] = &[ops::EQUAL];
        const ANY_OR_NONE: &[&str] = &[ops::CONTAINS_ANY, ops::NOT_CONTAINS_ANY];
        const SET_OPS: &[&str] = &[
            ops::CONTAINS_ALL,
            ops::CONTAINS_ANY,
            ops::NOT_CONTAINS_ANY,
            ops::CONTAINS_OTHER_THAN,
        ];
        const CVE_OPS: &[&str] = &[ops::BIGGER_EQUAL_THAN, ops::EQUAL];
        const USER_OPS: &[&str] = &[
            ops::CONTAINS_ANY,
            ops::NOT_CONTAINS_ANY,
            ops::REGEX,
            ops::NOT_REGEX,
        ];
        const USER_GROUP_OPS: &[&str] = &[
            ops::CONTAINS_ANY,
            ops::CONTAINS_ALL,
            ops::NOT_CONTAINS_ANY,
            ops::CONTAINS_OTHER_THAN,
            ops::REGEX,
            ops::NOT_REGEX,
        ];
        const RESOURCE_OPS: &[&str] = &[ops::LESS_EQUAL_THAN, ops::BIGGER_THAN, ops::NONE];

        let supported = [
            CriterionMapping::new(
                criteria::SHARE_IPC_WITH_HOST,
                "Share host's IPC namespaces",
                EQUAL,
                ValueShape::None,
                host_namespace.clone(),
            ),
            CriterionMapping::new(
                criteria::SHARE_NET_WITH_HOST,
                "Share host's Network",
                EQUAL,
                ValueShape::None,
                host_namespace.clone(),
            ),
            CriterionMapping::new(
                criteria::SHARE_PID_WITH_HOST,
                "Share host's PID namespaces",
                EQUAL,
                ValueShape::None,
                host_namespace,
            ),
            CriterionMapping::new(
                criteria::ALLOW_PRIV_ESCALATION,
                "Allow Privilege Escalation",
                EQUAL,
                ValueShape::None,
                Arc::new(ToggleHandler::allow_privilege_escalation()),
            ),
            CriterionMapping::new(
                criteria::RUN_AS_ROOT,
                "Run as root",
                EQUAL,
                ValueShape::None,
                Arc::new(ToggleHandler::running_as_user()),
            ),
            CriterionMapping::new(
                criteria::RUN_AS_PRIVILEGED,
                "Run as privileged",
                EQUAL,
                ValueShape::None,
                Arc::new(ToggleHandler::pod_privileged()),
            ),
            CriterionMapping::new(
                criteria::STORAGE_CLASS_NAME,
                "StorageClass Name",
                ANY_OR_NONE,
                ValueShape::List,
                Arc::new(StorageClassHandler::new()),
            ),
            CriterionMapping::new(
                criteria::ENV_VARS,
                "Environment variables",
                SET_OPS,
                ValueShape::List,
                Arc::new(NegatedListHandler::env_vars()),
            ),
            CriterionMapping::new(
                criteria::ENV_VAR_SECRETS,
                "Environment variables with secrets",
                EQUAL,
                ValueShape::None,
                Arc::new(ToggleHandler::env_var_secrets()),
            ),
            CriterionMapping::new(
                criteria::IMAGE,
                "Image",
                ANY_OR_NONE,
                ValueShape::List,
                trusted_repos.clone(),
            ),
            CriterionMapping::new(
                criteria::IMAGE_REGISTRY,
                "Image registry",
                ANY_OR_NONE,
                ValueShape::List,
                trusted_repos,
            ),
            CriterionMapping::new(
                criteria::NAMESPACE,
                "Namespace",
                ANY_OR_NONE,
                ValueShape::List,
                cel.clone(),
            )
            .namespace_scoped(),
            CriterionMapping::new(
                criteria::LABELS,
                "Labels",
                SET_OPS,
                ValueShape::Map,
                Arc::new(NegatedListHandler::labels()),
            ),
            CriterionMapping::new(
                criteria::ANNOTATIONS,
                "Annotations",
                SET_OPS,
                ValueShape::Map,
                Arc::new(NegatedListHandler::annotations()),
            ),
            CriterionMapping::new(
                criteria::SA_BIND_RISKY_ROLE,
                "Service Account Bound High Risk Role",
                &[ops::CONTAINS_ANY],
                ValueShape::List,
                Arc::new(HighRiskServiceAccountHandler::new()),
            ),
            CriterionMapping::new(
                criteria::IMAGE_SCANNED,
                "Image scanned",
                EQUAL,
                ValueShape::None,
                image_cve.clone(),
            ),
            CriterionMapping::new(
                criteria::CVE_HIGH_COUNT,
                "Count of high severity CVE",
                CVE_OPS,
                ValueShape::None,
                image_cve.clone(),
            ),
            CriterionMapping::new(
                criteria::CVE_MEDIUM_COUNT,
                "Count of medium severity CVE",
                CVE_OPS,
                ValueShape::None,
                image_cve,
            ),
            CriterionMapping::new(
                criteria::USER,
                "User",
                USER_OPS,
                ValueShape::List,
                cel.clone(),
            ),
            CriterionMapping::new(
                criteria::USER_GROUPS,
                "User groups",
                USER_GROUP_OPS,
                ValueShape::List,
                cel,
            ),
            CriterionMapping::new(
                criteria::RESOURCE_LIMIT,
                "Resource Limit Configuration (RLC)",
                RESOURCE_OPS,
                ValueShape::Map,
                Arc::new(ContainerResourcesHandler::new()),
            ),
        ];

        let meta = [CriterionMapping::meta(
            criteria::PSP_COMPLIANCE,
            "PSP Best Practice",
            EQUAL,
        )];

        let unsupported = [
            CriterionMapping::unsupported(criteria::CUSTOM_PATH, "Add customized criterion"),
            CriterionMapping::unsupported(
                criteria::CVE_HIGH_WITH_FIX_COUNT,
                "Count of high severity CVE with fix",
            ),
            CriterionMapping::unsupported(criteria::CVE_NAMES, "CVE names"),
            CriterionMapping::unsupported(criteria::CVE_SCORE, "CVE score"),
            CriterionMapping::unsupported(criteria::IMAGE_COMPLIANCE, "Image compliance violations"),
            CriterionMapping::unsupported(criteria::IMAGE_NO_OS, "Image without OS information"),
            CriterionMapping::unsupported(criteria::IMAGE_SIGNED, "Image signed"),
            CriterionMapping::unsupported(criteria::IMAGE_VERIFIERS, "Image Sigstore Verifiers"),
            CriterionMapping::unsupported(criteria::MODULES, "Modules"),
            CriterionMapping::unsupported(criteria::MOUNT_VOLUMES, "Mount Volumes"),
            CriterionMapping::unsupported(criteria::HAS_PSS_VIOLATION, "Violates PSA policy"),
        ];

        let mappings: HashMap<_, _> = supported
            .into_iter()
            .chain(meta)
            .chain(unsupported)
            .map(|mapping| (mapping.name, mapping))
            .collect();

        debug!(criteria = mappings.len(), "Criterion registry initialized");

        Self { mappings }
    }

    /// Look up a criterion name
    pub fn lookup(&self, name: &str) -> Option<&CriterionMapping> {
        self.mappings.get(name)
    }

    /// Settings builder for a criterion, failing for unknown or unsupported names
    pub fn handler_for(&self, criterion: &Criterion) -> Result<&Arc<dyn PolicyHandler>> {
        self.lookup(&criterion.name)
            .filter(|mapping| !mapping.unsupported)
            .and_then(CriterionMapping::handler)
            .ok_or_else(|| Error::UnsupportedCriterion(criterion.name.clone()))
    }

    /// Number of known criterion names
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Every known criterion with its support status, sorted by name
    pub fn support_matrix(&self) -> Vec<SupportEntry> {
        let expander = MetaCriterionExpander::new();

        let mut entries: Vec<SupportEntry> = self
            .mappings
            .values()
            .map(|mapping| {
                let mut modules: Vec<String> = match mapping.module() {
                    Some(module) => vec![module.to_string()],
                    None => expander
                        .bundle(mapping.name)
                        .unwrap_or_default()
                        .iter()
                        .filter_map(|c| self.lookup(&c.name).and_then(CriterionMapping::module))
                        .map(str::to_string)
                        .collect(),
                };
                modules.sort();
                modules.dedup();

                SupportEntry {
                    name: mapping.name.to_string(),
                    display_name: mapping.display_name.to_string(),
                    supported: !mapping.unsupported,
                    value_shape: mapping.value_shape,
                    modules,
                    operators: mapping.supported_ops.iter().map(|op| op.to_string()).collect(),
                }
            })
            .collect();

        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }
}

impl fmt::Debug for CriterionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CriterionRegistry")
            .field("criteria", &self.mappings.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module;

    fn registry() -> CriterionRegistry {
        CriterionRegistry::new(&ConversionConfig::default())
    }

    #[test]
    fn test_lookup_supported() {
        let registry = registry();
        let mapping = registry.lookup(criteria::SHARE_IPC_WITH_HOST).unwrap();
        assert_eq!(mapping.module(), Some(module::HOST_NAMESPACES_PSP));
        assert!(mapping.supports_operator(ops::EQUAL));
        assert!(!mapping.supports_operator(ops::CONTAINS_ANY));
        assert!(!mapping.unsupported);
    }

    #[test]
    fn test_shared_modules() {
        let registry = registry();
        let module_of = |name: &str| registry.lookup(name).and_then(|m| m.module()).map(str::to_string);

        assert_eq!(module_of(criteria::IMAGE), module_of(criteria::IMAGE_REGISTRY));
        assert_eq!(module_of(criteria::CVE_HIGH_COUNT), module_of(criteria::IMAGE_SCANNED));
        assert_eq!(module_of(criteria::USER), module_of(criteria::NAMESPACE));
        assert_ne!(module_of(criteria::LABELS), module_of(criteria::ANNOTATIONS));
    }

    #[test]
    fn test_unsupported_and_unknown() {
        let registry = registry();

        let cve_names = Criterion::new(criteria::CVE_NAMES, ops::CONTAINS_ANY, "CVE-1");
        assert!(registry.lookup(criteria::CVE_NAMES).unwrap().unsupported);
        assert!(matches!(
            registry.handler_for(&cve_names),
            Err(Error::UnsupportedCriterion(name)) if name == criteria::CVE_NAMES
        ));

        let bogus = Criterion::new("bogus", ops::EQUAL, "x");
        assert!(registry.lookup("bogus").is_none());
        assert!(registry.handler_for(&bogus).is_err());
    }

    #[test]
    fn test_namespace_is_scoped() {
        let registry = registry();
        assert!(registry.lookup(criteria::NAMESPACE).unwrap().namespace_scoped);
        assert!(!registry.lookup(criteria::LABELS).unwrap().namespace_scoped);
    }

    #[test]
    fn test_pvc_resource() {
        let registry = registry();
        assert_eq!(
            registry
                .lookup(criteria::STORAGE_CLASS_NAME)
                .unwrap()
                .applicable_resource(),
            Some(ApplicableResource::Pvc)
        );
    }

    #[test]
    fn test_support_matrix_sorted_and_complete() {
        let registry = registry();
        let matrix = registry.support_matrix();
        assert_eq!(matrix.len(), registry.len());
        assert!(matrix.windows(2).all(|w| w[0].name < w[1].name));

        let psp = matrix.iter().find(|e| e.name == criteria::PSP_COMPLIANCE).unwrap();
        assert!(psp.supported);
        assert_eq!(psp.modules.len(), 4);

        let custom = matrix.iter().find(|e| e.name == criteria::CUSTOM_PATH).unwrap();
        assert!(!custom.supported);
        assert!(custom.modules.is_empty());

        let shape_of = |name: &str| matrix.iter().find(|e| e.name == name).unwrap().value_shape;
        assert_eq!(shape_of(criteria::LABELS), ValueShape::Map);
        assert_eq!(shape_of(criteria::USER), ValueShape::List);
        assert_eq!(shape_of(criteria::CVE_HIGH_COUNT), ValueShape::None);
        assert_eq!(ValueShape::Map.to_string(), "map");
    }
}
