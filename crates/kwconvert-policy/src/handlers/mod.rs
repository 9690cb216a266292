//! Settings builders, one per criterion family
//!
//! A handler owns one Kubewarden module and turns the criteria routed to that
//! module into the module's settings document. Handlers receive every criterion
//! of a rule that maps to their module at once, so families that span several
//! criterion names (host namespaces, trusted repos, image CVE, CEL) merge them
//! into one settings object.

use kwconvert_core::{Criterion, Error, Result};
use serde_json::Value;
use std::fmt;

use crate::policy::ContextAwareResource;

pub mod cel;
pub mod container_resources;
pub mod host_namespace;
pub mod image_cve;
pub mod negated_list;
pub mod service_account;
pub mod storage_class;
pub mod toggle;
pub mod trusted_repos;

pub use cel::CelHandler;
pub use container_resources::ContainerResourcesHandler;
pub use host_namespace::HostNamespaceHandler;
pub use image_cve::ImageCveHandler;
pub use negated_list::NegatedListHandler;
pub use service_account::HighRiskServiceAccountHandler;
pub use storage_class::StorageClassHandler;
pub use toggle::ToggleHandler;
pub use trusted_repos::TrustedReposHandler;

/// Kind of Kubernetes object a module validates
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ApplicableResource {
    /// PersistentVolumeClaims
    Pvc,
    /// Pods and the controllers that create them
    Workload,
}

impl fmt::Display for ApplicableResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pvc => f.write_str("pvc"),
            Self::Workload => f.write_str("workload"),
        }
    }
}

/// Trait for all settings builders
pub trait PolicyHandler: Send + Sync + fmt::Debug {
    /// Module reference the settings are written for
    fn module(&self) -> &str;

    /// Objects the module validates
    fn applicable_resource(&self) -> ApplicableResource {
        ApplicableResource::Workload
    }

    /// Cluster resources the module reads while evaluating
    fn context_aware_resources(&self) -> Vec<ContextAwareResource> {
        Vec::new()
    }

    /// Build the settings for one criterion or several criteria sharing this module
    fn build_settings(&self, criteria: &[&Criterion]) -> Result<Value>;
}

/// Parse a boolean literal the way the source platform writes them
pub(crate) fn parse_bool(value: &str) -> Result<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(Error::handler(format!("invalid boolean value: {:?}", other))),
    }
}

/// Require exactly one criterion
pub(crate) fn single<'a>(criteria: &[&'a Criterion]) -> Result<&'a Criterion> {
    match criteria {
        [criterion] => Ok(criterion),
        _ => Err(Error::handler("only one criterion is allowed")),
    }
}

/// Comma separated values, trimmed, empty items dropped
pub(crate) fn list_values(criterion: &Criterion) -> Result<Vec<String>> {
    let values: Vec<String> = criterion
        .values()
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect();

    if values.is_empty() {
        return Err(Error::handler(format!(
            "criterion {} has no values",
            criterion.name
        )));
    }

    Ok(values)
}

pub(crate) fn unexpected_criterion(criterion: &Criterion) -> Error {
    Error::handler(format!("unsupported criterion: {}", criterion.name))
}
