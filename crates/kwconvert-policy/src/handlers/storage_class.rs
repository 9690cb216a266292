//! PersistentVolumeClaim storage classes

use kwconvert_core::types::ops;
use kwconvert_core::{Criterion, Result};
use serde_json::{json, Value};

use super::{list_values, single, ApplicableResource, PolicyHandler};
use crate::module;

/// Builds `persistentvolumeclaim-storageclass-policy` settings
#[derive(Debug, Default)]
pub struct StorageClassHandler;

impl StorageClassHandler {
    pub fn new() -> Self {
        Self
    }
}

impl PolicyHandler for StorageClassHandler {
    fn module(&self) -> &str {
        module::PVC_STORAGE_CLASS
    }

    fn applicable_resource(&self) -> ApplicableResource {
        ApplicableResource::Pvc
    }

    fn build_settings(&self, criteria: &[&Criterion]) -> Result<Value> {
        let criterion = single(criteria)?;
        let classes = list_values(criterion)?;

        if criterion.operator == ops::CONTAINS_ANY {
            Ok(json!({ "deniedStorageClasses": classes }))
        } else {
            Ok(json!({ "allowedStorageClasses": classes }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kwconvert_core::types::criteria;

    #[test]
    fn test_denied_classes() {
        let c = Criterion::new(criteria::STORAGE_CLASS_NAME, ops::CONTAINS_ANY, "slow,legacy");
        let settings = StorageClassHandler::new().build_settings(&[&c]).unwrap();
        assert_eq!(settings, json!({"deniedStorageClasses": ["slow", "legacy"]}));
    }

    #[test]
    fn test_allowed_classes() {
        let c = Criterion::new(criteria::STORAGE_CLASS_NAME, ops::NOT_CONTAINS_ANY, "fast");
        let settings = StorageClassHandler::new().build_settings(&[&c]).unwrap();
        assert_eq!(settings, json!({"allowedStorageClasses": ["fast"]}));
    }

    #[test]
    fn test_targets_pvcs() {
        assert_eq!(
            StorageClassHandler::new().applicable_resource(),
            ApplicableResource::Pvc
        );
    }
}
