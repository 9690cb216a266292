//! Trusted images and registries

use kwconvert_core::types::{criteria, ops};
use kwconvert_core::{Criterion, Result};
use serde_json::{Map, Value};

use super::{list_values, unexpected_criterion, PolicyHandler};
use crate::module;

/// Builds `trusted-repos` settings.
///
/// `containsAny` lists what to reject, `notContainsAny` lists the only things
/// allowed. Images and registries are independent sections of the settings.
#[derive(Debug, Default)]
pub struct TrustedReposHandler;

impl TrustedReposHandler {
    pub fn new() -> Self {
        Self
    }
}

impl PolicyHandler for TrustedReposHandler {
    fn module(&self) -> &str {
        module::TRUSTED_REPOS
    }

    fn build_settings(&self, criteria: &[&Criterion]) -> Result<Value> {
        let mut settings = Map::new();

        for criterion in criteria {
            let section = match criterion.name.as_str() {
                criteria::IMAGE_REGISTRY => "registries",
                criteria::IMAGE => "images",
                _ => return Err(unexpected_criterion(criterion)),
            };

            let action = if criterion.operator == ops::CONTAINS_ANY {
                "reject"
            } else {
                "allow"
            };

            let entry = settings
                .entry(section)
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(section) = entry {
                section.insert(action.to_string(), Value::from(list_values(criterion)?));
            }
        }

        Ok(Value::Object(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_reject_registries() {
        let c = Criterion::new(criteria::IMAGE_REGISTRY, ops::CONTAINS_ANY, "docker.io, quay.io");
        let settings = TrustedReposHandler::new().build_settings(&[&c]).unwrap();
        assert_eq!(settings, json!({"registries": {"reject": ["docker.io", "quay.io"]}}));
    }

    #[test]
    fn test_allow_images_and_registries_merge() {
        let images = Criterion::new(criteria::IMAGE, ops::NOT_CONTAINS_ANY, "nginx:1.25");
        let registries = Criterion::new(criteria::IMAGE_REGISTRY, ops::CONTAINS_ANY, "evil.io");
        let settings = TrustedReposHandler::new()
            .build_settings(&[&images, &registries])
            .unwrap();
        assert_eq!(
            settings,
            json!({
                "images": {"allow": ["nginx:1.25"]},
                "registries": {"reject": ["evil.io"]}
            })
        );
    }

    #[test]
    fn test_empty_value_rejected() {
        let c = Criterion::new(criteria::IMAGE, ops::CONTAINS_ANY, "");
        assert!(TrustedReposHandler::new().build_settings(&[&c]).is_err());
    }
}
