//! Container CPU and memory requests and limits

use kwconvert_core::types::{criteria, ops};
use kwconvert_core::{Criterion, Error, Result};
use serde::Serialize;
use serde_json::Value;

use super::{single, PolicyHandler};
use crate::module;

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResourceBounds {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_limit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min_request: Option<String>,
}

impl ResourceBounds {
    // Field names follow the module schema as observed, including ">" landing on max_*
    fn set_limit(&mut self, operator: &str, value: String) {
        if operator == ops::BIGGER_THAN {
            self.max_limit = Some(value);
        } else {
            self.min_limit = Some(value);
        }
    }

    fn set_request(&mut self, operator: &str, value: String) {
        if operator == ops::BIGGER_THAN {
            self.max_request = Some(value);
        } else {
            self.min_request = Some(value);
        }
    }

    fn is_empty(&self) -> bool {
        self.max_limit.is_none()
            && self.max_request.is_none()
            && self.min_limit.is_none()
            && self.min_request.is_none()
    }
}

#[derive(Debug, Default, Serialize)]
struct ContainerResourcesSettings {
    #[serde(skip_serializing_if = "ResourceBounds::is_empty")]
    cpu: ResourceBounds,
    #[serde(skip_serializing_if = "ResourceBounds::is_empty")]
    memory: ResourceBounds,
}

/// Builds `container-resources` settings from a resource limit criterion
#[derive(Debug, Default)]
pub struct ContainerResourcesHandler;

impl ContainerResourcesHandler {
    pub fn new() -> Self {
        Self
    }
}

fn quantity(sub: &Criterion) -> Result<String> {
    let value = sub.value.trim();
    match value.parse::<f64>() {
        Ok(number) if number.is_finite() && number >= 0.0 => Ok(value.to_string()),
        _ => Err(Error::handler(format!(
            "invalid {} value {:?}: expected a non-negative number",
            sub.name, sub.value
        ))),
    }
}

impl PolicyHandler for ContainerResourcesHandler {
    fn module(&self) -> &str {
        module::CONTAINER_RESOURCES
    }

    fn build_settings(&self, criteria: &[&Criterion]) -> Result<Value> {
        let criterion = single(criteria)?;
        if criterion.sub_criteria.is_empty() {
            return Err(Error::handler(format!(
                "criterion {} has no sub-criteria",
                criterion.name
            )));
        }

        let mut settings = ContainerResourcesSettings::default();

        for sub in &criterion.sub_criteria {
            if sub.operator != ops::LESS_EQUAL_THAN && sub.operator != ops::BIGGER_THAN {
                return Err(Error::handler(format!(
                    "unsupported operator {:?} for {}",
                    sub.operator, sub.name
                )));
            }

            let value = quantity(sub)?;
            match sub.name.as_str() {
                criteria::CPU_LIMIT => settings.cpu.set_limit(&sub.operator, value),
                criteria::CPU_REQUEST => settings.cpu.set_request(&sub.operator, value),
                criteria::MEMORY_LIMIT => settings.memory.set_limit(&sub.operator, value),
                criteria::MEMORY_REQUEST => settings.memory.set_request(&sub.operator, value),
                _ => {
                    return Err(Error::handler(format!(
                        "unsupported sub-criterion: {}",
                        sub.name
                    )))
                }
            }
        }

        Ok(serde_json::to_value(settings)?)
    }
}
