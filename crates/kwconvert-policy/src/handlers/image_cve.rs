//! Image vulnerability thresholds

use kwconvert_core::types::criteria;
use kwconvert_core::{Criterion, Error, Result};
use serde::Serialize;
use serde_json::Value;

use super::{parse_bool, unexpected_criterion, PolicyHandler};
use crate::module;
use crate::policy::ContextAwareResource;

const VULNERABILITY_REPORT_API_VERSION: &str = "storage.sbomscanner.kubewarden.io/v1alpha1";
const VULNERABILITY_REPORT_KIND: &str = "VulnerabilityReport";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CveSettings<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    ignore_missing_vulnerability_report: Option<bool>,
    vulnerability_report_namespace: &'a str,
    #[serde(skip_serializing_if = "MaxSeverity::is_empty")]
    max_severity: MaxSeverity,
    platform: Platform<'a>,
}

#[derive(Debug, Default, Serialize)]
struct MaxSeverity {
    #[serde(skip_serializing_if = "Option::is_none")]
    high: Option<SeverityLimit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    medium: Option<SeverityLimit>,
}

impl MaxSeverity {
    fn is_empty(&self) -> bool {
        self.high.is_none() && self.medium.is_none()
    }
}

#[derive(Debug, Serialize)]
struct SeverityLimit {
    total: i64,
}

#[derive(Debug, Serialize)]
struct Platform<'a> {
    os: &'static str,
    arch: &'a str,
}

/// Builds `image-cve-policy` settings.
///
/// The source rule denies once the CVE count reaches N; the module takes the
/// highest accepted count, so each threshold is written as N - 1.
#[derive(Debug, Clone)]
pub struct ImageCveHandler {
    vul_report_namespace: String,
    platform: String,
}

impl ImageCveHandler {
    pub fn new(vul_report_namespace: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            vul_report_namespace: vul_report_namespace.into(),
            platform: platform.into(),
        }
    }
}

/// Highest accepted count for a "deny when count >= N" threshold
pub fn max_accepted(threshold: i64) -> Result<i64> {
    threshold
        .checked_sub(1)
        .ok_or_else(|| Error::handler(format!("CVE threshold {} is out of range", threshold)))
}

fn parse_threshold(criterion: &Criterion) -> Result<i64> {
    let threshold = criterion.value.trim().parse::<i64>().map_err(|e| {
        Error::handler(format!(
            "invalid {} value {:?}: {}",
            criterion.name, criterion.value, e
        ))
    })?;

    if threshold < 0 {
        return Err(Error::handler(format!(
            "{} must not be negative, got {}",
            criterion.name, threshold
        )));
    }

    Ok(threshold)
}

impl PolicyHandler for ImageCveHandler {
    fn module(&self) -> &str {
        module::IMAGE_CVE_POLICY
    }

    fn context_aware_resources(&self) -> Vec<ContextAwareResource> {
        vec![ContextAwareResource::new(
            VULNERABILITY_REPORT_API_VERSION,
            VULNERABILITY_REPORT_KIND,
        )]
    }

    fn build_settings(&self, criteria: &[&Criterion]) -> Result<Value> {
        let mut settings = CveSettings {
            ignore_missing_vulnerability_report: None,
            vulnerability_report_namespace: &self.vul_report_namespace,
            max_severity: MaxSeverity::default(),
            platform: Platform {
                os: "linux",
                arch: &self.platform,
            },
        };

        for criterion in criteria {
            match criterion.name.as_str() {
                criteria::IMAGE_SCANNED => {
                    settings.ignore_missing_vulnerability_report =
                        Some(parse_bool(&criterion.value)?);
                }
                criteria::CVE_HIGH_COUNT => {
                    settings.max_severity.high = Some(SeverityLimit {
                        total: max_accepted(parse_threshold(criterion)?)?,
                    });
                }
                criteria::CVE_MEDIUM_COUNT => {
                    settings.max_severity.medium = Some(SeverityLimit {
                        total: max_accepted(parse_threshold(criterion)?)?,
                    });
                }
                _ => return Err(unexpected_criterion(criterion)),
            }
        }

        Ok(serde_json::to_value(settings)?)
    }
}
