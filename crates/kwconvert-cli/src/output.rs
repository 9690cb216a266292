//! Policy writers

use anyhow::Context;
use kwconvert_policy::Policy;
use std::io::Write;
use tracing::info;

/// Output path meaning standard output
pub const STDOUT_PATH: &str = "-";

/// Serialize policies as a multi-document YAML stream
pub fn render_policies(policies: &[Policy]) -> anyhow::Result<String> {
    let mut buf = String::new();

    for (idx, policy) in policies.iter().enumerate() {
        let yaml = serde_yaml::to_string(policy)
            .with_context(|| format!("failed to marshal policy at index {}", idx))?;
        if idx > 0 {
            buf.push_str("---\n");
        }
        buf.push_str(&yaml);
    }

    Ok(buf)
}

/// Write policies to `path`, or stdout for `-`.
///
/// Nothing is written when there are no policies. Returns whether output
/// was produced.
pub fn write_policies(policies: &[Policy], path: &str) -> anyhow::Result<bool> {
    if policies.is_empty() {
        return Ok(false);
    }

    let rendered = render_policies(policies)?;

    if path == STDOUT_PATH {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()?;
    } else {
        std::fs::write(path, rendered)
            .with_context(|| format!("failed to write output file {}", path))?;
        info!(output_file = path, policies = policies.len(), "Policies written");
    }

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kwconvert_core::types::{criteria, ops};
    use kwconvert_core::{AdmissionRule, ConversionConfig, Criterion};
    use kwconvert_policy::{RuleConverter, RuleOutcome};

    fn policies(ids: &[u32]) -> Vec<Policy> {
        let converter = RuleConverter::new(ConversionConfig::default()).unwrap();
        ids.iter()
            .map(|&id| {
                let rule = AdmissionRule::deny(
                    id,
                    vec![Criterion::new(criteria::RUN_AS_ROOT, ops::EQUAL, "true")],
                );
                match converter.convert_rule(&rule).unwrap() {
                    RuleOutcome::Converted(policy) => policy,
                    RuleOutcome::Diverted(_) => panic!("unexpected diversion"),
                }
            })
            .collect()
    }

    #[test]
    fn test_documents_separated() {
        let rendered = render_policies(&policies(&[1001, 1002])).unwrap();
        assert_eq!(rendered.matches("---\n").count(), 1);

        let documents: Vec<serde_yaml::Value> = serde_yaml::Deserializer::from_str(&rendered)
            .map(|doc| serde::Deserialize::deserialize(doc).unwrap())
            .collect();
        assert_eq!(documents.len(), 2);
        assert_eq!(
            documents[1]["metadata"]["name"].as_str(),
            Some("neuvector-rule-1002-conversion")
        );
    }

    #[test]
    fn test_no_policies_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.yaml");
        let written = write_policies(&[], path.to_str().unwrap()).unwrap();
        assert!(!written);
        assert!(!path.exists());
    }

    #[test]
    fn test_write_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.yaml");
        assert!(write_policies(&policies(&[1001]), path.to_str().unwrap()).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("kind: ClusterAdmissionPolicy"));
        assert!(!content.contains("---"));
    }
}
