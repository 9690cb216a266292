//! Conversion configuration layering

use anyhow::Context;
use kwconvert_core::ConversionConfig;
use tracing::debug;

use crate::cli::ConvertArgs;

/// Load configuration from file and CLI overrides
pub fn load(args: &ConvertArgs) -> anyhow::Result<ConversionConfig> {
    let mut config = if args.config.exists() {
        let content = std::fs::read_to_string(&args.config)
            .with_context(|| format!("failed to read config file {}", args.config.display()))?;
        debug!(path = %args.config.display(), "Loaded configuration file");
        ConversionConfig::from_yaml(&content)
            .with_context(|| format!("invalid config file {}", args.config.display()))?
    } else {
        ConversionConfig::default()
    };

    // Apply CLI overrides
    if let Some(policy_server) = &args.policy_server {
        config.policy_server = policy_server.clone();
    }

    if let Some(mode) = args.mode {
        config.mode = Some(mode);
    }

    if let Some(background_audit) = args.background_audit {
        config.background_audit = background_audit;
    }

    if let Some(namespace) = &args.vul_report_namespace {
        config.vul_report_namespace = namespace.clone();
    }

    if let Some(platform) = &args.platform {
        config.platform = platform.clone();
    }

    if let Some(output) = &args.output {
        config.output = output.clone();
    }

    if args.show_summary {
        config.show_summary = true;
    }

    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kwconvert_core::PolicyMode;
    use std::io::Write;
    use std::path::PathBuf;

    fn args(config: PathBuf) -> ConvertArgs {
        ConvertArgs {
            input: PathBuf::from("rules.json"),
            config,
            ..ConvertArgs::default()
        }
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load(&args(dir.path().join("absent.yaml"))).unwrap();
        assert_eq!(config, ConversionConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "policy_server: from-file").unwrap();
        writeln!(file, "mode: monitor").unwrap();
        writeln!(file, "platform: arm64").unwrap();

        let mut args = args(file.path().to_path_buf());
        args.policy_server = Some("from-flag".to_string());
        args.show_summary = true;

        let config = load(&args).unwrap();
        assert_eq!(config.policy_server, "from-flag");
        assert_eq!(config.mode, Some(PolicyMode::Monitor));
        assert_eq!(config.platform, "arm64");
        assert!(config.show_summary);
        assert!(config.background_audit);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "mode: audit").unwrap();
        assert!(load(&args(file.path().to_path_buf())).is_err());
    }

    #[test]
    fn test_empty_override_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(dir.path().join("absent.yaml"));
        args.policy_server = Some(String::new());
        assert!(load(&args).is_err());
    }
}
