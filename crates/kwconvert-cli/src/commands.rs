//! Subcommand implementations

use anyhow::Context;
use kwconvert_core::ConversionConfig;
use kwconvert_policy::{ConversionResult, CriterionRegistry, RuleConverter};
use tracing::info;

use crate::cli::ConvertArgs;
use crate::{config, loader, output, table};

/// Run a conversion and write its outputs
pub fn convert(args: &ConvertArgs) -> anyhow::Result<ConversionResult> {
    let config = config::load(args)?;

    let rules = loader::load_rules(&args.input).with_context(|| {
        format!(
            "failed to parse NeuVector admission rules from {}",
            args.input.display()
        )
    })?;

    let converter = RuleConverter::new(config.clone())?;
    let result = converter.convert_rules(&rules);

    if output::write_policies(&result.policies, &config.output)
        .context("failed to write output YAML")?
        && config.output != output::STDOUT_PATH
    {
        info!(output_file = %config.output, "Conversion done");
    }

    if config.show_summary {
        println!("{}", table::render_summary(&result.summary));
    }

    Ok(result)
}

/// Print the support matrix
pub fn support() {
    let registry = CriterionRegistry::new(&ConversionConfig::default());
    println!("{}", table::render_support(&registry.support_matrix()));
}
