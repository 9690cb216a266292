use clap::{Args, Parser, Subcommand};
use kwconvert_core::PolicyMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kwconvert")]
#[command(
    author,
    version,
    about = "Convert NeuVector admission control rules into Kubewarden policies"
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert an exported rule file into Kubewarden policies
    Convert(ConvertArgs),

    /// Show which NeuVector criteria can be converted
    Support {
        /// Enable verbose logging
        #[arg(short, long)]
        verbose: bool,
    },

    /// Print the converter version
    Version,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConvertArgs {
    /// Rule export: JSON from the REST API, or YAML custom resources
    pub input: PathBuf,

    /// Configuration file path, skipped when absent
    #[arg(short, long, default_value = "kwconvert.yaml")]
    pub config: PathBuf,

    /// Policy server that runs the generated policies
    #[arg(long, env = "KWCONVERT_POLICY_SERVER")]
    pub policy_server: Option<String>,

    /// Force a policy mode instead of each rule's own mode
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<PolicyMode>,

    /// Enable or disable background audit on generated policies
    #[arg(long)]
    pub background_audit: Option<bool>,

    /// Namespace holding vulnerability reports
    #[arg(long)]
    pub vul_report_namespace: Option<String>,

    /// Image platform architecture checked by CVE policies
    #[arg(long)]
    pub platform: Option<String>,

    /// Output file, "-" for stdout
    #[arg(short, long)]
    pub output: Option<String>,

    /// Print a per-rule conversion summary
    #[arg(long)]
    pub show_summary: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn parse_mode(s: &str) -> Result<PolicyMode, String> {
    s.parse().map_err(|e: kwconvert_core::Error| e.to_string())
}
