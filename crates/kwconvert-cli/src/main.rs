//! kwconvert
//!
//! Converts NeuVector admission control rules into Kubewarden
//! ClusterAdmissionPolicy and ClusterAdmissionPolicyGroup resources.

use anyhow::Result;
use clap::Parser;
use kwconvert_cli::commands;
use kwconvert_cli::{Cli, Commands};
use tracing::debug;

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert(args) => {
            init_tracing(args.verbose);
            debug!(input = %args.input.display(), "Starting conversion");
            commands::convert(&args)?;
        }

        Commands::Support { verbose } => {
            init_tracing(verbose);
            commands::support();
        }

        Commands::Version => {
            println!("kwconvert {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Initialize tracing/logging on stderr so stdout stays free for policies
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("kwconvert=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kwconvert=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
