//! vyos-apply entry point.
//!
//! Applies, destroys or reads declared configuration on one VyOS device.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use vyos_provider::{ApplyPlan, ApplyReport, Provider, ProviderConfig};

/// Declarative configuration for VyOS devices
#[derive(Parser, Debug)]
#[command(name = "vyos-apply")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Provider settings (TOML)
    #[arg(short, long, env = "VYOS_PROVIDER_CONFIG", default_value = "/etc/vyos/provider.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or reconcile every resource of a plan, then save
    Apply {
        /// Plan file (TOML)
        plan: PathBuf,
    },
    /// Delete every resource of a plan, then save
    Destroy {
        /// Plan file (TOML)
        plan: PathBuf,
    },
    /// Print the configuration at a path as JSON
    Show {
        /// Space-separated path, e.g. "system host-name"
        path: String,
    },
}

/// Initialize tracing/logging. `RUST_LOG` overrides the default `info`.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn print_report(report: &ApplyReport) {
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(change) => println!("ok     {} {} ({} change(s))", outcome.kind, outcome.id, change.applied),
            Err(e) => println!("failed {} {}: {}", outcome.kind, outcome.id, e),
        }
    }
    match &report.save {
        Some(save) => println!("save: {:?}", save),
        None => println!("save: skipped"),
    }
}

async fn run(args: Args) -> Result<bool> {
    let config = ProviderConfig::load(&args.config)
        .with_context(|| format!("loading provider config {}", args.config.display()))?;
    let provider = Provider::configure(config).context("configuring provider")?;

    match args.command {
        Command::Apply { plan } => {
            let plan = ApplyPlan::load(&plan)
                .with_context(|| format!("loading plan {}", plan.display()))?;
            let report = provider.apply(&plan).await.context("apply failed")?;
            print_report(&report);
            Ok(report.is_success())
        }
        Command::Destroy { plan } => {
            let plan = ApplyPlan::load(&plan)
                .with_context(|| format!("loading plan {}", plan.display()))?;
            let report = provider.destroy(&plan).await.context("destroy failed")?;
            print_report(&report);
            Ok(report.is_success())
        }
        Command::Show { path } => {
            let value = provider
                .read(&path)
                .await
                .with_context(|| format!("reading '{}'", path))?;
            match &value.tree {
                Some(tree) => println!("{}", serde_json::to_string_pretty(tree)?),
                None => warn!(path = %path, "Path not present on device"),
            }
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    info!("--- Starting vyos-apply ---");

    match run(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            error!("One or more resources failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("vyos-apply error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
