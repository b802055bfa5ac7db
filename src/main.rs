use anyhow::Context;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use mesh_convert::config::{CliArgs, CliConfig};
use mesh_convert::pipeline::{Pipeline, RunSummary};

fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // Init tracing
    let filter = if args.verbose {
        EnvFilter::new("mesh_convert=debug")
    } else {
        EnvFilter::new("mesh_convert=info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config: CliConfig = args.into();

    // Configure rayon thread pool
    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure rayon thread pool")?;
    }

    match Pipeline::run(&config) {
        Ok(summary) => {
            if config.report {
                print_report(&summary)?;
            } else {
                println!(
                    "Done: {} file(s) converted in {:.2}s",
                    summary.files.len(),
                    summary.duration.as_secs_f64()
                );
            }
            Ok(())
        }
        Err(e) => {
            error!(%e, kind = ?e.kind(), "Conversion failed");
            Err(anyhow::anyhow!(e)).context("mesh-convert failed")
        }
    }
}

/// Print the run as JSON on stdout.
fn print_report(summary: &RunSummary) -> anyhow::Result<()> {
    let report = serde_json::json!({
        "files": summary.files,
        "elapsed_secs": summary.duration.as_secs_f64(),
    });
    let text = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    println!("{text}");
    Ok(())
}
