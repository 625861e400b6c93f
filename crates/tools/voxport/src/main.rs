//! voxport CLI - batch conversion to MagicaVoxel `.vox`
//!
//! Exit status: 0 when every input converted, 1 when any input failed, 2 when
//! the configuration was rejected before processing.

mod cli;

use cli::Cli;
use schematic::{Batch, ConfigError, RunConfig};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const EXIT_BATCH_FAILED: u8 = 1;
const EXIT_CONFIG_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse_normalized();
    init_tracing(cli.debug);

    info!("voxport v{}", env!("CARGO_PKG_VERSION"));

    match run(&cli) {
        Ok(true) => {
            println!("Done.");
            ExitCode::SUCCESS
        }
        Ok(false) => {
            println!("Failed.");
            ExitCode::from(EXIT_BATCH_FAILED)
        }
        Err(err) => {
            error!("{:#}", err);
            println!("Failed.");
            if err.downcast_ref::<ConfigError>().is_some() {
                ExitCode::from(EXIT_CONFIG_ERROR)
            } else {
                ExitCode::from(EXIT_BATCH_FAILED)
            }
        }
    }
}

/// `RUST_LOG` wins; otherwise `info`, or `debug` with `--debug`
fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Validate the configuration and convert every input; `Ok(false)` means some file failed
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let config = RunConfig::new(cli.input.as_deref(), cli.output.clone(), cli.raw_options())?;
    config.log_summary();

    let batch = Batch::from_config(&config)?;
    let report = batch.run(&config.inputs);

    let failed: Vec<_> = report.failed().collect();
    info!(
        "Converted {} of {} inputs into {}",
        report.converted().count(),
        report.len(),
        batch.exporter().output_dir().display()
    );
    for outcome in &failed {
        error!("[FAILED] {}", outcome.input().display());
    }

    Ok(failed.is_empty())
}
