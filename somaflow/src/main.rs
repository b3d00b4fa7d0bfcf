//! Somaflow binary entry point.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::Parser;
use somaflow::config::PipelineConfig;
use somaflow::context::{RunContext, RunIdentity};
use somaflow::events::LoggingEventSink;
use somaflow::inputs::Cohort;
use somaflow::logging::init_tracing;
use somaflow::pipeline::{Driver, RunReport};
use somaflow::process::TokioProcessRunner;
use somaflow::store::FsArtifactStore;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

/// Align, consolidate and call somatic variants for a normal and a tumor
/// cohort. Steps whose output already exists are skipped.
#[derive(Parser, Debug)]
#[command(name = "somaflow", version)]
struct Cli {
    /// Directory holding the normal cohort's paired read files
    normal_dir: PathBuf,
    /// Filename prefix shared by the normal read files
    normal_prefix: String,
    /// Directory holding the tumor cohort's paired read files
    tumor_dir: PathBuf,
    /// Filename prefix shared by the tumor read files
    tumor_prefix: String,
}

/// Exit status for usage errors and failed runs.
const FAILURE_STATUS: u8 = 1;

/// Parses the command line, printing clap's message on error.
///
/// `Err` carries the exit status: 0 for `--help` and `--version`, 1 for a
/// usage error.
fn parse_cli<I, T>(args: I) -> Result<Cli, u8>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Cli::try_parse_from(args).map_err(|e| {
        let _ = e.print();
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
            _ => FAILURE_STATUS,
        }
    })
}

async fn run(cli: Cli) -> Result<RunReport> {
    let config = PipelineConfig::default();
    config.validate().context("default configuration is unusable")?;

    let identity = RunIdentity::new();
    info!(
        run_id = %identity.run_id,
        processors = config.processors,
        memory_gb = config.memory_gb,
        "Running somaflow {}",
        env!("CARGO_PKG_VERSION")
    );

    let ctx = RunContext::new(identity).with_event_sink(Arc::new(LoggingEventSink));
    let driver = Driver::new(
        config,
        Arc::new(FsArtifactStore::new()),
        Arc::new(TokioProcessRunner::new()),
    )
    .with_context(ctx);

    let normal = Cohort::normal(cli.normal_dir, cli.normal_prefix);
    let tumor = Cohort::tumor(cli.tumor_dir, cli.tumor_prefix);
    Ok(driver.run(&normal, &tumor).await?)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match parse_cli(std::env::args_os()) {
        Ok(cli) => cli,
        Err(status) => return ExitCode::from(status),
    };

    init_tracing();

    match run(cli).await {
        Ok(report) => {
            info!("Pipeline finished: {}", report.summary());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::from(FAILURE_STATUS)
        }
    }
}
