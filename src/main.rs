//! Release publisher CLI entrypoint.
//!
//! Builds the next release, stages and checksums its archives, records it in
//! the manifest and publishes it to the configured host.

use camino::Utf8PathBuf;
use clap::Parser;
use relay_publisher::cli::Cli;
use relay_publisher::config::FileConfig;
use relay_publisher::error::{PublisherError, Result};
use relay_publisher::executor::SystemCommandExecutor;
use relay_publisher::output::write_stderr_line;
use relay_publisher::pipeline::{Pipeline, PipelineConfig, ReleaseReport};
use std::io::Write;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Log to stderr, filtered by `RUST_LOG` or else by the verbosity flags.
fn init_logging(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<ReleaseReport> {
    let config = resolve_config(cli)?;
    let executor = SystemCommandExecutor;
    Pipeline::new(config, &executor).run(stderr)
}

/// Merge flags with the configuration file found from the working directory.
fn resolve_config(cli: &Cli) -> Result<PipelineConfig> {
    let cwd = std::env::current_dir()?;
    let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| PublisherError::InvalidConfig {
        path: Utf8PathBuf::from("."),
        reason: format!("current directory is not valid UTF-8: {e}"),
    })?;
    let file = FileConfig::discover(cli.config.as_deref(), &cwd)?;
    cli.resolve(&file)
}

fn exit_code_for_run_result(result: Result<ReleaseReport>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(_) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            err.exit_code()
        }
    }
}
