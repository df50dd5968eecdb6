use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use frontpage_harvester::config::{Cli, Config};
use frontpage_harvester::driver;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    match run().await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = ?err, "startup failed");
            std::process::ExitCode::FAILURE
        }
    }
}

/// The one fallible path in the binary: CLI parsing, output-directory
/// preparation, and the id-registry scan. Everything past this point is a
/// per-task failure the scheduler logs and swallows on its own.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_directive = if cli.verbose {
        "frontpage_harvester=debug"
    } else {
        "frontpage_harvester=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .init();

    let config = Config::from_cli(cli).context("resolving configuration")?;

    let cancel = CancellationToken::new();
    let shutdown_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_signal.cancel();
        }
    });

    driver::run(config, cancel).await.context("running crawler")?;
    Ok(())
}
