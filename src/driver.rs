//! Periodic Driver (C7): resolves and creates the output directory, loads
//! the id registry, builds the shared fetcher, then loops forever —
//! one discovery pass, sleep for `refresh_period`, repeat — until a
//! Ctrl-C listener raises the shared cancellation token.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::Config;
use crate::error::ConfigError;
use crate::fetcher::Fetcher;
use crate::registry::{self, IdRegistry};
use crate::scheduler::Scheduler;

/// Create the output directory if missing. The only fatal error in the
/// crawler: every other failure is logged and swallowed by its owning task.
pub fn prepare_out_dir(config: &Config) -> Result<(), ConfigError> {
    std::fs::create_dir_all(&config.out_root)
        .map_err(|e| ConfigError(format!("cannot create output directory {}: {e}", config.out_root.display())))
}

pub async fn run(config: Config, cancel: CancellationToken) -> Result<(), ConfigError> {
    prepare_out_dir(&config)?;

    let seen = registry::load(&config.out_root)
        .map_err(|e| ConfigError(format!("cannot read output directory {}: {e}", config.out_root.display())))?;
    info!(out_root = %config.out_root.display(), seeded_ids = seen.len(), "id registry loaded");

    let registry = Arc::new(IdRegistry::new(seen));
    let fetcher = Arc::new(Fetcher::new(config.fetcher));
    let scheduler = Scheduler::new(fetcher, registry, config.out_root.clone());

    loop {
        if cancel.is_cancelled() {
            info!("shutdown requested, exiting before next pass");
            return Ok(());
        }

        let stats = scheduler.run_pass(&config.seed_url, &cancel).await;
        info!("{stats}");

        tokio::select! {
            _ = tokio::time::sleep(config.refresh_period) => {}
            _ = cancel.cancelled() => {
                info!("shutdown requested during refresh sleep, exiting");
                return Ok(());
            }
        }
    }
}
