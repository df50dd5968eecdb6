//! Configuration: CLI surface (clap derive, matching the corpus's
//! `dev` CLI idiom) plus the small `Config` struct computed once from the
//! parsed args and threaded explicitly into the fetcher, scheduler, and
//! driver — no hidden globals.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::error::ConfigError;
use crate::fetcher::FetcherConfig;

const DEFAULT_SEED_URL: &str = "https://news.ycombinator.com";
const DEFAULT_OUT_DIR: &str = "ycombinator";

/// Periodic crawler that mirrors a news aggregator's stories, comment
/// threads, and outbound links to disk.
#[derive(Parser, Debug)]
#[command(name = "frontpage-harvester")]
#[command(about = "Periodic news-aggregator crawler")]
#[command(version)]
pub struct Cli {
    /// Seconds between front-page polls.
    #[arg(long, default_value_t = 600)]
    pub refresh_period: u64,

    /// Output directory. Relative paths are resolved against the current
    /// working directory; absolute paths are used as-is.
    #[arg(long, default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,

    /// Maximum total concurrent fetches.
    #[arg(long, default_value_t = 100)]
    pub global_limit: usize,

    /// Maximum concurrent fetches to the same host.
    #[arg(long, default_value_t = 1)]
    pub per_host_limit: usize,

    /// Per-request timeout, in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    /// Attempts before giving up on a URL.
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Front page to poll.
    #[arg(long, default_value = DEFAULT_SEED_URL)]
    pub seed_url: String,

    /// Raise the default log level from `info` to `debug`.
    #[arg(short, long)]
    pub verbose: bool,
}

pub struct Config {
    pub refresh_period: Duration,
    pub out_root: PathBuf,
    pub seed_url: String,
    pub fetcher: FetcherConfig,
}

impl Config {
    /// Resolve the CLI args into a runnable `Config`. Joins a relative
    /// `out_dir` with the process CWD; leaves an absolute one untouched.
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let out_root = if cli.out_dir.is_absolute() {
            cli.out_dir
        } else {
            std::env::current_dir()
                .map_err(|e| ConfigError(format!("cannot read current directory: {e}")))?
                .join(cli.out_dir)
        };

        Ok(Self {
            refresh_period: Duration::from_secs(cli.refresh_period),
            out_root,
            seed_url: cli.seed_url,
            fetcher: FetcherConfig {
                global_limit: cli.global_limit,
                per_host_limit: cli.per_host_limit,
                timeout: Duration::from_secs(cli.timeout),
                retries: cli.retries,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(out_dir: &str) -> Cli {
        Cli {
            refresh_period: 600,
            out_dir: PathBuf::from(out_dir),
            global_limit: 100,
            per_host_limit: 1,
            timeout: 30,
            retries: 3,
            seed_url: DEFAULT_SEED_URL.to_string(),
            verbose: false,
        }
    }

    #[test]
    fn relative_out_dir_is_joined_with_cwd() {
        let config = Config::from_cli(cli("ycombinator")).unwrap();
        assert_eq!(config.out_root, std::env::current_dir().unwrap().join("ycombinator"));
    }

    #[test]
    fn absolute_out_dir_is_used_as_is() {
        let config = Config::from_cli(cli("/tmp/somewhere")).unwrap();
        assert_eq!(config.out_root, PathBuf::from("/tmp/somewhere"));
    }
}
