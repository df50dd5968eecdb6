use std::path::PathBuf;

use thiserror::Error;

/// Invalid or inaccessible output path at startup. The only fatal condition
/// in the crawler: every other error is logged and swallowed by its owning task.
#[derive(Error, Debug)]
#[error("configuration error: {0}")]
pub struct ConfigError(pub String);

/// A URL's retries were exhausted, or a single attempt timed out irrecoverably.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("fetch {url} failed after {attempts} attempt(s): {source}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("fetch {url} timed out after {attempts} attempt(s)")]
    TimedOut { url: String, attempts: u32 },
    #[error("fetch {url} returned status {status}")]
    Status { url: String, status: reqwest::StatusCode },
    #[error("fetch {url} cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::Exhausted { url, .. }
            | FetchError::TimedOut { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Cancelled { url, .. } => url,
        }
    }
}

/// HTML could not be parsed at all — distinct from "selectors matched nothing",
/// which is a valid (if uninteresting) extraction result, not an error.
///
/// `scraper::Html::parse_document` never fails (malformed markup just
/// produces a best-effort DOM via `html5ever`'s error-recovery parsing), so
/// this variant is currently unreachable in `extractor.rs`. Kept as the
/// named taxonomy entry the spec's §7 error model calls for, in case a
/// future extractor backend (or a pre-parse encoding check) can actually
/// fail this way.
#[derive(Error, Debug)]
#[error("could not parse HTML from {context}")]
pub struct ParseError {
    pub context: String,
}

/// A filesystem write failed. Logged with `path`; the owning task ends.
#[derive(Error, Debug)]
#[error("failed to persist {path}: {source}", path = path.display())]
pub struct StorageError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
