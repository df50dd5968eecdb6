//! Artifact Store (C2): durably persist a byte payload at a path, creating
//! missing parent directories. No application-level locking — concurrent
//! persists to distinct paths race safely, and directory creation is
//! idempotent under concurrent callers that share a parent.

use std::path::Path;

use tracing::{info, warn};

use crate::error::StorageError;

pub async fn persist(path: &Path, bytes: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| StorageError { path: path.to_path_buf(), source })?;
    }

    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| StorageError { path: path.to_path_buf(), source })?;

    info!(path = %path.display(), bytes = bytes.len(), "persisted artifact");
    Ok(())
}

/// Persist and log-and-swallow any failure, matching the spec's "a failed
/// persist never aborts the pass" propagation policy.
pub async fn persist_or_log(path: &Path, bytes: &[u8]) {
    if let Err(err) = persist(path, bytes).await {
        warn!(path = %err.path.display(), error = %err.source, "failed to persist artifact");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn persist_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b").join("page.html");

        persist(&target, b"hello").await.unwrap();

        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn persist_truncates_preexisting_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("page.html");

        persist(&target, b"a much longer first write").await.unwrap();
        persist(&target, b"short").await.unwrap();

        assert_eq!(tokio::fs::read(&target).await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn concurrent_persists_sharing_a_parent_directory_both_succeed() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("shared").join("a.html");
        let b = dir.path().join("shared").join("b.html");

        let (ra, rb) = tokio::join!(persist(&a, b"one"), persist(&b, b"two"));
        ra.unwrap();
        rb.unwrap();

        assert_eq!(tokio::fs::read(&a).await.unwrap(), b"one");
        assert_eq!(tokio::fs::read(&b).await.unwrap(), b"two");
    }
}
