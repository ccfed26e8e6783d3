//! Artifact fetcher: makes sure the model file is on local disk.
//!
//! Presence is decided by existence alone. A file already at the destination is never
//! re-downloaded, compared or touched.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::metrics::METRICS;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request { url: String, #[source] source: reqwest::Error },
    #[error("{url} answered with {status}")]
    Status { url: String, status: reqwest::StatusCode },
    #[error("writing artifact to {path}: {source}")]
    Io { path: PathBuf, #[source] source: std::io::Error },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    AlreadyPresent,
    Downloaded { bytes: usize },
}

#[derive(Debug, Clone, Default)]
pub struct ArtifactFetcher {
    client: reqwest::Client,
}

impl ArtifactFetcher {
    pub fn new() -> Self { Self::default() }

    /// No-op when `dest` exists; otherwise GETs `url` and stores the whole body at `dest`.
    /// The body lands in a sibling staging file first and is renamed into place, so a failed
    /// fetch never leaves a partial file at `dest`.
    #[instrument(skip(self, dest), fields(dest = %dest.display()))]
    pub async fn ensure(&self, url: &str, dest: &Path) -> Result<FetchOutcome, FetchError> {
        let io_err = |source| FetchError::Io { path: dest.to_path_buf(), source };
        if tokio::fs::try_exists(dest).await.map_err(io_err)? {
            info!("artifact already present, skipping download");
            METRICS.artifact_fetch_total.with_label_values(&["cached"]).inc();
            return Ok(FetchOutcome::AlreadyPresent);
        }
        info!(url, "downloading artifact");
        let res = self.download(url, dest).await;
        let outcome = if res.is_ok() { "downloaded" } else { "failed" };
        METRICS.artifact_fetch_total.with_label_values(&[outcome]).inc();
        res
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<FetchOutcome, FetchError> {
        let request_err = |source| FetchError::Request { url: url.to_string(), source };
        let response = self.client.get(url).send().await.map_err(request_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { url: url.to_string(), status });
        }
        let body = response.bytes().await.map_err(request_err)?;

        let io_err = |source| FetchError::Io { path: dest.to_path_buf(), source };
        if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let staging = staging_path(dest);
        if let Err(source) = write_then_rename(&staging, dest, &body).await {
            if let Err(e) = tokio::fs::remove_file(&staging).await {
                if e.kind() != std::io::ErrorKind::NotFound { warn!(staging = %staging.display(), error = %e, "could not remove staging file"); }
            }
            return Err(io_err(source));
        }
        info!(bytes = body.len(), "artifact stored");
        Ok(FetchOutcome::Downloaded { bytes: body.len() })
    }
}

async fn write_then_rename(staging: &Path, dest: &Path, body: &[u8]) -> std::io::Result<()> {
    tokio::fs::write(staging, body).await?;
    tokio::fs::rename(staging, dest).await
}

/// `dir/model.onnx` -> `dir/.model.onnx.part`
fn staging_path(dest: &Path) -> PathBuf {
    let name = dest.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_else(|| "artifact".into());
    dest.with_file_name(format!(".{name}.part"))
}
