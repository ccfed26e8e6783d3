//! One-shot startup sequence: fetch the artifact, then load it.
//!
//! Runs to completion before any listener is bound. Every error is fatal to the caller;
//! nothing here retries. The lifecycle is left in `Loading`: the final step to `Serving`
//! belongs to whoever binds the public listener (see [`close_phase`]).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use orchard_core::Lifecycle;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::fetch::{ArtifactFetcher, FetchError, FetchOutcome};
use crate::loader::{LoadError, ModelLoader};
use crate::metrics::METRICS;
use crate::predictor::Classifier;

/// Where the published model lives.
pub const ARTIFACT_URL: &str = "https://drive.google.com/uc?export=download&id=1ThGp9A4kdkWknAorcttHvCEBm85Ne-Oq";
/// File name of the artifact inside the install directory.
pub const ARTIFACT_FILE_NAME: &str = "inception_transfer2.onnx";

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("fetching model artifact: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("model loading task did not complete: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Identity of the artifact: remote source plus local placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub url: String,
    pub model_dir: PathBuf,
    pub file_name: String,
}

impl ArtifactLocation {
    /// The published artifact, stored directly in the install directory.
    pub fn bundled(app_dir: &Path) -> Self {
        Self { url: ARTIFACT_URL.to_string(), model_dir: app_dir.to_path_buf(), file_name: ARTIFACT_FILE_NAME.to_string() }
    }

    pub fn path(&self) -> PathBuf { self.model_dir.join(&self.file_name) }
}

pub struct Bootstrap {
    fetcher: ArtifactFetcher,
    loader: ModelLoader,
    lifecycle: Arc<Lifecycle>,
}

impl Bootstrap {
    pub fn new(fetcher: ArtifactFetcher, loader: ModelLoader, lifecycle: Arc<Lifecycle>) -> Self {
        Self { fetcher, loader, lifecycle }
    }

    /// Ensures the artifact is on disk, then deserializes it. The returned handle is the only
    /// model this process will ever use.
    #[instrument(skip_all, fields(url = %location.url, path = %location.path().display()))]
    pub async fn run(&self, location: &ArtifactLocation) -> Result<Arc<dyn Classifier>, BootstrapError> {
        let outcome = self.fetcher.ensure(&location.url, &location.path()).await?;
        if let FetchOutcome::Downloaded { bytes } = outcome { info!(bytes, "artifact downloaded"); }
        close_phase(&self.lifecycle);

        let loader = self.loader.clone();
        let model_dir = location.model_dir.clone();
        let file_name = location.file_name.clone();
        let model = tokio::task::spawn_blocking(move || loader.load(&model_dir, &file_name)).await?.map_err(|e| {
            if matches!(e, LoadError::Decode(_)) {
                warn!(path = %location.path().display(), "artifact is unreadable and is never re-fetched while present; delete it to download again");
            }
            e
        })?;
        info!("artifact loaded");
        Ok(model)
    }
}

/// Closes the current bootstrap phase and records its duration.
pub fn close_phase(lifecycle: &Lifecycle) {
    let (phase, dur) = lifecycle.advance();
    METRICS.bootstrap_phase_ms.with_label_values(&[phase.as_str()]).observe(dur.as_secs_f64() * 1000.0);
    info!(phase = phase.as_str(), ms = dur.as_millis() as u64, "bootstrap phase finished");
}
