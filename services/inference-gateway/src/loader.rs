//! Model loader: artifact on disk -> shared [`Classifier`] handle.
//!
//! Decoding is delegated to an [`ArtifactDecoder`]. Decoders say *why* they failed through
//! [`DecodeError`]; the loader turns the CPU-incompatibility case into an operator-facing
//! remediation message and hands every other failure back untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument};

use crate::predictor::Classifier;

/// Shown when an artifact was exported for a GPU runtime and cannot run here.
pub const REMEDIATION: &str = "\n\nThis model was trained with an old version of fastai and will not work in a CPU environment.\n\nPlease update the fastai library in your training environment and export your model again.\n\nSee instructions for 'Returning to work' at https://course.fast.ai.";

#[derive(Debug, Error)]
pub enum DecodeError {
    /// The artifact can only be materialized on an accelerator this process does not have.
    #[error("{detail}")]
    CpuIncompatible { detail: String },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{}", REMEDIATION)]
    IncompatibleArtifact { path: PathBuf, detail: String },
    #[error(transparent)]
    Decode(anyhow::Error),
}

/// Turns the bytes of one artifact format into a ready classifier.
pub trait ArtifactDecoder: Send + Sync + 'static {
    fn decode(&self, path: &Path) -> Result<Arc<dyn Classifier>, DecodeError>;
}

#[derive(Clone)]
pub struct ModelLoader {
    decoder: Arc<dyn ArtifactDecoder>,
}

impl ModelLoader {
    pub fn new(decoder: Arc<dyn ArtifactDecoder>) -> Self { Self { decoder } }

    /// Deserializes `model_dir/model_file`. Blocking; call from a blocking context.
    #[instrument(skip(self, model_dir), fields(model_dir = %model_dir.display()))]
    pub fn load(&self, model_dir: &Path, model_file: &str) -> Result<Arc<dyn Classifier>, LoadError> {
        let path = model_dir.join(model_file);
        match self.decoder.decode(&path) {
            Ok(model) => {
                info!(path = %path.display(), "model loaded");
                Ok(model)
            }
            Err(DecodeError::CpuIncompatible { detail }) => {
                error!(path = %path.display(), %detail, "artifact requires an accelerator");
                Err(LoadError::IncompatibleArtifact { path, detail })
            }
            Err(DecodeError::Other(e)) => Err(LoadError::Decode(e)),
        }
    }
}
