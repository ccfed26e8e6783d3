//! Request-time inference: raw image bytes in, one label out.

use axum::body::Bytes;
use orchard_core::{Bulkhead, BulkheadError};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::metrics::METRICS;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("image could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
    #[error("model evaluation failed: {0}")]
    Model(#[source] anyhow::Error),
    #[error("model produced class index {index} outside the {known} known labels")]
    UnknownClass { index: usize, known: usize },
    #[error("inference worker failed: {0}")]
    Worker(#[from] BulkheadError),
}

impl InferenceError {
    /// True when the request payload itself was unusable.
    pub fn is_client_error(&self) -> bool { matches!(self, InferenceError::Decode(_)) }

    fn outcome(&self) -> &'static str {
        match self {
            InferenceError::Decode(_) => "decode_error",
            InferenceError::Model(_) | InferenceError::UnknownClass { .. } => "model_error",
            InferenceError::Worker(_) => "worker_error",
        }
    }
}

/// The loaded model as seen by the rest of the service: one synchronous operation.
/// Implementations are immutable after construction and shared across requests.
pub trait Classifier: Send + Sync + 'static {
    fn predict(&self, image: &[u8]) -> Result<String, InferenceError>;
}

/// Runs a shared [`Classifier`] off the async workers, at most `workers` calls at a time.
#[derive(Clone)]
pub struct Predictor {
    model: Arc<dyn Classifier>,
    pool: Bulkhead,
}

impl Predictor {
    pub fn new(model: Arc<dyn Classifier>, workers: usize) -> Self {
        Self { model, pool: Bulkhead::new("inference", workers) }
    }

    pub fn pool(&self) -> &Bulkhead { &self.pool }

    #[instrument(skip(self, image), fields(bytes = image.len()))]
    pub async fn predict(&self, image: Bytes) -> Result<String, InferenceError> {
        let model = self.model.clone();
        let start = Instant::now();
        let res = {
            let _inflight = InflightGauge::enter();
            self.pool.run_blocking(move || model.predict(&image)).await
        };
        let res = res.map_err(InferenceError::from).and_then(|r| r);
        let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        METRICS.inference_latency_ms.observe(elapsed_ms);
        match &res {
            Ok(label) => {
                METRICS.predictions_total.with_label_values(&["ok"]).inc();
                debug!(%label, elapsed_ms, "prediction");
            }
            Err(e) => {
                METRICS.predictions_total.with_label_values(&[e.outcome()]).inc();
                warn!(error = %e, elapsed_ms, "prediction failed");
            }
        }
        res
    }
}

/// Keeps `inference_inflight` balanced even when the request future is dropped mid-wait.
struct InflightGauge;

impl InflightGauge {
    fn enter() -> Self {
        METRICS.inference_inflight.inc();
        Self
    }
}

impl Drop for InflightGauge {
    fn drop(&mut self) { METRICS.inference_inflight.dec(); }
}
