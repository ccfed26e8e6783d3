//! Inference gateway: fetches and loads the fruit classifier once, then serves `/analyze`.

use anyhow::{Context, Result};
use orchard_core::{Lifecycle, ServiceConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub mod bootstrap;
pub mod fetch;
pub mod http;
pub mod labels;
pub mod loader;
pub mod metrics;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod predictor;
pub mod preprocess;

use bootstrap::{ArtifactLocation, Bootstrap};
use fetch::ArtifactFetcher;
use http::AppState;
use loader::{ArtifactDecoder, ModelLoader};
use predictor::{Classifier, Predictor};

pub const SERVICE: &str = "inference-gateway";

#[cfg(feature = "onnx")]
pub fn default_decoder(cfg: &ServiceConfig) -> Result<Arc<dyn ArtifactDecoder>> {
    Ok(Arc::new(onnx::OnnxDecoder::new(cfg.image_size)))
}

#[cfg(not(feature = "onnx"))]
pub fn default_decoder(_cfg: &ServiceConfig) -> Result<Arc<dyn ArtifactDecoder>> {
    anyhow::bail!("built without the `onnx` feature; no artifact decoder available")
}

/// Fetches and loads the bundled artifact. Any error means the service must not start.
pub async fn bootstrap_model(cfg: &ServiceConfig, lifecycle: Arc<Lifecycle>) -> Result<Arc<dyn Classifier>> {
    let loader = ModelLoader::new(default_decoder(cfg)?);
    let location = ArtifactLocation::bundled(&cfg.app_dir);
    Bootstrap::new(ArtifactFetcher::new(), loader, lifecycle)
        .run(&location)
        .await
        .context("bootstrap failed; refusing to serve")
}

/// Binds the public listener and serves until ctrl-c. Only call with a loaded model.
/// The lifecycle reaches `Serving` (and `/ready` turns 200) only once the bind succeeded.
pub async fn serve(cfg: &ServiceConfig, model: Arc<dyn Classifier>, lifecycle: Arc<Lifecycle>) -> Result<()> {
    let predictor = Predictor::new(model, cfg.inference_workers);
    let app = http::router(AppState { predictor, app_dir: cfg.app_dir.clone() });
    let addr = cfg.bind_addr()?;
    let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
    bootstrap::close_phase(&lifecycle);
    info!(addr = %listener.local_addr()?, workers = cfg.inference_workers, "serving");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
    info!("shutdown");
}
