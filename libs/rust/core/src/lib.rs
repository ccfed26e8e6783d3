//! Core shared utilities for Orchard services.

use anyhow::{bail, Context, Result};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use once_cell::sync::OnceCell;
use prometheus::{Encoder, TextEncoder};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod bulkhead;
pub mod lifecycle;

pub use bulkhead::{Bulkhead, BulkheadError, BulkheadStats};
pub use lifecycle::{BootstrapPhase, BootstrapState, Lifecycle, LifecycleStatus};

static TRACING_INIT: OnceCell<()> = OnceCell::new();

/// Prefix for environment overrides, e.g. `ORCHARD__PORT=8080`.
pub const ENV_PREFIX: &str = "ORCHARD";
/// Names an optional config file layered between defaults and the environment.
pub const CONFIG_FILE_ENV: &str = "ORCHARD_CONFIG_FILE";

/// Installs the global subscriber. `RUST_LOG` wins over `default_level`;
/// `ORCHARD_JSON_LOG=1` switches to flattened JSON lines.
pub fn init_tracing(service: &str, default_level: &str) -> Result<()> {
    TRACING_INIT.get_or_try_init(|| -> Result<()> {
        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        let json = std::env::var("ORCHARD_JSON_LOG").ok().map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false);
        let registry = tracing_subscriber::registry().with(env_filter);
        if json {
            registry
                .with(tracing_subscriber::fmt::layer().json().flatten_event(true).with_current_span(true).with_span_list(false))
                .try_init()?;
        } else {
            registry
                .with(tracing_subscriber::fmt::layer().with_target(true).with_thread_ids(false).with_line_number(true))
                .try_init()?;
        }
        Ok(())
    })?;
    info!(target: "orchard", service, "tracing initialized");
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    pub service_name: String,
    pub host: String,
    pub port: u16,
    pub health_port: u16,
    /// Install directory: holds the model artifact, `view/` and `static/`.
    pub app_dir: PathBuf,
    pub image_size: u32,
    pub inference_workers: usize,
    pub log_level: String,
}

impl ServiceConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}

/// Defaults, then the file named by `ORCHARD_CONFIG_FILE` (if any), then `ORCHARD__*` variables.
pub fn load_config(service: &str) -> Result<ServiceConfig> {
    let file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);
    load_config_from(service, file.as_deref())
}

pub fn load_config_from(service: &str, file: Option<&Path>) -> Result<ServiceConfig> {
    let workers = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(2);
    let mut builder = config::Config::builder()
        .set_default("service_name", service)?
        .set_default("host", "0.0.0.0")?
        .set_default("port", 5000_i64)?
        .set_default("health_port", 9091_i64)?
        .set_default("app_dir", "app")?
        .set_default("image_size", 224_i64)?
        .set_default("inference_workers", workers as i64)?
        .set_default("log_level", "info")?;
    if let Some(file) = file {
        builder = builder.add_source(config::File::from(file).required(false));
    }
    builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__").try_parsing(true));
    let cfg: ServiceConfig = builder
        .build()
        .context("building configuration")?
        .try_deserialize()
        .context("deserializing configuration")?;
    if cfg.inference_workers == 0 {
        bail!("inference_workers must be at least 1");
    }
    if cfg.image_size == 0 {
        bail!("image_size must be positive");
    }
    Ok(cfg)
}

/// Binds the health listener on `0.0.0.0:port` and serves it in the background.
/// Returns the bound address (useful with port 0).
pub async fn start_health_server(port: u16, lifecycle: Arc<Lifecycle>) -> Result<SocketAddr> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding health server on {addr}"))?;
    let local = listener.local_addr()?;
    let app = health_router(lifecycle);
    info!(addr = %local, "health server listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = ?e, "health server failed");
        }
    });
    Ok(local)
}

pub fn health_router(lifecycle: Arc<Lifecycle>) -> Router {
    Router::new()
        .route("/live", get(live))
        .route("/ready", get(ready))
        .route("/status", get(status))
        .route("/metrics", get(metrics_handler))
        .with_state(lifecycle)
}

async fn live(State(lifecycle): State<Arc<Lifecycle>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "live": lifecycle.is_live() }))
}

async fn ready(State(lifecycle): State<Arc<Lifecycle>>) -> Response {
    let ready = lifecycle.is_ready();
    let code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (code, Json(serde_json::json!({ "ready": ready }))).into_response()
}

async fn status(State(lifecycle): State<Arc<Lifecycle>>) -> Json<LifecycleStatus> {
    Json(lifecycle.status())
}

async fn metrics_handler() -> Response {
    let families = prometheus::gather();
    let mut buf = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&families, &mut buf) {
        return (StatusCode::INTERNAL_SERVER_ERROR, format!("encode error: {e}")).into_response();
    }
    ([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], buf).into_response()
}
