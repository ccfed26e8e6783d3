//! HTTP surface: upload analysis, the landing page and static assets.

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::{header, HeaderName, Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::predictor::{InferenceError, Predictor};

/// Multipart part carrying the image.
pub const UPLOAD_FIELD: &str = "file";
/// Request body cap for `/analyze` (axum defaults to 2 MiB).
pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub predictor: Predictor,
    pub app_dir: PathBuf,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Analysis {
    pub result: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("multipart field '{0}' is missing")]
    MissingField(&'static str),
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("landing page unavailable: {0}")]
    Page(#[source] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MissingField(_) => StatusCode::BAD_REQUEST,
            // 413 for oversized uploads, 400 for malformed bodies.
            AppError::Multipart(e) => e.status(),
            AppError::Inference(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            AppError::Inference(_) | AppError::Page(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!(%status, error = %self, "request failed");
        (status, self.to_string()).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(state.app_dir.join("static"));
    Router::new()
        .route("/", get(homepage))
        .route("/analyze", post(analyze).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)))
        .nest_service("/static", assets)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors())
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([HeaderName::from_static("x-requested-with"), header::CONTENT_TYPE])
}

async fn homepage(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let page = tokio::fs::read_to_string(state.app_dir.join("view").join("index.html")).await.map_err(AppError::Page)?;
    Ok(Html(page))
}

async fn analyze(State(state): State<AppState>, mut form: Multipart) -> Result<Json<Analysis>, AppError> {
    let image = upload(&mut form).await?;
    let result = state.predictor.predict(image).await?;
    Ok(Json(Analysis { result }))
}

/// Bytes of the first part named [`UPLOAD_FIELD`]; other parts are skipped.
async fn upload(form: &mut Multipart) -> Result<Bytes, AppError> {
    while let Some(field) = form.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return Ok(field.bytes().await?);
        }
    }
    Err(AppError::MissingField(UPLOAD_FIELD))
}
