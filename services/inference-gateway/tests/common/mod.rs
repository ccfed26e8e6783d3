#![allow(dead_code)]

use axum::{http::StatusCode, routing::get, Router};
use inference_gateway::predictor::{Classifier, InferenceError};
use inference_gateway::preprocess;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Serves `router` on an ephemeral loopback port and returns its base URL.
pub async fn spawn_app(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, router).await.unwrap(); });
    format!("http://{addr}")
}

/// Remote artifact host answering `/model.onnx` with `status` and `body`, counting hits.
pub async fn artifact_server(status: StatusCode, body: &'static [u8]) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let router = Router::new().route(
        "/model.onnx",
        get(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                (status, body)
            }
        }),
    );
    let base = spawn_app(router).await;
    (format!("{base}/model.onnx"), hits)
}

/// Always answers with the same label, like a model pinned to one class.
pub struct FixedClassifier(pub &'static str);

impl Classifier for FixedClassifier {
    fn predict(&self, _image: &[u8]) -> Result<String, InferenceError> { Ok(self.0.to_string()) }
}

/// Decodes the image first, so undecodable uploads fail the way a real model would.
pub struct DecodingClassifier(pub &'static str);

impl Classifier for DecodingClassifier {
    fn predict(&self, image: &[u8]) -> Result<String, InferenceError> {
        preprocess::decode(image)?;
        Ok(self.0.to_string())
    }
}

pub fn banana_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 16, image::Rgb([240, 220, 60]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img).write_to(&mut Cursor::new(&mut buf), image::ImageOutputFormat::Png).unwrap();
    buf
}
