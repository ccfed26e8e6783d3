//! Readiness is tied to the public listener, not just to a loaded model.
mod common;

use common::FixedClassifier;
use inference_gateway::bootstrap::close_phase;
use inference_gateway::serve;
use orchard_core::{load_config_from, BootstrapPhase, Lifecycle, ServiceConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

fn config(port: u16) -> ServiceConfig {
    let mut cfg = load_config_from("inference-gateway", None).unwrap();
    cfg.host = "127.0.0.1".into();
    cfg.port = port;
    cfg.inference_workers = 1;
    cfg
}

/// Lifecycle as bootstrap leaves it: artifact fetched and loaded.
fn loaded() -> Arc<Lifecycle> {
    let lifecycle = Arc::new(Lifecycle::new());
    close_phase(&lifecycle);
    assert_eq!(lifecycle.phase(), BootstrapPhase::Loading);
    lifecycle
}

#[tokio::test]
async fn bind_failure_never_reports_ready() {
    let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = taken.local_addr().unwrap().port();
    let lifecycle = loaded();

    let err = serve(&config(port), Arc::new(FixedClassifier("Banana")), lifecycle.clone()).await.unwrap_err();
    assert!(format!("{err:#}").contains("binding"), "{err:#}");
    assert!(!lifecycle.is_ready());
    assert_eq!(lifecycle.phase(), BootstrapPhase::Loading);
}

#[tokio::test]
async fn ready_once_listener_is_bound() {
    let port = {
        let scratch = TcpListener::bind("127.0.0.1:0").await.unwrap();
        scratch.local_addr().unwrap().port()
    };
    let lifecycle = loaded();
    let task = tokio::spawn({
        let lifecycle = lifecycle.clone();
        async move { serve(&config(port), Arc::new(FixedClassifier("Banana")), lifecycle).await }
    });

    let mut waited = Duration::ZERO;
    while !lifecycle.is_ready() {
        assert!(waited < Duration::from_secs(5), "service never became ready");
        tokio::time::sleep(Duration::from_millis(10)).await;
        waited += Duration::from_millis(10);
    }
    assert_eq!(lifecycle.phase(), BootstrapPhase::Serving);
    let resp = reqwest::get(format!("http://127.0.0.1:{port}/static/missing.js")).await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
    task.abort();
}
