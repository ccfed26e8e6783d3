//! Exercises the health listener over loopback: readiness flips only after bootstrap completes.
use orchard_core::{start_health_server, BootstrapPhase, Lifecycle};
use std::sync::Arc;

#[tokio::test]
async fn readiness_follows_bootstrap_phases() {
    let lifecycle = Arc::new(Lifecycle::new());
    let addr = start_health_server(0, lifecycle.clone()).await.expect("health server binds");
    let base = format!("http://127.0.0.1:{}", addr.port());
    let client = reqwest::Client::new();

    let live: serde_json::Value = client.get(format!("{base}/live")).send().await.unwrap().json().await.unwrap();
    assert_eq!(live["live"], true);

    let resp = client.get(format!("{base}/ready")).send().await.unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::SERVICE_UNAVAILABLE);

    assert_eq!(lifecycle.advance().0, BootstrapPhase::Fetching);
    assert_eq!(lifecycle.advance().0, BootstrapPhase::Loading);

    let resp = client.get(format!("{base}/ready")).send().await.unwrap();
    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ready"], true);

    let status: serde_json::Value = client.get(format!("{base}/status")).send().await.unwrap().json().await.unwrap();
    assert_eq!(status["phase"], "serving");
    assert_eq!(status["phase_durations_ms"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(status["phase_durations_ms"][0]["phase"], "fetching");
}

#[tokio::test]
async fn metrics_endpoint_serves_text_exposition() {
    let counter = prometheus::register_int_counter!("orchard_core_test_marker_total", "marker counter for the exposition test").unwrap();
    counter.inc();
    let addr = start_health_server(0, Arc::new(Lifecycle::new())).await.unwrap();
    let resp = reqwest::get(format!("http://127.0.0.1:{}/metrics", addr.port())).await.unwrap();
    assert!(resp.status().is_success());
    let body = resp.text().await.unwrap();
    assert!(body.contains("orchard_core_test_marker_total 1"), "missing marker counter in {body}");
}
