//! Prometheus instruments for the gateway, registered in the default registry
//! so the health server's `/metrics` picks them up.

use once_cell::sync::Lazy;
use prometheus::{register_histogram, register_histogram_vec, register_int_counter_vec, register_int_gauge, Histogram, HistogramVec, IntCounterVec, IntGauge};

pub struct GatewayMetrics {
    pub predictions_total: IntCounterVec,
    pub inference_latency_ms: Histogram,
    pub inference_inflight: IntGauge,
    pub artifact_fetch_total: IntCounterVec,
    pub bootstrap_phase_ms: HistogramVec,
}

const LATENCY_BUCKETS_MS: &[f64] = &[5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0];

pub static METRICS: Lazy<GatewayMetrics> = Lazy::new(|| GatewayMetrics {
    predictions_total: register_int_counter_vec!("orchard_predictions_total", "Predictions served, by outcome", &["outcome"])
        .expect("register orchard_predictions_total"),
    inference_latency_ms: register_histogram!("orchard_inference_latency_ms", "Wait + run time of one inference (ms)", LATENCY_BUCKETS_MS.to_vec())
        .expect("register orchard_inference_latency_ms"),
    inference_inflight: register_int_gauge!("orchard_inference_inflight", "Inference calls currently queued or running")
        .expect("register orchard_inference_inflight"),
    artifact_fetch_total: register_int_counter_vec!("orchard_artifact_fetch_total", "Artifact fetch attempts, by outcome", &["outcome"])
        .expect("register orchard_artifact_fetch_total"),
    bootstrap_phase_ms: register_histogram_vec!("orchard_bootstrap_phase_ms", "Duration of each bootstrap phase (ms)", &["phase"], LATENCY_BUCKETS_MS.to_vec())
        .expect("register orchard_bootstrap_phase_ms"),
});
