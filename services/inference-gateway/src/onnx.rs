//! tract-backed decoder and classifier for ONNX exports.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tract_onnx::pb::ModelProto;
use tract_onnx::prelude::*;
use tracing::{debug, info};

use crate::labels;
use crate::loader::{ArtifactDecoder, DecodeError};
use crate::predictor::{Classifier, InferenceError};
use crate::preprocess;

/// Metadata key exporters use to record the device the graph was exported for.
pub const DEVICE_METADATA_KEY: &str = "export_device";

type Plan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Reads the device tag, if the exporter left one.
pub fn export_device(proto: &ModelProto) -> Option<&str> {
    proto.metadata_props.iter().find(|p| p.key == DEVICE_METADATA_KEY).map(|p| p.value.as_str())
}

/// `None` when the graph can run on CPU, otherwise a description of what it needs instead.
pub fn cpu_incompatibility(proto: &ModelProto) -> Option<String> {
    match export_device(proto).map(str::trim) {
        None | Some("") => None,
        Some(d) if d.eq_ignore_ascii_case("cpu") => None,
        Some(d) => Some(format!(
            "artifact was exported for device '{d}' (producer {} {}) and cannot be deserialized on this CPU-only machine",
            proto.producer_name, proto.producer_version
        )),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct OnnxDecoder {
    /// Square input side the graph is pinned to.
    pub image_size: u32,
}

impl OnnxDecoder {
    pub fn new(image_size: u32) -> Self { Self { image_size } }
}

impl ArtifactDecoder for OnnxDecoder {
    fn decode(&self, path: &Path) -> Result<Arc<dyn Classifier>, DecodeError> {
        let start = Instant::now();
        let onnx = tract_onnx::onnx();
        let proto = onnx.proto_model_for_path(path)?;
        if let Some(detail) = cpu_incompatibility(&proto) {
            return Err(DecodeError::CpuIncompatible { detail });
        }
        let side = self.image_size as usize;
        let plan = onnx
            .model_for_proto_model(&proto)?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)))?
            .into_optimized()?
            .into_runnable()?;
        info!(path = %path.display(), side, elapsed_ms = start.elapsed().as_millis() as u64, "onnx plan ready");
        Ok(Arc::new(OnnxClassifier { plan, side: self.image_size }))
    }
}

pub struct OnnxClassifier {
    plan: Plan,
    side: u32,
}

impl Classifier for OnnxClassifier {
    fn predict(&self, image: &[u8]) -> Result<String, InferenceError> {
        let input = preprocess::image_to_input(image, self.side)?;
        let side = self.side as usize;
        let tensor = Tensor::from_shape(&[1, 3, side, side], &input).map_err(InferenceError::Model)?;
        let outputs = self.plan.run(tvec!(tensor.into())).map_err(InferenceError::Model)?;
        let scores = outputs[0].to_array_view::<f32>().map_err(InferenceError::Model)?;
        let index = argmax(scores.iter().copied()).ok_or_else(|| InferenceError::Model(anyhow::anyhow!("model returned an empty score vector")))?;
        debug!(index, "top class");
        labels::label(index)
            .map(str::to_string)
            .ok_or(InferenceError::UnknownClass { index, known: labels::LABELS.len() })
    }
}

/// Index of the largest score; the first one wins ties. NaNs never win.
fn argmax(scores: impl Iterator<Item = f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, s) in scores.enumerate() {
        match best {
            Some((_, b)) if !(s > b) => {}
            _ if s.is_nan() => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}
