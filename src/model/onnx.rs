//! ONNX Runtime backend for the scan classifier. Input: [1, size, size, 3] f32, Output: [1, 4] softmax.

use super::scan::ScanModel;
use crate::error::{PredictError, Result};
use ndarray::{ArrayView4, CowArray};
use ort::{Environment, GraphOptimizationLevel, Session, SessionBuilder, Value};
use std::path::Path;
use std::sync::{Arc, OnceLock};

static ORT_ENV: OnceLock<Arc<Environment>> = OnceLock::new();

fn environment() -> Result<Arc<Environment>> {
    if let Some(env) = ORT_ENV.get() {
        return Ok(env.clone());
    }
    let env = Environment::builder().with_name("stroke-risk").build()?.into_arc();
    Ok(ORT_ENV.get_or_init(|| env).clone())
}

pub struct OnnxScanModel {
    session: Session,
}

impl OnnxScanModel {
    /// Load an exported scan classifier. The file must exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(PredictError::Artifact(format!("scan model not found: {}", path.display())));
        }
        let env = environment()?;
        let session = SessionBuilder::new(&env)?
            .with_optimization_level(GraphOptimizationLevel::Level1)?
            .with_model_from_file(path)?;
        tracing::info!(
            path = %path.display(),
            input = session.inputs.first().map(|i| i.name.as_str()).unwrap_or("input"),
            "scan model loaded"
        );
        Ok(Self { session })
    }
}

impl ScanModel for OnnxScanModel {
    fn class_probabilities(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>> {
        let array = CowArray::from(input.view().into_dyn());
        let value = Value::from_array(self.session.allocator(), &array)?;
        let outputs = self.session.run(vec![value])?;
        let first = outputs
            .first()
            .ok_or_else(|| PredictError::Inference("scan model produced no outputs".to_string()))?;
        let tensor = first.try_extract::<f32>()?;
        let probs = tensor.view().iter().copied().collect();
        Ok(probs)
    }
}
