//! Brain-scan classifier: decode → square resize → RGB in [0, 1] → 4-class model.
//!
//! The reference network behind this was trained on random noise with random labels.
//! Treat its output as a non-functional placeholder until a model trained on real,
//! labelled scans is exported.

use super::forest::argmax;
use crate::error::{PredictError, Result};
use crate::risk::{ClassifierResult, RiskLevel, Stage};
use image::imageops::FilterType;
use ndarray::{Array4, ArrayView4};

pub const SCAN_CLASSES: usize = 4;

/// Backend producing class probabilities for one NHWC `[1, size, size, 3]` tensor.
pub trait ScanModel: Send + Sync {
    fn class_probabilities(&self, input: ArrayView4<'_, f32>) -> Result<Vec<f32>>;
}

pub struct ScanClassifier {
    model: Box<dyn ScanModel>,
    image_size: u32,
}

impl ScanClassifier {
    pub fn new(model: Box<dyn ScanModel>, image_size: u32) -> Self {
        Self { model, image_size }
    }

    /// Decode any supported format into the model's input tensor.
    pub fn preprocess(&self, bytes: &[u8]) -> Result<Array4<f32>> {
        let img = image::load_from_memory(bytes).map_err(|e| PredictError::ImageDecode(e.to_string()))?;
        let size = self.image_size;
        let rgb = img.resize_exact(size, size, FilterType::Nearest).to_rgb8();

        let side = size as usize;
        let mut tensor = Array4::<f32>::zeros((1, side, side, 3));
        for (x, y, pixel) in rgb.enumerate_pixels() {
            for c in 0..3 {
                tensor[[0, y as usize, x as usize, c]] = pixel[c] as f32 / 255.0;
            }
        }
        Ok(tensor)
    }

    pub fn predict(&self, bytes: &[u8]) -> Result<ClassifierResult> {
        let input = self.preprocess(bytes)?;
        let probs = self.model.class_probabilities(input.view())?;
        if probs.len() != SCAN_CLASSES {
            return Err(PredictError::Inference(format!(
                "scan model returned {} probabilities, expected {}",
                probs.len(),
                SCAN_CLASSES
            )));
        }
        if probs.iter().any(|p| !p.is_finite()) {
            return Err(PredictError::Inference(format!(
                "scan model returned non-finite probabilities {:?}",
                probs
            )));
        }
        let probs: Vec<f64> = probs.into_iter().map(f64::from).collect();
        let class = argmax(&probs);
        let (risk, stage) = scan_outcome(class);
        Ok(ClassifierResult {
            risk,
            confidence: probs[class].clamp(0.0, 1.0),
            stage,
            class_probabilities: Some(probs),
        })
    }
}

/// Class index → (risk, stage) for the four scan classes.
pub fn scan_outcome(class: usize) -> (RiskLevel, Option<Stage>) {
    match class {
        0 => (RiskLevel::Low, None),
        1 => (RiskLevel::Medium, Some(Stage::Stage1)),
        2 => (RiskLevel::High, Some(Stage::Stage2)),
        _ => (RiskLevel::High, Some(Stage::Stage3)),
    }
}
