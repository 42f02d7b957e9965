//! Confidence-weighted fusion of the tabular (A) and scan (B) classifier results.

use super::{ClassifierResult, FusedResult, RiskLevel, Stage};
use crate::error::{PredictError, Result};

/// Combined score below this is Low.
const LOW_CEILING: f64 = 0.7;
/// Combined score below this (and at least `LOW_CEILING`) is Medium.
const MEDIUM_CEILING: f64 = 1.5;

/// Weights fall back to this split when both confidences are zero.
const ZERO_CONFIDENCE_SPLIT: FusionWeights = FusionWeights { a: 0.3, b: 0.7 };

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionWeights {
    pub a: f64,
    pub b: f64,
}

impl FusionWeights {
    /// Each side's share of the total confidence.
    pub fn from_confidences(conf_a: f64, conf_b: f64) -> Self {
        let total = conf_a + conf_b;
        if total > 0.0 {
            Self {
                a: conf_a / total,
                b: conf_b / total,
            }
        } else {
            ZERO_CONFIDENCE_SPLIT
        }
    }
}

/// Fuse two classifier results. A lone result passes through unchanged; none at all is an error.
pub fn combine(a: Option<&ClassifierResult>, b: Option<&ClassifierResult>) -> Result<FusedResult> {
    let (a, b) = match (a, b) {
        (Some(a), Some(b)) => (a, b),
        (Some(only), None) | (None, Some(only)) => return Ok(FusedResult::from(only)),
        (None, None) => return Err(PredictError::EmptyFusion),
    };

    let w = FusionWeights::from_confidences(a.confidence, b.confidence);
    tracing::debug!(weight_a = w.a, weight_b = w.b, "fusion weights");

    let score = w.a * a.risk.score() + w.b * b.risk.score();
    let confidence = w.a * a.confidence + w.b * b.confidence;

    let (risk, stage) = if score < LOW_CEILING {
        (RiskLevel::Low, None)
    } else if score < MEDIUM_CEILING {
        let stage = a.stage.or(b.stage).unwrap_or(Stage::Stage1);
        (RiskLevel::Medium, Some(stage))
    } else {
        // Scan stage wins only when the scan is strictly more confident.
        let preferred = if b.confidence > a.confidence {
            b.stage
        } else {
            a.stage.or(b.stage)
        };
        (RiskLevel::High, Some(preferred.unwrap_or(Stage::Stage2)))
    };

    Ok(FusedResult {
        risk,
        confidence,
        stage,
    })
}
