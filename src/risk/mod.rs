//! Risk vocabulary shared by both classifiers, fusion, explanation and recommendations.

mod engine;
mod explain;
pub mod recommend;

pub use engine::{combine, FusionWeights};
pub use explain::{explain, FeatureContribution};
pub use recommend::recommend;

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Ordinal score used by fusion: Low 0, Medium 1, High 2.
    pub fn score(self) -> f64 {
        match self {
            RiskLevel::Low => 0.0,
            RiskLevel::Medium => 1.0,
            RiskLevel::High => 2.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        RiskLevel::ALL.into_iter().find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity marker; only meaningful when risk is not Low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "Stage 1")]
    Stage1,
    #[serde(rename = "Stage 2")]
    Stage2,
    #[serde(rename = "Stage 3")]
    Stage3,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Stage1 => "Stage 1",
            Stage::Stage2 => "Stage 2",
            Stage::Stage3 => "Stage 3",
        }
    }

    /// Accepts "Stage 2", "stage2" or "2".
    pub fn parse(s: &str) -> Option<Self> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_ascii_lowercase();
        match compact.strip_prefix("stage").unwrap_or(compact.as_str()) {
            "1" => Some(Stage::Stage1),
            "2" => Some(Stage::Stage2),
            "3" => Some(Stage::Stage3),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a single classifier for one prediction call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifierResult {
    pub risk: RiskLevel,
    /// Probability of the winning class, in [0, 1]
    pub confidence: f64,
    pub stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_probabilities: Option<Vec<f64>>,
}

/// Final risk after fusing the available classifier results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    pub risk: RiskLevel,
    pub confidence: f64,
    pub stage: Option<Stage>,
}

impl From<&ClassifierResult> for FusedResult {
    fn from(r: &ClassifierResult) -> Self {
        Self {
            risk: r.risk,
            confidence: r.confidence,
            stage: r.stage,
        }
    }
}
