//! One assessment request end to end: form → features → classifiers → fusion → explanation.
//!
//! Produces the [`PredictionRecord`] handed to the store and to the report generator.

use crate::config::ScanConfig;
use crate::error::{PredictError, Result};
use crate::features::FeatureVector;
use crate::model::ModelRegistry;
use crate::risk::{combine, recommend, ClassifierResult, FeatureContribution, FusedResult, RiskLevel, Stage};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Patient identity fields. Opaque to the models; carried through to storage and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientIdentity {
    pub name: String,
    pub age: u32,
    pub gender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Uploaded scan as received: original file name and raw bytes.
#[derive(Debug, Clone)]
pub struct ScanUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct AssessmentRequest {
    pub patient: PatientIdentity,
    /// Raw form values keyed by feature name
    pub form: BTreeMap<String, String>,
    pub scan: Option<ScanUpload>,
}

/// Everything persisted for one assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub patient: PatientIdentity,
    pub features: FeatureVector,
    pub risk: RiskLevel,
    pub stage: Option<Stage>,
    /// Fused confidence
    pub confidence: f64,
    pub tabular_risk: RiskLevel,
    pub tabular_confidence: f64,
    pub scan_risk: Option<RiskLevel>,
    pub scan_confidence: Option<f64>,
    /// SHA-256 of the uploaded scan bytes
    pub scan_sha256: Option<String>,
    /// Why a supplied scan did not contribute
    pub scan_error: Option<String>,
    pub recommendations: Vec<String>,
    pub contributions: FeatureContribution,
}

impl PredictionRecord {
    /// Recommendations as a single newline-separated block.
    pub fn recommendations_text(&self) -> String {
        self.recommendations.join("\n")
    }
}

/// Record plus the intermediate classifier outputs.
#[derive(Debug, Clone, Serialize)]
pub struct Assessment {
    pub record: PredictionRecord,
    pub tabular: ClassifierResult,
    pub scan: Option<ClassifierResult>,
    pub fused: FusedResult,
}

pub struct Assessor {
    registry: Arc<ModelRegistry>,
    allowed_extensions: Vec<String>,
}

impl Assessor {
    pub fn new(registry: Arc<ModelRegistry>, scan: &ScanConfig) -> Self {
        Self {
            registry,
            allowed_extensions: scan.allowed_extensions.iter().map(|e| e.to_ascii_lowercase()).collect(),
        }
    }

    /// Run one assessment. Invalid form input fails before any model is called; a scan
    /// that can't be decoded is recorded and the tabular result stands alone.
    pub fn assess(&self, request: AssessmentRequest) -> Result<Assessment> {
        let features = FeatureVector::from_form(&request.form)?;
        let tabular = self.registry.predict_tabular(&features)?;

        let mut scan_error = None;
        let mut scan_sha256 = None;
        let scan = match &request.scan {
            None => None,
            Some(upload) => {
                scan_sha256 = Some(format!("{:x}", Sha256::digest(&upload.bytes)));
                match self.scan_result(upload) {
                    Ok(result) => Some(result),
                    Err(PredictError::ImageDecode(reason)) => {
                        warn!(file = %upload.file_name, error = %reason, "scan ignored");
                        scan_error = Some(reason);
                        None
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let fused = combine(Some(&tabular), scan.as_ref())?;
        let recommendations = recommend(&features, &fused);
        let contributions = self.registry.explain(&features)?;

        let record = PredictionRecord {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            patient: request.patient,
            features,
            risk: fused.risk,
            stage: fused.stage,
            confidence: fused.confidence,
            tabular_risk: tabular.risk,
            tabular_confidence: tabular.confidence,
            scan_risk: scan.as_ref().map(|s| s.risk),
            scan_confidence: scan.as_ref().map(|s| s.confidence),
            scan_sha256,
            scan_error,
            recommendations,
            contributions,
        };
        info!(
            prediction_id = %record.id,
            risk = %record.risk,
            stage = record.stage.map(|s| s.as_str()),
            confidence = record.confidence,
            tabular_confidence = record.tabular_confidence,
            scan_confidence = record.scan_confidence,
            "assessment complete"
        );

        Ok(Assessment {
            record,
            tabular,
            scan,
            fused,
        })
    }

    fn scan_result(&self, upload: &ScanUpload) -> Result<ClassifierResult> {
        let ext = Path::new(&upload.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        if !self.allowed_extensions.contains(&ext) {
            return Err(PredictError::ImageDecode(format!(
                "unsupported scan file type {:?}",
                upload.file_name
            )));
        }
        self.registry.predict_scan(&upload.bytes)
    }
}
