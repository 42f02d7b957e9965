//! Classifiers and the registry that owns them.
//!
//! A [`ModelRegistry`] is built once at startup (or by a test with fixture models) and
//! shared read-only across requests.

pub mod forest;
pub mod onnx;
pub mod scan;
pub mod synthetic;
pub mod tabular;

pub use onnx::OnnxScanModel;
pub use scan::{ScanClassifier, ScanModel};
pub use tabular::{TabularClassifier, TrainingMetrics};

use crate::config::ServiceConfig;
use crate::error::{PredictError, Result};
use crate::features::FeatureVector;
use crate::risk::{explain, ClassifierResult, FeatureContribution};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArtifactStatus {
    pub tabular_model_present: bool,
    pub scan_model_present: bool,
}

#[derive(Default)]
pub struct ModelRegistry {
    tabular: Option<TabularClassifier>,
    scan: Option<ScanClassifier>,
}

impl ModelRegistry {
    pub fn with_tabular(mut self, tabular: TabularClassifier) -> Self {
        self.tabular = Some(tabular);
        self
    }

    pub fn with_scan(mut self, scan: ScanClassifier) -> Self {
        self.scan = Some(scan);
        self
    }

    /// Load (or train and save) the tabular model; load the scan model if its file exists.
    pub fn load(config: &ServiceConfig) -> Result<Self> {
        let tabular_path = config.tabular_model_path();
        let tabular = if tabular_path.exists() {
            Some(TabularClassifier::load(&tabular_path)?)
        } else if config.tabular.train_if_missing {
            info!(path = %tabular_path.display(), "tabular model not found; training");
            let model = TabularClassifier::train(&config.tabular)?;
            model.save(&tabular_path)?;
            Some(model)
        } else {
            warn!(path = %tabular_path.display(), "tabular model not found; predictions disabled");
            None
        };

        let scan_path = config.scan_model_path();
        let scan = if scan_path.exists() {
            let backend = OnnxScanModel::load(&scan_path)?;
            Some(ScanClassifier::new(Box::new(backend), config.scan.image_size))
        } else {
            warn!(path = %scan_path.display(), "scan model not found; scan inference disabled");
            None
        };

        Ok(Self { tabular, scan })
    }

    /// Which model files exist on disk. Reads nothing and trains nothing.
    pub fn artifact_status(config: &ServiceConfig) -> ArtifactStatus {
        ArtifactStatus {
            tabular_model_present: config.tabular_model_path().is_file(),
            scan_model_present: config.scan_model_path().is_file(),
        }
    }

    pub fn has_tabular(&self) -> bool {
        self.tabular.is_some()
    }

    pub fn has_scan(&self) -> bool {
        self.scan.is_some()
    }

    pub fn tabular(&self) -> Result<&TabularClassifier> {
        self.tabular.as_ref().ok_or(PredictError::ModelNotLoaded("tabular"))
    }

    pub fn scan(&self) -> Result<&ScanClassifier> {
        self.scan.as_ref().ok_or(PredictError::ModelNotLoaded("scan"))
    }

    pub fn predict_tabular(&self, features: &FeatureVector) -> Result<ClassifierResult> {
        Ok(self.tabular()?.predict(features))
    }

    pub fn predict_scan(&self, image: &[u8]) -> Result<ClassifierResult> {
        self.scan()?.predict(image)
    }

    /// Contribution breakdown weighted by the tabular model's global importances.
    pub fn explain(&self, features: &FeatureVector) -> Result<FeatureContribution> {
        Ok(explain(features, self.tabular()?.feature_importances()))
    }
}
