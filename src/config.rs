//! Service configuration. Loaded from JSON; any missing file falls back to defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Data directory (prediction store, model artifacts)
    pub data_dir: PathBuf,
    /// Tabular (clinical measurements) classifier
    pub tabular: TabularConfig,
    /// Scan (brain image) classifier
    pub scan: ScanConfig,
    /// Encrypted prediction store
    pub store: StoreConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularConfig {
    /// JSON artifact with forest, scaler, importances and metrics
    pub model_path: PathBuf,
    /// Train on placeholder data and save when the artifact is missing
    pub train_if_missing: bool,
    /// Number of synthetic samples generated for training
    pub n_samples: usize,
    /// Held-out share for the test split
    pub test_fraction: f64,
    /// k for k-fold cross-validation; 0 or 1 disables it
    pub cv_folds: usize,
    pub forest: ForestConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    /// None grows until leaves are pure or too small
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// ONNX export of the scan classifier; skipped when missing
    pub model_path: PathBuf,
    /// Square input resolution expected by the model
    pub image_size: u32,
    /// Accepted upload extensions (lowercase)
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite file name under `data_dir`
    pub file_name: String,
    /// Environment variable holding the payload encryption secret
    pub secret_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".stroke-risk"),
            tabular: TabularConfig::default(),
            scan: ScanConfig::default(),
            store: StoreConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/stroke_tabular.json"),
            train_if_missing: true,
            n_samples: 2000,
            test_fraction: 0.2,
            cv_folds: 5,
            forest: ForestConfig::default(),
        }
    }
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 200,
            max_depth: Some(15),
            min_samples_split: 5,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/stroke_scan.onnx"),
            image_size: 224,
            allowed_extensions: vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()],
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file_name: "predictions.db".to_string(),
            secret_env: "STROKE_RISK_STORE_SECRET".to_string(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl ServiceConfig {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            if let Ok(data) = std::fs::read_to_string(path) {
                if let Ok(c) = serde_json::from_str::<ServiceConfig>(&data) {
                    return c;
                }
            }
        }
        Self::default()
    }

    /// Path of the SQLite prediction store
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(&self.store.file_name)
    }

    /// Tabular artifact path; relative paths resolve under `data_dir`
    pub fn tabular_model_path(&self) -> PathBuf {
        self.data_dir.join(&self.tabular.model_path)
    }

    /// ONNX scan model path; relative paths resolve under `data_dir`
    pub fn scan_model_path(&self) -> PathBuf {
        self.data_dir.join(&self.scan.model_path)
    }
}
