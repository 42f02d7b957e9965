//! Tabular classifier over the nine clinical measurements: scaler + random forest.
//!
//! Trained in-process on the placeholder cohort from [`super::synthetic`]; the saved JSON
//! artifact carries the forest, scaler, importances and evaluation metrics.

use super::forest::{RandomForest, Row};
use super::synthetic;
use crate::config::{ForestConfig, TabularConfig};
use crate::error::{PredictError, Result};
use crate::features::{Feature, FeatureVector, StandardScaler, FEATURE_COUNT};
use crate::risk::{ClassifierResult, RiskLevel, Stage};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

const N_CLASSES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    pub n_train: usize,
    pub n_test: usize,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_std: Option<f64>,
    /// Support-weighted over the three classes, on the test split
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    /// Rows are true class, columns predicted class
    pub confusion_matrix: [[usize; N_CLASSES]; N_CLASSES],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TabularArtifact {
    forest: RandomForest,
    scaler: StandardScaler,
    feature_importances: [f64; FEATURE_COUNT],
    metrics: TrainingMetrics,
    params: ForestConfig,
    trained_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct TabularClassifier {
    artifact: TabularArtifact,
}

impl TabularClassifier {
    /// Generate the placeholder cohort, split, fit and evaluate.
    pub fn train(config: &TabularConfig) -> Result<Self> {
        if config.n_samples < 10 {
            return Err(PredictError::Artifact(format!(
                "need at least 10 training samples, got {}",
                config.n_samples
            )));
        }
        info!(n_samples = config.n_samples, "generating placeholder training data");
        let (features, labels) = synthetic::generate(config.n_samples, config.forest.seed);
        let raw: Vec<Row> = features.iter().map(FeatureVector::to_array).collect();

        let mut rng = StdRng::seed_from_u64(config.forest.seed);
        let (train_idx, test_idx) = stratified_split(&labels, config.test_fraction, &mut rng);

        let train_raw: Vec<Row> = train_idx.iter().map(|&i| raw[i]).collect();
        let train_y: Vec<usize> = train_idx.iter().map(|&i| labels[i]).collect();
        let test_raw: Vec<Row> = test_idx.iter().map(|&i| raw[i]).collect();
        let test_y: Vec<usize> = test_idx.iter().map(|&i| labels[i]).collect();

        let min_train = config.forest.min_samples_split.max(2);
        if train_raw.len() < min_train {
            return Err(PredictError::Artifact(format!(
                "split leaves {} training rows, need at least {} (test_fraction {})",
                train_raw.len(),
                min_train,
                config.test_fraction
            )));
        }

        let scaler = StandardScaler::fit(&train_raw);
        let train_x = scaler.transform_all(&train_raw);
        let test_x = scaler.transform_all(&test_raw);

        let (cv_mean, cv_std) = match cross_validate(&train_x, &train_y, config.cv_folds, &config.forest) {
            Some((mean, std)) => {
                info!(folds = config.cv_folds, cv_mean = mean, cv_std = std, "cross-validation");
                (Some(mean), Some(std))
            }
            None => (None, None),
        };

        info!(n_trees = config.forest.n_trees, n_train = train_x.len(), "training random forest");
        let forest = RandomForest::fit(&train_x, &train_y, N_CLASSES, &config.forest);

        let train_pred: Vec<usize> = train_x.iter().map(|r| forest.predict(r).0).collect();
        let test_pred: Vec<usize> = test_x.iter().map(|r| forest.predict(r).0).collect();
        let confusion = confusion_matrix(&test_y, &test_pred);
        let (precision, recall, f1_score) = weighted_scores(&confusion);

        let metrics = TrainingMetrics {
            n_train: train_x.len(),
            n_test: test_x.len(),
            train_accuracy: accuracy(&train_y, &train_pred),
            test_accuracy: accuracy(&test_y, &test_pred),
            cv_mean,
            cv_std,
            precision,
            recall,
            f1_score,
            confusion_matrix: confusion,
        };
        info!(
            train_accuracy = metrics.train_accuracy,
            test_accuracy = metrics.test_accuracy,
            precision,
            recall,
            f1_score,
            "tabular model trained"
        );

        let mut feature_importances = [0.0; FEATURE_COUNT];
        feature_importances.copy_from_slice(forest.feature_importances());

        Ok(Self {
            artifact: TabularArtifact {
                forest,
                scaler,
                feature_importances,
                metrics,
                params: config.forest.clone(),
                trained_at: Utc::now(),
            },
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let artifact: TabularArtifact = serde_json::from_str(&data)?;
        if artifact.forest.n_classes() != N_CLASSES {
            return Err(PredictError::Artifact(format!(
                "expected {} classes, artifact has {}",
                N_CLASSES,
                artifact.forest.n_classes()
            )));
        }
        info!(path = %path.display(), n_trees = artifact.forest.n_trees(), "tabular model loaded");
        Ok(Self { artifact })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, serde_json::to_vec(&self.artifact)?)?;
        info!(path = %path.display(), "tabular model saved");
        Ok(())
    }

    /// Risk, confidence (winning class probability), stage and all class probabilities.
    pub fn predict(&self, features: &FeatureVector) -> ClassifierResult {
        let scaled = self.artifact.scaler.transform(&features.to_array());
        let (class, proba) = self.artifact.forest.predict(&scaled);
        let confidence = proba[class];
        let (risk, stage) = class_outcome(class, confidence);
        ClassifierResult {
            risk,
            confidence,
            stage,
            class_probabilities: Some(proba),
        }
    }

    /// Global importance per feature column (sums to 1).
    pub fn feature_importances(&self) -> &[f64; FEATURE_COUNT] {
        &self.artifact.feature_importances
    }

    /// Importances keyed by feature, largest first.
    pub fn ranked_importances(&self) -> Vec<(Feature, f64)> {
        let mut out: Vec<(Feature, f64)> = Feature::ALL
            .iter()
            .map(|&f| (f, self.artifact.feature_importances[f.index()]))
            .collect();
        out.sort_by(|a, b| b.1.total_cmp(&a.1));
        out
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.artifact.metrics
    }

    pub fn params(&self) -> &ForestConfig {
        &self.artifact.params
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.artifact.trained_at
    }
}

/// Class 0 has no stage, class 1 is always Stage 1, class 2 escalates with its probability.
pub fn class_outcome(class: usize, probability: f64) -> (RiskLevel, Option<Stage>) {
    match class {
        0 => (RiskLevel::Low, None),
        1 => (RiskLevel::Medium, Some(Stage::Stage1)),
        _ => {
            let stage = if probability > 0.8 {
                Stage::Stage3
            } else if probability > 0.6 {
                Stage::Stage2
            } else {
                Stage::Stage1
            };
            (RiskLevel::High, Some(stage))
        }
    }
}

fn stratified_split(labels: &[usize], test_fraction: f64, rng: &mut StdRng) -> (Vec<usize>, Vec<usize>) {
    let fraction = test_fraction.clamp(0.0, 0.9);
    let mut train = Vec::new();
    let mut test = Vec::new();
    for class in 0..N_CLASSES {
        let mut members: Vec<usize> = (0..labels.len()).filter(|&i| labels[i] == class).collect();
        members.shuffle(rng);
        let n_test = (members.len() as f64 * fraction).round() as usize;
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }
    train.shuffle(rng);
    (train, test)
}

/// Mean and population std of fold accuracies; None when disabled or too little data.
fn cross_validate(x: &[Row], y: &[usize], folds: usize, config: &ForestConfig) -> Option<(f64, f64)> {
    if folds < 2 || x.len() < folds {
        return None;
    }
    let mut scores = Vec::with_capacity(folds);
    for fold in 0..folds {
        let mut train_x = Vec::new();
        let mut train_y = Vec::new();
        let mut hold_x = Vec::new();
        let mut hold_y = Vec::new();
        for (i, (row, label)) in x.iter().zip(y).enumerate() {
            if i % folds == fold {
                hold_x.push(*row);
                hold_y.push(*label);
            } else {
                train_x.push(*row);
                train_y.push(*label);
            }
        }
        let forest = RandomForest::fit(&train_x, &train_y, N_CLASSES, config);
        let pred: Vec<usize> = hold_x.iter().map(|r| forest.predict(r).0).collect();
        scores.push(accuracy(&hold_y, &pred));
    }
    let mean = scores.iter().sum::<f64>() / folds as f64;
    let var = scores.iter().map(|s| (s - mean) * (s - mean)).sum::<f64>() / folds as f64;
    Some((mean, var.sqrt()))
}

fn accuracy(truth: &[usize], pred: &[usize]) -> f64 {
    if truth.is_empty() {
        return 0.0;
    }
    let hits = truth.iter().zip(pred).filter(|(t, p)| t == p).count();
    hits as f64 / truth.len() as f64
}

fn confusion_matrix(truth: &[usize], pred: &[usize]) -> [[usize; N_CLASSES]; N_CLASSES] {
    let mut m = [[0; N_CLASSES]; N_CLASSES];
    for (&t, &p) in truth.iter().zip(pred) {
        m[t][p] += 1;
    }
    m
}

/// Support-weighted precision, recall and F1. Undefined per-class ratios count as 0.
fn weighted_scores(m: &[[usize; N_CLASSES]; N_CLASSES]) -> (f64, f64, f64) {
    let total: usize = m.iter().flatten().sum();
    if total == 0 {
        return (0.0, 0.0, 0.0);
    }
    let (mut precision, mut recall, mut f1) = (0.0, 0.0, 0.0);
    for c in 0..N_CLASSES {
        let tp = m[c][c] as f64;
        let support: usize = m[c].iter().sum();
        let predicted: usize = (0..N_CLASSES).map(|r| m[r][c]).sum();
        let p = if predicted > 0 { tp / predicted as f64 } else { 0.0 };
        let r = if support > 0 { tp / support as f64 } else { 0.0 };
        let f = if p + r > 0.0 { 2.0 * p * r / (p + r) } else { 0.0 };
        let w = support as f64 / total as f64;
        precision += w * p;
        recall += w * r;
        f1 += w * f;
    }
    (precision, recall, f1)
}
