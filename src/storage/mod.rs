//! Encrypted local storage for prediction records.

mod encrypted;

pub use encrypted::{retention_cutoff, ModelComparison, PredictionFilter, PredictionStore, RiskDistribution};
