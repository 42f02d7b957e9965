//! Stroke risk assessment: tabular and scan classifiers fused into one risk tier.
//!
//! Modular structure:
//! - [`features`] — Typed clinical feature vector, form validation, scaling
//! - [`model`] — Random forest (tabular), ONNX scan classifier, model registry
//! - [`risk`] — Risk vocabulary, fusion, contribution breakdown, recommendations
//! - [`assessment`] — One request end to end, producing the persisted record
//! - [`storage`] — Encrypted local prediction store
//! - [`logging`] — Structured JSON logging
//!
//! Both models are trained on placeholder data (synthetic measurements, random-noise
//! scans). Their output has no clinical validity.

pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod risk;
pub mod assessment;
pub mod storage;
pub mod logging;

pub use config::ServiceConfig;
pub use error::{PredictError, Result};
pub use features::{Feature, FeatureVector};
pub use model::{ModelRegistry, ScanClassifier, ScanModel, TabularClassifier};
pub use risk::{ClassifierResult, FeatureContribution, FusedResult, RiskLevel, Stage};
pub use assessment::{Assessment, AssessmentRequest, Assessor, PatientIdentity, PredictionRecord, ScanUpload};
pub use storage::PredictionStore;
pub use logging::StructuredLogger;
