//! Clinical feature vector: validated at the form boundary, fixed column order for the models.

mod ranges;
mod scaler;

pub use ranges::ClinicalRange;
pub(crate) use ranges::normalize as normalize_feature;
pub use scaler::StandardScaler;

use crate::error::{PredictError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const FEATURE_COUNT: usize = 9;

/// Feature names in model column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Age,
    HeartRate,
    BpSystolic,
    BpDiastolic,
    BloodSugar,
    Cholesterol,
    Bmi,
    IsSmoker,
    IsAlcoholic,
}

impl Feature {
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Age,
        Feature::HeartRate,
        Feature::BpSystolic,
        Feature::BpDiastolic,
        Feature::BloodSugar,
        Feature::Cholesterol,
        Feature::Bmi,
        Feature::IsSmoker,
        Feature::IsAlcoholic,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Age => "age",
            Feature::HeartRate => "heart_rate",
            Feature::BpSystolic => "bp_systolic",
            Feature::BpDiastolic => "bp_diastolic",
            Feature::BloodSugar => "blood_sugar",
            Feature::Cholesterol => "cholesterol",
            Feature::Bmi => "bmi",
            Feature::IsSmoker => "is_smoker",
            Feature::IsAlcoholic => "is_alcoholic",
        }
    }

    /// Column index in [`FeatureVector::to_array`]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Nine clinical measurements for one patient visit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub age: u32,
    pub heart_rate: u32,
    pub bp_systolic: u32,
    pub bp_diastolic: u32,
    pub blood_sugar: f64,
    pub cholesterol: f64,
    pub bmi: f64,
    #[serde(default)]
    pub is_smoker: bool,
    #[serde(default)]
    pub is_alcoholic: bool,
}

impl FeatureVector {
    /// Build from raw form values (string-typed, as submitted by the clinician UI).
    ///
    /// The seven numeric fields are required; the two flags default to false.
    pub fn from_form(form: &BTreeMap<String, String>) -> Result<Self> {
        let fv = Self {
            age: required_int(form, Feature::Age)?,
            heart_rate: required_int(form, Feature::HeartRate)?,
            bp_systolic: required_int(form, Feature::BpSystolic)?,
            bp_diastolic: required_int(form, Feature::BpDiastolic)?,
            blood_sugar: required_float(form, Feature::BloodSugar)?,
            cholesterol: required_float(form, Feature::Cholesterol)?,
            bmi: required_float(form, Feature::Bmi)?,
            is_smoker: optional_flag(form, Feature::IsSmoker)?,
            is_alcoholic: optional_flag(form, Feature::IsAlcoholic)?,
        };
        Ok(fv)
    }

    /// Raw values in model column order; flags encode as 0/1.
    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.age as f64,
            self.heart_rate as f64,
            self.bp_systolic as f64,
            self.bp_diastolic as f64,
            self.blood_sugar,
            self.cholesterol,
            self.bmi,
            if self.is_smoker { 1.0 } else { 0.0 },
            if self.is_alcoholic { 1.0 } else { 0.0 },
        ]
    }

    pub fn value(&self, feature: Feature) -> f64 {
        self.to_array()[feature.index()]
    }
}

fn field<'a>(form: &'a BTreeMap<String, String>, feature: Feature) -> Option<&'a str> {
    form.get(feature.name())
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

fn required_int(form: &BTreeMap<String, String>, feature: Feature) -> Result<u32> {
    let raw = field(form, feature).ok_or_else(|| PredictError::invalid(feature.name(), "missing"))?;
    raw.parse::<u32>()
        .map_err(|_| PredictError::invalid(feature.name(), format!("expected a whole number, got {:?}", raw)))
}

fn required_float(form: &BTreeMap<String, String>, feature: Feature) -> Result<f64> {
    let raw = field(form, feature).ok_or_else(|| PredictError::invalid(feature.name(), "missing"))?;
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(PredictError::invalid(feature.name(), format!("expected a number, got {:?}", raw))),
    }
}

fn optional_flag(form: &BTreeMap<String, String>, feature: Feature) -> Result<bool> {
    let Some(raw) = field(form, feature) else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(PredictError::invalid(feature.name(), format!("expected true or false, got {:?}", raw))),
    }
}
