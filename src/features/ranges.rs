//! Expected clinical ranges used to put raw measurements on a common scale.

use super::Feature;

/// Inclusive [min, max] a measurement is expected to fall in. Flags have no range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClinicalRange {
    pub min: f64,
    pub max: f64,
}

impl ClinicalRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn for_feature(feature: Feature) -> Option<Self> {
        match feature {
            Feature::Age => Some(Self::new(20.0, 90.0)),
            Feature::HeartRate => Some(Self::new(60.0, 120.0)),
            Feature::BpSystolic => Some(Self::new(90.0, 180.0)),
            Feature::BpDiastolic => Some(Self::new(60.0, 120.0)),
            Feature::BloodSugar => Some(Self::new(70.0, 250.0)),
            Feature::Cholesterol => Some(Self::new(150.0, 300.0)),
            Feature::Bmi => Some(Self::new(18.0, 40.0)),
            Feature::IsSmoker | Feature::IsAlcoholic => None,
        }
    }

    /// Position of `value` within the range (0 at min, 1 at max). Not clamped.
    pub fn position(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min)
    }
}

/// Normalized value of a feature: range position for measurements, the raw 0/1 for flags.
pub(crate) fn normalize(feature: Feature, value: f64) -> f64 {
    match ClinicalRange::for_feature(feature) {
        Some(range) => range.position(value),
        None => value,
    }
}
