//! Rule-based clinical recommendations. Order of the list is part of the contract.

use super::{FusedResult, RiskLevel};
use crate::features::FeatureVector;

const SYSTOLIC_HIGH: u32 = 140;
const DIASTOLIC_HIGH: u32 = 90;
const SUGAR_HIGH: f64 = 126.0;
const CHOLESTEROL_HIGH: f64 = 240.0;
const BMI_OBESE: f64 = 30.0;

pub const URGENT_NOTICE: &str = "⚠️ URGENT: Immediate medical consultation required.";
pub const EMERGENCY_NOTICE: &str = "Consider emergency medical evaluation.";
pub const BLOOD_PRESSURE_NOTICE: &str =
    "🩺 High Blood Pressure detected. Monitor regularly and consult cardiologist.";
pub const SUGAR_NOTICE: &str = "🍬 Elevated blood sugar levels. Diabetes screening recommended.";
pub const CHOLESTEROL_NOTICE: &str =
    "💊 High cholesterol. Consider dietary changes and lipid-lowering medication.";
pub const BMI_NOTICE: &str = "⚖️ BMI indicates obesity. Weight management program recommended.";
pub const SMOKING_NOTICE: &str = "🚭 Smoking cessation is crucial. Join a quit-smoking program.";
pub const ALCOHOL_NOTICE: &str = "🍺 Reduce alcohol consumption. Seek support if needed.";
pub const MEDIUM_CADENCE_NOTICE: &str = "📊 Regular health checkups every 3-6 months advised.";
pub const LOW_CADENCE_NOTICE: &str = "✅ Maintain healthy lifestyle. Annual checkups recommended.";
pub const LIFESTYLE_NOTICES: [&str; 3] = [
    "🏃 Regular exercise: 30 minutes daily.",
    "🥗 Balanced diet: More fruits, vegetables, and whole grains.",
    "😴 Adequate sleep: 7-8 hours per night.",
];

/// Evaluate the rules against the measurements and the fused outcome.
pub fn recommend(features: &FeatureVector, outcome: &FusedResult) -> Vec<String> {
    let mut out: Vec<&str> = Vec::new();

    if outcome.risk == RiskLevel::High {
        out.push(URGENT_NOTICE);
        out.push(EMERGENCY_NOTICE);
    }
    if features.bp_systolic > SYSTOLIC_HIGH || features.bp_diastolic > DIASTOLIC_HIGH {
        out.push(BLOOD_PRESSURE_NOTICE);
    }
    if features.blood_sugar > SUGAR_HIGH {
        out.push(SUGAR_NOTICE);
    }
    if features.cholesterol > CHOLESTEROL_HIGH {
        out.push(CHOLESTEROL_NOTICE);
    }
    if features.bmi > BMI_OBESE {
        out.push(BMI_NOTICE);
    }
    if features.is_smoker {
        out.push(SMOKING_NOTICE);
    }
    if features.is_alcoholic {
        out.push(ALCOHOL_NOTICE);
    }
    match outcome.risk {
        RiskLevel::Medium => out.push(MEDIUM_CADENCE_NOTICE),
        RiskLevel::Low => out.push(LOW_CADENCE_NOTICE),
        RiskLevel::High => {}
    }
    out.extend(LIFESTYLE_NOTICES);

    out.into_iter().map(String::from).collect()
}
