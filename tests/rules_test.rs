//! Form validation, contribution breakdown and recommendation rules (no trained model needed).

use std::collections::BTreeMap;
use stroke_risk::features::{ClinicalRange, Feature, FeatureVector, FEATURE_COUNT};
use stroke_risk::risk::recommend::{
    ALCOHOL_NOTICE, BLOOD_PRESSURE_NOTICE, BMI_NOTICE, CHOLESTEROL_NOTICE, EMERGENCY_NOTICE,
    LIFESTYLE_NOTICES, LOW_CADENCE_NOTICE, MEDIUM_CADENCE_NOTICE, SMOKING_NOTICE, SUGAR_NOTICE,
    URGENT_NOTICE,
};
use stroke_risk::risk::{explain, recommend, FusedResult, RiskLevel, Stage};
use stroke_risk::PredictError;

const UNIFORM: [f64; FEATURE_COUNT] = [1.0 / 9.0; FEATURE_COUNT];

fn form(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn complete_form() -> BTreeMap<String, String> {
    form(&[
        ("age", "67"),
        ("heart_rate", "88"),
        ("bp_systolic", "150"),
        ("bp_diastolic", "95"),
        ("blood_sugar", "100"),
        ("cholesterol", "200"),
        ("bmi", "28.4"),
    ])
}

fn features(systolic: u32, diastolic: u32, sugar: f64, cholesterol: f64, bmi: f64) -> FeatureVector {
    FeatureVector {
        age: 50,
        heart_rate: 72,
        bp_systolic: systolic,
        bp_diastolic: diastolic,
        blood_sugar: sugar,
        cholesterol,
        bmi,
        is_smoker: false,
        is_alcoholic: false,
    }
}

fn outcome(risk: RiskLevel, stage: Option<Stage>) -> FusedResult {
    FusedResult {
        risk,
        confidence: 0.7,
        stage,
    }
}

#[test]
fn form_flags_default_to_false() {
    let fv = FeatureVector::from_form(&complete_form()).unwrap();
    assert_eq!(fv.age, 67);
    assert_eq!(fv.bp_systolic, 150);
    assert!((fv.bmi - 28.4).abs() < 1e-12);
    assert!(!fv.is_smoker);
    assert!(!fv.is_alcoholic);
}

#[test]
fn form_flags_parse_case_insensitively() {
    let mut f = complete_form();
    f.insert("is_smoker".into(), "TRUE".into());
    f.insert("is_alcoholic".into(), "false".into());
    let fv = FeatureVector::from_form(&f).unwrap();
    assert!(fv.is_smoker);
    assert!(!fv.is_alcoholic);
}

#[test]
fn form_missing_field_is_rejected() {
    let mut f = complete_form();
    f.remove("cholesterol");
    match FeatureVector::from_form(&f) {
        Err(PredictError::InvalidFeature { field, .. }) => assert_eq!(field, "cholesterol"),
        other => panic!("expected InvalidFeature, got {:?}", other),
    }
}

#[test]
fn form_mistyped_fields_are_rejected() {
    for (key, bad) in [("age", "sixty"), ("heart_rate", "-4"), ("bmi", "NaN"), ("is_smoker", "maybe")] {
        let mut f = complete_form();
        f.insert(key.into(), bad.into());
        match FeatureVector::from_form(&f) {
            Err(PredictError::InvalidFeature { field, .. }) => assert_eq!(field, key),
            other => panic!("{key}={bad}: expected InvalidFeature, got {:?}", other),
        }
    }
}

#[test]
fn feature_columns_follow_model_order() {
    let fv = FeatureVector::from_form(&complete_form()).unwrap();
    let arr = fv.to_array();
    for f in Feature::ALL {
        assert_eq!(arr[f.index()], fv.value(f));
    }
    assert_eq!(arr[Feature::BpDiastolic.index()], 95.0);
    assert_eq!(Feature::IsAlcoholic.index(), FEATURE_COUNT - 1);
}

#[test]
fn clinical_range_positions() {
    let age = ClinicalRange::for_feature(Feature::Age).unwrap();
    assert_eq!(age.position(20.0), 0.0);
    assert_eq!(age.position(90.0), 1.0);
    assert!(ClinicalRange::for_feature(Feature::IsSmoker).is_none());
}

#[test]
fn contributions_sum_to_one_hundred() {
    let fv = FeatureVector::from_form(&complete_form()).unwrap();
    let c = explain(&fv, &UNIFORM);
    assert_eq!(c.entries().len(), FEATURE_COUNT);
    assert!((c.total() - 100.0).abs() < 1e-9);
    let shares: Vec<f64> = c.entries().iter().map(|(_, p)| *p).collect();
    assert!(shares.windows(2).all(|w| w[0] >= w[1]), "not sorted: {:?}", shares);
}

#[test]
fn contributions_split_between_active_features() {
    let fv = FeatureVector {
        age: 90,
        heart_rate: 60,
        bp_systolic: 90,
        bp_diastolic: 60,
        blood_sugar: 70.0,
        cholesterol: 150.0,
        bmi: 18.0,
        is_smoker: true,
        is_alcoholic: false,
    };
    let c = explain(&fv, &UNIFORM);
    assert!((c.get(Feature::Age).unwrap() - 50.0).abs() < 1e-9);
    assert!((c.get(Feature::IsSmoker).unwrap() - 50.0).abs() < 1e-9);
    assert_eq!(c.get(Feature::Cholesterol), Some(0.0));
}

#[test]
fn below_range_values_contribute_nothing() {
    let fv = FeatureVector {
        age: 10,
        heart_rate: 50,
        bp_systolic: 80,
        bp_diastolic: 50,
        blood_sugar: 60.0,
        cholesterol: 120.0,
        bmi: 16.0,
        is_smoker: false,
        is_alcoholic: false,
    };
    let c = explain(&fv, &UNIFORM);
    assert_eq!(c.total(), 0.0);
    assert!(c.entries().iter().all(|(_, p)| *p == 0.0));
    assert_eq!(c.top(), None);
}

#[test]
fn contributions_follow_importance() {
    let fv = FeatureVector::from_form(&complete_form()).unwrap();
    let mut only_bmi = [0.0; FEATURE_COUNT];
    only_bmi[Feature::Bmi.index()] = 1.0;
    let c = explain(&fv, &only_bmi);
    assert_eq!(c.top(), Some(Feature::Bmi));
    assert!((c.get(Feature::Bmi).unwrap() - 100.0).abs() < 1e-9);
}

#[test]
fn contribution_serializes_as_ordered_map() {
    let fv = FeatureVector::from_form(&complete_form()).unwrap();
    let c = explain(&fv, &UNIFORM);
    let json = serde_json::to_value(&c).unwrap();
    let obj = json.as_object().unwrap();
    assert_eq!(obj.len(), FEATURE_COUNT);
    assert!(obj.contains_key("bp_systolic"));
}

#[test]
fn medium_risk_with_high_pressure() {
    let fv = features(150, 95, 100.0, 200.0, 28.0);
    let recs = recommend(&fv, &outcome(RiskLevel::Medium, Some(Stage::Stage1)));
    let mut expected = vec![BLOOD_PRESSURE_NOTICE, MEDIUM_CADENCE_NOTICE];
    expected.extend(LIFESTYLE_NOTICES);
    assert_eq!(recs, expected);
}

#[test]
fn high_risk_lists_every_triggered_rule_in_order() {
    let mut fv = features(130, 95, 180.0, 260.0, 33.0);
    fv.is_smoker = true;
    fv.is_alcoholic = true;
    let recs = recommend(&fv, &outcome(RiskLevel::High, Some(Stage::Stage3)));
    let mut expected = vec![
        URGENT_NOTICE,
        EMERGENCY_NOTICE,
        BLOOD_PRESSURE_NOTICE,
        SUGAR_NOTICE,
        CHOLESTEROL_NOTICE,
        BMI_NOTICE,
        SMOKING_NOTICE,
        ALCOHOL_NOTICE,
    ];
    expected.extend(LIFESTYLE_NOTICES);
    assert_eq!(recs, expected);
}

#[test]
fn low_risk_gets_annual_checkup_only() {
    let fv = features(120, 80, 90.0, 180.0, 22.0);
    let recs = recommend(&fv, &outcome(RiskLevel::Low, None));
    let mut expected = vec![LOW_CADENCE_NOTICE];
    expected.extend(LIFESTYLE_NOTICES);
    assert_eq!(recs, expected);
}

#[test]
fn thresholds_are_strict() {
    let fv = features(140, 90, 126.0, 240.0, 30.0);
    let recs = recommend(&fv, &outcome(RiskLevel::Low, None));
    assert_eq!(recs.len(), 1 + LIFESTYLE_NOTICES.len());
}

#[test]
fn stage_and_risk_parse_loosely() {
    assert_eq!(Stage::parse("Stage 2"), Some(Stage::Stage2));
    assert_eq!(Stage::parse("stage3"), Some(Stage::Stage3));
    assert_eq!(Stage::parse(" 1 "), Some(Stage::Stage1));
    assert_eq!(Stage::parse("Stage 4"), None);
    assert_eq!(RiskLevel::parse("high"), Some(RiskLevel::High));
    assert_eq!(RiskLevel::parse("severe"), None);
}
