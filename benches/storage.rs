//! Prediction store benchmark: insert and read encrypted records.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stroke_risk::features::FEATURE_COUNT;
use stroke_risk::risk::explain;
use stroke_risk::{FeatureVector, PatientIdentity, PredictionRecord, PredictionStore, RiskLevel, Stage};
use tempfile::tempdir;
use uuid::Uuid;

fn make_record() -> PredictionRecord {
    let features = FeatureVector {
        age: 58,
        heart_rate: 80,
        bp_systolic: 142,
        bp_diastolic: 91,
        blood_sugar: 118.0,
        cholesterol: 226.0,
        bmi: 29.4,
        is_smoker: false,
        is_alcoholic: true,
    };
    let contributions = explain(&features, &[1.0 / FEATURE_COUNT as f64; FEATURE_COUNT]);
    PredictionRecord {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        patient: PatientIdentity {
            name: "Bench Patient".to_string(),
            age: 58,
            gender: "female".to_string(),
            email: None,
            phone: Some("555-0100".to_string()),
        },
        features,
        risk: RiskLevel::Medium,
        stage: Some(Stage::Stage1),
        confidence: 0.71,
        tabular_risk: RiskLevel::Medium,
        tabular_confidence: 0.71,
        scan_risk: None,
        scan_confidence: None,
        scan_sha256: None,
        scan_error: None,
        recommendations: vec!["bench".to_string(); 5],
        contributions,
    }
}

fn bench_insert_record(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("predictions.db");
    let store = PredictionStore::open(&path, b"bench-secret").unwrap();
    let record = make_record();

    c.bench_function("storage_insert_record", |b| {
        b.iter(|| black_box(store.insert(black_box(&record))).unwrap())
    });
}

fn bench_get_record(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("predictions.db");
    let store = PredictionStore::open(&path, b"bench-secret").unwrap();
    let record = make_record();
    store.insert(&record).unwrap();
    let id = record.id.to_string();

    c.bench_function("storage_get_record", |b| {
        b.iter(|| black_box(store.get(&id)).unwrap())
    });
}

criterion_group!(benches, bench_insert_record, bench_get_record);
criterion_main!(benches);
