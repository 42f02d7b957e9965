//! PLACEHOLDER training data. Not clinical data.
//!
//! Measurements are drawn uniformly from fixed ranges and labelled by a hand-written
//! weighted sum of risk-factor thresholds. A forest trained on this learns that rule and
//! nothing else; its predictions carry no clinical meaning.

use crate::features::FeatureVector;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Label score at or below this is Low (class 0).
const LOW_MAX_SCORE: f64 = 3.0;
/// Label score at or below this is Medium (class 1); above is High (class 2).
const MEDIUM_MAX_SCORE: f64 = 6.0;

/// Weighted count of threshold risk factors for one vector.
pub fn placeholder_score(fv: &FeatureVector) -> f64 {
    let mut score = 0.0;
    if fv.age > 60 {
        score += 2.0;
    }
    if fv.bp_systolic > 140 {
        score += 2.0;
    }
    if fv.blood_sugar > 126.0 {
        score += 1.5;
    }
    if fv.cholesterol > 240.0 {
        score += 1.5;
    }
    if fv.bmi > 30.0 {
        score += 1.0;
    }
    if fv.is_smoker {
        score += 1.5;
    }
    if fv.is_alcoholic {
        score += 1.0;
    }
    score
}

/// Class index 0/1/2 derived from [`placeholder_score`].
pub fn placeholder_label(fv: &FeatureVector) -> usize {
    let score = placeholder_score(fv);
    if score <= LOW_MAX_SCORE {
        0
    } else if score <= MEDIUM_MAX_SCORE {
        1
    } else {
        2
    }
}

/// Seeded synthetic cohort with placeholder labels.
pub fn generate(n_samples: usize, seed: u64) -> (Vec<FeatureVector>, Vec<usize>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let fv = FeatureVector {
            age: rng.gen_range(20..90),
            heart_rate: rng.gen_range(60..120),
            bp_systolic: rng.gen_range(90..180),
            bp_diastolic: rng.gen_range(60..120),
            blood_sugar: rng.gen_range(70..250) as f64,
            cholesterol: rng.gen_range(150..300) as f64,
            bmi: rng.gen_range(18.0..40.0),
            is_smoker: rng.gen_bool(0.5),
            is_alcoholic: rng.gen_bool(0.5),
        };
        labels.push(placeholder_label(&fv));
        features.push(fv);
    }
    (features, labels)
}
