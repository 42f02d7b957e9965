//! Per-feature contribution breakdown: range-normalized value times global importance, as percentages.

use crate::features::{normalize_feature, Feature, FeatureVector, FEATURE_COUNT};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Feature → share of the explanation in percent, largest first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureContribution {
    entries: Vec<(Feature, f64)>,
}

impl FeatureContribution {
    fn from_unsorted(mut entries: Vec<(Feature, f64)>) -> Self {
        entries.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        Self { entries }
    }

    pub fn entries(&self) -> &[(Feature, f64)] {
        &self.entries
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.entries.iter().find(|(f, _)| *f == feature).map(|(_, p)| *p)
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    /// Feature with the largest share, if any share is nonzero.
    pub fn top(&self) -> Option<Feature> {
        self.entries.first().filter(|(_, p)| *p > 0.0).map(|(f, _)| *f)
    }
}

impl Serialize for FeatureContribution {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (feature, pct) in &self.entries {
            map.serialize_entry(feature, pct)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FeatureContribution {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = HashMap::<Feature, f64>::deserialize(deserializer)?;
        Ok(Self::from_unsorted(raw.into_iter().collect()))
    }
}

/// Weight each feature's range position (negatives clamped to zero) by its importance,
/// then rescale so the contributions sum to 100. All-zero input stays all zero.
pub fn explain(features: &FeatureVector, importances: &[f64; FEATURE_COUNT]) -> FeatureContribution {
    let raw: Vec<(Feature, f64)> = Feature::ALL
        .iter()
        .map(|&f| {
            let normalized = normalize_feature(f, features.value(f)).max(0.0);
            (f, importances[f.index()] * normalized)
        })
        .collect();

    let total: f64 = raw.iter().map(|(_, c)| c).sum();
    let entries = if total > 0.0 {
        raw.into_iter().map(|(f, c)| (f, c / total * 100.0)).collect()
    } else {
        raw.into_iter().map(|(f, _)| (f, 0.0)).collect()
    };
    FeatureContribution::from_unsorted(entries)
}
