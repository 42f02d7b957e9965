//! Random forest of CART trees (Gini impurity), bootstrap sampling, sqrt(features) per split.
//!
//! Class probabilities are the mean of leaf class distributions; feature importance is
//! mean decrease in impurity, normalized per tree and averaged.

use crate::config::ForestConfig;
use crate::features::FEATURE_COUNT;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub type Row = [f64; FEATURE_COUNT];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Leaf {
        distribution: Vec<f64>,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn leaf_distribution(&self, row: &Row) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { distribution } => return distribution,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_classes: usize,
    importances: Vec<f64>,
}

impl RandomForest {
    /// Fit on `rows` with class labels in `0..n_classes`.
    pub fn fit(rows: &[Row], labels: &[usize], n_classes: usize, config: &ForestConfig) -> Self {
        let mut master = StdRng::seed_from_u64(config.seed);
        let max_features = ((FEATURE_COUNT as f64).sqrt().floor() as usize).max(1);
        let n = rows.len();

        let mut trees = Vec::with_capacity(config.n_trees);
        let mut importances = vec![0.0; FEATURE_COUNT];

        for _ in 0..config.n_trees.max(1) {
            let mut rng = StdRng::seed_from_u64(master.gen());
            let mut samples: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();

            let mut builder = TreeBuilder {
                rows,
                labels,
                n_classes,
                config,
                max_features,
                nodes: Vec::new(),
                importances: [0.0; FEATURE_COUNT],
            };
            builder.grow(&mut samples, 0, &mut rng);

            let tree_total: f64 = builder.importances.iter().sum();
            if tree_total > 0.0 {
                for (acc, imp) in importances.iter_mut().zip(builder.importances) {
                    *acc += imp / tree_total;
                }
            }
            trees.push(DecisionTree {
                nodes: builder.nodes,
            });
        }

        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for imp in importances.iter_mut() {
                *imp /= total;
            }
        }

        Self {
            trees,
            n_classes,
            importances,
        }
    }

    /// Mean of the leaf class distributions across trees.
    pub fn predict_proba(&self, row: &Row) -> Vec<f64> {
        let mut out = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (acc, p) in out.iter_mut().zip(tree.leaf_distribution(row)) {
                *acc += p;
            }
        }
        let n = self.trees.len().max(1) as f64;
        for p in out.iter_mut() {
            *p /= n;
        }
        out
    }

    /// Winning class (first index on ties) and its probabilities.
    pub fn predict(&self, row: &Row) -> (usize, Vec<f64>) {
        let proba = self.predict_proba(row);
        (argmax(&proba), proba)
    }

    /// Normalized mean decrease in impurity per feature column.
    pub fn feature_importances(&self) -> &[f64] {
        &self.importances
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn gini(counts: &[f64], n: f64) -> f64 {
    if n <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / n) * (c / n)).sum::<f64>()
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

struct TreeBuilder<'a> {
    rows: &'a [Row],
    labels: &'a [usize],
    n_classes: usize,
    config: &'a ForestConfig,
    max_features: usize,
    nodes: Vec<Node>,
    importances: [f64; FEATURE_COUNT],
}

impl<'a> TreeBuilder<'a> {
    fn counts(&self, samples: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &i in samples {
            counts[self.labels[i]] += 1.0;
        }
        counts
    }

    fn push_leaf(&mut self, counts: &[f64], n: f64) -> usize {
        let distribution = if n > 0.0 {
            counts.iter().map(|c| c / n).collect()
        } else {
            vec![1.0 / self.n_classes as f64; self.n_classes]
        };
        self.nodes.push(Node::Leaf { distribution });
        self.nodes.len() - 1
    }

    fn grow(&mut self, samples: &mut [usize], depth: usize, rng: &mut StdRng) -> usize {
        let n = samples.len();
        let counts = self.counts(samples);
        let impurity = gini(&counts, n as f64);

        let depth_reached = self.config.max_depth.is_some_and(|d| depth >= d);
        if impurity <= 0.0
            || depth_reached
            || n < self.config.min_samples_split.max(2)
            || n < 2 * self.config.min_samples_leaf.max(1)
        {
            return self.push_leaf(&counts, n as f64);
        }

        let Some(split) = self.best_split(samples, impurity, rng) else {
            return self.push_leaf(&counts, n as f64);
        };

        let mut mid = 0;
        for j in 0..n {
            if self.rows[samples[j]][split.feature] <= split.threshold {
                samples.swap(mid, j);
                mid += 1;
            }
        }
        self.importances[split.feature] += n as f64 * split.decrease;

        let idx = self.nodes.len();
        // Placeholder until both children exist.
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });
        let (left_samples, right_samples) = samples.split_at_mut(mid);
        let left = self.grow(left_samples, depth + 1, rng);
        let right = self.grow(right_samples, depth + 1, rng);
        self.nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn best_split(&self, samples: &[usize], impurity: f64, rng: &mut StdRng) -> Option<BestSplit> {
        let n = samples.len();
        let min_leaf = self.config.min_samples_leaf.max(1);
        let total = self.counts(samples);
        let mut features: Vec<usize> = (0..FEATURE_COUNT).collect();
        features.shuffle(rng);

        let mut best: Option<BestSplit> = None;
        let mut order: Vec<usize> = samples.to_vec();
        let mut visited = 0;
        for feature in features {
            if visited == self.max_features {
                break;
            }
            // Constant columns don't count towards max_features.
            let first = self.rows[samples[0]][feature];
            if samples.iter().all(|&i| self.rows[i][feature] == first) {
                continue;
            }
            visited += 1;

            order.sort_by(|&a, &b| self.rows[a][feature].total_cmp(&self.rows[b][feature]));

            let mut left = vec![0.0; self.n_classes];
            for pos in 0..n - 1 {
                left[self.labels[order[pos]]] += 1.0;
                let here = self.rows[order[pos]][feature];
                let next = self.rows[order[pos + 1]][feature];
                if here == next {
                    continue;
                }
                let n_left = pos + 1;
                let n_right = n - n_left;
                if n_left < min_leaf || n_right < min_leaf {
                    continue;
                }
                let right: Vec<f64> = total.iter().zip(&left).map(|(t, l)| t - l).collect();
                let weighted = (n_left as f64 * gini(&left, n_left as f64)
                    + n_right as f64 * gini(&right, n_right as f64))
                    / n as f64;
                let decrease = impurity - weighted;
                if decrease > 1e-12 && best.as_ref().map_or(true, |b| decrease > b.decrease) {
                    best = Some(BestSplit {
                        feature,
                        threshold: (here + next) / 2.0,
                        decrease,
                    });
                }
            }
        }
        best
    }
}
