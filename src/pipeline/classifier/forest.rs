//! Random forest of gini CART trees over sparse rows.
//!
//! Each tree is grown on a bootstrap sample (expressed as per-row sample counts),
//! with balanced class weights computed on the full training labels. At every node
//! `floor(sqrt(d))` candidate features are drawn without replacement from the
//! features that are non-zero in at least one node sample; constant candidates
//! are skipped and do not count towards the budget. Thresholds are midpoints
//! between consecutive distinct values, and rows go left when `x <= threshold`.
//!
//! Trees are fitted in parallel with `rayon`; tree `t` uses seed `seed + t`.

use std::collections::BTreeSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{class_weights, ProbabilisticClassifier};
use crate::error::Result;
use crate::pipeline::config::ForestConfig;
use crate::pipeline::data::Label;
use crate::pipeline::sparse::SparseVector;

/// Tree node, stored in a flat vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Node {
    Leaf {
        proba: [f64; 2],
    },
    Split {
        feature: u32,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// A single fitted decision tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    /// Leaf class distribution for `row`.
    pub fn predict_proba(&self, row: &SparseVector) -> [f64; 2] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { proba } => return *proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row.get(*feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], idx: usize) -> usize {
            match &nodes[idx] {
                Node::Leaf { .. } => 0,
                Node::Split { left, right, .. } => 1 + walk(nodes, *left).max(walk(nodes, *right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }
}

/// Fitted random forest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit `config.n_trees` trees in parallel.
    pub fn fit(
        rows: &[SparseVector],
        labels: &[Label],
        n_features: usize,
        config: &ForestConfig,
        seed: u64,
    ) -> Result<Self> {
        let class_w = class_weights(labels, config.balanced_class_weight)?;
        let max_features = ((n_features as f64).sqrt().floor() as usize).max(1);

        log::info!(
            "Fitting random forest: {} trees, {} candidate features per split",
            config.n_trees,
            max_features
        );

        let trees = (0..config.n_trees)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(t as u64));
                let builder = TreeBuilder {
                    rows,
                    labels,
                    max_features,
                    max_depth: config.max_depth,
                    min_samples_split: config.min_samples_split,
                };
                builder.build(&bootstrap_weights(labels, &class_w, &mut rng), &mut rng)
            })
            .collect();

        Ok(RandomForest { trees })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}

impl ProbabilisticClassifier for RandomForest {
    /// Mean of the per-tree leaf distributions.
    fn predict_proba(&self, row: &SparseVector) -> [f64; 2] {
        if self.trees.is_empty() {
            return [0.5, 0.5];
        }
        let mut sum = [0.0; 2];
        for tree in &self.trees {
            let p = tree.predict_proba(row);
            sum[0] += p[0];
            sum[1] += p[1];
        }
        let n = self.trees.len() as f64;
        [sum[0] / n, sum[1] / n]
    }
}

/// Bootstrap `n` draws with replacement; each row's weight is `count * class_weight`.
fn bootstrap_weights(labels: &[Label], class_w: &[f64; 2], rng: &mut StdRng) -> Vec<f64> {
    let n = labels.len();
    let mut counts = vec![0u32; n];
    for _ in 0..n {
        counts[rng.gen_range(0..n)] += 1;
    }
    counts
        .iter()
        .zip(labels)
        .map(|(&c, l)| c as f64 * class_w[l.index()])
        .collect()
}

struct TreeBuilder<'a> {
    rows: &'a [SparseVector],
    labels: &'a [Label],
    max_features: usize,
    max_depth: usize,
    min_samples_split: usize,
}

struct BestSplit {
    feature: u32,
    threshold: f64,
    impurity: f64,
}

impl<'a> TreeBuilder<'a> {
    fn build(&self, weights: &[f64], rng: &mut StdRng) -> DecisionTree {
        let samples: Vec<usize> = (0..self.rows.len()).filter(|&i| weights[i] > 0.0).collect();
        let mut nodes = Vec::new();
        self.grow(&mut nodes, samples, weights, 0, rng);
        DecisionTree { nodes }
    }

    /// Append the subtree for `samples` and return its root index.
    fn grow(
        &self,
        nodes: &mut Vec<Node>,
        samples: Vec<usize>,
        weights: &[f64],
        depth: usize,
        rng: &mut StdRng,
    ) -> usize {
        let totals = self.class_totals(&samples, weights);
        let idx = nodes.len();
        nodes.push(Node::Leaf {
            proba: distribution(totals),
        });

        let pure = totals[0] <= 0.0 || totals[1] <= 0.0;
        if pure || depth >= self.max_depth || samples.len() < self.min_samples_split {
            return idx;
        }

        let Some(split) = self.best_split(&samples, weights, totals, rng) else {
            return idx;
        };

        let (left, right): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&i| self.rows[i].get(split.feature) <= split.threshold);
        log::trace!(
            "depth {} split on {} at {:.4} (impurity {:.4})",
            depth,
            split.feature,
            split.threshold,
            split.impurity
        );

        let left_idx = self.grow(nodes, left, weights, depth + 1, rng);
        let right_idx = self.grow(nodes, right, weights, depth + 1, rng);
        nodes[idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left: left_idx,
            right: right_idx,
        };
        idx
    }

    fn class_totals(&self, samples: &[usize], weights: &[f64]) -> [f64; 2] {
        let mut totals = [0.0; 2];
        for &i in samples {
            totals[self.labels[i].index()] += weights[i];
        }
        totals
    }

    fn best_split(
        &self,
        samples: &[usize],
        weights: &[f64],
        totals: [f64; 2],
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        // Features absent from every node sample are constant zero
        let mut candidates: Vec<u32> = samples
            .iter()
            .flat_map(|&i| self.rows[i].indices().iter().copied())
            .collect::<BTreeSet<u32>>()
            .into_iter()
            .collect();

        let mut best: Option<BestSplit> = None;
        let mut informative = 0;
        let mut drawn = 0;
        let mut values: Vec<(f64, usize)> = Vec::with_capacity(samples.len());

        while informative < self.max_features && drawn < candidates.len() {
            let pick = rng.gen_range(drawn..candidates.len());
            candidates.swap(drawn, pick);
            let feature = candidates[drawn];
            drawn += 1;

            values.clear();
            values.extend(samples.iter().map(|&i| (self.rows[i].get(feature), i)));
            values.sort_by(|a, b| a.0.total_cmp(&b.0));
            if values[0].0 == values[values.len() - 1].0 {
                continue;
            }
            informative += 1;

            let mut left = [0.0; 2];
            for pos in 1..values.len() {
                let (prev, prev_idx) = values[pos - 1];
                left[self.labels[prev_idx].index()] += weights[prev_idx];
                let current = values[pos].0;
                if current <= prev {
                    continue;
                }
                let right = [totals[0] - left[0], totals[1] - left[1]];
                let impurity = weighted_gini(left) + weighted_gini(right);
                if best.as_ref().map_or(true, |b| impurity < b.impurity) {
                    let mut threshold = prev + (current - prev) / 2.0;
                    if threshold >= current {
                        threshold = prev;
                    }
                    best = Some(BestSplit {
                        feature,
                        threshold,
                        impurity,
                    });
                }
            }
        }

        best
    }
}

/// Gini impurity scaled by the node weight: `w * (1 - sum p_c^2)`.
fn weighted_gini(counts: [f64; 2]) -> f64 {
    let total = counts[0] + counts[1];
    if total <= 0.0 {
        return 0.0;
    }
    let p0 = counts[0] / total;
    let p1 = counts[1] / total;
    total * (1.0 - p0 * p0 - p1 * p1)
}

fn distribution(totals: [f64; 2]) -> [f64; 2] {
    let sum = totals[0] + totals[1];
    if sum <= 0.0 {
        [0.5, 0.5]
    } else {
        [totals[0] / sum, totals[1] / sum]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(n_trees: usize) -> ForestConfig {
        ForestConfig {
            n_trees,
            ..ForestConfig::default()
        }
    }

    fn toy_data() -> (Vec<SparseVector>, Vec<Label>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let x = i as f64 / 10.0;
            let label = if x > 2.0 { Label::Phishing } else { Label::Safe };
            rows.push(SparseVector::from_dense(&[x, 1.0, (i % 3) as f64]));
            labels.push(label);
        }
        (rows, labels)
    }

    #[test]
    fn test_weighted_gini() {
        assert_eq!(weighted_gini([4.0, 0.0]), 0.0);
        assert!((weighted_gini([2.0, 2.0]) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_forest_learns_threshold() {
        let (rows, labels) = toy_data();
        let forest = RandomForest::fit(&rows, &labels, 3, &config(25), 42).unwrap();
        assert_eq!(forest.n_trees(), 25);

        let low = SparseVector::from_dense(&[0.5, 1.0, 0.0]);
        let high = SparseVector::from_dense(&[3.5, 1.0, 0.0]);
        assert_eq!(forest.predict(&low).0, Label::Safe);
        assert_eq!(forest.predict(&high).0, Label::Phishing);

        let p = forest.predict_proba(&high);
        assert!((p[0] + p[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_respects_max_depth() {
        let (rows, labels) = toy_data();
        let shallow = ForestConfig {
            n_trees: 5,
            max_depth: 1,
            ..ForestConfig::default()
        };
        let forest = RandomForest::fit(&rows, &labels, 3, &shallow, 7).unwrap();
        assert!(forest.trees().iter().all(|t| t.depth() <= 1));
    }

    #[test]
    fn test_seeded_fit_is_reproducible() {
        let (rows, labels) = toy_data();
        let a = RandomForest::fit(&rows, &labels, 3, &config(10), 3).unwrap();
        let b = RandomForest::fit(&rows, &labels, 3, &config(10), 3).unwrap();
        let probe = SparseVector::from_dense(&[2.05, 1.0, 2.0]);
        assert_eq!(a.predict_proba(&probe), b.predict_proba(&probe));
    }
}
