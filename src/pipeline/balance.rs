//! SMOTE minority oversampling for the training partition.
//!
//! Synthetic rows are `x + gap * (neighbour - x)` for a uniformly chosen minority
//! row `x`, one of its k nearest minority neighbours (Euclidean distance in the
//! composed feature space) and `gap ~ U[0, 1)`. Rows are generated until both
//! classes have the same count. Original rows keep their order; synthetic rows
//! are appended after them.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::data::{class_counts, Label};
use super::sparse::SparseVector;
use crate::error::{DetectorError, Result};

/// Whether the pipeline is fitting or serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineMode {
    Training,
    Inference,
}

/// Training rows after balancing.
#[derive(Debug, Clone)]
pub struct BalancedSet {
    pub rows: Vec<SparseVector>,
    pub labels: Vec<Label>,
    /// Number of synthetic rows appended
    pub synthetic: usize,
}

impl BalancedSet {
    pub fn class_counts(&self) -> [usize; 2] {
        class_counts(self.labels.iter().copied())
    }
}

/// Seeded SMOTE oversampler.
#[derive(Debug, Clone)]
pub struct Balancer {
    k_neighbors: usize,
    seed: u64,
}

impl Balancer {
    pub fn new(k_neighbors: usize, seed: u64) -> Self {
        Balancer { k_neighbors, seed }
    }

    /// Oversample the minority class until both classes are equally represented.
    ///
    /// # Errors
    ///
    /// Returns [`DetectorError::InvalidMode`] for any mode other than
    /// [`PipelineMode::Training`].
    pub fn balance(
        &self,
        mode: PipelineMode,
        rows: Vec<SparseVector>,
        labels: Vec<Label>,
    ) -> Result<BalancedSet> {
        if mode != PipelineMode::Training {
            return Err(DetectorError::InvalidMode(format!(
                "balancing is training-only, got {:?}",
                mode
            )));
        }

        let counts = class_counts(labels.iter().copied());
        let (minority, n_minority, n_majority) = if counts[1] < counts[0] {
            (Label::Phishing, counts[1], counts[0])
        } else {
            (Label::Safe, counts[0], counts[1])
        };
        let unchanged = |rows: Vec<SparseVector>, labels: Vec<Label>| BalancedSet {
            rows,
            labels,
            synthetic: 0,
        };

        if n_minority == n_majority {
            return Ok(unchanged(rows, labels));
        }

        let mut k = self.k_neighbors;
        if n_minority <= k {
            k = n_minority.saturating_sub(1);
            log::warn!(
                "Only {} {} rows; reducing SMOTE neighbours to {}",
                n_minority,
                minority,
                k
            );
        }
        if k == 0 {
            log::warn!(
                "Too few {} rows to interpolate ({}); skipping balancing",
                minority,
                n_minority
            );
            return Ok(unchanged(rows, labels));
        }

        let minority_idx: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| **l == minority)
            .map(|(i, _)| i)
            .collect();
        let neighbours = nearest_neighbours(&rows, &minority_idx, k);

        let n_synthetic = n_majority - n_minority;
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut rows = rows;
        let mut labels = labels;
        rows.reserve(n_synthetic);
        labels.reserve(n_synthetic);

        for _ in 0..n_synthetic {
            let sample = rng.gen_range(0..minority_idx.len());
            let neighbour = neighbours[sample][rng.gen_range(0..k)];
            let gap: f64 = rng.gen();
            let synthetic = rows[minority_idx[sample]].interpolate(&rows[neighbour], gap);
            rows.push(synthetic);
            labels.push(minority);
        }

        log::info!(
            "SMOTE: added {} synthetic {} rows ({} -> {})",
            n_synthetic,
            minority,
            n_minority,
            n_majority
        );

        Ok(BalancedSet {
            rows,
            labels,
            synthetic: n_synthetic,
        })
    }
}

/// For each minority row, the row indices of its `k` nearest other minority rows.
///
/// Ties are broken by lower row index.
fn nearest_neighbours(rows: &[SparseVector], members: &[usize], k: usize) -> Vec<Vec<usize>> {
    let norms: Vec<f64> = members.iter().map(|&i| rows[i].norm_sq()).collect();

    members
        .par_iter()
        .enumerate()
        .map(|(a, &i)| {
            let mut distances: Vec<(f64, usize)> = members
                .iter()
                .enumerate()
                .filter(|(b, _)| *b != a)
                .map(|(b, &j)| (rows[i].sq_distance(norms[a], &rows[j], norms[b]), j))
                .collect();
            distances.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
            distances.truncate(k);
            distances.into_iter().map(|(_, j)| j).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n_safe: usize, n_phishing: usize) -> (Vec<SparseVector>, Vec<Label>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n_safe {
            rows.push(SparseVector::from_dense(&[i as f64, 0.0]));
            labels.push(Label::Safe);
        }
        for i in 0..n_phishing {
            rows.push(SparseVector::from_dense(&[0.0, 10.0 + i as f64]));
            labels.push(Label::Phishing);
        }
        (rows, labels)
    }

    #[test]
    fn test_balances_counts_and_keeps_originals() {
        let (rows, labels) = dataset(20, 8);
        let balanced = Balancer::new(5, 42)
            .balance(PipelineMode::Training, rows.clone(), labels.clone())
            .unwrap();

        assert_eq!(balanced.class_counts(), [20, 20]);
        assert_eq!(balanced.synthetic, 12);
        assert_eq!(&balanced.rows[..28], &rows[..]);
        assert_eq!(&balanced.labels[..28], &labels[..]);

        // synthetic rows lie on segments between minority rows
        for row in &balanced.rows[28..] {
            assert_eq!(row.get(0), 0.0);
            let y = row.get(1);
            assert!((10.0..=17.0).contains(&y));
        }
    }

    #[test]
    fn test_inference_mode_rejected() {
        let (rows, labels) = dataset(5, 2);
        let err = Balancer::new(5, 42)
            .balance(PipelineMode::Inference, rows, labels)
            .unwrap_err();
        assert!(matches!(err, DetectorError::InvalidMode(_)));
    }

    #[test]
    fn test_small_minority_reduces_k() {
        let (rows, labels) = dataset(10, 3);
        let balanced = Balancer::new(5, 1)
            .balance(PipelineMode::Training, rows, labels)
            .unwrap();
        assert_eq!(balanced.class_counts(), [10, 10]);
    }

    #[test]
    fn test_single_minority_row_skips() {
        let (rows, labels) = dataset(10, 1);
        let balanced = Balancer::new(5, 1)
            .balance(PipelineMode::Training, rows, labels)
            .unwrap();
        assert_eq!(balanced.class_counts(), [10, 1]);
        assert_eq!(balanced.synthetic, 0);
    }

    #[test]
    fn test_already_balanced_and_deterministic() {
        let (rows, labels) = dataset(4, 4);
        let balanced = Balancer::new(5, 1)
            .balance(PipelineMode::Training, rows.clone(), labels)
            .unwrap();
        assert_eq!(balanced.rows, rows);

        let (rows, labels) = dataset(12, 6);
        let a = Balancer::new(3, 9)
            .balance(PipelineMode::Training, rows.clone(), labels.clone())
            .unwrap();
        let b = Balancer::new(3, 9)
            .balance(PipelineMode::Training, rows, labels)
            .unwrap();
        assert_eq!(a.rows, b.rows);
    }
}
