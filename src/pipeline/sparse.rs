//! Sparse feature rows.
//!
//! Composed rows are ~100k columns wide with only a few hundred non-zeros, so
//! every stage works on sorted `(index, value)` pairs instead of dense vectors.

use serde::{Deserialize, Serialize};

/// A sparse vector with strictly increasing column indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    indices: Vec<u32>,
    values: Vec<f64>,
}

impl SparseVector {
    /// Empty vector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from unordered pairs; duplicate indices are summed and zeros dropped.
    pub fn from_pairs(mut pairs: Vec<(u32, f64)>) -> Self {
        pairs.sort_unstable_by_key(|(idx, _)| *idx);
        let mut indices = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (idx, value) in pairs {
            if indices.last() == Some(&idx) {
                if let Some(last) = values.last_mut() {
                    *last += value;
                }
            } else {
                indices.push(idx);
                values.push(value);
            }
        }
        let mut vector = SparseVector { indices, values };
        vector.prune_zeros();
        vector
    }

    /// Build from a dense slice, keeping non-zero entries.
    pub fn from_dense(dense: &[f64]) -> Self {
        let (indices, values): (Vec<u32>, Vec<f64>) = dense
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0.0)
            .map(|(i, v)| (i as u32, *v))
            .unzip();
        SparseVector { indices, values }
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate `(index, value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `index` (zero if not stored).
    pub fn get(&self, index: u32) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Dot product with a dense weight vector; out-of-range indices contribute zero.
    pub fn dot_dense(&self, weights: &[f64]) -> f64 {
        self.iter()
            .map(|(i, v)| weights.get(i as usize).map_or(0.0, |w| w * v))
            .sum()
    }

    /// Sparse-sparse dot product.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut a, mut b) = (0, 0);
        let mut sum = 0.0;
        while a < self.indices.len() && b < other.indices.len() {
            match self.indices[a].cmp(&other.indices[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[a] * other.values[b];
                    a += 1;
                    b += 1;
                }
            }
        }
        sum
    }

    /// Squared L2 norm.
    pub fn norm_sq(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// Scale to unit L2 norm (no-op for the zero vector).
    pub fn l2_normalize(&mut self) {
        let norm = self.norm_sq().sqrt();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    /// Squared Euclidean distance, given both squared norms.
    pub fn sq_distance(&self, self_norm_sq: f64, other: &SparseVector, other_norm_sq: f64) -> f64 {
        (self_norm_sq + other_norm_sq - 2.0 * self.dot(other)).max(0.0)
    }

    /// `self + gap * (other - self)`, the SMOTE interpolation.
    pub fn interpolate(&self, other: &SparseVector, gap: f64) -> SparseVector {
        let mut pairs = Vec::with_capacity(self.nnz() + other.nnz());
        let (mut a, mut b) = (0, 0);
        while a < self.indices.len() || b < other.indices.len() {
            let ia = self.indices.get(a).copied().unwrap_or(u32::MAX);
            let ib = other.indices.get(b).copied().unwrap_or(u32::MAX);
            if ia < ib {
                pairs.push((ia, self.values[a] * (1.0 - gap)));
                a += 1;
            } else if ib < ia {
                pairs.push((ib, other.values[b] * gap));
                b += 1;
            } else {
                let (va, vb) = (self.values[a], other.values[b]);
                pairs.push((ia, va + gap * (vb - va)));
                a += 1;
                b += 1;
            }
        }
        let mut out = SparseVector {
            indices: pairs.iter().map(|(i, _)| *i).collect(),
            values: pairs.iter().map(|(_, v)| *v).collect(),
        };
        out.prune_zeros();
        out
    }

    /// Concatenate blocks; each block is shifted by the total width of the blocks before it.
    pub fn concat(blocks: &[(SparseVector, usize)]) -> SparseVector {
        let capacity = blocks.iter().map(|(b, _)| b.nnz()).sum();
        let mut indices = Vec::with_capacity(capacity);
        let mut values = Vec::with_capacity(capacity);
        let mut offset = 0u32;
        for (block, width) in blocks {
            indices.extend(block.indices.iter().map(|i| i + offset));
            values.extend_from_slice(&block.values);
            offset += *width as u32;
        }
        SparseVector { indices, values }
    }

    fn prune_zeros(&mut self) {
        if self.values.iter().all(|v| *v != 0.0) {
            return;
        }
        let (indices, values): (Vec<u32>, Vec<f64>) = self
            .iter()
            .filter(|(_, v)| *v != 0.0)
            .unzip();
        self.indices = indices;
        self.values = values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_sorts_and_merges() {
        let v = SparseVector::from_pairs(vec![(5, 1.0), (1, 2.0), (5, 0.5), (3, 0.0)]);
        assert_eq!(v.indices(), &[1, 5]);
        assert_eq!(v.values(), &[2.0, 1.5]);
        assert_eq!(v.get(5), 1.5);
        assert_eq!(v.get(3), 0.0);
    }

    #[test]
    fn test_dot_and_distance() {
        let a = SparseVector::from_dense(&[1.0, 0.0, 2.0]);
        let b = SparseVector::from_dense(&[0.0, 3.0, 4.0]);
        assert_eq!(a.dot(&b), 8.0);
        assert_eq!(a.dot_dense(&[1.0, 1.0, 1.0]), 3.0);
        // (1-0)^2 + (0-3)^2 + (2-4)^2 = 14
        assert!((a.sq_distance(a.norm_sq(), &b, b.norm_sq()) - 14.0).abs() < 1e-12);
    }

    #[test]
    fn test_interpolate() {
        let a = SparseVector::from_dense(&[2.0, 0.0, 4.0]);
        let b = SparseVector::from_dense(&[0.0, 2.0, 8.0]);
        let mid = a.interpolate(&b, 0.5);
        assert_eq!(mid, SparseVector::from_dense(&[1.0, 1.0, 6.0]));
        assert_eq!(a.interpolate(&b, 0.0), a);
    }

    #[test]
    fn test_concat_offsets() {
        let a = SparseVector::from_dense(&[1.0, 0.0]);
        let b = SparseVector::from_dense(&[0.0, 0.0, 3.0]);
        let joined = SparseVector::concat(&[(a, 2), (b, 3)]);
        assert_eq!(joined.indices(), &[0, 4]);
        assert_eq!(joined.values(), &[1.0, 3.0]);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = SparseVector::from_dense(&[3.0, 4.0]);
        v.l2_normalize();
        assert!((v.norm_sq() - 1.0).abs() < 1e-12);
        let mut zero = SparseVector::new();
        zero.l2_normalize();
        assert!(zero.is_empty());
    }
}
