//! Standardization of the numeric signal block.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{DetectorError, Result};

/// Zero-mean, unit-variance scaler fitted on the training rows.
///
/// Uses the population standard deviation; constant columns get a scale of 1
/// so they map to zero instead of dividing by zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl StandardScaler {
    /// Compute per-column means and standard deviations.
    ///
    /// # Errors
    ///
    /// Fails on empty input or ragged rows.
    pub fn fit<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let n_samples = rows.len();
        if n_samples == 0 {
            return Err(DetectorError::empty_dataset("cannot fit scaler on zero rows"));
        }
        let n_features = rows[0].as_ref().len();

        let flat: Vec<f64> = rows.iter().flat_map(|r| r.as_ref().iter().copied()).collect();
        let matrix = Array2::from_shape_vec((n_samples, n_features), flat)
            .map_err(|e| DetectorError::invalid_config(format!("ragged numeric rows: {e}")))?;

        let means = matrix
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(n_features));
        let stds = matrix.std_axis(Axis(0), 0.0).mapv(|s| {
            if s < 10.0 * f64::EPSILON {
                1.0
            } else {
                s
            }
        });

        Ok(StandardScaler {
            means: means.to_vec(),
            stds: stds.to_vec(),
        })
    }

    /// Standardize one row. Columns beyond the fitted width pass through unchanged.
    pub fn transform(&self, row: &[f64]) -> Vec<f64> {
        row.iter()
            .enumerate()
            .map(|(i, &val)| {
                if i < self.means.len() {
                    (val - self.means[i]) / self.stds[i]
                } else {
                    val
                }
            })
            .collect()
    }

    /// Number of fitted columns.
    pub fn width(&self) -> usize {
        self.means.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_transform() {
        let rows = vec![vec![1.0, 10.0], vec![3.0, 10.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert_eq!(scaler.means, vec![2.0, 10.0]);
        assert_eq!(scaler.stds, vec![1.0, 1.0]);

        assert_eq!(scaler.transform(&[1.0, 10.0]), vec![-1.0, 0.0]);
        assert_eq!(scaler.transform(&[3.0, 12.0]), vec![1.0, 2.0]);
    }

    #[test]
    fn test_population_std() {
        let rows = [[0.0], [0.0], [4.0], [4.0]];
        let scaler = StandardScaler::fit(&rows).unwrap();
        assert!((scaler.stds[0] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_empty_and_ragged() {
        assert!(StandardScaler::fit::<Vec<f64>>(&[]).is_err());
        assert!(StandardScaler::fit(&[vec![1.0, 2.0], vec![1.0]]).is_err());
    }
}
