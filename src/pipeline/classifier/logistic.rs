//! L2-regularized logistic regression.
//!
//! Minimizes
//!
//! ```text
//! 0.5 * ||w||^2 + C * sum_i s_i * log(1 + exp(-y_i * (w . x_i + b)))
//! ```
//!
//! with `y_i` in {-1, +1}, per-sample class weights `s_i` and an unregularized
//! intercept `b`. The solver is Nesterov-accelerated full gradient descent with
//! step `1 / L` and gradient-based momentum restarts. `L` bounds the Hessian:
//! `1 + C/4 * lambda_max(A^T S A)` where `A` is the data matrix with a bias column,
//! estimated by power iteration.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::{class_weights, ProbabilisticClassifier};
use crate::error::Result;
use crate::pipeline::config::LinearConfig;
use crate::pipeline::data::Label;
use crate::pipeline::sparse::SparseVector;

const POWER_ITERATIONS: usize = 30;

/// Fitted logistic regression model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub weights: Vec<f64>,
    pub intercept: f64,
    /// Iterations run by the solver
    pub n_iter: usize,
    pub converged: bool,
}

impl LogisticRegression {
    /// Fit on composed rows.
    ///
    /// # Arguments
    ///
    /// * `rows` - training rows
    /// * `labels` - one label per row (both classes must be present)
    /// * `n_features` - width of the weight vector
    /// * `config` - C, iteration budget, tolerance, class weighting
    /// * `convergence_warnings` - log a warning if `max_iter` is exhausted
    pub fn fit(
        rows: &[SparseVector],
        labels: &[Label],
        n_features: usize,
        config: &LinearConfig,
        convergence_warnings: bool,
    ) -> Result<Self> {
        let class_w = class_weights(labels, config.balanced_class_weight)?;
        let targets: Vec<f64> = labels
            .iter()
            .map(|l| if *l == Label::Phishing { 1.0 } else { -1.0 })
            .collect();
        let sample_w: Vec<f64> = labels.iter().map(|l| class_w[l.index()]).collect();
        let c = config.c;

        let lipschitz = 1.0 + 0.25 * c * spectral_bound(rows, &sample_w, n_features);
        let step = 1.0 / lipschitz;
        log::debug!("Logistic regression: L = {:.4}, step = {:.3e}", lipschitz, step);

        let mut w = vec![0.0; n_features];
        let mut b = 0.0;
        let mut w_prev = w.clone();
        let mut b_prev = b;
        let mut t = 1.0f64;
        let mut converged = false;
        let mut n_iter = 0;

        let mut v = vec![0.0; n_features];
        let mut grad = vec![0.0; n_features];

        for iter in 1..=config.max_iter {
            n_iter = iter;
            let t_next = (1.0 + (1.0 + 4.0 * t * t).sqrt()) / 2.0;
            let momentum = (t - 1.0) / t_next;

            for j in 0..n_features {
                v[j] = w[j] + momentum * (w[j] - w_prev[j]);
            }
            let vb = b + momentum * (b - b_prev);

            // Per-sample derivative of the weighted loss w.r.t. the margin
            let coefs: Vec<f64> = rows
                .par_iter()
                .zip(targets.par_iter())
                .zip(sample_w.par_iter())
                .map(|((x, &y), &s)| {
                    let z = x.dot_dense(&v) + vb;
                    -c * s * y * sigmoid(-y * z)
                })
                .collect();

            grad.copy_from_slice(&v);
            let mut grad_b = 0.0;
            for (x, &coef) in rows.iter().zip(&coefs) {
                for (j, val) in x.iter() {
                    grad[j as usize] += coef * val;
                }
                grad_b += coef;
            }

            std::mem::swap(&mut w_prev, &mut w);
            b_prev = b;
            for j in 0..n_features {
                w[j] = v[j] - step * grad[j];
            }
            b = vb - step * grad_b;

            let mut max_change = (b - b_prev).abs();
            let mut max_weight = b.abs();
            let mut restart = grad_b * (b - b_prev);
            for j in 0..n_features {
                let delta = w[j] - w_prev[j];
                max_change = max_change.max(delta.abs());
                max_weight = max_weight.max(w[j].abs());
                restart += grad[j] * delta;
            }

            t = if restart > 0.0 { 1.0 } else { t_next };

            if max_weight > 0.0 && max_change / max_weight < config.tol {
                converged = true;
                break;
            }
        }

        if converged {
            log::info!("Logistic regression converged after {} iterations", n_iter);
        } else if convergence_warnings {
            log::warn!(
                "Logistic regression did not converge in {} iterations; consider raising max_iter",
                config.max_iter
            );
        }

        Ok(LogisticRegression {
            weights: w,
            intercept: b,
            n_iter,
            converged,
        })
    }

    /// Raw margin `w . x + b`.
    pub fn decision_function(&self, row: &SparseVector) -> f64 {
        row.dot_dense(&self.weights) + self.intercept
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, row: &SparseVector) -> [f64; 2] {
        let p = sigmoid(self.decision_function(row));
        [1.0 - p, p]
    }
}

/// Numerically stable logistic function.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Upper estimate of the largest eigenvalue of `A^T S A`, `A = [X | 1]`.
fn spectral_bound(rows: &[SparseVector], sample_w: &[f64], n_features: usize) -> f64 {
    let dim = n_features + 1;
    let mut u = vec![1.0 / (dim as f64).sqrt(); dim];
    let mut eigenvalue = 0.0;

    for _ in 0..POWER_ITERATIONS {
        let mut next = vec![0.0; dim];
        for (x, &s) in rows.iter().zip(sample_w) {
            let au = x.dot_dense(&u[..n_features]) + u[n_features];
            let scaled = s * au;
            for (j, val) in x.iter() {
                next[j as usize] += scaled * val;
            }
            next[n_features] += scaled;
        }
        let norm = next.iter().map(|v| v * v).sum::<f64>().sqrt();
        if norm == 0.0 {
            break;
        }
        eigenvalue = norm;
        for (ui, ni) in u.iter_mut().zip(&next) {
            *ui = ni / norm;
        }
    }

    // power iteration approaches from below
    eigenvalue * 1.1
}
