//! Gaussian-process surrogate used by the Bayesian search strategy.

use statrs::distribution::{Continuous, ContinuousCDF, Normal};

use crate::error::{EnsembleError, Result};

/// Jitter added to the kernel diagonal for numerical stability.
const JITTER: f64 = 1e-9;

/// One-dimensional GP regression with an RBF kernel.
///
/// Inputs are expected on a unit scale; targets are standardised internally
/// and predictions are returned on the original scale.
#[derive(Debug, Clone)]
pub(crate) struct GaussianProcess {
    xs: Vec<f64>,
    /// Lower Cholesky factor of `K + noise * I`, row-major.
    chol: Vec<f64>,
    alpha: Vec<f64>,
    length_scale: f64,
    y_mean: f64,
    y_scale: f64,
}

impl GaussianProcess {
    /// Fit on observations `(xs[i], ys[i])`.
    pub(crate) fn fit(xs: &[f64], ys: &[f64], length_scale: f64, noise: f64) -> Result<Self> {
        let n = xs.len();
        if n == 0 || n != ys.len() {
            return Err(EnsembleError::ShapeMismatch {
                expected: n,
                got: ys.len(),
            });
        }

        let y_mean = ys.iter().sum::<f64>() / n as f64;
        let var = ys.iter().map(|y| (y - y_mean).powi(2)).sum::<f64>() / n as f64;
        let y_scale = if var.sqrt() > 1e-12 { var.sqrt() } else { 1.0 };
        let targets: Vec<f64> = ys.iter().map(|y| (y - y_mean) / y_scale).collect();

        let mut gram = vec![0.0; n * n];
        for i in 0..n {
            for j in 0..n {
                gram[i * n + j] = rbf(xs[i], xs[j], length_scale);
            }
            gram[i * n + i] += noise + JITTER;
        }

        let chol = cholesky(&gram, n).ok_or_else(|| {
            EnsembleError::ComputationError("surrogate kernel matrix is not positive definite".into())
        })?;
        let z = forward_substitute(&chol, &targets, n);
        let alpha = backward_substitute(&chol, &z, n);

        Ok(Self {
            xs: xs.to_vec(),
            chol,
            alpha,
            length_scale,
            y_mean,
            y_scale,
        })
    }

    /// Posterior mean and standard deviation at `x`.
    pub(crate) fn predict(&self, x: f64) -> (f64, f64) {
        let n = self.xs.len();
        let k_star: Vec<f64> = self
            .xs
            .iter()
            .map(|&xi| rbf(x, xi, self.length_scale))
            .collect();

        let mean: f64 = k_star.iter().zip(&self.alpha).map(|(k, a)| k * a).sum();
        let v = forward_substitute(&self.chol, &k_star, n);
        let variance = (1.0 - v.iter().map(|vi| vi * vi).sum::<f64>()).max(1e-12);

        (
            self.y_mean + mean * self.y_scale,
            variance.sqrt() * self.y_scale,
        )
    }
}

/// Expected improvement over `best` for a minimisation problem.
pub(crate) fn expected_improvement(
    normal: &Normal,
    mean: f64,
    std: f64,
    best: f64,
    xi: f64,
) -> f64 {
    let improvement = best - mean - xi;
    if std < 1e-12 {
        return improvement.max(0.0);
    }
    let z = improvement / std;
    improvement * normal.cdf(z) + std * normal.pdf(z)
}

fn rbf(a: f64, b: f64, length_scale: f64) -> f64 {
    (-(a - b).powi(2) / (2.0 * length_scale * length_scale)).exp()
}

fn cholesky(a: &[f64], n: usize) -> Option<Vec<f64>> {
    let mut l = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i * n + j];
            for k in 0..j {
                sum -= l[i * n + k] * l[j * n + k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i * n + i] = sum.sqrt();
            } else {
                l[i * n + j] = sum / l[j * n + j];
            }
        }
    }
    Some(l)
}

/// Solve `L z = b` for lower-triangular `L`.
fn forward_substitute(l: &[f64], b: &[f64], n: usize) -> Vec<f64> {
    let mut z = vec![0.0; n];
    for i in 0..n {
        let mut sum = b[i];
        for k in 0..i {
            sum -= l[i * n + k] * z[k];
        }
        z[i] = sum / l[i * n + i];
    }
    z
}

/// Solve `L^T x = z` for lower-triangular `L`.
fn backward_substitute(l: &[f64], z: &[f64], n: usize) -> Vec<f64> {
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut sum = z[i];
        for k in (i + 1)..n {
            sum -= l[k * n + i] * x[k];
        }
        x[i] = sum / l[i * n + i];
    }
    x
}
