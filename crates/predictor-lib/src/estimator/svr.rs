//! Epsilon support vector regression with an RBF kernel
//!
//! The dual problem is solved by `linfa-svm`. The fitted machine is then
//! flattened into support vectors, dual coefficients and a bias:
//!
//! - Kernel: k(x, y) = exp(-γ‖x-y‖²)
//! - Prediction: f(x) = Σ αᵢ k(x, xᵢ) + b over the support vectors
//!
//! The bias is read back from the machine's own predictions on the training
//! rows, and fitting fails if the flattened form disagrees with them.

use super::{check_training_input, Regressor};
use crate::error::{PredictorError, Result};
use linfa::traits::{Fit, Predict};
use linfa::Dataset;
use linfa_svm::Svm;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Row cap for the solver, whose kernel cache is a dense n×n matrix
pub const DEFAULT_MAX_ROWS: usize = 2_000;

/// Dual coefficients below this magnitude are not kept as support vectors
const SUPPORT_THRESHOLD: f64 = 1e-12;

/// Allowed gap between flattened and solver predictions, relative to the target scale
const RECONSTRUCTION_TOL: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportVectorRegressor {
    pub c: f64,
    pub gamma: f64,
    pub epsilon: f64,
    /// Larger training sets are subsampled to this many rows
    pub max_rows: usize,
    pub seed: u64,
    pub support_vectors: Vec<Vec<f64>>,
    pub dual_coef: Vec<f64>,
    pub bias: f64,
}

impl Default for SupportVectorRegressor {
    fn default() -> Self {
        Self {
            c: 100.0,
            gamma: 0.1,
            epsilon: 0.1,
            max_rows: DEFAULT_MAX_ROWS,
            seed: 42,
            support_vectors: Vec::new(),
            dual_coef: Vec::new(),
            bias: 0.0,
        }
    }
}

impl SupportVectorRegressor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    #[inline]
    fn kernel(&self, a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        let sq_dist: f64 = a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum();
        (-self.gamma * sq_dist).exp()
    }

    /// Training rows handed to the solver, subsampled without replacement
    /// when there are more than `max_rows`
    fn training_rows(
        &self,
        features: ArrayView2<f64>,
        targets: ArrayView1<f64>,
    ) -> (Array2<f64>, Array1<f64>) {
        let n = targets.len();
        if n <= self.max_rows.max(1) {
            return (features.to_owned(), targets.to_owned());
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut picked = rand::seq::index::sample(&mut rng, n, self.max_rows.max(1)).into_vec();
        picked.sort_unstable();
        info!(
            rows = n,
            kept = picked.len(),
            "Subsampling support vector training set"
        );
        (
            features.select(Axis(0), &picked),
            targets.select(Axis(0), &picked),
        )
    }
}

impl Regressor for SupportVectorRegressor {
    fn fit(self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<Self> {
        check_training_input(features, targets)?;
        if !(self.gamma > 0.0 && self.gamma.is_finite()) {
            return Err(PredictorError::Training(format!(
                "svr gamma must be positive, got {}",
                self.gamma
            )));
        }

        let (x, y) = self.training_rows(features, targets);
        let n = y.len();
        let dataset = Dataset::new(x.clone(), y.clone());

        // linfa's gaussian kernel is exp(-‖x-y‖² / eps)
        let svm = Svm::<f64, f64>::params()
            .c_svr(self.c, Some(self.epsilon))
            .gaussian_kernel(1.0 / self.gamma)
            .fit(&dataset)
            .map_err(|e| PredictorError::Training(format!("support vector regression: {}", e)))?;

        if svm.alpha.len() != n {
            return Err(PredictorError::Training(format!(
                "svr solver returned {} dual coefficients for {} rows",
                svm.alpha.len(),
                n
            )));
        }
        let solver_predictions: Array1<f64> = svm.predict(&x);

        let mut support_vectors = Vec::new();
        let mut dual_coef = Vec::new();
        for (i, a) in svm.alpha.iter().enumerate() {
            if a.abs() > SUPPORT_THRESHOLD {
                support_vectors.push(x.row(i).to_vec());
                dual_coef.push(*a);
            }
        }
        let flattened = Self {
            support_vectors,
            dual_coef,
            bias: 0.0,
            ..self
        };

        let kernel_sums = Regressor::predict(&flattened, x.view());
        let offsets = &solver_predictions - &kernel_sums;
        let bias = offsets.mean().unwrap_or(0.0);

        let scale = 1.0 + y.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        let gap = offsets.iter().fold(0.0_f64, |m, o| m.max((o - bias).abs()));
        if !bias.is_finite() || gap > RECONSTRUCTION_TOL * scale {
            return Err(PredictorError::Training(format!(
                "svr solution could not be flattened (gap {:e})",
                gap
            )));
        }

        debug!(
            support_vectors = flattened.dual_coef.len(),
            samples = n,
            bias,
            "SVR fitted"
        );
        Ok(Self { bias, ..flattened })
    }

    fn predict(&self, features: ArrayView2<f64>) -> Array1<f64> {
        features
            .rows()
            .into_iter()
            .map(|row| {
                self.bias
                    + self
                        .support_vectors
                        .iter()
                        .zip(&self.dual_coef)
                        .map(|(sv, a)| a * self.kernel(row, ArrayView1::from(sv.as_slice())))
                        .sum::<f64>()
            })
            .collect()
    }

    fn validate(&self, width: usize) -> std::result::Result<(), String> {
        if !(self.gamma > 0.0 && self.gamma.is_finite()) {
            return Err(format!("svr gamma {} is not positive", self.gamma));
        }
        if self.support_vectors.len() != self.dual_coef.len() {
            return Err(format!(
                "{} support vectors but {} dual coefficients",
                self.support_vectors.len(),
                self.dual_coef.len()
            ));
        }
        if let Some(sv) = self.support_vectors.iter().find(|sv| sv.len() != width) {
            return Err(format!(
                "support vector has {} features, encoder produces {}",
                sv.len(),
                width
            ));
        }
        let finite = self.bias.is_finite()
            && self.dual_coef.iter().all(|a| a.is_finite())
            && self.support_vectors.iter().flatten().all(|v| v.is_finite());
        if !finite {
            return Err("svr parameters contain non-finite values".to_string());
        }
        Ok(())
    }
}
