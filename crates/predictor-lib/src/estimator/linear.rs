//! Linear regressors: ordinary least squares and Huber
//!
//! Both hand a (weighted) least squares problem on centered features to
//! `linfa-linear`. The design is augmented with ridge rows scaled to the data,
//! which keeps it full rank although the one-hot block is collinear with the
//! intercept.

use super::{check_training_input, Regressor};
use crate::error::{PredictorError, Result};
use linfa::traits::Fit;
use linfa::Dataset;
use linfa_linear::LinearRegression;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relative ridge used by plain least squares
const LEAST_SQUARES_RIDGE: f64 = 1e-9;

/// Consistency constant turning the median absolute deviation into a
/// standard deviation estimate for normal residuals
const MAD_TO_STD: f64 = 0.6745;

/// Ordinary least squares with intercept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressor {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearRegressor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Regressor for LinearRegressor {
    fn fit(self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<Self> {
        check_training_input(features, targets)?;
        let weights = Array1::ones(targets.len());
        let (coefficients, intercept) =
            weighted_least_squares(features, targets, weights.view(), 0.0)?;
        Ok(Self {
            coefficients: coefficients.to_vec(),
            intercept,
        })
    }

    fn predict(&self, features: ArrayView2<f64>) -> Array1<f64> {
        linear_predict(features, &self.coefficients, self.intercept)
    }

    fn validate(&self, width: usize) -> std::result::Result<(), String> {
        check_linear_params(&self.coefficients, self.intercept, width)
    }
}

/// Huber regression fit by iteratively reweighted least squares
///
/// Residuals within `epsilon` robust standard deviations keep full weight,
/// larger ones are down-weighted in proportion to their size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HuberRegressor {
    pub epsilon: f64,
    /// L2 penalty on the coefficients
    pub alpha: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Robust residual scale at convergence
    pub scale: f64,
}

impl Default for HuberRegressor {
    fn default() -> Self {
        Self {
            epsilon: 1.35,
            alpha: 1e-4,
            max_iter: 100,
            tol: 1e-5,
            coefficients: Vec::new(),
            intercept: 0.0,
            scale: 0.0,
        }
    }
}

impl HuberRegressor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Regressor for HuberRegressor {
    fn fit(self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<Self> {
        check_training_input(features, targets)?;
        if self.epsilon < 1.0 {
            return Err(PredictorError::Training(format!(
                "huber epsilon must be >= 1.0, got {}",
                self.epsilon
            )));
        }

        let n = targets.len();
        let mut weights = Array1::<f64>::ones(n);
        let (mut coefficients, mut intercept) =
            weighted_least_squares(features, targets, weights.view(), self.alpha)?;
        let mut scale = 0.0;

        for iteration in 0..self.max_iter {
            let fitted = linear_predict(features, &coefficients.to_vec(), intercept);
            let residuals = &targets - &fitted;
            scale = median_absolute_deviation(residuals.view()) / MAD_TO_STD;
            if scale < f64::EPSILON {
                debug!(iteration, "Huber residuals vanished, stopping");
                break;
            }

            let threshold = self.epsilon * scale;
            for (w, r) in weights.iter_mut().zip(residuals.iter()) {
                let abs = r.abs();
                *w = if abs <= threshold { 1.0 } else { threshold / abs };
            }

            let (next, next_intercept) =
                weighted_least_squares(features, targets, weights.view(), self.alpha)?;
            let change = next
                .iter()
                .zip(coefficients.iter())
                .map(|(a, b)| (a - b).abs())
                .fold((next_intercept - intercept).abs(), f64::max);
            coefficients = next;
            intercept = next_intercept;

            if change < self.tol {
                debug!(iteration, "Huber regression converged");
                break;
            }
        }

        Ok(Self {
            coefficients: coefficients.to_vec(),
            intercept,
            scale,
            ..self
        })
    }

    fn predict(&self, features: ArrayView2<f64>) -> Array1<f64> {
        linear_predict(features, &self.coefficients, self.intercept)
    }

    fn validate(&self, width: usize) -> std::result::Result<(), String> {
        check_linear_params(&self.coefficients, self.intercept, width)
    }
}

fn linear_predict(features: ArrayView2<f64>, coefficients: &[f64], intercept: f64) -> Array1<f64> {
    features
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .zip(coefficients)
                .map(|(x, w)| x * w)
                .sum::<f64>()
                + intercept
        })
        .collect()
}

fn check_linear_params(
    coefficients: &[f64],
    intercept: f64,
    width: usize,
) -> std::result::Result<(), String> {
    if coefficients.len() != width {
        return Err(format!(
            "{} coefficients, encoder produces {} features",
            coefficients.len(),
            width
        ));
    }
    if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
        return Err("linear parameters contain non-finite values".to_string());
    }
    Ok(())
}

/// Solve `min Σ wᵢ(yᵢ - xᵢ·β - b)² + α‖β‖²` for `(β, b)`
///
/// Rows are scaled by √wᵢ and the penalty enters as √α·I rows below the
/// data, so an unweighted, intercept-free least squares fit solves it.
fn weighted_least_squares(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    w: ArrayView1<f64>,
    alpha: f64,
) -> Result<(Array1<f64>, f64)> {
    let (n, p) = x.dim();
    let total_weight = w.sum();
    if total_weight <= 0.0 {
        return Err(PredictorError::Training(
            "sample weights sum to zero".to_string(),
        ));
    }

    let weights_col = w.insert_axis(Axis(1));
    let x_mean = (&x * &weights_col).sum_axis(Axis(0)) / total_weight;
    let y_mean = (&y * &w).sum() / total_weight;

    let sqrt_w = w.mapv(f64::sqrt);
    let xw = (&x - &x_mean) * &sqrt_w.view().insert_axis(Axis(1));
    let yw = (&y - y_mean) * &sqrt_w;

    let max_diag = xw
        .axis_iter(Axis(1))
        .map(|col| col.dot(&col))
        .fold(0.0, f64::max);
    let ridge = alpha + LEAST_SQUARES_RIDGE * (1.0 + max_diag);

    let mut design = Array2::<f64>::zeros((n + p, p));
    design.slice_mut(s![..n, ..]).assign(&xw);
    design.slice_mut(s![n.., ..]).diag_mut().fill(ridge.sqrt());
    let mut target = Array1::<f64>::zeros(n + p);
    target.slice_mut(s![..n]).assign(&yw);

    let fitted = LinearRegression::new()
        .with_intercept(false)
        .fit(&Dataset::new(design, target))
        .map_err(|e| PredictorError::Training(format!("least squares: {}", e)))?;
    let coefficients = fitted.params().to_owned();
    let intercept = y_mean - coefficients.dot(&x_mean);

    if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
        return Err(PredictorError::Training(
            "least squares produced non-finite coefficients".to_string(),
        ));
    }
    Ok((coefficients, intercept))
}

fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

fn median_absolute_deviation(values: ArrayView1<f64>) -> f64 {
    let mut v = values.to_vec();
    let center = median(&mut v);
    let mut deviations: Vec<f64> = values.iter().map(|x| (x - center).abs()).collect();
    median(&mut deviations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_linear_recovers_exact_line() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![3.0, 5.0, 7.0, 9.0];
        let model = LinearRegressor::new().fit(x.view(), y.view()).unwrap();
        assert!((model.coefficients[0] - 2.0).abs() < 1e-6);
        assert!((model.intercept - 1.0).abs() < 1e-6);
        let pred = model.predict(array![[10.0]].view());
        assert!((pred[0] - 21.0).abs() < 1e-5);
    }

    #[test]
    fn test_linear_handles_collinear_one_hot() {
        // One category only: the one-hot column is constant
        let x = array![[1.0, 10.0], [1.0, 20.0], [1.0, 30.0]];
        let y = array![1.0, 2.0, 3.0];
        let model = LinearRegressor::new().fit(x.view(), y.view()).unwrap();
        let pred = model.predict(array![[0.0, 40.0]].view());
        assert!(pred[0].is_finite());
        assert!((pred[0] - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_huber_resists_outlier() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0], [6.0], [7.0], [8.0]];
        let y = array![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 100.0];
        let ols = LinearRegressor::new().fit(x.view(), y.view()).unwrap();
        let huber = HuberRegressor::new().fit(x.view(), y.view()).unwrap();
        assert!((huber.coefficients[0] - 1.0).abs() < (ols.coefficients[0] - 1.0).abs());
    }

    #[test]
    fn test_median_absolute_deviation() {
        let v = array![1.0, 1.0, 2.0, 2.0, 4.0, 6.0, 9.0];
        assert!((median_absolute_deviation(v.view()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_rows_pull_the_fit() {
        let x = array![[0.0], [1.0], [2.0]];
        let y = array![0.0, 1.0, 5.0];
        let heavy = array![1.0, 1.0, 100.0];
        let (flat, _) = weighted_least_squares(x.view(), y.view(), array![1.0, 1.0, 1.0].view(), 0.0).unwrap();
        let (tilted, _) = weighted_least_squares(x.view(), y.view(), heavy.view(), 0.0).unwrap();
        assert!((flat[0] - 2.5).abs() < 1e-6);
        assert!(tilted[0] > flat[0]);
    }

    #[test]
    fn test_validate_checks_width() {
        let model = LinearRegressor {
            coefficients: vec![1.0],
            intercept: 0.5,
        };
        assert!(model.validate(1).is_ok());
        assert!(model.validate(4).is_err());

        let huber = HuberRegressor {
            coefficients: vec![f64::NAN, 1.0],
            ..HuberRegressor::new()
        };
        assert!(huber.validate(2).is_err());
    }
}
