//! Dual-target regression estimators
//!
//! An [`Estimator`] pairs a fitted [`FeatureEncoder`] with a fitted
//! [`RegressorModel`] for one prediction target. The encoder is fitted first
//! and handed to the estimator explicitly, so the category mapping a model
//! was trained with is always the one it predicts with.

mod features;
mod linear;
mod strategy;
mod svr;
mod tree;

pub use features::{FeatureEncoder, NUM_NUMERIC_FEATURES};
pub use linear::{HuberRegressor, LinearRegressor};
pub use strategy::{RegressionStrategy, RegressorModel};
pub use svr::SupportVectorRegressor;
pub use tree::{GradientBoostingRegressor, RandomForestRegressor, RegressionTree, TreeNode};

use crate::error::{PredictorError, Result};
use crate::models::{FeatureRow, Observation};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Batch regression algorithm over encoded features
pub trait Regressor {
    /// Fit on `features` (rows x columns) and `targets`, returning the fitted model
    fn fit(self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<Self>
    where
        Self: Sized;

    /// One prediction per feature row
    fn predict(&self, features: ArrayView2<f64>) -> Array1<f64>;

    /// Check that fitted parameters are consistent with `width` input columns
    fn validate(&self, width: usize) -> std::result::Result<(), String>;
}

/// Reject inputs no regressor can fit
pub(crate) fn check_training_input(features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<()> {
    if targets.is_empty() {
        return Err(PredictorError::Training("no training rows".to_string()));
    }
    if features.nrows() != targets.len() {
        return Err(PredictorError::Training(format!(
            "feature rows ({}) and targets ({}) differ in length",
            features.nrows(),
            targets.len()
        )));
    }
    if features.iter().chain(targets.iter()).any(|v| !v.is_finite()) {
        return Err(PredictorError::Training(
            "training data contains non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Quantity an estimator predicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Execution time in seconds
    Time,
    /// User quality rating
    Quality,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Time => "time",
            Target::Quality => "quality",
        }
    }

    /// Target value of an observation
    pub fn value(&self, observation: &Observation) -> f64 {
        match self {
            Target::Time => observation.execution_time,
            Target::Quality => observation.user_rating,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fitted encoder + regressor for one target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimator {
    target: Target,
    encoder: FeatureEncoder,
    regressor: RegressorModel,
}

impl Estimator {
    /// Fit a regressor of `strategy` on observations encoded with `encoder`
    pub fn fit(
        target: Target,
        strategy: RegressionStrategy,
        encoder: FeatureEncoder,
        observations: &[Observation],
    ) -> Result<Self> {
        let rows: Vec<FeatureRow> = observations.iter().map(Observation::feature_row).collect();
        let features = encoder.transform(&rows);
        let targets: Array1<f64> = observations.iter().map(|o| target.value(o)).collect();

        info!(
            target = %target,
            strategy = %strategy,
            rows = rows.len(),
            width = encoder.width(),
            "Fitting estimator"
        );
        let regressor = strategy.build().fit(features.view(), targets.view())?;

        Ok(Self {
            target,
            encoder,
            regressor,
        })
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn strategy(&self) -> RegressionStrategy {
        self.regressor.strategy()
    }

    pub fn encoder(&self) -> &FeatureEncoder {
        &self.encoder
    }

    /// Check a deserialized estimator before it is used for prediction
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.encoder.validate()?;
        self.regressor.validate(self.encoder.width())
    }

    /// Encode with the frozen encoder, then predict with the regressor
    pub fn predict(&self, rows: &[FeatureRow]) -> Array1<f64> {
        let features = self.encoder.transform(rows);
        self.regressor.predict(features.view())
    }
}
