//! Regression strategy selection

use super::linear::{HuberRegressor, LinearRegressor};
use super::svr::SupportVectorRegressor;
use super::tree::{GradientBoostingRegressor, RandomForestRegressor};
use super::Regressor;
use crate::error::Result;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which regression algorithm an estimator uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionStrategy {
    /// Ordinary least squares
    Linear,
    /// Huber loss, resistant to outliers
    Robust,
    /// Random forest, good for non-linear relations
    #[default]
    Forest,
    /// Gradient boosted trees
    Boosted,
    /// RBF-kernel support vector regression
    #[serde(alias = "svr")]
    SupportVector,
}

impl RegressionStrategy {
    pub const ALL: [RegressionStrategy; 5] = [
        RegressionStrategy::Linear,
        RegressionStrategy::Robust,
        RegressionStrategy::Forest,
        RegressionStrategy::Boosted,
        RegressionStrategy::SupportVector,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RegressionStrategy::Linear => "linear",
            RegressionStrategy::Robust => "robust",
            RegressionStrategy::Forest => "forest",
            RegressionStrategy::Boosted => "boosted",
            RegressionStrategy::SupportVector => "support_vector",
        }
    }

    /// Unfitted regressor with default hyperparameters
    pub fn build(&self) -> RegressorModel {
        match self {
            RegressionStrategy::Linear => RegressorModel::Linear(LinearRegressor::new()),
            RegressionStrategy::Robust => RegressorModel::Robust(HuberRegressor::new()),
            RegressionStrategy::Forest => RegressorModel::Forest(RandomForestRegressor::new()),
            RegressionStrategy::Boosted => RegressorModel::Boosted(GradientBoostingRegressor::new()),
            RegressionStrategy::SupportVector => {
                RegressorModel::SupportVector(SupportVectorRegressor::new())
            }
        }
    }
}

impl fmt::Display for RegressionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RegressionStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "linear" => Ok(RegressionStrategy::Linear),
            "robust" | "huber" => Ok(RegressionStrategy::Robust),
            "forest" | "random_forest" => Ok(RegressionStrategy::Forest),
            "boosted" | "gradient_boosting" => Ok(RegressionStrategy::Boosted),
            "support_vector" | "svr" => Ok(RegressionStrategy::SupportVector),
            other => Err(format!(
                "unknown regression strategy {:?} (expected one of: linear, robust, forest, boosted, support_vector)",
                other
            )),
        }
    }
}

/// A regressor of any strategy, fitted or not. This is the serialized form
/// stored in model files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "snake_case")]
pub enum RegressorModel {
    Linear(LinearRegressor),
    Robust(HuberRegressor),
    Forest(RandomForestRegressor),
    Boosted(GradientBoostingRegressor),
    SupportVector(SupportVectorRegressor),
}

impl RegressorModel {
    pub fn strategy(&self) -> RegressionStrategy {
        match self {
            RegressorModel::Linear(_) => RegressionStrategy::Linear,
            RegressorModel::Robust(_) => RegressionStrategy::Robust,
            RegressorModel::Forest(_) => RegressionStrategy::Forest,
            RegressorModel::Boosted(_) => RegressionStrategy::Boosted,
            RegressorModel::SupportVector(_) => RegressionStrategy::SupportVector,
        }
    }
}

impl Regressor for RegressorModel {
    fn fit(self, features: ArrayView2<f64>, targets: ArrayView1<f64>) -> Result<Self> {
        Ok(match self {
            RegressorModel::Linear(m) => RegressorModel::Linear(m.fit(features, targets)?),
            RegressorModel::Robust(m) => RegressorModel::Robust(m.fit(features, targets)?),
            RegressorModel::Forest(m) => RegressorModel::Forest(m.fit(features, targets)?),
            RegressorModel::Boosted(m) => RegressorModel::Boosted(m.fit(features, targets)?),
            RegressorModel::SupportVector(m) => {
                RegressorModel::SupportVector(m.fit(features, targets)?)
            }
        })
    }

    fn predict(&self, features: ArrayView2<f64>) -> Array1<f64> {
        match self {
            RegressorModel::Linear(m) => m.predict(features),
            RegressorModel::Robust(m) => m.predict(features),
            RegressorModel::Forest(m) => m.predict(features),
            RegressorModel::Boosted(m) => m.predict(features),
            RegressorModel::SupportVector(m) => m.predict(features),
        }
    }

    fn validate(&self, width: usize) -> std::result::Result<(), String> {
        match self {
            RegressorModel::Linear(m) => m.validate(width),
            RegressorModel::Robust(m) => m.validate(width),
            RegressorModel::Forest(m) => m.validate(width),
            RegressorModel::Boosted(m) => m.validate(width),
            RegressorModel::SupportVector(m) => m.validate(width),
        }
    }
}
