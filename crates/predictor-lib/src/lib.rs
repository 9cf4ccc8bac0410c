//! LLM model execution-time and quality predictor
//!
//! This crate provides the core functionality for:
//! - Parsing historical run records and filtering unrated runs
//! - Encoding model identity and prompt statistics into features
//! - Fitting per-target regressors with a selectable strategy
//! - Persisting fitted estimators as checksummed model files
//! - Predicting time and quality for every model in the catalog

pub mod artifact;
pub mod catalog;
pub mod config;
pub mod error;
pub mod estimator;
pub mod models;
pub mod predictor;
pub mod records;
pub mod trainer;

pub use catalog::ModelCatalog;
pub use config::PredictorConfig;
pub use error::{PredictorError, Result};
pub use estimator::{Estimator, FeatureEncoder, RegressionStrategy, Target};
pub use models::*;
pub use predictor::{format_line, Predictor};
pub use records::{RecordParser, TrainingSet};
pub use trainer::{TrainedModels, Trainer, TrainingReport};
