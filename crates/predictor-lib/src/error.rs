//! Error taxonomy for training and prediction

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PredictorError>;

/// Every failure the library can report. All of them are fatal to the
/// operation that raised them.
#[derive(Debug, Error)]
pub enum PredictorError {
    /// Historical data file unreadable or malformed
    #[error("failed to read training data from {}: {reason}", path.display())]
    Data { path: PathBuf, reason: String },

    /// No usable rows after quality-label filtering
    #[error("no usable training rows in {} after dropping unrated observations", path.display())]
    EmptyTrainingSet { path: PathBuf },

    #[error(
        "model files not found ({}, {}); train the models first with `lmp train`",
        time_path.display(),
        quality_path.display()
    )]
    ArtifactNotFound {
        time_path: PathBuf,
        quality_path: PathBuf,
    },

    #[error("failed to load model file {}: {reason}", path.display())]
    ArtifactCorrupt { path: PathBuf, reason: String },

    #[error("failed to write model file {}: {source}", path.display())]
    ArtifactWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Numeric arguments that are not non-negative integers
    #[error("invalid value {value:?} for {name}: expected a non-negative integer")]
    InvalidArgument { name: &'static str, value: String },

    #[error("training failed: {0}")]
    Training(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PredictorError {
    pub(crate) fn data(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Data {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ArtifactCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
