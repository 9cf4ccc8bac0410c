//! Core data models for the model predictor

use crate::error::{PredictorError, Result};
use serde::{Deserialize, Serialize};

/// Simple textual statistics describing a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PromptStats {
    pub lines: u64,
    pub words: u64,
    pub chars: u64,
}

impl PromptStats {
    pub fn new(lines: u64, words: u64, chars: u64) -> Self {
        Self {
            lines,
            words,
            chars,
        }
    }

    /// Parse user-supplied counts; each must be a non-negative integer
    pub fn parse(lines: &str, words: &str, chars: &str) -> Result<Self> {
        Ok(Self {
            lines: parse_count("lines", lines)?,
            words: parse_count("words", words)?,
            chars: parse_count("chars", chars)?,
        })
    }

    /// Numeric feature columns, in encoded order
    pub fn as_features(&self) -> [f64; 3] {
        [self.lines as f64, self.words as f64, self.chars as f64]
    }
}

fn parse_count(name: &'static str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| PredictorError::InvalidArgument {
            name,
            value: value.to_string(),
        })
}

/// One rated historical run of a model against a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub model_name: String,
    pub stats: PromptStats,
    /// Seconds
    pub execution_time: f64,
    /// User rating on the 0-5 scale
    pub user_rating: f64,
}

impl Observation {
    pub fn feature_row(&self) -> FeatureRow {
        FeatureRow {
            model_name: self.model_name.clone(),
            stats: self.stats,
        }
    }
}

/// Raw, not yet encoded input for an estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub model_name: String,
    pub stats: PromptStats,
}

impl FeatureRow {
    pub fn new(model_name: impl Into<String>, stats: PromptStats) -> Self {
        Self {
            model_name: model_name.into(),
            stats,
        }
    }
}

/// Predicted outcome of running one catalog model on a prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPrediction {
    pub model_name: String,
    pub predicted_time: f64,
    pub predicted_quality: f64,
}
