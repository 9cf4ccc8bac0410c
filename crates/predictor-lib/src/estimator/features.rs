//! Feature encoding for the regression estimators
//!
//! A row is laid out as a one-hot block over the model names seen at
//! training time (sorted), followed by the numeric prompt statistics:
//!
//! ```text
//! [ is_model_0, ..., is_model_k-1, lines, words, chars ]
//! ```
//!
//! The category set is fixed when the encoder is fitted and persisted with
//! the estimator. Names outside it encode as an all-zero block.

use crate::models::FeatureRow;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Number of numeric columns appended after the categorical block
pub const NUM_NUMERIC_FEATURES: usize = 3;

/// Fitted one-hot encoder for the model-name column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureEncoder {
    categories: Vec<String>,
}

impl FeatureEncoder {
    /// Learn the category set from training rows
    pub fn fit(rows: &[FeatureRow]) -> Self {
        Self::from_categories(rows.iter().map(|r| r.model_name.clone()))
    }

    pub fn from_categories(categories: impl IntoIterator<Item = String>) -> Self {
        let categories: BTreeSet<String> = categories.into_iter().collect();
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// Total encoded width
    pub fn width(&self) -> usize {
        self.categories.len() + NUM_NUMERIC_FEATURES
    }

    pub fn is_known(&self, model_name: &str) -> bool {
        self.category_index(model_name).is_some()
    }

    fn category_index(&self, model_name: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(model_name))
            .ok()
    }

    /// Categories must be strictly sorted for the index lookup to find them
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self.categories.windows(2).find(|w| w[0] >= w[1]) {
            Some(w) => Err(format!(
                "categories are not sorted and unique at {:?}, {:?}",
                w[0], w[1]
            )),
            None => Ok(()),
        }
    }

    /// Encode rows into a dense `rows x width` matrix
    pub fn transform(&self, rows: &[FeatureRow]) -> Array2<f64> {
        let width = self.width();
        let offset = self.categories.len();
        let mut matrix = Array2::zeros((rows.len(), width));

        for (mut out, row) in matrix.rows_mut().into_iter().zip(rows) {
            if let Some(idx) = self.category_index(&row.model_name) {
                out[idx] = 1.0;
            }
            for (j, value) in row.stats.as_features().into_iter().enumerate() {
                out[offset + j] = value;
            }
        }

        matrix
    }
}
