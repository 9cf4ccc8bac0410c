//! Known-model catalog
//!
//! The set of model names predictions are generated for. It is independent
//! of the names seen in training data; entries the estimators never saw are
//! predicted with the unknown-category encoding.

use crate::error::{PredictorError, Result};
use std::collections::HashSet;

/// Built-in catalog, in output order
pub const KNOWN_MODELS: &[&str] = &[
    "gemma3:1b",
    "gemma3:4b",
    "gemma3:12b",
    "aya",
    "aya-expanse",
    "llama2",
    "codellama",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCatalog {
    models: Vec<String>,
}

impl ModelCatalog {
    /// Build a catalog, dropping repeated names but keeping first-seen order
    pub fn new<I, S>(models: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for model in models {
            let model: String = model.into();
            let model = model.trim().to_string();
            if model.is_empty() || model.chars().any(char::is_whitespace) {
                return Err(PredictorError::Config(format!(
                    "invalid model name {:?} in catalog",
                    model
                )));
            }
            if seen.insert(model.clone()) {
                unique.push(model);
            }
        }

        if unique.is_empty() {
            return Err(PredictorError::Config("model catalog is empty".to_string()));
        }
        Ok(Self { models: unique })
    }

    pub fn builtin() -> Self {
        Self {
            models: KNOWN_MODELS.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let catalog = ModelCatalog::builtin();
        assert_eq!(catalog.len(), KNOWN_MODELS.len());
        assert_eq!(catalog.iter().next(), Some("gemma3:1b"));
        assert_eq!(catalog.iter().last(), Some("codellama"));
    }

    #[test]
    fn test_duplicates_removed_in_order() {
        let catalog = ModelCatalog::new(["b", "a", "b", "c"]).unwrap();
        assert_eq!(catalog.models(), &["b", "a", "c"]);
    }

    #[test]
    fn test_empty_and_blank_rejected() {
        assert!(ModelCatalog::new(Vec::<String>::new()).is_err());
        assert!(ModelCatalog::new(["ok", "  "]).is_err());
        assert!(ModelCatalog::new(["two words"]).is_err());
    }
}
