//! Predictor configuration

use crate::catalog::{ModelCatalog, KNOWN_MODELS};
use crate::error::{PredictorError, Result};
use crate::estimator::RegressionStrategy;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Settings shared by training and prediction
#[derive(Debug, Clone, Deserialize)]
pub struct PredictorConfig {
    /// Regression strategy for execution time
    #[serde(default)]
    pub time_strategy: RegressionStrategy,

    /// Regression strategy for quality rating
    #[serde(default)]
    pub quality_strategy: RegressionStrategy,

    /// Model names to predict for
    #[serde(default = "default_catalog")]
    pub catalog: Vec<String>,
}

fn default_catalog() -> Vec<String> {
    KNOWN_MODELS.iter().map(|m| m.to_string()).collect()
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            time_strategy: RegressionStrategy::default(),
            quality_strategy: RegressionStrategy::default(),
            catalog: default_catalog(),
        }
    }
}

impl PredictorConfig {
    /// Load from a TOML/JSON/YAML file, or defaults when no file is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let config: Self = config::Config::builder()
            .add_source(config::File::from(path).required(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| PredictorError::Config(format!("{}: {}", path.display(), e)))?;

        // Reject a bad catalog at load time rather than at first prediction
        config.model_catalog()?;

        info!(
            path = %path.display(),
            time_strategy = %config.time_strategy,
            quality_strategy = %config.quality_strategy,
            catalog = config.catalog.len(),
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn model_catalog(&self) -> Result<ModelCatalog> {
        ModelCatalog::new(self.catalog.iter().cloned())
    }
}
