//! Catalog-wide prediction from persisted estimators

use super::output::OutputFormatter;
use crate::artifact::{load_estimator, ArtifactPaths};
use crate::catalog::ModelCatalog;
use crate::error::{PredictorError, Result};
use crate::estimator::{Estimator, Target};
use crate::models::{FeatureRow, ModelPrediction, PromptStats};
use crate::trainer::TrainedModels;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Time and quality estimators loaded for prediction
pub struct Predictor {
    time: Estimator,
    quality: Estimator,
    output_formatter: OutputFormatter,
}

impl Predictor {
    /// Load both model files for `prefix`
    pub fn load(prefix: impl AsRef<Path>) -> Result<Self> {
        let paths = ArtifactPaths::from_prefix(prefix);
        if !paths.all_exist() {
            return Err(PredictorError::ArtifactNotFound {
                time_path: paths.time.clone(),
                quality_path: paths.quality.clone(),
            });
        }

        let (time_header, time) = load_estimator(&paths.time, Target::Time)?;
        let (quality_header, quality) = load_estimator(&paths.quality, Target::Quality)?;

        info!(
            time_strategy = %time.strategy(),
            quality_strategy = %quality.strategy(),
            time_rows = time_header.training_rows,
            quality_rows = quality_header.training_rows,
            "Models loaded"
        );
        Ok(Self::new(time, quality))
    }

    pub fn new(time: Estimator, quality: Estimator) -> Self {
        Self {
            time,
            quality,
            output_formatter: OutputFormatter::new(),
        }
    }

    pub fn time_estimator(&self) -> &Estimator {
        &self.time
    }

    pub fn quality_estimator(&self) -> &Estimator {
        &self.quality
    }

    /// One prediction per catalog entry, in catalog order
    pub fn predict(&self, catalog: &ModelCatalog, stats: PromptStats) -> Vec<ModelPrediction> {
        let start = Instant::now();

        for model in catalog.iter() {
            let unseen_by: Vec<&str> = [&self.time, &self.quality]
                .into_iter()
                .filter(|e| !e.encoder().is_known(model))
                .map(|e| e.target().as_str())
                .collect();
            if !unseen_by.is_empty() {
                warn!(
                    model,
                    estimators = ?unseen_by,
                    "Model absent from training data, predicting without model identity"
                );
            }
        }

        let rows: Vec<FeatureRow> = catalog
            .iter()
            .map(|model| FeatureRow::new(model, stats))
            .collect();
        let times = self.time.predict(&rows);
        let qualities = self.quality.predict(&rows);

        let predictions: Vec<ModelPrediction> = rows
            .iter()
            .zip(times.iter().zip(qualities.iter()))
            .map(|(row, (&t, &q))| self.output_formatter.format(&row.model_name, t, q))
            .collect();

        debug!(
            models = predictions.len(),
            elapsed_us = start.elapsed().as_micros(),
            "Predictions generated"
        );
        predictions
    }
}

impl From<TrainedModels> for Predictor {
    fn from(models: TrainedModels) -> Self {
        Self::new(models.time, models.quality)
    }
}
