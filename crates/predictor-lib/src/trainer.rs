//! Training orchestration
//!
//! Parses the record file, fits one estimator per target and persists both.
//! The two model files are staged first and renamed into place as a pair. If
//! the second rename fails the first file is restored, so a failed run never
//! leaves a mismatched pair behind.

use crate::artifact::{commit_pair, stage_estimator, ArtifactPaths};
use crate::config::PredictorConfig;
use crate::error::{PredictorError, Result};
use crate::estimator::{Estimator, FeatureEncoder, RegressionStrategy, Target};
use crate::models::{FeatureRow, Observation};
use crate::records::{RecordParser, TrainingSet};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Estimators fitted on the same training set
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModels {
    pub time: Estimator,
    pub quality: Estimator,
}

/// Summary of a completed training run
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// Rated rows the estimators were fitted on
    pub rows_used: usize,
    pub total_rows: usize,
    pub unrated_rows: usize,
    pub paths: ArtifactPaths,
    pub time_strategy: RegressionStrategy,
    pub quality_strategy: RegressionStrategy,
    /// Model names seen during training, sorted
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Trainer {
    time_strategy: RegressionStrategy,
    quality_strategy: RegressionStrategy,
}

impl Trainer {
    pub fn new(time_strategy: RegressionStrategy, quality_strategy: RegressionStrategy) -> Self {
        Self {
            time_strategy,
            quality_strategy,
        }
    }

    pub fn from_config(config: &PredictorConfig) -> Self {
        Self::new(config.time_strategy, config.quality_strategy)
    }

    pub fn time_strategy(&self) -> RegressionStrategy {
        self.time_strategy
    }

    pub fn quality_strategy(&self) -> RegressionStrategy {
        self.quality_strategy
    }

    /// Fit both estimators; each gets its own encoder fitted on the same rows
    pub fn fit(&self, set: &TrainingSet) -> Result<TrainedModels> {
        if set.is_empty() {
            return Err(PredictorError::Training(
                "no rated observations to fit".to_string(),
            ));
        }

        Ok(TrainedModels {
            time: fit_target(Target::Time, self.time_strategy, &set.observations)?,
            quality: fit_target(Target::Quality, self.quality_strategy, &set.observations)?,
        })
    }

    /// Train from `data_path` and write `<prefix>_time_model.json` and
    /// `<prefix>_quality_model.json`
    pub fn train(&self, data_path: impl AsRef<Path>, prefix: impl AsRef<Path>) -> Result<TrainingReport> {
        let start = Instant::now();
        let set = RecordParser::new(data_path.as_ref()).parse()?;
        let models = self.fit(&set)?;

        let paths = ArtifactPaths::from_prefix(prefix);
        let rows = set.len();
        let time = stage_estimator(&paths.time, &models.time, rows)?;
        let quality = stage_estimator(&paths.quality, &models.quality, rows)?;
        commit_pair(time, quality)?;

        info!(
            rows,
            time_path = %paths.time.display(),
            quality_path = %paths.quality.display(),
            elapsed_ms = start.elapsed().as_millis(),
            "Training complete"
        );

        Ok(TrainingReport {
            rows_used: rows,
            total_rows: set.total_rows,
            unrated_rows: set.unrated_rows,
            paths,
            time_strategy: self.time_strategy,
            quality_strategy: self.quality_strategy,
            categories: models.time.encoder().categories().to_vec(),
        })
    }
}

fn fit_target(
    target: Target,
    strategy: RegressionStrategy,
    observations: &[Observation],
) -> Result<Estimator> {
    let rows: Vec<FeatureRow> = observations.iter().map(Observation::feature_row).collect();
    Estimator::fit(target, strategy, FeatureEncoder::fit(&rows), observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PromptStats;

    fn observation(name: &str, lines: u64, time: f64, rating: f64) -> Observation {
        Observation {
            model_name: name.to_string(),
            stats: PromptStats::new(lines, lines * 4, lines * 17),
            execution_time: time,
            user_rating: rating,
        }
    }

    fn training_set() -> TrainingSet {
        let observations = vec![
            observation("b", 3, 1.0, 4.0),
            observation("a", 5, 2.0, 3.0),
            observation("b", 9, 3.5, 2.0),
        ];
        TrainingSet {
            total_rows: observations.len(),
            unrated_rows: 0,
            observations,
        }
    }

    #[test]
    fn test_fit_uses_configured_strategies() {
        let trainer = Trainer::new(RegressionStrategy::Linear, RegressionStrategy::Boosted);
        let models = trainer.fit(&training_set()).unwrap();
        assert_eq!(models.time.target(), Target::Time);
        assert_eq!(models.time.strategy(), RegressionStrategy::Linear);
        assert_eq!(models.quality.target(), Target::Quality);
        assert_eq!(models.quality.strategy(), RegressionStrategy::Boosted);
    }

    #[test]
    fn test_targets_encode_same_categories() {
        let models = Trainer::default().fit(&training_set()).unwrap();
        assert_eq!(models.time.encoder().categories(), ["a", "b"]);
        assert_eq!(models.time.encoder(), models.quality.encoder());
    }

    #[test]
    fn test_fit_rejects_empty_set() {
        let err = Trainer::default().fit(&TrainingSet::default()).unwrap_err();
        assert!(matches!(err, PredictorError::Training(_)));
    }

    #[test]
    fn test_from_config() {
        let config = PredictorConfig {
            time_strategy: RegressionStrategy::SupportVector,
            quality_strategy: RegressionStrategy::Robust,
            ..PredictorConfig::default()
        };
        let trainer = Trainer::from_config(&config);
        assert_eq!(trainer.time_strategy(), RegressionStrategy::SupportVector);
        assert_eq!(trainer.quality_strategy(), RegressionStrategy::Robust);
    }

    #[test]
    fn test_failed_quality_write_keeps_previous_time_model() {
        let dir = tempfile::TempDir::new().unwrap();
        let data = dir.path().join("history.txt");
        std::fs::write(&data, "a 1 4 17 1.0 4\nb 2 8 34 2.0 3\n").unwrap();
        let prefix = dir.path().join("m");
        let paths = ArtifactPaths::from_prefix(&prefix);

        Trainer::default().train(&data, &prefix).unwrap();
        let previous_time = std::fs::read(&paths.time).unwrap();

        std::fs::remove_file(&paths.quality).unwrap();
        std::fs::create_dir(&paths.quality).unwrap();
        std::fs::write(paths.quality.join("occupied"), b"x").unwrap();
        std::fs::write(&data, "a 1 4 17 9.0 1\nc 2 8 34 8.0 2\n").unwrap();

        let err = Trainer::new(RegressionStrategy::Linear, RegressionStrategy::Linear)
            .train(&data, &prefix)
            .unwrap_err();
        assert!(matches!(err, PredictorError::ArtifactWrite { .. }));
        assert_eq!(std::fs::read(&paths.time).unwrap(), previous_time);
    }
}
