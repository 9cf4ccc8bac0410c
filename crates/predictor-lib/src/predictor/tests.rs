//! Predictor tests

use super::*;
use crate::artifact::ArtifactPaths;
use crate::catalog::ModelCatalog;
use crate::error::PredictorError;
use crate::estimator::RegressionStrategy;
use crate::models::PromptStats;
use crate::records::RecordParser;
use crate::trainer::Trainer;
use std::fs;
use tempfile::TempDir;

const HISTORY: &str = "\
modelA 10 50 200 1.2 4
modelA 20 80 300 2.1 3
modelB 10 50 200 0.9 ?
";

fn write_history(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("history.txt");
    fs::write(&path, HISTORY).unwrap();
    path
}

fn catalog() -> ModelCatalog {
    ModelCatalog::new(["modelA", "modelB"]).unwrap()
}

#[test]
fn test_train_then_predict() {
    let dir = TempDir::new().unwrap();
    let data = write_history(&dir);
    let prefix = dir.path().join("m");

    let report = Trainer::default().train(&data, &prefix).unwrap();
    assert_eq!(report.rows_used, 2);
    assert_eq!(report.total_rows, 3);
    assert_eq!(report.unrated_rows, 1);
    assert_eq!(report.categories, vec!["modelA".to_string()]);

    let predictor = Predictor::load(&prefix).unwrap();
    let predictions = predictor.predict(&catalog(), PromptStats::new(15, 60, 250));

    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[0].model_name, "modelA");
    assert_eq!(predictions[1].model_name, "modelB");
    for p in &predictions {
        assert!(p.predicted_time >= 0.0);
        assert!((0.0..=5.0).contains(&p.predicted_quality));
    }
}

#[test]
fn test_loaded_models_match_in_memory_models() {
    let dir = TempDir::new().unwrap();
    let data = write_history(&dir);
    let prefix = dir.path().join("m");

    for strategy in RegressionStrategy::ALL {
        let trainer = Trainer::new(strategy, strategy);
        trainer.train(&data, &prefix).unwrap();

        let set = RecordParser::new(&data).parse().unwrap();
        let in_memory = Predictor::from(trainer.fit(&set).unwrap());
        let loaded = Predictor::load(&prefix).unwrap();

        let stats = PromptStats::new(15, 60, 250);
        assert_eq!(
            in_memory.predict(&catalog(), stats),
            loaded.predict(&catalog(), stats),
            "{strategy} predictions changed across save/load"
        );
    }
}

#[test]
fn test_training_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let data = write_history(&dir);

    Trainer::default().train(&data, dir.path().join("first")).unwrap();
    Trainer::default().train(&data, dir.path().join("second")).unwrap();

    let first = Predictor::load(dir.path().join("first")).unwrap();
    let second = Predictor::load(dir.path().join("second")).unwrap();
    let stats = PromptStats::new(7, 33, 120);
    assert_eq!(first.predict(&catalog(), stats), second.predict(&catalog(), stats));
}

#[test]
fn test_all_unrated_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("history.txt");
    fs::write(&data, "modelA 1 2 3 0.5 ?\nmodelB 4 5 6 0.7 ?\n").unwrap();
    let prefix = dir.path().join("m");

    let err = Trainer::default().train(&data, &prefix).unwrap_err();
    assert!(matches!(err, PredictorError::EmptyTrainingSet { .. }));

    let paths = ArtifactPaths::from_prefix(&prefix);
    assert!(!paths.time.exists());
    assert!(!paths.quality.exists());
}

#[test]
fn test_missing_models() {
    let dir = TempDir::new().unwrap();
    let err = Predictor::load(dir.path().join("never_trained")).err().unwrap();
    assert!(matches!(err, PredictorError::ArtifactNotFound { .. }));
    assert!(err.to_string().contains("lmp train"));
}

#[test]
fn test_one_missing_model_file() {
    let dir = TempDir::new().unwrap();
    let data = write_history(&dir);
    let prefix = dir.path().join("m");
    Trainer::default().train(&data, &prefix).unwrap();
    fs::remove_file(ArtifactPaths::from_prefix(&prefix).quality).unwrap();

    assert!(matches!(
        Predictor::load(&prefix),
        Err(PredictorError::ArtifactNotFound { .. })
    ));
}

#[test]
fn test_retrain_replaces_models() {
    let dir = TempDir::new().unwrap();
    let data = write_history(&dir);
    let prefix = dir.path().join("m");

    Trainer::new(RegressionStrategy::Linear, RegressionStrategy::Linear)
        .train(&data, &prefix)
        .unwrap();
    Trainer::new(RegressionStrategy::Boosted, RegressionStrategy::Robust)
        .train(&data, &prefix)
        .unwrap();

    let predictor = Predictor::load(&prefix).unwrap();
    assert_eq!(predictor.time_estimator().strategy(), RegressionStrategy::Boosted);
    assert_eq!(predictor.quality_estimator().strategy(), RegressionStrategy::Robust);
}

#[test]
fn test_extreme_predictions_are_clamped() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("history.txt");
    // Rating falls steeply with prompt size, so a huge prompt extrapolates below zero
    fs::write(
        &data,
        "m 1 1 1 0.1 5\nm 2 2 2 0.2 4\nm 3 3 3 0.3 3\nm 4 4 4 0.4 2\n",
    )
    .unwrap();
    let prefix = dir.path().join("m");
    Trainer::new(RegressionStrategy::Linear, RegressionStrategy::Linear)
        .train(&data, &prefix)
        .unwrap();

    let predictor = Predictor::load(&prefix).unwrap();
    let catalog = ModelCatalog::new(["m"]).unwrap();

    let low = predictor.predict(&catalog, PromptStats::new(100, 100, 100));
    assert_eq!(low[0].predicted_quality, 0.0);

    let high = predictor.predict(&catalog, PromptStats::new(0, 0, 0));
    assert!(high[0].predicted_quality <= MAX_QUALITY);
}
