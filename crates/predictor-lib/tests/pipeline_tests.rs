//! End-to-end tests for training and prediction through the public API

use predictor_lib::artifact::ArtifactPaths;
use predictor_lib::{
    format_line, ModelCatalog, Predictor, PredictorConfig, PredictorError, PromptStats,
    RegressionStrategy, Trainer,
};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

const HISTORY: &str = "\
# model lines words chars execution_time user_rating
gemma3:1b 10 50 200 1.2 4
gemma3:1b 22 110 480 2.4 4   # long prompt
gemma3:4b 10 50 200 2.0 5
gemma3:4b 30 140 650 4.9 4

aya 5 20 90 0.6 2
aya 12 60 260 1.1 ?
llama2 8 41 170 1.9 3
";

#[test]
fn test_builtin_catalog_prediction() {
    let dir = TempDir::new().unwrap();
    let data = write_file(dir.path(), "history.txt", HISTORY);
    let prefix = dir.path().join("models/run");
    fs::create_dir_all(dir.path().join("models")).unwrap();

    let report = Trainer::default().train(&data, &prefix).unwrap();
    assert_eq!(report.rows_used, 6);
    assert_eq!(report.unrated_rows, 1);
    assert_eq!(report.categories, ["aya", "gemma3:1b", "gemma3:4b", "llama2"]);

    let predictor = Predictor::load(&prefix).unwrap();
    let catalog = ModelCatalog::builtin();
    let predictions = predictor.predict(&catalog, PromptStats::new(15, 60, 250));

    let names: Vec<&str> = predictions.iter().map(|p| p.model_name.as_str()).collect();
    assert_eq!(names, catalog.models());
    for p in &predictions {
        let line = format_line(p);
        let fields: Vec<&str> = line.split(' ').collect();
        assert_eq!(fields.len(), 3, "bad line {line:?}");
        assert_eq!(fields[1].split('.').nth(1).map(str::len), Some(2));
        assert_eq!(fields[2].split('.').nth(1).map(str::len), Some(2));
    }
}

#[test]
fn test_config_selects_strategies_and_catalog() {
    let dir = TempDir::new().unwrap();
    let data = write_file(dir.path(), "history.txt", HISTORY);
    let config_path = write_file(
        dir.path(),
        "lmp.toml",
        "time_strategy = \"linear\"\nquality_strategy = \"robust\"\ncatalog = [\"aya\", \"mistral\"]\n",
    );
    let config = PredictorConfig::load(Some(config_path.as_path())).unwrap();
    let prefix = dir.path().join("cfg");

    let report = Trainer::from_config(&config).train(&data, &prefix).unwrap();
    assert_eq!(report.time_strategy, RegressionStrategy::Linear);
    assert_eq!(report.quality_strategy, RegressionStrategy::Robust);

    let predictions = Predictor::load(&prefix)
        .unwrap()
        .predict(&config.model_catalog().unwrap(), PromptStats::new(3, 9, 40));
    assert_eq!(predictions.len(), 2);
    assert_eq!(predictions[1].model_name, "mistral");
    assert!(predictions[1].predicted_quality.is_finite());
}

#[test]
fn test_malformed_row_reports_line() {
    let dir = TempDir::new().unwrap();
    let data = write_file(dir.path(), "bad.txt", "aya 1 2 3 0.5 4\naya 1 2 0.5 4\n");

    let err = Trainer::default()
        .train(&data, dir.path().join("m"))
        .unwrap_err();
    match &err {
        PredictorError::Data { reason, .. } => assert!(reason.contains("line 2"), "{reason}"),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!ArtifactPaths::from_prefix(dir.path().join("m")).time.exists());
}

#[test]
fn test_missing_training_file() {
    let dir = TempDir::new().unwrap();
    let err = Trainer::default()
        .train(dir.path().join("absent.txt"), dir.path().join("m"))
        .unwrap_err();
    assert!(matches!(err, PredictorError::Data { .. }));
}

#[test]
fn test_corrupt_model_file() {
    let dir = TempDir::new().unwrap();
    let data = write_file(dir.path(), "history.txt", HISTORY);
    let prefix = dir.path().join("m");
    Trainer::default().train(&data, &prefix).unwrap();

    fs::write(ArtifactPaths::from_prefix(&prefix).time, "{}").unwrap();
    assert!(matches!(
        Predictor::load(&prefix),
        Err(PredictorError::ArtifactCorrupt { .. })
    ));
}
