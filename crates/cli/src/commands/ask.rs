//! Ask command

use anyhow::Result;
use predictor_lib::{Predictor, PredictorConfig, PromptStats};
use std::path::Path;

use crate::output::{print_predictions, OutputFormat};

/// Predict for every catalog model; `counts` are the raw lines, words and chars
pub fn run(
    config: &PredictorConfig,
    prefix: &Path,
    counts: [&str; 3],
    format: OutputFormat,
) -> Result<()> {
    let [lines, words, chars] = counts;
    // Bad counts are reported before any model file is touched
    let stats = PromptStats::parse(lines, words, chars)?;
    let catalog = config.model_catalog()?;

    let predictor = Predictor::load(prefix)?;
    let predictions = predictor.predict(&catalog, stats);
    print_predictions(&predictions, format)
}
