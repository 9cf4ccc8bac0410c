//! Train command

use anyhow::Result;
use predictor_lib::{PredictorConfig, Trainer};
use std::path::Path;

use crate::output::{print_info, print_success};

/// Fit both models on `trainfile` and write them under `prefix`
pub fn run(config: &PredictorConfig, trainfile: &Path, prefix: &Path) -> Result<()> {
    let report = Trainer::from_config(config).train(trainfile, prefix)?;

    print_success(&format!(
        "Models trained and saved with prefix '{}'",
        prefix.display()
    ));
    print_info(&format!(
        "Rows used: {} of {} ({} unrated)",
        report.rows_used, report.total_rows, report.unrated_rows
    ));
    print_info(&format!(
        "Strategies: time={}, quality={}",
        report.time_strategy, report.quality_strategy
    ));
    print_info(&format!("Known models: {}", report.categories.join(", ")));
    Ok(())
}
