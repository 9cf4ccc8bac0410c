//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use predictor_lib::{format_line, ModelPrediction};
use tabled::{settings::Style, Table, Tabled};

/// Output format for predictions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One `<model> <time> <quality>` line per model (default)
    #[default]
    Plain,
    /// Table format
    Table,
    /// JSON format
    Json,
}

/// Log line format on stderr
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Row for the prediction table
#[derive(Tabled)]
struct PredictionRow {
    #[tabled(rename = "Model")]
    model: String,
    #[tabled(rename = "Time (s)")]
    time: String,
    #[tabled(rename = "Quality")]
    quality: String,
}

impl From<&ModelPrediction> for PredictionRow {
    fn from(p: &ModelPrediction) -> Self {
        Self {
            model: p.model_name.clone(),
            time: format!("{:.2}", p.predicted_time),
            quality: color_quality(p.predicted_quality),
        }
    }
}

/// Print predictions to stdout in the requested format
pub fn print_predictions(predictions: &[ModelPrediction], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Plain => {
            for p in predictions {
                println!("{}", format_line(p));
            }
        }
        OutputFormat::Table => {
            if predictions.is_empty() {
                println!("{}", "No models in catalog".yellow());
                return Ok(());
            }
            let rows: Vec<PredictionRow> = predictions.iter().map(PredictionRow::from).collect();
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(predictions)?);
        }
    }
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Color quality based on value
pub fn color_quality(quality: f64) -> String {
    let formatted = format!("{:.2}", quality);
    if quality >= 4.0 {
        formatted.green().to_string()
    } else if quality >= 2.5 {
        formatted.yellow().to_string()
    } else {
        formatted.red().to_string()
    }
}
