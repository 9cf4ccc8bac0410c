//! Prediction output post-processing
//!
//! Raw regression output is unbounded. Quality is clamped onto the rating
//! scale and execution time is floored at zero before results are emitted.

use crate::models::ModelPrediction;

/// Lowest rating on the quality scale
pub const MIN_QUALITY: f64 = 0.0;

/// Highest rating on the quality scale
pub const MAX_QUALITY: f64 = 5.0;

/// Execution times below this are reported as this value
pub const MIN_TIME: f64 = 0.0;

/// Turns raw estimator outputs into [`ModelPrediction`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputFormatter;

impl OutputFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, model_name: &str, raw_time: f64, raw_quality: f64) -> ModelPrediction {
        ModelPrediction {
            model_name: model_name.to_string(),
            predicted_time: self.bound_time(raw_time),
            predicted_quality: self.clamp_quality(raw_quality),
        }
    }

    pub fn clamp_quality(&self, raw: f64) -> f64 {
        raw.clamp(MIN_QUALITY, MAX_QUALITY)
    }

    fn bound_time(&self, raw: f64) -> f64 {
        raw.max(MIN_TIME)
    }
}

/// `<model> <time:.2> <quality:.2>`, the line format consumed by scripts
pub fn format_line(prediction: &ModelPrediction) -> String {
    format!(
        "{} {:.2} {:.2}",
        prediction.model_name, prediction.predicted_time, prediction.predicted_quality
    )
}
