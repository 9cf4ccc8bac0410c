//! Prediction engine

mod inference;
mod output;

#[cfg(test)]
mod tests;

pub use inference::Predictor;
pub use output::{format_line, OutputFormatter, MAX_QUALITY, MIN_QUALITY, MIN_TIME};
