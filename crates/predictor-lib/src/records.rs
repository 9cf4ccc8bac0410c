//! Historical record parsing
//!
//! Reads the whitespace-separated observation log:
//!
//! ```text
//! # model lines words chars execution_time user_rating
//! gemma3:1b 10 50 200 1.2 4
//! aya 3 12 80 0.7 ?
//! ```
//!
//! Everything after `#` is ignored and blank lines are skipped. Ratings that
//! do not parse as a finite number (`?` is the usual marker) leave the row
//! unrated, and unrated rows are dropped from the training set.

use crate::error::{PredictorError, Result};
use crate::models::{Observation, PromptStats};
use std::path::PathBuf;
use tracing::{debug, info};

/// Marker starting a comment
pub const COMMENT_MARKER: char = '#';

/// Marker for a run the user did not rate
pub const UNRATED_MARKER: &str = "?";

/// Number of columns per record
pub const NUM_COLUMNS: usize = 6;

/// Observations that survived rating filtering
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub observations: Vec<Observation>,
    /// Records read before filtering
    pub total_rows: usize,
    /// Records dropped for a missing or unparseable rating
    pub unrated_rows: usize,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }
}

/// Parses historical records into a [`TrainingSet`]
pub struct RecordParser {
    path: PathBuf,
}

impl RecordParser {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read and filter the file. Fails with `EmptyTrainingSet` when no rated
    /// row remains.
    pub fn parse(&self) -> Result<TrainingSet> {
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| PredictorError::data(&self.path, e.to_string()))?;
        let set = self.parse_str(&content)?;

        if set.is_empty() {
            return Err(PredictorError::EmptyTrainingSet {
                path: self.path.clone(),
            });
        }

        info!(
            path = %self.path.display(),
            total = set.total_rows,
            unrated = set.unrated_rows,
            used = set.len(),
            "Training data loaded"
        );
        Ok(set)
    }

    /// Parse already-read content. Does not apply the empty-set guard.
    pub fn parse_str(&self, content: &str) -> Result<TrainingSet> {
        let mut set = TrainingSet::default();

        for (idx, raw) in content.lines().enumerate() {
            let line = strip_comment(raw).trim();
            if line.is_empty() {
                continue;
            }
            let line_no = idx + 1;
            set.total_rows += 1;

            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != NUM_COLUMNS {
                return Err(PredictorError::data(
                    &self.path,
                    format!(
                        "line {}: expected {} fields, found {}",
                        line_no,
                        NUM_COLUMNS,
                        fields.len()
                    ),
                ));
            }

            let stats = PromptStats {
                lines: self.parse_count(fields[1], "lines", line_no)?,
                words: self.parse_count(fields[2], "words", line_no)?,
                chars: self.parse_count(fields[3], "chars", line_no)?,
            };
            let execution_time = self.parse_time(fields[4], line_no)?;

            match parse_rating(fields[5]) {
                Some(user_rating) => set.observations.push(Observation {
                    model_name: fields[0].to_string(),
                    stats,
                    execution_time,
                    user_rating,
                }),
                None => {
                    debug!(line = line_no, rating = fields[5], "Skipping unrated record");
                    set.unrated_rows += 1;
                }
            }
        }

        Ok(set)
    }

    fn parse_count(&self, value: &str, column: &str, line_no: usize) -> Result<u64> {
        value.parse::<u64>().map_err(|_| {
            PredictorError::data(
                &self.path,
                format!(
                    "line {}: {} must be a non-negative integer, got {:?}",
                    line_no, column, value
                ),
            )
        })
    }

    fn parse_time(&self, value: &str, line_no: usize) -> Result<f64> {
        match value.parse::<f64>() {
            Ok(t) if t.is_finite() && t >= 0.0 => Ok(t),
            _ => Err(PredictorError::data(
                &self.path,
                format!(
                    "line {}: execution_time must be a non-negative number, got {:?}",
                    line_no, value
                ),
            )),
        }
    }
}

fn strip_comment(line: &str) -> &str {
    match line.find(COMMENT_MARKER) {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// `None` for the unrated marker or anything that is not a finite number
pub fn parse_rating(value: &str) -> Option<f64> {
    if value == UNRATED_MARKER {
        return None;
    }
    value.parse::<f64>().ok().filter(|r| r.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> RecordParser {
        RecordParser::new("history.txt")
    }

    #[test]
    fn test_unrated_rows_dropped() {
        let content = "modelA 10 50 200 1.2 4\nmodelA 20 80 300 2.1 3\nmodelB 10 50 200 0.9 ?\n";
        let set = parser().parse_str(content).unwrap();
        assert_eq!(set.total_rows, 3);
        assert_eq!(set.unrated_rows, 1);
        assert_eq!(set.len(), 2);
        assert!(set.observations.iter().all(|o| o.model_name == "modelA"));
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let content = "# header\n\naya 1 2 3 0.5 5 # inline note\n   \n";
        let set = parser().parse_str(content).unwrap();
        assert_eq!(set.total_rows, 1);
        assert_eq!(set.observations[0].stats, PromptStats::new(1, 2, 3));
        assert_eq!(set.observations[0].user_rating, 5.0);
    }

    #[test]
    fn test_non_numeric_ratings_are_unrated() {
        assert_eq!(parse_rating("?"), None);
        assert_eq!(parse_rating("n/a"), None);
        assert_eq!(parse_rating("NaN"), None);
        assert_eq!(parse_rating("inf"), None);
        assert_eq!(parse_rating("3.5"), Some(3.5));
    }

    #[test]
    fn test_filtered_size_matches_total_minus_unrated() {
        let content = "a 1 1 1 1 1\nb 1 1 1 1 x\nc 1 1 1 1 2\nd 1 1 1 1 ?\ne 1 1 1 1 0\n";
        let set = parser().parse_str(content).unwrap();
        assert_eq!(set.len(), set.total_rows - set.unrated_rows);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_wrong_field_count_is_data_error() {
        let err = parser().parse_str("a 1 1 1 1\n").unwrap_err();
        match err {
            PredictorError::Data { reason, .. } => assert!(reason.contains("line 1")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_bad_counts_and_times_are_data_errors() {
        assert!(matches!(
            parser().parse_str("a x 1 1 1 1\n"),
            Err(PredictorError::Data { .. })
        ));
        assert!(matches!(
            parser().parse_str("a -1 1 1 1 1\n"),
            Err(PredictorError::Data { .. })
        ));
        assert!(matches!(
            parser().parse_str("a 1 1 1 -0.5 1\n"),
            Err(PredictorError::Data { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_data_error() {
        let err = RecordParser::new("/nonexistent/history.txt").parse().unwrap_err();
        assert!(matches!(err, PredictorError::Data { .. }));
    }

    #[test]
    fn test_all_unrated_is_empty_training_set() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("history.txt");
        std::fs::write(&path, "a 1 1 1 1 ?\nb 2 2 2 2 ?\n").unwrap();
        let err = RecordParser::new(&path).parse().unwrap_err();
        assert!(matches!(err, PredictorError::EmptyTrainingSet { .. }));
    }
}
