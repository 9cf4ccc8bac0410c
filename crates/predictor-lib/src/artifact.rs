//! Model file persistence
//!
//! Each fitted estimator is stored as one JSON document:
//! - Header: format version, target, strategy, training timestamp and row count
//! - `checksum`: hex SHA-256 of `payload`
//! - `payload`: the serialized estimator (encoder categories + regressor)
//!
//! Files are written to a `.tmp` sibling and renamed into place, so readers
//! never observe a partially written model. A pair of files is committed
//! together: if the second rename fails, the first file is rolled back to its
//! previous contents from a `.prev` copy.

use crate::error::{PredictorError, Result};
use crate::estimator::{Estimator, RegressionStrategy, Target};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const TIME_MODEL_SUFFIX: &str = "_time_model.json";
pub const QUALITY_MODEL_SUFFIX: &str = "_quality_model.json";

/// Current model file layout version
pub const FORMAT_VERSION: u32 = 1;

/// The pair of model files belonging to one prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub time: PathBuf,
    pub quality: PathBuf,
}

impl ArtifactPaths {
    /// `<prefix>_time_model.json` and `<prefix>_quality_model.json`
    pub fn from_prefix(prefix: impl AsRef<Path>) -> Self {
        let prefix = prefix.as_ref().as_os_str();
        let with_suffix = |suffix: &str| {
            let mut name = prefix.to_owned();
            name.push(suffix);
            PathBuf::from(name)
        };
        Self {
            time: with_suffix(TIME_MODEL_SUFFIX),
            quality: with_suffix(QUALITY_MODEL_SUFFIX),
        }
    }

    pub fn for_target(&self, target: Target) -> &Path {
        match target {
            Target::Time => &self.time,
            Target::Quality => &self.quality,
        }
    }

    pub fn all_exist(&self) -> bool {
        self.time.is_file() && self.quality.is_file()
    }
}

/// Metadata stored alongside a fitted estimator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactHeader {
    pub format_version: u32,
    pub target: Target,
    pub strategy: RegressionStrategy,
    pub trained_at: DateTime<Utc>,
    pub training_rows: usize,
}

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactFile {
    #[serde(flatten)]
    header: ArtifactHeader,
    checksum: String,
    payload: String,
}

fn compute_checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// A model file written to its temporary location, not yet renamed into place.
/// Dropping it without [`StagedArtifact::commit`] removes the temporary file.
#[derive(Debug)]
pub struct StagedArtifact {
    temp_path: PathBuf,
    path: PathBuf,
    committed: bool,
}

impl StagedArtifact {
    /// Atomically replace the destination file
    pub fn commit(mut self) -> Result<PathBuf> {
        fs::rename(&self.temp_path, &self.path).map_err(|source| PredictorError::ArtifactWrite {
            path: self.path.clone(),
            source,
        })?;
        self.committed = true;
        debug!(path = %self.path.display(), "Model file committed");
        Ok(self.path.clone())
    }
}

impl Drop for StagedArtifact {
    fn drop(&mut self) {
        if !self.committed {
            match fs::remove_file(&self.temp_path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!(
                    path = %self.temp_path.display(),
                    error = %e,
                    "Failed to remove staged model file"
                ),
            }
        }
    }
}

fn sibling_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(extension);
    PathBuf::from(name)
}

fn temp_path_for(path: &Path) -> PathBuf {
    sibling_path(path, ".tmp")
}

fn backup_path_for(path: &Path) -> PathBuf {
    sibling_path(path, ".prev")
}

/// Commit two staged files so that either both replace their destinations
/// or `first`'s destination is left as it was
pub fn commit_pair(first: StagedArtifact, second: StagedArtifact) -> Result<()> {
    let first_path = first.path.clone();
    let backup = backup_path_for(&first_path);
    let had_previous = match fs::copy(&first_path, &backup) {
        Ok(_) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(source) => {
            return Err(PredictorError::ArtifactWrite {
                path: first_path,
                source,
            })
        }
    };

    let result = first.commit().and_then(|_| second.commit());
    let cleanup = if result.is_err() && had_previous {
        fs::rename(&backup, &first_path)
    } else if result.is_err() {
        fs::remove_file(&first_path)
    } else if had_previous {
        fs::remove_file(&backup)
    } else {
        Ok(())
    };

    match cleanup {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            path = %first_path.display(),
            error = %e,
            rolled_back = result.is_err(),
            "Failed to clean up after committing model files"
        ),
    }
    if result.is_err() {
        debug!(path = %first_path.display(), "Model file rolled back");
    }
    result.map(|_| ())
}

/// Serialize an estimator to the temporary sibling of `path`
pub fn stage_estimator(path: &Path, estimator: &Estimator, training_rows: usize) -> Result<StagedArtifact> {
    let write_err = |source: std::io::Error| PredictorError::ArtifactWrite {
        path: path.to_path_buf(),
        source,
    };

    let payload = serde_json::to_string(estimator)
        .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    let file = ArtifactFile {
        header: ArtifactHeader {
            format_version: FORMAT_VERSION,
            target: estimator.target(),
            strategy: estimator.strategy(),
            trained_at: Utc::now(),
            training_rows,
        },
        checksum: compute_checksum(payload.as_bytes()),
        payload,
    };
    let content = serde_json::to_vec_pretty(&file)
        .map_err(|e| write_err(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    let temp_path = temp_path_for(path);
    let staged = StagedArtifact {
        temp_path: temp_path.clone(),
        path: path.to_path_buf(),
        committed: false,
    };

    let mut out = File::create(&temp_path).map_err(write_err)?;
    out.write_all(&content).map_err(write_err)?;
    out.sync_all().map_err(write_err)?;

    debug!(
        path = %path.display(),
        target = %estimator.target(),
        bytes = content.len(),
        "Model file staged"
    );
    Ok(staged)
}

/// Write an estimator to `path`, replacing any existing file
pub fn save_estimator(path: &Path, estimator: &Estimator, training_rows: usize) -> Result<()> {
    stage_estimator(path, estimator, training_rows)?.commit()?;
    Ok(())
}

/// Load and verify the estimator stored at `path`
pub fn load_estimator(path: &Path, expected: Target) -> Result<(ArtifactHeader, Estimator)> {
    let content = fs::read(path).map_err(|e| PredictorError::corrupt(path, e.to_string()))?;
    let file: ArtifactFile = serde_json::from_slice(&content)
        .map_err(|e| PredictorError::corrupt(path, format!("invalid model file: {}", e)))?;

    if file.header.format_version != FORMAT_VERSION {
        return Err(PredictorError::corrupt(
            path,
            format!(
                "unsupported format version {} (expected {})",
                file.header.format_version, FORMAT_VERSION
            ),
        ));
    }

    let computed = compute_checksum(file.payload.as_bytes());
    if computed != file.checksum {
        return Err(PredictorError::corrupt(
            path,
            format!("checksum mismatch: expected {}, got {}", file.checksum, computed),
        ));
    }

    let estimator: Estimator = serde_json::from_str(&file.payload)
        .map_err(|e| PredictorError::corrupt(path, format!("invalid model payload: {}", e)))?;
    estimator
        .validate()
        .map_err(|reason| PredictorError::corrupt(path, format!("inconsistent model: {}", reason)))?;

    if estimator.target() != expected || file.header.target != expected {
        return Err(PredictorError::corrupt(
            path,
            format!(
                "file holds a {} model, expected {}",
                estimator.target(),
                expected
            ),
        ));
    }

    debug!(
        path = %path.display(),
        target = %expected,
        strategy = %estimator.strategy(),
        trained_at = %file.header.trained_at,
        "Model file loaded"
    );
    Ok((file.header, estimator))
}
