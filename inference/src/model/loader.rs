use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::artifact::ClassifierArtifact;
use super::boosting::GradientBoosting;
use super::forest::RandomForest;
use crate::error::InferenceError;

/// Candidate artifact locations relative to the working directory, in priority order.
pub const DEFAULT_CANDIDATES: [&str; 3] = [
    "scripts/rf_defungi.json",
    "rf_defungi.json",
    "scripts/best_xgb_defungi.json",
];

pub fn default_candidates() -> Vec<PathBuf> {
    DEFAULT_CANDIDATES.iter().map(PathBuf::from).collect()
}

/// On-disk artifact formats, tagged by `"type"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ArtifactFile {
    RandomForest(RandomForest),
    GradientBoosting(GradientBoosting),
}

impl ArtifactFile {
    pub fn into_artifact(self) -> Result<Arc<dyn ClassifierArtifact>, String> {
        match self {
            ArtifactFile::RandomForest(forest) => {
                forest.validate()?;
                Ok(Arc::new(forest))
            }
            ArtifactFile::GradientBoosting(model) => {
                model.validate()?;
                Ok(Arc::new(model))
            }
        }
    }
}

pub fn load_artifact(path: &Path) -> Result<Arc<dyn ClassifierArtifact>, InferenceError> {
    let load_err = |reason: String| InferenceError::ModelLoad { path: path.to_path_buf(), reason };

    let file = File::open(path).map_err(|e| load_err(e.to_string()))?;
    let parsed: ArtifactFile =
        serde_json::from_reader(BufReader::new(file)).map_err(|e| load_err(e.to_string()))?;
    parsed.into_artifact().map_err(load_err)
}

/// Loads the first candidate that exists on disk.
///
/// A candidate that exists but fails to parse is an error; later candidates
/// are only consulted when earlier ones are absent.
pub fn load_first_existing(
    candidates: &[PathBuf],
) -> Result<(PathBuf, Arc<dyn ClassifierArtifact>), InferenceError> {
    for path in candidates {
        if !path.exists() {
            log::debug!("No model artifact at {}", path.display());
            continue;
        }
        let artifact = load_artifact(path)?;
        log::info!("Loaded model artifact from {}", path.display());
        return Ok((path.clone(), artifact));
    }
    Err(InferenceError::ModelUnavailable { tried: candidates.to_vec() })
}
