use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use super::artifact::ClassifierArtifact;
use super::loader::load_first_existing;
use crate::error::InferenceError;

type Loader = Box<dyn Fn() -> Result<Arc<dyn ClassifierArtifact>, InferenceError> + Send + Sync>;

/// Owns the process's classifier. The artifact is loaded at most once, on
/// first use; a failed load is not cached, so the next call tries again.
pub struct ModelHandle {
    artifact: OnceLock<Arc<dyn ClassifierArtifact>>,
    init: Mutex<()>,
    loader: Loader,
}

impl ModelHandle {
    pub fn from_candidates(candidates: Vec<PathBuf>) -> Self {
        Self::with_loader(move || load_first_existing(&candidates).map(|(_, artifact)| artifact))
    }

    pub fn with_loader<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn ClassifierArtifact>, InferenceError> + Send + Sync + 'static,
    {
        Self {
            artifact: OnceLock::new(),
            init: Mutex::new(()),
            loader: Box::new(loader),
        }
    }

    pub fn preloaded(artifact: Arc<dyn ClassifierArtifact>) -> Self {
        Self {
            artifact: OnceLock::from(artifact),
            init: Mutex::new(()),
            loader: Box::new(|| {
                Err(InferenceError::ModelUnavailable { tried: Vec::new() })
            }),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.artifact.get().is_some()
    }

    pub fn get(&self) -> Result<Arc<dyn ClassifierArtifact>, InferenceError> {
        if let Some(artifact) = self.artifact.get() {
            return Ok(artifact.clone());
        }

        let _guard = self.init.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(artifact) = self.artifact.get() {
            return Ok(artifact.clone());
        }

        let artifact = (self.loader)()?;
        let _ = self.artifact.set(artifact.clone());
        Ok(artifact)
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle").field("loaded", &self.is_loaded()).finish()
    }
}
