use std::sync::Arc;
use std::time::Instant;

use crate::error::InferenceError;
use crate::features::FeatureBlocks;
use crate::model::{ClassificationResult, ClassifierAdapter, ModelHandle};
use crate::preprocess::{ImageSource, normalize};

/// Decode → resize → describe → classify, one synchronous call per image.
#[derive(Debug, Clone)]
pub struct InferenceService {
    model: Arc<ModelHandle>,
    include_features: bool,
}

impl InferenceService {
    pub fn new(model: Arc<ModelHandle>) -> Self {
        Self { model, include_features: false }
    }

    /// Attach the raw descriptor blocks to every result.
    pub fn with_features(mut self, include: bool) -> Self {
        self.include_features = include;
        self
    }

    pub fn model(&self) -> &ModelHandle {
        &self.model
    }

    pub fn classify(&self, source: ImageSource<'_>) -> Result<ClassificationResult, InferenceError> {
        let started = Instant::now();

        // Resolve the model first so a missing artifact fails before any image work.
        let artifact = self.model.get()?;

        let canonical = normalize(source)?;
        let blocks = FeatureBlocks::extract(&canonical);
        let vector = blocks.to_vector();
        log::debug!("Extracted {} features in {:?}", vector.len(), started.elapsed());

        let mut result = ClassifierAdapter::new(artifact.as_ref()).classify(&vector)?;
        if self.include_features {
            result.features = Some(blocks);
        }

        log::info!(
            "Classified image as {} (index {}, confidence {:.4}) in {:?}",
            result.label,
            result.class_index,
            result.confidence,
            started.elapsed()
        );
        Ok(result)
    }
}
