use std::fmt;

use shared::{ClassProbability, ClassifyResponse, FeatureBreakdown, FungiSpecies, UNCLASSIFIED_LABEL};
use strum::{EnumCount, IntoEnumIterator};

use super::artifact::ClassifierArtifact;
use crate::error::InferenceError;
use crate::features::{FEATURE_LEN, FeatureBlocks, FeatureVector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictedLabel {
    Species(FungiSpecies),
    Unclassifiable,
}

impl PredictedLabel {
    pub fn from_index(index: i64) -> Self {
        match FungiSpecies::from_index(index) {
            Some(species) => PredictedLabel::Species(species),
            None => PredictedLabel::Unclassifiable,
        }
    }
}

impl fmt::Display for PredictedLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictedLabel::Species(species) => write!(f, "{}", species),
            PredictedLabel::Unclassifiable => f.write_str(UNCLASSIFIED_LABEL),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub label: PredictedLabel,
    pub class_index: i64,
    pub confidence: f64,
    pub probabilities: Vec<f64>,
    pub features: Option<FeatureBlocks>,
}

impl ClassificationResult {
    /// Probabilities paired with species names, when the artifact reports one
    /// column per entry of the species table.
    pub fn labeled_probabilities(&self) -> Option<Vec<ClassProbability>> {
        if self.probabilities.len() != FungiSpecies::COUNT {
            return None;
        }
        Some(
            FungiSpecies::iter()
                .zip(&self.probabilities)
                .map(|(species, &probability)| ClassProbability {
                    label: species.to_string(),
                    probability,
                })
                .collect(),
        )
    }

    pub fn to_response(&self, include_probabilities: bool) -> ClassifyResponse {
        ClassifyResponse {
            class: self.label.to_string(),
            confidence: self.confidence,
            probabilities: if include_probabilities { self.labeled_probabilities() } else { None },
            features: self.features.as_ref().map(FeatureBreakdown::from),
        }
    }
}

/// Runs a feature vector through an artifact and interprets the answer.
pub struct ClassifierAdapter<'a> {
    artifact: &'a dyn ClassifierArtifact,
}

impl<'a> ClassifierAdapter<'a> {
    pub fn new(artifact: &'a dyn ClassifierArtifact) -> Self {
        Self { artifact }
    }

    pub fn classify(&self, vector: &FeatureVector) -> Result<ClassificationResult, InferenceError> {
        if vector.len() != FEATURE_LEN {
            return Err(InferenceError::InvalidImage(format!(
                "feature vector has {} values, expected {}",
                vector.len(),
                FEATURE_LEN
            )));
        }
        let batch = vector.to_batch()?;

        let class_index = *self
            .artifact
            .predict(batch.view())?
            .first()
            .ok_or_else(|| InferenceError::Prediction("artifact returned no prediction".to_string()))?;

        let proba = self.artifact.predict_proba(batch.view())?;
        if proba.nrows() == 0 || proba.ncols() == 0 {
            return Err(InferenceError::Prediction("artifact returned no probabilities".to_string()));
        }
        let probabilities = proba.row(0).to_vec();
        let confidence = probabilities.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        // Indices outside the species table yield the sentinel label instead of
        // an error. Callers rely on always getting a label string back, so keep
        // this soft.
        let label = PredictedLabel::from_index(class_index);
        if label == PredictedLabel::Unclassifiable {
            log::warn!("Classifier returned index {} outside the species table", class_index);
        }

        Ok(ClassificationResult {
            label,
            class_index,
            confidence,
            probabilities,
            features: None,
        })
    }
}
