use ndarray::{Array2, ArrayView2};

use crate::error::InferenceError;

/// A pretrained classifier. Implementations are loaded once and shared
/// read-only between requests.
///
/// Rows of `batch` are feature vectors; columns of the `predict_proba`
/// result follow the artifact's class order.
pub trait ClassifierArtifact: Send + Sync {
    fn predict(&self, batch: ArrayView2<'_, f64>) -> Result<Vec<i64>, InferenceError>;

    fn predict_proba(&self, batch: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError>;
}

/// Index of the first maximum, as `numpy.argmax` picks it.
pub(crate) fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &v) in values.iter().enumerate() {
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

pub(crate) fn check_width(batch: &ArrayView2<'_, f64>, n_features: usize) -> Result<(), InferenceError> {
    if batch.ncols() != n_features {
        return Err(InferenceError::Prediction(format!(
            "artifact expects {} features per row, got {}",
            n_features,
            batch.ncols()
        )));
    }
    Ok(())
}
