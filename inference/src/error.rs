use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),
    #[error("Model unavailable: no artifact found at any of {}", display_paths(.tried))]
    ModelUnavailable { tried: Vec<PathBuf> },
    #[error("Failed to load model artifact {}: {reason}", .path.display())]
    ModelLoad { path: PathBuf, reason: String },
    #[error("Prediction error: {0}")]
    Prediction(String),
}

impl From<image::ImageError> for InferenceError {
    fn from(err: image::ImageError) -> Self {
        InferenceError::InvalidImage(err.to_string())
    }
}

impl From<base64::DecodeError> for InferenceError {
    fn from(err: base64::DecodeError) -> Self {
        InferenceError::InvalidImage(format!("base64 decoding failed: {}", err))
    }
}

impl From<ndarray::ShapeError> for InferenceError {
    fn from(err: ndarray::ShapeError) -> Self {
        InferenceError::Prediction(err.to_string())
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    if paths.is_empty() {
        return "[]".to_string();
    }
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
