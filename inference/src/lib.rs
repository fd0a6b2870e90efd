//! Feature extraction and classification core for microscopic fungi images.
//!
//! A request flows strictly one way: decode and resize to 256×256
//! ([`preprocess`]), compute the GLCM, LBP and HSV descriptors
//! ([`features`]), then run the 40-value vector through a pretrained
//! [`ClassifierArtifact`] ([`model`]). [`InferenceService`] ties the steps together.

pub mod error;
pub mod features;
pub mod model;
pub mod preprocess;
pub mod service;

pub use error::InferenceError;
pub use features::{FEATURE_LEN, FeatureBlocks, FeatureVector, aggregate, self_check};
pub use model::{
    ClassificationResult, ClassifierAdapter, ClassifierArtifact, ModelHandle, PredictedLabel,
};
pub use preprocess::{CanonicalImage, ImageSource, normalize};
pub use service::InferenceService;
