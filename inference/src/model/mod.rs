pub mod adapter;
pub mod artifact;
pub mod boosting;
pub mod forest;
pub mod handle;
pub mod loader;
pub mod tree;

pub use adapter::{ClassificationResult, ClassifierAdapter, PredictedLabel};
pub use artifact::ClassifierArtifact;
pub use handle::ModelHandle;
pub use loader::{ArtifactFile, default_candidates, load_artifact, load_first_existing};
