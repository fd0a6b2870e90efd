//! Texture and color descriptors and the fixed-order feature vector built from them.
//!
//! The block order below is what every deployed artifact was trained on:
//! GLCM (6) ++ LBP (10) ++ HSV (24). Reordering breaks predictions silently.

pub mod glcm;
pub mod hsv;
pub mod lbp;

use ndarray::Array2;
use shared::FeatureBreakdown;

use crate::error::InferenceError;
use crate::preprocess::CanonicalImage;

pub use glcm::{GLCM_LEN, glcm_features};
pub use hsv::{HSV_LEN, hsv_features};
pub use lbp::{LBP_LEN, lbp_features};

pub const FEATURE_LEN: usize = 40;

const _: () = assert!(GLCM_LEN + LBP_LEN + HSV_LEN == FEATURE_LEN);

/// The three descriptor blocks computed from one canonical image.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBlocks {
    pub glcm: [f64; GLCM_LEN],
    pub lbp: [f64; LBP_LEN],
    pub hsv: [f64; HSV_LEN],
}

impl FeatureBlocks {
    pub fn extract(image: &CanonicalImage) -> Self {
        let gray = image.to_gray();
        Self {
            glcm: glcm::glcm_from_gray(&gray),
            lbp: lbp::lbp_from_gray(&gray),
            hsv: hsv_features(image),
        }
    }

    pub fn to_vector(&self) -> FeatureVector {
        let mut values = Vec::with_capacity(FEATURE_LEN);
        values.extend_from_slice(&self.glcm);
        values.extend_from_slice(&self.lbp);
        values.extend_from_slice(&self.hsv);
        FeatureVector(values)
    }
}

impl From<&FeatureBlocks> for FeatureBreakdown {
    fn from(blocks: &FeatureBlocks) -> Self {
        FeatureBreakdown {
            glcm: blocks.glcm.to_vec(),
            lbp: blocks.lbp.to_vec(),
            hsv: blocks.hsv.to_vec(),
        }
    }
}

/// Exactly [`FEATURE_LEN`] values in block order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f64>);

impl FeatureVector {
    pub fn from_values(values: Vec<f64>) -> Result<Self, InferenceError> {
        if values.len() != FEATURE_LEN {
            return Err(InferenceError::InvalidImage(format!(
                "feature vector has {} values, expected {}",
                values.len(),
                FEATURE_LEN
            )));
        }
        Ok(Self(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Single-row batch of shape (1, 40), the input shape artifacts expect.
    pub fn to_batch(&self) -> Result<Array2<f64>, InferenceError> {
        Ok(Array2::from_shape_vec((1, self.0.len()), self.0.clone())?)
    }
}

pub fn aggregate(image: &CanonicalImage) -> FeatureVector {
    FeatureBlocks::extract(image).to_vector()
}

/// Runs the pipeline on a blank canonical image and checks the vector width.
pub fn self_check() -> Result<(), InferenceError> {
    let blank = CanonicalImage::blank();
    let vector = aggregate(&blank);
    if vector.len() != FEATURE_LEN {
        return Err(InferenceError::InvalidImage(format!(
            "feature pipeline produced {} values, expected {}",
            vector.len(),
            FEATURE_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::{ImageSource, normalize};
    use image::{DynamicImage, Rgb, RgbImage};

    fn canonical(img: RgbImage) -> CanonicalImage {
        normalize(ImageSource::Decoded(DynamicImage::ImageRgb8(img))).unwrap()
    }

    #[test]
    fn test_vector_layout() {
        let img = RgbImage::from_fn(64, 48, |x, y| Rgb([(x * 4) as u8, (y * 5) as u8, 128]));
        let image = canonical(img);
        let blocks = FeatureBlocks::extract(&image);
        let vector = blocks.to_vector();

        assert_eq!(vector.len(), FEATURE_LEN);
        assert_eq!(&vector.as_slice()[..6], &glcm_features(&image)[..]);
        assert_eq!(&vector.as_slice()[6..16], &lbp_features(&image)[..]);
        assert_eq!(&vector.as_slice()[16..], &hsv_features(&image)[..]);
    }

    #[test]
    fn test_batch_shape() {
        let batch = aggregate(&CanonicalImage::blank()).to_batch().unwrap();
        assert_eq!(batch.dim(), (1, FEATURE_LEN));
    }

    #[test]
    fn test_from_values_rejects_wrong_width() {
        assert!(FeatureVector::from_values(vec![0.0; 39]).is_err());
        assert!(FeatureVector::from_values(vec![0.0; FEATURE_LEN]).is_ok());
    }

    #[test]
    fn test_self_check_passes() {
        self_check().unwrap();
    }
}
