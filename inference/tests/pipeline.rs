use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use defungi_inference::features::{glcm, hsv, lbp};
use defungi_inference::{
    ClassifierArtifact, FEATURE_LEN, ImageSource, InferenceError, InferenceService, ModelHandle,
    PredictedLabel, aggregate, normalize,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use ndarray::{Array2, ArrayView2};
use shared::{FungiSpecies, UNCLASSIFIED_LABEL};

struct MockArtifact {
    index: i64,
    proba: Vec<f64>,
    calls: AtomicUsize,
}

impl MockArtifact {
    fn new(index: i64, proba: Vec<f64>) -> Self {
        Self { index, proba, calls: AtomicUsize::new(0) }
    }
}

impl ClassifierArtifact for MockArtifact {
    fn predict(&self, batch: ArrayView2<'_, f64>) -> Result<Vec<i64>, InferenceError> {
        assert_eq!(batch.dim(), (1, FEATURE_LEN));
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![self.index])
    }

    fn predict_proba(&self, batch: ArrayView2<'_, f64>) -> Result<Array2<f64>, InferenceError> {
        assert_eq!(batch.dim(), (1, FEATURE_LEN));
        Ok(Array2::from_shape_vec((1, self.proba.len()), self.proba.clone()).unwrap())
    }
}

fn service_with(artifact: Arc<MockArtifact>) -> InferenceService {
    InferenceService::new(Arc::new(ModelHandle::preloaded(artifact))).with_features(true)
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

fn textured(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            ((x * 7 + y * 3) % 256) as u8,
            ((x * x + y) % 256) as u8,
            ((x ^ y) * 5 % 256) as u8,
        ])
    })
}

#[test]
fn test_black_image_features() {
    let black = DynamicImage::ImageRgb8(RgbImage::new(256, 256));
    let image = normalize(ImageSource::Decoded(black)).unwrap();

    let g = glcm::glcm_features(&image);
    assert!(g[0].abs() < 1e-12, "contrast should vanish, got {}", g[0]);

    let l = lbp::lbp_features(&image);
    assert!((l[8] - 1.0).abs() < 1e-6);
    assert!(l.iter().enumerate().all(|(i, &v)| i == 8 || v == 0.0));

    let h = hsv::hsv_features(&image);
    let value = &h[16..24];
    assert_eq!(value[0], 1.0);
    assert!(value[1..].iter().all(|&v| v == 0.0));
}

#[test]
fn test_known_class_scenario() {
    let artifact = Arc::new(MockArtifact::new(1, vec![0.1, 0.8, 0.05, 0.03, 0.02]));
    let bytes = encode(DynamicImage::ImageRgb8(textured(120, 80)), ImageFormat::Png);

    let result = service_with(artifact).classify(ImageSource::Encoded(&bytes)).unwrap();
    let response = result.to_response(false);
    assert_eq!(response.class, "Aspergillus Niger");
    assert_eq!(response.confidence, 0.8);
    assert_eq!(result.label, PredictedLabel::Species(FungiSpecies::AspergillusNiger));

    let features = response.features.unwrap();
    assert_eq!(features.glcm.len(), 6);
    assert_eq!(features.lbp.len(), 10);
    assert_eq!(features.hsv.len(), 24);
}

#[test]
fn test_unknown_index_scenario() {
    let artifact = Arc::new(MockArtifact::new(99, vec![0.2, 0.2, 0.2, 0.2, 0.2]));
    let bytes = encode(DynamicImage::ImageRgb8(textured(64, 64)), ImageFormat::Png);

    let result = service_with(artifact).classify(ImageSource::Encoded(&bytes)).unwrap();
    assert_eq!(result.label, PredictedLabel::Unclassifiable);
    assert_eq!(result.to_response(true).class, UNCLASSIFIED_LABEL);
}

#[test]
fn test_missing_model_fails_before_image_work() {
    let dir = std::env::temp_dir().join(format!("defungi-missing-{}", uuid::Uuid::new_v4()));
    let candidates: Vec<PathBuf> = vec![dir.join("rf_defungi.json"), dir.join("best_xgb_defungi.json")];
    let service = InferenceService::new(Arc::new(ModelHandle::from_candidates(candidates.clone())));

    // Undecodable bytes: if the image were looked at first this would be InvalidImage.
    let err = service.classify(ImageSource::Encoded(b"garbage")).unwrap_err();
    match err {
        InferenceError::ModelUnavailable { tried } => assert_eq!(tried, candidates),
        other => panic!("expected ModelUnavailable, got {:?}", other),
    }
}

#[test]
fn test_invalid_input_never_reaches_the_classifier() {
    let artifact = Arc::new(MockArtifact::new(0, vec![1.0, 0.0, 0.0, 0.0, 0.0]));
    let service = service_with(artifact.clone());

    for bad in [&b""[..], &b"\x89PNG\r\n\x1a\nbroken"[..], &b"hello"[..]] {
        let err = service.classify(ImageSource::Encoded(bad)).unwrap_err();
        assert!(matches!(err, InferenceError::InvalidImage(_)));
    }
    let err = service.classify(ImageSource::Transport("data:image/png;base64,!!!")).unwrap_err();
    assert!(matches!(err, InferenceError::InvalidImage(_)));

    assert_eq!(artifact.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_classification_is_deterministic() {
    let artifact = Arc::new(MockArtifact::new(2, vec![0.1, 0.1, 0.6, 0.1, 0.1]));
    let service = service_with(artifact);
    let bytes = encode(DynamicImage::ImageRgb8(textured(301, 199)), ImageFormat::Png);

    let first = service.classify(ImageSource::Encoded(&bytes)).unwrap();
    for _ in 0..3 {
        assert_eq!(service.classify(ImageSource::Encoded(&bytes)).unwrap(), first);
    }
}

#[test]
fn test_vector_length_for_any_input_shape() {
    let inputs = vec![
        DynamicImage::ImageRgb8(textured(1, 1)),
        DynamicImage::ImageRgb8(textured(17, 1000)),
        DynamicImage::ImageRgb8(textured(512, 512)),
        DynamicImage::ImageLuma8(image::GrayImage::from_fn(90, 45, |x, _| image::Luma([x as u8]))),
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(33, 33, Rgba([10, 200, 30, 0]))),
        DynamicImage::ImageRgb16(image::ImageBuffer::from_pixel(40, 40, Rgb([65535u16, 0, 1000]))),
    ];
    for img in inputs {
        let canonical = normalize(ImageSource::Decoded(img)).unwrap();
        assert_eq!(aggregate(&canonical).len(), FEATURE_LEN);
    }
}

#[test]
fn test_lbp_block_sums_to_one() {
    let canonical = normalize(ImageSource::Decoded(DynamicImage::ImageRgb8(textured(200, 300)))).unwrap();
    let vector = aggregate(&canonical);
    let sum: f64 = vector.as_slice()[6..16].iter().sum();
    assert!((sum - 1.0).abs() < 1e-6);
}

#[test]
fn test_resize_is_idempotent_at_canonical_size() {
    let original = DynamicImage::ImageRgb8(textured(640, 360));
    let once = normalize(ImageSource::Decoded(original.clone())).unwrap();
    let pre_resized = DynamicImage::ImageRgb8(once.as_rgb().clone());

    let via_bytes = encode(pre_resized.clone(), ImageFormat::Png);
    let twice = normalize(ImageSource::Encoded(&via_bytes)).unwrap();

    assert_eq!(aggregate(&once), aggregate(&twice));
    assert_eq!(
        aggregate(&normalize(ImageSource::Decoded(pre_resized)).unwrap()),
        aggregate(&normalize(ImageSource::Decoded(original)).unwrap())
    );
}

#[test]
fn test_transport_and_path_sources_agree() {
    use base64::Engine as _;

    let bytes = encode(DynamicImage::ImageRgb8(textured(90, 120)), ImageFormat::Png);
    let transport = format!(
        "data:image/png;base64,{}",
        base64::engine::general_purpose::STANDARD.encode(&bytes)
    );
    let path = std::env::temp_dir().join(format!("defungi-{}.png", uuid::Uuid::new_v4()));
    std::fs::write(&path, &bytes).unwrap();

    let from_bytes = aggregate(&normalize(ImageSource::Encoded(&bytes)).unwrap());
    let from_transport = aggregate(&normalize(ImageSource::Transport(&transport)).unwrap());
    let from_path = aggregate(&normalize(ImageSource::Path(&path)).unwrap());

    assert_eq!(from_bytes, from_transport);
    assert_eq!(from_bytes, from_path);
    std::fs::remove_file(&path).ok();
}
