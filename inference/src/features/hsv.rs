use crate::preprocess::CanonicalImage;
use crate::preprocess::color::{HUE_RANGE, HsvTables};

pub const HSV_BINS: usize = 8;
pub const HSV_LEN: usize = HSV_BINS * 3;

const SV_RANGE: u32 = 256;

/// Counts `values` into `HSV_BINS` uniform bins over [0, range); values outside are skipped.
fn channel_histogram(values: impl Iterator<Item = u8>, range: u32) -> [f64; HSV_BINS] {
    let scale = HSV_BINS as f64 / range as f64;
    let mut hist = [0.0; HSV_BINS];
    for v in values {
        let bin = (v as f64 * scale).floor() as usize;
        if (v as u32) < range && bin < HSV_BINS {
            hist[bin] += 1.0;
        }
    }
    hist
}

/// Scales the block to unit Euclidean norm. A zero block stays zero.
///
/// Results pass through `f32` because the histograms this was trained on
/// were single precision.
pub fn l2_normalize(hist: &mut [f64]) {
    let norm = hist.iter().map(|v| v * v).sum::<f64>().sqrt();
    let scale = if norm > f64::EPSILON { 1.0 / norm } else { 0.0 };
    for v in hist.iter_mut() {
        *v = (*v * scale) as f32 as f64;
    }
}

pub fn hsv_features(image: &CanonicalImage) -> [f64; HSV_LEN] {
    let tables = HsvTables::new();
    let hsv: Vec<(u8, u8, u8)> = image
        .as_rgb()
        .pixels()
        .map(|p| tables.convert(p[0], p[1], p[2]))
        .collect();

    let mut h = channel_histogram(hsv.iter().map(|p| p.0), HUE_RANGE);
    let mut s = channel_histogram(hsv.iter().map(|p| p.1), SV_RANGE);
    let mut v = channel_histogram(hsv.iter().map(|p| p.2), SV_RANGE);
    l2_normalize(&mut h);
    l2_normalize(&mut s);
    l2_normalize(&mut v);

    let mut out = [0.0; HSV_LEN];
    out[..HSV_BINS].copy_from_slice(&h);
    out[HSV_BINS..2 * HSV_BINS].copy_from_slice(&s);
    out[2 * HSV_BINS..].copy_from_slice(&v);
    out
}
