use std::f64::consts::PI;

use ndarray::Array2;

use crate::preprocess::CanonicalImage;

pub const LBP_POINTS: usize = 8;
pub const LBP_RADIUS: f64 = 1.0;
/// Uniform codes 0..=P plus one bucket for non-uniform patterns.
pub const LBP_LEN: usize = LBP_POINTS + 2;

const HIST_EPSILON: f64 = 1e-7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LbpParams {
    pub points: usize,
    pub radius: f64,
}

impl Default for LbpParams {
    fn default() -> Self {
        Self { points: LBP_POINTS, radius: LBP_RADIUS }
    }
}

impl LbpParams {
    pub fn bins(&self) -> usize {
        self.points + 2
    }

    /// Circular sampling offsets (row, col), rounded to 5 decimals so that
    /// axis-aligned points land exactly on pixel centers.
    fn offsets(&self) -> Vec<(f64, f64)> {
        let round5 = |v: f64| (v * 1e5).round_ties_even() / 1e5;
        (0..self.points)
            .map(|p| {
                let theta = 2.0 * PI * p as f64 / self.points as f64;
                (round5(-self.radius * theta.sin()), round5(self.radius * theta.cos()))
            })
            .collect()
    }
}

#[inline]
fn pixel_or_zero(image: &Array2<f64>, r: i64, c: i64) -> f64 {
    let (rows, cols) = image.dim();
    if r < 0 || c < 0 || r >= rows as i64 || c >= cols as i64 {
        0.0
    } else {
        image[[r as usize, c as usize]]
    }
}

fn bilinear(image: &Array2<f64>, r: f64, c: f64) -> f64 {
    let (r0, c0) = (r.floor() as i64, c.floor() as i64);
    let (r1, c1) = (r.ceil() as i64, c.ceil() as i64);
    let dr = r - r0 as f64;
    let dc = c - c0 as f64;

    let top = (1.0 - dc) * pixel_or_zero(image, r0, c0) + dc * pixel_or_zero(image, r0, c1);
    let bottom = (1.0 - dc) * pixel_or_zero(image, r1, c0) + dc * pixel_or_zero(image, r1, c1);
    (1.0 - dr) * top + dr * bottom
}

/// Rotation-invariant uniform code for one bit pattern (bit p = neighbour p >= center).
pub fn uniform_code(bits: &[bool]) -> usize {
    let transitions = bits.windows(2).filter(|w| w[0] != w[1]).count();
    if transitions <= 2 {
        bits.iter().filter(|&&b| b).count()
    } else {
        bits.len() + 1
    }
}

/// Per-pixel uniform LBP codes.
pub fn lbp_codes(gray: &Array2<u8>, params: LbpParams) -> Array2<usize> {
    let image = gray.mapv(f64::from);
    let offsets = params.offsets();
    let mut bits = vec![false; params.points];

    let mut codes = Array2::<usize>::zeros(image.dim());
    for ((r, c), code) in codes.indexed_iter_mut() {
        let center = image[[r, c]];
        for (bit, &(dr, dc)) in bits.iter_mut().zip(&offsets) {
            let sample = bilinear(&image, r as f64 + dr, c as f64 + dc);
            *bit = sample - center >= 0.0;
        }
        *code = uniform_code(&bits);
    }
    codes
}

/// Normalized histogram of uniform codes; sums to 1 up to the epsilon guard.
pub fn lbp_histogram(gray: &Array2<u8>, params: LbpParams) -> Vec<f64> {
    let mut hist = vec![0.0f64; params.bins()];
    for &code in lbp_codes(gray, params).iter() {
        hist[code] += 1.0;
    }
    let total: f64 = hist.iter().sum();
    hist.iter().map(|h| h / (total + HIST_EPSILON)).collect()
}

pub fn lbp_from_gray(gray: &Array2<u8>) -> [f64; LBP_LEN] {
    let hist = lbp_histogram(gray, LbpParams::default());
    let mut out = [0.0; LBP_LEN];
    out.copy_from_slice(&hist);
    out
}

pub fn lbp_features(image: &CanonicalImage) -> [f64; LBP_LEN] {
    lbp_from_gray(&image.to_gray())
}
