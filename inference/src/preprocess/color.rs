//! 8-bit color conversions matching OpenCV's integer code paths.

use image::RgbImage;
use ndarray::Array2;

const YUV_SHIFT: u32 = 14;
const R2Y: u32 = 4899;
const G2Y: u32 = 9617;
const B2Y: u32 = 1868;

const HSV_SHIFT: u32 = 12;

/// Hue is stored halved so it fits a byte: [0, 180).
pub const HUE_RANGE: u32 = 180;

#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> u8 {
    let y = (r as u32 * R2Y + g as u32 * G2Y + b as u32 * B2Y + (1 << (YUV_SHIFT - 1))) >> YUV_SHIFT;
    y as u8
}

/// Row-major (height, width) grayscale plane.
pub fn to_gray(image: &RgbImage) -> Array2<u8> {
    let (w, h) = image.dimensions();
    Array2::from_shape_fn((h as usize, w as usize), |(y, x)| {
        let p = image.get_pixel(x as u32, y as u32);
        luma(p[0], p[1], p[2])
    })
}

/// Division tables for the fixed-point HSV converter.
pub struct HsvTables {
    sdiv: [i32; 256],
    hdiv: [i32; 256],
}

impl HsvTables {
    pub fn new() -> Self {
        let mut sdiv = [0i32; 256];
        let mut hdiv = [0i32; 256];
        for i in 1..256 {
            sdiv[i] = (((255u32 << HSV_SHIFT) as f64) / i as f64).round_ties_even() as i32;
            hdiv[i] = (((HUE_RANGE << HSV_SHIFT) as f64) / (6.0 * i as f64)).round_ties_even() as i32;
        }
        Self { sdiv, hdiv }
    }

    /// Returns (h, s, v) with h in [0, 180) and s, v in [0, 256).
    pub fn convert(&self, r: u8, g: u8, b: u8) -> (u8, u8, u8) {
        let (r, g, b) = (r as i32, g as i32, b as i32);
        let v = r.max(g).max(b);
        let vmin = r.min(g).min(b);
        let diff = v - vmin;
        let round = 1 << (HSV_SHIFT - 1);

        let s = (diff * self.sdiv[v as usize] + round) >> HSV_SHIFT;

        let h = if v == r {
            g - b
        } else if v == g {
            b - r + 2 * diff
        } else {
            r - g + 4 * diff
        };
        let mut h = (h * self.hdiv[diff as usize] + round) >> HSV_SHIFT;
        if h < 0 {
            h += HUE_RANGE as i32;
        }

        (h as u8, s as u8, v as u8)
    }
}

impl Default for HsvTables {
    fn default() -> Self {
        Self::new()
    }
}
