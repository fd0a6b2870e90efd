//! Bilinear resampling with the fixed-point arithmetic of OpenCV's
//! `INTER_LINEAR` for 8-bit images, which is what the training pipeline used.

use image::RgbImage;

const COEF_BITS: u32 = 11;
const COEF_SCALE: f32 = (1 << COEF_BITS) as f32;

/// One output coordinate: the two source taps and their fixed-point weights.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Tap {
    lo: usize,
    hi: usize,
    w_lo: i32,
    w_hi: i32,
}

fn linear_taps(src_len: u32, dst_len: u32) -> Vec<Tap> {
    let scale = src_len as f64 / dst_len as f64;
    let last = src_len as i64 - 1;

    (0..dst_len)
        .map(|d| {
            let pos = ((d as f64 + 0.5) * scale - 0.5) as f32;
            let mut lo = pos.floor() as i64;
            let mut frac = pos - lo as f32;
            if lo < 0 {
                frac = 0.0;
                lo = 0;
            }
            if lo >= last {
                frac = 0.0;
                lo = last;
            }
            let lo = lo as usize;
            Tap {
                lo,
                hi: (lo + 1).min(last as usize),
                w_lo: ((1.0 - frac) * COEF_SCALE).round_ties_even() as i32,
                w_hi: (frac * COEF_SCALE).round_ties_even() as i32,
            }
        })
        .collect()
}

/// Resizes `src` to exactly `width × height`, ignoring aspect ratio.
pub fn resize_bilinear(src: &RgbImage, width: u32, height: u32) -> RgbImage {
    if src.dimensions() == (width, height) {
        return src.clone();
    }
    if src.width() == width * 2 && src.height() == height * 2 {
        return halve(src);
    }

    let xs = linear_taps(src.width(), width);
    let ys = linear_taps(src.height(), height);
    let src_w = src.width() as usize;
    let raw = src.as_raw();

    // Horizontal pass over every source row, kept as 11-bit fixed point.
    let row = |y: usize| -> Vec<i32> {
        let base = y * src_w * 3;
        let mut out = Vec::with_capacity(width as usize * 3);
        for tap in &xs {
            for c in 0..3 {
                let a = raw[base + tap.lo * 3 + c] as i32;
                let b = raw[base + tap.hi * 3 + c] as i32;
                out.push(a * tap.w_lo + b * tap.w_hi);
            }
        }
        out
    };
    let rows: Vec<Vec<i32>> = (0..src.height() as usize).map(row).collect();

    let mut out = RgbImage::new(width, height);
    let dst = out.as_mut();
    let stride = width as usize * 3;
    for (dy, tap) in ys.iter().enumerate() {
        let top = &rows[tap.lo];
        let bottom = &rows[tap.hi];
        let line = &mut dst[dy * stride..(dy + 1) * stride];
        for (x, px) in line.iter_mut().enumerate() {
            *px = vertical_blend(top[x], bottom[x], tap.w_lo, tap.w_hi);
        }
    }
    out
}

/// Vertical blend as OpenCV's vectorized 8-bit kernel computes it: both rows
/// drop 4 bits and narrow to i16, each product keeps its high 16 bits, and the
/// sum is rounded by 2 more bits. This differs by one from the exact 22-bit
/// rounding on many samples. The scalar tail only runs when `width * 3` is not
/// a multiple of the vector width, which never holds at the canonical size.
fn vertical_blend(top: i32, bottom: i32, w_top: i32, w_bottom: i32) -> u8 {
    let mul_hi = |s: i32, w: i32| ((s >> 4).clamp(i16::MIN as i32, i16::MAX as i32) * w) >> 16;
    ((mul_hi(top, w_top) + mul_hi(bottom, w_bottom) + 2) >> 2).clamp(0, 255) as u8
}

/// Exact 2x downscale: OpenCV switches to a 2x2 box average here.
fn halve(src: &RgbImage) -> RgbImage {
    let (w, h) = (src.width() / 2, src.height() / 2);
    RgbImage::from_fn(w, h, |x, y| {
        let p00 = src.get_pixel(2 * x, 2 * y);
        let p01 = src.get_pixel(2 * x + 1, 2 * y);
        let p10 = src.get_pixel(2 * x, 2 * y + 1);
        let p11 = src.get_pixel(2 * x + 1, 2 * y + 1);
        let mut px = [0u8; 3];
        for c in 0..3 {
            let sum = p00[c] as u32 + p01[c] as u32 + p10[c] as u32 + p11[c] as u32;
            px[c] = ((sum + 2) >> 2) as u8;
        }
        image::Rgb(px)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_same_size_is_identity() {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([x as u8 * 10, y as u8 * 10, 7]));
        assert_eq!(resize_bilinear(&img, 16, 16), img);
    }

    #[test]
    fn test_uniform_color_survives_any_scale() {
        let img = RgbImage::from_pixel(37, 91, Rgb([200, 13, 90]));
        let resized = resize_bilinear(&img, 256, 256);
        assert_eq!(resized.dimensions(), (256, 256));
        assert!(resized.pixels().all(|p| *p == Rgb([200, 13, 90])));
    }

    #[test]
    fn test_halving_averages_blocks() {
        let img = RgbImage::from_fn(4, 4, |x, _| if x % 2 == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let out = resize_bilinear(&img, 2, 2);
        // (0 + 255 + 0 + 255 + 2) >> 2
        assert!(out.pixels().all(|p| *p == Rgb([128, 128, 128])));
    }

    #[test]
    fn test_taps_clamp_at_edges() {
        let taps = linear_taps(4, 8);
        assert_eq!(taps[0], Tap { lo: 0, hi: 1, w_lo: 2048, w_hi: 0 });
        assert_eq!(taps[7].lo, 3);
        assert_eq!(taps[7].w_hi, 0);
        // (1 + 0.5) * 0.5 - 0.5 = 0.25
        assert_eq!(taps[1], Tap { lo: 0, hi: 1, w_lo: 1536, w_hi: 512 });
    }

    #[test]
    fn test_upscale_interpolates_between_neighbours() {
        let img = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([0, 0, 0]) } else { Rgb([100, 100, 100]) });
        let out = resize_bilinear(&img, 4, 1);
        let reds: Vec<u8> = out.pixels().map(|p| p[0]).collect();
        assert_eq!(reds, vec![0, 25, 75, 100]);
    }

    #[test]
    fn test_vertical_pass_rounds_like_vector_kernel() {
        let values = [[0u8, 1], [0, 7]];
        let img = RgbImage::from_fn(2, 2, |x, y| {
            let v = values[y as usize][x as usize];
            Rgb([v, v, v])
        });
        let out = resize_bilinear(&img, 4, 4);
        // Taps at x = 1 and y = 1 weigh (1536, 512). Rows after the horizontal
        // pass: 512 and 3584. Exact rounding gives (512*1536 + 3584*512 + 2^21) >> 22 = 1,
        // the vector kernel gives ((32*1536 >> 16) + (224*512 >> 16) + 2) >> 2 = 0.
        assert_eq!(out.get_pixel(1, 1), &Rgb([0, 0, 0]));
        let row: Vec<u8> = (0..4).map(|x| out.get_pixel(x, 2)[0]).collect();
        assert_eq!(row, vec![0, 1, 4, 6]);
        assert_eq!(out.get_pixel(3, 3), &Rgb([7, 7, 7]));
    }

    #[test]
    fn test_vertical_blend_matches_exact_on_full_weight() {
        for v in [0, 1, 127, 254, 255] {
            assert_eq!(vertical_blend(v * 2048, 0, 2048, 0), v as u8);
        }
    }
}
