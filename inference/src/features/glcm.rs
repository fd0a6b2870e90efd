use ndarray::Array2;

use crate::preprocess::CanonicalImage;

pub const LEVELS: usize = 256;
pub const GLCM_LEN: usize = 6;

/// Pixel offsets (row, col) at distance 1 for 0°, 45°, 90° and 135°.
const OFFSETS: [(isize, isize); 4] = [(0, 1), (-1, 1), (-1, 0), (-1, -1)];

/// Symmetric co-occurrence matrix for one offset, normalized to sum 1.
pub fn cooccurrence(gray: &Array2<u8>, offset: (isize, isize)) -> Array2<f64> {
    let (rows, cols) = gray.dim();
    let (dr, dc) = offset;
    let mut counts = Array2::<u64>::zeros((LEVELS, LEVELS));

    for r in 0..rows {
        let nr = r as isize + dr;
        if nr < 0 || nr >= rows as isize {
            continue;
        }
        for c in 0..cols {
            let nc = c as isize + dc;
            if nc < 0 || nc >= cols as isize {
                continue;
            }
            let i = gray[[r, c]] as usize;
            let j = gray[[nr as usize, nc as usize]] as usize;
            counts[[i, j]] += 1;
            counts[[j, i]] += 1;
        }
    }

    let total: u64 = counts.sum();
    if total == 0 {
        return Array2::zeros((LEVELS, LEVELS));
    }
    counts.mapv(|n| n as f64 / total as f64)
}

fn properties(p: &Array2<f64>) -> [f64; GLCM_LEN] {
    let mut contrast = 0.0;
    let mut dissimilarity = 0.0;
    let mut homogeneity = 0.0;
    let mut asm = 0.0;
    let mut mean_i = 0.0;
    let mut mean_j = 0.0;

    for ((i, j), &v) in p.indexed_iter() {
        let d = i as f64 - j as f64;
        contrast += d * d * v;
        dissimilarity += d.abs() * v;
        // Absolute difference, not skimage's (i - j)^2. Artifacts must be trained on this form.
        homogeneity += v / (1.0 + d.abs());
        asm += v * v;
        mean_i += i as f64 * v;
        mean_j += j as f64 * v;
    }

    let mut var_i = 0.0;
    let mut var_j = 0.0;
    let mut cov = 0.0;
    for ((i, j), &v) in p.indexed_iter() {
        let di = i as f64 - mean_i;
        let dj = j as f64 - mean_j;
        var_i += v * di * di;
        var_j += v * dj * dj;
        cov += v * di * dj;
    }
    let (std_i, std_j) = (var_i.sqrt(), var_j.sqrt());
    // A constant image has no spread; treat it as perfectly correlated.
    let correlation = if std_i < 1e-15 || std_j < 1e-15 { 1.0 } else { cov / (std_i * std_j) };

    [contrast, dissimilarity, homogeneity, asm.sqrt(), correlation, asm]
}

/// Six texture statistics, each averaged over the four angles.
pub fn glcm_from_gray(gray: &Array2<u8>) -> [f64; GLCM_LEN] {
    let mut acc = [0.0; GLCM_LEN];
    for offset in OFFSETS {
        let props = properties(&cooccurrence(gray, offset));
        for (a, p) in acc.iter_mut().zip(props) {
            *a += p;
        }
    }
    acc.map(|a| a / OFFSETS.len() as f64)
}

pub fn glcm_features(image: &CanonicalImage) -> [f64; GLCM_LEN] {
    glcm_from_gray(&image.to_gray())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_constant_image() {
        let gray = Array2::<u8>::from_elem((32, 32), 90);
        let [contrast, dissimilarity, homogeneity, energy, correlation, asm] = glcm_from_gray(&gray);
        assert!(close(contrast, 0.0));
        assert!(close(dissimilarity, 0.0));
        assert!(close(homogeneity, 1.0));
        assert!(close(energy, 1.0));
        assert!(close(correlation, 1.0));
        assert!(close(asm, 1.0));
    }

    #[test]
    fn test_cooccurrence_is_symmetric_and_normalized() {
        let gray = array![[0u8, 1, 2], [2, 1, 0], [1, 1, 3]];
        for offset in OFFSETS {
            let p = cooccurrence(&gray, offset);
            assert!(close(p.sum(), 1.0));
            assert_eq!(p, p.t());
        }
    }

    #[test]
    fn test_homogeneity_uses_absolute_difference() {
        // Horizontal neighbours always differ by 2: 1 / (1 + 2), not 1 / (1 + 4).
        let gray = Array2::from_shape_fn((4, 4), |(_, c)| (c % 2 * 2) as u8);
        let props = properties(&cooccurrence(&gray, (0, 1)));
        assert!(close(props[2], 1.0 / 3.0));
        assert!(close(props[1], 2.0));
    }

    #[test]
    fn test_horizontal_stripes() {
        // Columns alternate 0, 1: horizontal neighbours always differ, vertical never do.
        let gray = Array2::from_shape_fn((4, 4), |(_, c)| (c % 2) as u8);

        let p0 = cooccurrence(&gray, (0, 1));
        assert!(close(p0[[0, 1]], 0.5));
        assert!(close(p0[[1, 0]], 0.5));

        let p90 = cooccurrence(&gray, (-1, 0));
        assert!(close(p90[[0, 0]] + p90[[1, 1]], 1.0));

        let feats = glcm_from_gray(&gray);
        // Contrast per angle: 1, 1, 0, 1.
        assert!(close(feats[0], 0.75));
        assert!(close(feats[1], 0.75));
    }

    #[test]
    fn test_energy_dominates_asm() {
        let gray = Array2::from_shape_fn((16, 16), |(r, c)| ((r * 7 + c * 13) % 256) as u8);
        let feats = glcm_from_gray(&gray);
        assert!(feats[3] > 0.0);
        assert!(feats[5] <= feats[3]);
    }
}
