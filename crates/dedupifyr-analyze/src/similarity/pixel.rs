use rayon::prelude::*;

use dedupifyr_core::RasterImage;

use super::Similarity;

/// Whether `target` lies within `source ± tolerance`, clamped to `0..=255`.
pub fn within_tolerance(source: u8, target: u8, tolerance: u8) -> bool {
    let lower = source.saturating_sub(tolerance);
    let upper = source.saturating_add(tolerance);
    (lower..=upper).contains(&target)
}

fn count_mismatches(source: &[u8], target: &[u8], tolerance: u8) -> usize {
    source
        .iter()
        .zip(target)
        .filter(|&(&s, &t)| !within_tolerance(s, t, tolerance))
        .count()
}

/// Byte-wise comparison of decoded pixel buffers.
///
/// Bytes outside the tolerance band count as mismatches, as does every
/// byte one buffer has beyond the other. The score is
/// `1 - mismatches / max_len`.
#[derive(Debug, Clone, Copy)]
pub struct PixelComparison {
    tolerance: u8,
    batch_count: usize,
    parallel_threshold: usize,
}

impl PixelComparison {
    /// Comparator with the given per-channel tolerance.
    pub fn new(tolerance: u8) -> Self {
        Self {
            tolerance,
            batch_count: 128,
            parallel_threshold: 64 * 1024,
        }
    }

    /// Number of mismatching bytes between two buffers.
    pub fn mismatch_count(&self, source: &[u8], target: &[u8]) -> usize {
        let shared = source.len().min(target.len());
        let overhang = source.len().abs_diff(target.len());
        let (source, target) = (&source[..shared], &target[..shared]);

        let counted = if shared < self.parallel_threshold {
            count_mismatches(source, target, self.tolerance)
        } else {
            let batch = shared.div_ceil(self.batch_count).max(1);
            source
                .par_chunks(batch)
                .zip(target.par_chunks(batch))
                .map(|(s, t)| count_mismatches(s, t, self.tolerance))
                .sum()
        };

        overhang + counted
    }
}

impl Similarity<RasterImage> for PixelComparison {
    fn score(&self, source: &RasterImage, target: &RasterImage) -> f64 {
        if source.format != target.format || source.is_empty() || target.is_empty() {
            return 0.0;
        }

        let max_len = source.len().max(target.len());
        let mismatches = self.mismatch_count(&source.pixels, &target.pixels);
        (1.0 - mismatches as f64 / max_len as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dedupifyr_core::PixelFormat;

    fn gray(pixels: Vec<u8>) -> RasterImage {
        let width = pixels.len() as u32;
        RasterImage::new(width, 1, PixelFormat::Luma8, pixels)
    }

    #[test]
    fn test_tolerance_band_is_clamped_and_inclusive() {
        assert!(within_tolerance(250, 255, 10));
        assert!(within_tolerance(3, 0, 5));
        assert!(within_tolerance(100, 105, 5));
        assert!(within_tolerance(100, 95, 5));
        assert!(!within_tolerance(100, 106, 5));
        assert!(within_tolerance(7, 7, 0));
        assert!(!within_tolerance(7, 8, 0));
    }

    #[test]
    fn test_identical_buffers() {
        let img = gray(vec![10, 20, 30, 40]);
        assert_eq!(PixelComparison::new(0).score(&img, &img), 1.0);
    }

    #[test]
    fn test_length_difference_counts_as_mismatch() {
        let a = gray(vec![1, 2, 3, 4]);
        let b = gray(vec![1, 2]);
        assert!((PixelComparison::new(0).score(&a, &b) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_format_mismatch_and_empty() {
        let a = gray(vec![1, 2, 3]);
        let b = RasterImage::new(1, 1, PixelFormat::Rgb8, vec![1, 2, 3]);
        assert_eq!(PixelComparison::new(255).score(&a, &b), 0.0);
        assert_eq!(PixelComparison::new(255).score(&gray(vec![]), &gray(vec![])), 0.0);
    }

    #[test]
    fn test_parallel_batches_agree_with_sequential() {
        let source: Vec<u8> = (0..200_000).map(|i| (i % 256) as u8).collect();
        let target: Vec<u8> = source.iter().map(|&b| b.wrapping_add(7)).collect();

        let cmp = PixelComparison::new(5);
        let expected = count_mismatches(&source, &target, 5);
        assert_eq!(cmp.mismatch_count(&source, &target), expected);
    }
}
