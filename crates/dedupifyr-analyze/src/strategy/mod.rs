//! Detection strategies, one per [`ComparisonKind`].
//!
//! Each strategy follows the same lifecycle: build image descriptors,
//! score candidates, aggregate results. The phases are reported through
//! the run's progress channel as they are entered.

mod directory;
mod pair;
mod single;

pub(crate) use directory::DirectoryComparison;
pub(crate) use pair::PairComparison;
pub(crate) use single::SingleComparison;

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use dedupifyr_core::{
    ComparisonKind, ComparisonOptions, ComparisonRequest, DeDupifyrResult, DetectError,
    DuplicateImage, LocalImage, ScanError,
};
use dedupifyr_scan::ImageSource;

use crate::fingerprint::{FingerprintProvider, Granularity};
use crate::progress::ProgressReporter;

/// A duplicate detection algorithm for one kind of request.
pub trait DetectionStrategy {
    /// The request kind this strategy serves.
    fn kind(&self) -> ComparisonKind;

    /// Build the image descriptors the run works on.
    fn build_images(&self, request: &ComparisonRequest) -> Result<Vec<LocalImage>, DetectError>;

    /// Similarity of `target` to `source` in `[0.0, 1.0]`.
    fn score(&self, source: &LocalImage, target: &LocalImage) -> Result<f64, DetectError>;

    /// Execute the whole run.
    fn run(&self, request: &ComparisonRequest) -> Result<Vec<DeDupifyrResult>, DetectError>;
}

/// Everything a strategy borrows from the detector for one run.
#[derive(Clone, Copy)]
pub(crate) struct StrategyContext<'a> {
    pub source: &'a dyn ImageSource,
    pub options: &'a ComparisonOptions,
    pub fingerprinter: &'a dyn FingerprintProvider,
    pub progress: &'a ProgressReporter,
}

/// Read `path` and fingerprint the part of it selected by `granularity`.
pub fn build_local_image(
    source: &dyn ImageSource,
    fingerprinter: &dyn FingerprintProvider,
    granularity: Granularity,
    path: &Path,
) -> Result<LocalImage, ScanError> {
    let bytes = source.read_bytes(path)?;
    let fingerprint = fingerprinter.fingerprint(granularity.select(&bytes));
    Ok(LocalImage::new(path, fingerprint))
}

/// [`build_local_image`] for many paths at once, in parallel.
///
/// The output keeps the order of `paths`. The first failure aborts.
pub fn build_local_images(
    source: &dyn ImageSource,
    fingerprinter: &dyn FingerprintProvider,
    granularity: Granularity,
    paths: &[PathBuf],
) -> Result<Vec<LocalImage>, ScanError> {
    paths
        .par_iter()
        .map(|path| build_local_image(source, fingerprinter, granularity, path))
        .collect()
}

/// Compare two descriptors, short-circuiting on equal fingerprints.
///
/// Equal non-empty fingerprints score `1.0` without calling `score`.
/// Otherwise `score` decides, and the target is kept only at or above `bias`.
pub fn direct_comparison<E>(
    source: &LocalImage,
    target: &LocalImage,
    bias: f64,
    score: impl FnOnce(&LocalImage, &LocalImage) -> Result<f64, E>,
) -> Result<Option<DuplicateImage>, E> {
    let similarity =
        if !source.fingerprint.is_empty() && source.fingerprint == target.fingerprint {
            1.0
        } else {
            score(source, target)?
        };

    Ok((similarity >= bias).then(|| DuplicateImage::new(target.clone(), similarity)))
}

/// Canonical form of `path`, or the path itself if it cannot be resolved.
pub(crate) fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}


#[cfg(test)]
mod tests {
    use super::testing::MemorySource;
    use super::*;
    use crate::fingerprint::ReversedBase64;
    use crate::similarity::{PositionalComparison, Similarity};
    use dedupifyr_core::Fingerprint;
    use std::convert::Infallible;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn image(path: &str, fingerprint: &str) -> LocalImage {
        LocalImage::new(path, Fingerprint::new(fingerprint))
    }

    fn by_fingerprint(
        cmp: &dyn Similarity<str>,
    ) -> impl Fn(&LocalImage, &LocalImage) -> Result<f64, Infallible> + '_ {
        move |s, t| Ok(cmp.score(s.fingerprint.as_str(), t.fingerprint.as_str()))
    }

    #[test]
    fn test_direct_comparison_equal_fingerprints() {
        let calls = AtomicUsize::new(0);
        let source = image("/a.png", "abcd");
        let target = image("/b.png", "abcd");

        let found = direct_comparison(&source, &target, 0.8, |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, Infallible>(0.0)
        });

        let found = found.unwrap().unwrap();
        assert_eq!(found.similarity, 1.0);
        assert_eq!(found.image.path, PathBuf::from("/b.png"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_direct_comparison_respects_bias() {
        let cmp = PositionalComparison::exhaustive();
        let source = image("/a.png", "abcd");
        let target = image("/b.png", "abcx");

        let rejected = direct_comparison(&source, &target, 0.8, by_fingerprint(&cmp)).unwrap();
        assert!(rejected.is_none());

        let kept = direct_comparison(&source, &target, 0.75, by_fingerprint(&cmp))
            .unwrap()
            .unwrap();
        assert!((kept.similarity - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_empty_fingerprints_do_not_short_circuit() {
        let cmp = PositionalComparison::new(0.5);
        let source = image("/a.png", "");
        let target = image("/b.png", "");

        let found = direct_comparison(&source, &target, 0.5, by_fingerprint(&cmp));
        assert!(found.unwrap().is_none());
    }

    #[test]
    fn test_direct_comparison_propagates_score_error() {
        let source = image("/a.png", "ab");
        let target = image("/b.png", "cd");

        let err = direct_comparison(&source, &target, 0.5, |_, _| Err("decode failed"))
            .unwrap_err();
        assert_eq!(err, "decode failed");
    }

    #[test]
    fn test_build_local_images_keeps_order() {
        let source = MemorySource::default()
            .with_file("/d/b.png", "bbb")
            .with_file("/d/a.png", "aaa");
        let paths = vec![PathBuf::from("/d/b.png"), PathBuf::from("/d/a.png")];

        let images =
            build_local_images(&source, &ReversedBase64, Granularity::Full, &paths).unwrap();
        assert_eq!(images[0].path, paths[0]);
        assert_eq!(images[1].path, paths[1]);
        assert_eq!(images[0].fingerprint, ReversedBase64.fingerprint(b"bbb"));
    }

    #[test]
    fn test_build_local_images_fails_fast() {
        let source = MemorySource::default().with_file("/d/a.png", "aaa");
        let paths = vec![PathBuf::from("/d/a.png"), PathBuf::from("/d/missing.png")];

        let err = build_local_images(&source, &ReversedBase64, Granularity::Full, &paths)
            .unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }
}
