//! Similarity scores between fingerprints and between decoded images.
//!
//! Every comparator returns a score in `[0.0, 1.0]`, where `1.0` means the
//! inputs are considered identical.

mod levenshtein;
mod pixel;
mod positional;

pub use levenshtein::{EditDistance, levenshtein};
pub use pixel::{PixelComparison, within_tolerance};
pub use positional::PositionalComparison;

use dedupifyr_core::{ComparisonOptions, FingerprintMetric};

/// Scores how alike two values are.
pub trait Similarity<T: ?Sized>: Send + Sync {
    /// Similarity of `target` to `source` in `[0.0, 1.0]`.
    fn score(&self, source: &T, target: &T) -> f64;
}

/// The fingerprint comparator selected by `options`.
pub fn fingerprint_comparator(options: &ComparisonOptions) -> Box<dyn Similarity<str>> {
    match options.metric() {
        FingerprintMetric::Positional => Box::new(PositionalComparison::new(options.bias())),
        FingerprintMetric::EditDistance => Box::new(EditDistance::default()),
    }
}
