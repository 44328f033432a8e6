//! Duplicate image detection for dedupifyr.
//!
//! This crate turns a [`ComparisonRequest`](dedupifyr_core::ComparisonRequest)
//! into duplicate results:
//!
//! - **Fingerprints** - cheap content stand-ins built from leading file bytes
//! - **Similarity** - positional and edit-distance scores over fingerprints,
//!   tolerance-banded scores over decoded pixels
//! - **Strategies** - all-in-directory, pair, and single-against-directory
//!
//! # Example
//!
//! ```rust,ignore
//! use dedupifyr_analyze::Detector;
//! use dedupifyr_core::{ComparisonOptions, ComparisonRequest};
//!
//! let options = ComparisonOptions::from_flags([("level", "all"), ("bias", "90")], None)?;
//! let request = ComparisonRequest::parse("/path/to/photos")?;
//!
//! let detector = Detector::new(options);
//! for result in detector.run(&request)? {
//!     println!("{} has {} duplicates", result.source.name, result.duplicate_count());
//! }
//! ```
//!
//! Scores are in `[0.0, 1.0]`. All-in-directory and single runs keep only
//! matches at or above the bias; pair runs always report the raw score.

mod detector;
mod fingerprint;
mod progress;
mod similarity;
mod strategy;

pub use detector::Detector;
pub use fingerprint::{Blake3Hex, FingerprintProvider, Granularity, ReversedBase64};
pub use progress::{DetectionProgress, RunPhase};
pub use similarity::{
    EditDistance, PixelComparison, PositionalComparison, Similarity, fingerprint_comparator,
    levenshtein, within_tolerance,
};
pub use strategy::{DetectionStrategy, build_local_image, build_local_images, direct_comparison};
