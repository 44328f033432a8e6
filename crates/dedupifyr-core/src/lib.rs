//! Core types for dedupifyr.
//!
//! This crate provides the data model shared by the rest of the workspace:
//! image descriptors and duplicate results, comparison options, comparison
//! requests with their validation, and the error types.

mod config;
mod error;
mod image;
mod request;

pub use config::{
    ComparisonOptions, ComparisonOptionsBuilder, DEFAULT_BIAS_PERCENT, DEFAULT_EXTENSIONS,
    DedupPolicy, FingerprintMetric, RawOptions, SearchDepth, Strictness, Tolerance,
};
pub use error::{DetectError, OptionsError, RequestError, ScanError};
pub use image::{
    DeDupifyrResult, DuplicateImage, Fingerprint, LocalImage, PixelFormat, RasterImage,
};
pub use request::{ComparisonKind, ComparisonRequest};
