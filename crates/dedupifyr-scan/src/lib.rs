//! Image discovery for dedupifyr.
//!
//! This crate implements the collaborators the detection engine depends on:
//! listing image files under a directory, reading their bytes, and decoding
//! them into pixels.
//!
//! - **Parallel traversal** via jwalk/rayon, sorted for a stable order
//! - **Extension filtering** and top-level or recursive search
//! - **Decoding** through the `image` crate, normalized to RGBA
//!
//! # Example
//!
//! ```rust,no_run
//! use dedupifyr_scan::{ComparisonOptions, FsImageSource, ImageSource};
//!
//! let source = FsImageSource::new();
//! let images = source
//!     .list_images("/path/to/photos".as_ref(), &ComparisonOptions::default())
//!     .unwrap();
//!
//! println!("Found {} images", images.len());
//! ```

mod source;
mod walker;

pub use source::{FsImageSource, ImageSource};
pub use walker::ImageWalker;

// Re-export core types for convenience
pub use dedupifyr_core::{ComparisonOptions, PixelFormat, RasterImage, ScanError, SearchDepth};
