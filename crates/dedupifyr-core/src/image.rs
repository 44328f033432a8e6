//! Image descriptors, duplicates and decoded rasters.

use std::path::{Path, PathBuf};

use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Compact content fingerprint produced by a fingerprint provider.
///
/// Not collision resistant. Equal bytes always give equal fingerprints,
/// nothing more is promised.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Wrap an already computed fingerprint.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The fingerprint text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the fingerprint is empty (nothing was hashed).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// An image file discovered on disk, with its fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalImage {
    /// File name (not full path).
    pub name: CompactString,
    /// Full path to the file.
    pub path: PathBuf,
    /// Extension including the leading dot, or empty.
    pub extension: CompactString,
    /// Fingerprint of the hashed portion of the file. Can be as large as
    /// the file itself, so it is left out of serialized output.
    #[serde(skip_serializing, default)]
    pub fingerprint: Fingerprint,
}

impl LocalImage {
    /// Create a descriptor for `path`, deriving the name and extension.
    pub fn new(path: impl Into<PathBuf>, fingerprint: Fingerprint) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| CompactString::new(n.to_string_lossy()))
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| CompactString::new(format!(".{}", e.to_string_lossy())))
            .unwrap_or_default();

        Self {
            name,
            path,
            extension,
            fingerprint,
        }
    }

    /// Path to the file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// An image judged similar to some source image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuplicateImage {
    /// The similar image.
    pub image: LocalImage,
    /// Similarity score that produced the judgement, in `0.0..=1.0`.
    pub similarity: f64,
}

impl DuplicateImage {
    /// Create a new duplicate entry.
    pub fn new(image: LocalImage, similarity: f64) -> Self {
        Self { image, similarity }
    }

    /// Similarity as a percentage.
    pub fn percent(&self) -> f64 {
        self.similarity * 100.0
    }
}

/// A root image and the duplicates found for it, in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeDupifyrResult {
    /// The root image.
    pub source: LocalImage,
    /// Duplicates of the root, append-only.
    pub duplicates: Vec<DuplicateImage>,
}

impl DeDupifyrResult {
    /// Create a result with no duplicates yet.
    pub fn new(source: LocalImage) -> Self {
        Self {
            source,
            duplicates: Vec::new(),
        }
    }

    /// Append a duplicate.
    pub fn push(&mut self, duplicate: DuplicateImage) {
        self.duplicates.push(duplicate);
    }

    /// Check if any duplicates were recorded.
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }

    /// Number of duplicates recorded.
    pub fn duplicate_count(&self) -> usize {
        self.duplicates.len()
    }
}

/// Channel layout of a decoded raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8-bit grayscale.
    Luma8,
    /// 8-bit grayscale with alpha.
    LumaA8,
    /// 8-bit RGB.
    Rgb8,
    /// 8-bit RGBA.
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Luma8 => 1,
            PixelFormat::LumaA8 => 2,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
        }
    }
}

/// Decoded pixels, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Bytes per row.
    pub stride: usize,
    /// Channel layout.
    pub format: PixelFormat,
    /// Raw channel bytes, `stride * height` long.
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Create a tightly packed raster (stride = width * channels).
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width as usize * format.channels(),
            format,
            pixels,
        }
    }

    /// Number of channel bytes.
    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Whether the raster has no bytes.
    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }
}
