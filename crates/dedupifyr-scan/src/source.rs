//! Access to image files: enumeration, raw bytes and decoded pixels.

use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::trace;

use dedupifyr_core::{ComparisonOptions, PixelFormat, RasterImage, ScanError};

use crate::walker::ImageWalker;

/// Everything the detection engine needs from the file system.
///
/// Implementations must be shareable across worker threads.
pub trait ImageSource: Send + Sync {
    /// List candidate images under `directory`, in a stable order.
    fn list_images(
        &self,
        directory: &Path,
        options: &ComparisonOptions,
    ) -> Result<Vec<PathBuf>, ScanError>;

    /// Read the raw bytes of a file.
    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, ScanError>;

    /// Decode a file into pixels.
    fn decode(&self, path: &Path) -> Result<RasterImage, ScanError>;
}

/// [`ImageSource`] backed by the local file system.
///
/// Decoded images are always converted to [`PixelFormat::Rgba8`] so that
/// files of different encodings can be compared byte for byte.
#[derive(Debug, Clone, Default)]
pub struct FsImageSource {
    walker: ImageWalker,
}

impl FsImageSource {
    /// Create a source using the default rayon pool for walking.
    pub fn new() -> Self {
        Self {
            walker: ImageWalker::new(),
        }
    }

    /// Create a source whose walker uses `threads` threads.
    pub fn with_threads(threads: usize) -> Self {
        Self {
            walker: ImageWalker::with_threads(threads),
        }
    }
}

impl ImageSource for FsImageSource {
    fn list_images(
        &self,
        directory: &Path,
        options: &ComparisonOptions,
    ) -> Result<Vec<PathBuf>, ScanError> {
        self.walker.walk(directory, options)
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>, ScanError> {
        let bytes = std::fs::read(path).map_err(|e| ScanError::io(path, e))?;
        trace!(path = %path.display(), len = bytes.len(), "read file");
        Ok(bytes)
    }

    fn decode(&self, path: &Path) -> Result<RasterImage, ScanError> {
        let decoded = ImageReader::open(path)
            .map_err(|e| ScanError::io(path, e))?
            .with_guessed_format()
            .map_err(|e| ScanError::io(path, e))?
            .decode()
            .map_err(|e| ScanError::decode(path, e))?;

        let rgba = decoded.into_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(RasterImage::new(
            width,
            height,
            PixelFormat::Rgba8,
            rgba.into_raw(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_read_bytes() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("raw.png");
        fs::write(&path, [1u8, 2, 3]).unwrap();

        let source = FsImageSource::new();
        assert_eq!(source.read_bytes(&path).unwrap(), [1, 2, 3]);

        let err = source.read_bytes(&temp.path().join("missing.png")).unwrap_err();
        assert!(matches!(err, ScanError::NotFound { .. }));
    }

    #[test]
    fn test_decode_converts_to_rgba() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("red.png");
        RgbImage::from_pixel(4, 3, Rgb([255, 0, 0])).save(&path).unwrap();

        let raster = FsImageSource::new().decode(&path).unwrap();
        assert_eq!(raster.width, 4);
        assert_eq!(raster.height, 3);
        assert_eq!(raster.format, PixelFormat::Rgba8);
        assert_eq!(raster.stride, 16);
        assert_eq!(raster.len(), 48);
        assert_eq!(&raster.pixels[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.png");
        fs::write(&path, b"definitely not a png").unwrap();

        let err = FsImageSource::new().decode(&path).unwrap_err();
        assert!(matches!(err, ScanError::Decode { .. }));
    }

    #[test]
    fn test_list_images_delegates_to_walker() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("one.png"), "1").unwrap();
        fs::write(temp.path().join("two.txt"), "2").unwrap();

        let images = FsImageSource::new()
            .list_images(temp.path(), &ComparisonOptions::default())
            .unwrap();
        assert_eq!(images, [temp.path().join("one.png")]);
    }
}
