//! JWalk-based image enumeration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use jwalk::{Parallelism, WalkDir};
use tracing::{debug, warn};

use dedupifyr_core::{ComparisonOptions, ScanError, SearchDepth};

/// Lists image files under a directory using jwalk for parallel traversal.
///
/// Entries are sorted by name within each directory, so the order of the
/// returned paths is stable between runs.
///
/// Any entry that cannot be read fails the whole walk; a listing is either
/// complete or an error.
#[derive(Debug, Clone, Default)]
pub struct ImageWalker {
    threads: usize,
    follow_links: bool,
}

impl ImageWalker {
    /// Create a walker on the default rayon pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a walker with its own pool of `threads` threads (0 = default pool).
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads,
            ..Self::default()
        }
    }

    /// Follow symbolic links while walking. Off by default.
    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    /// Collect every file under `root` that `options` accepts as an image,
    /// honouring the configured search depth.
    pub fn walk(&self, root: &Path, options: &ComparisonOptions) -> Result<Vec<PathBuf>, ScanError> {
        let metadata = std::fs::metadata(root).map_err(|e| ScanError::io(root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let parallelism = match self.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let max_depth = match options.search_depth() {
            SearchDepth::TopOnly => 1,
            SearchDepth::Recursive => usize::MAX,
        };

        let walker = WalkDir::new(root)
            .parallelism(parallelism)
            .skip_hidden(false)
            .follow_links(self.follow_links)
            .sort(true)
            .min_depth(1)
            .max_depth(max_depth);

        let mut images = Vec::new();
        for entry_result in walker {
            let entry = entry_result.map_err(|err| walk_error(root, err))?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if options.is_image_path(&path) {
                images.push(path);
            }
        }

        debug!(root = %root.display(), count = images.len(), "enumerated images");
        Ok(images)
    }
}

fn walk_error(root: &Path, err: jwalk::Error) -> ScanError {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    let message = err.to_string();
    warn!(path = %path.display(), error = %message, "walk failed");

    match err.into_io_error() {
        Some(source) => ScanError::io(path, source),
        None => ScanError::Walk { path, message },
    }
}
