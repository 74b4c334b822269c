//! Static image copying.
//!
//! Production builds copy the image tree verbatim into the output directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};

/// Image output directory, relative to the output root.
pub const IMAGE_DIR: &str = "assets/images";

/// Asset copying errors.
#[derive(Debug, Error)]
pub enum AssetError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid asset path.
    #[error("invalid asset path: {0}")]
    InvalidPath(PathBuf),
}

/// Result type for asset operations.
pub type Result<T> = std::result::Result<T, AssetError>;

/// Copies an image directory into the output tree.
#[derive(Debug, Clone)]
pub struct ImageCopier {
    source: PathBuf,
}

impl ImageCopier {
    /// Create a copier for `source`.
    #[must_use]
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Copy every non-hidden file to `<out_root>/assets/images`.
    ///
    /// A missing source directory is a no-op. Returns the number of files copied.
    pub fn copy_into(&self, out_root: &Path) -> Result<usize> {
        let dest = out_root.join(IMAGE_DIR);
        info!(
            source = %self.source.display(),
            dest = %dest.display(),
            "copying images"
        );

        if !self.source.is_dir() {
            debug!("image directory does not exist, skipping");
            return Ok(0);
        }

        let count = self.copy_dir(&self.source, &dest)?;
        info!(count, "images copied");
        Ok(count)
    }

    fn copy_dir(&self, current: &Path, dest_base: &Path) -> Result<usize> {
        let mut count = 0;

        for entry in fs::read_dir(current)? {
            let path = entry?.path();

            if path
                .file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with('.'))
            {
                continue;
            }

            if path.is_dir() {
                count += self.copy_dir(&path, dest_base)?;
            } else if path.is_file() {
                let relative = path
                    .strip_prefix(&self.source)
                    .map_err(|_| AssetError::InvalidPath(path.clone()))?;
                let dest = dest_base.join(relative);

                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(&path, &dest)?;
                debug!(src = %path.display(), dest = %dest.display(), "copied image");
                count += 1;
            }
        }

        Ok(count)
    }
}
