//! Page discovery.
//!
//! Walks the page root for page-definition files and derives a [`PageId`]
//! for each, optionally restricted by a [`PageFilter`].

use std::path::{Path, PathBuf};

use mpa_core::{Config, PageFilter, PageId};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Page discovery errors.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// No page-definition file matched.
    #[error("no pages matching `{filter}` found under {root}")]
    NotFound { root: PathBuf, filter: String },

    /// A page named in an explicit filter list has no definition file.
    #[error("page `{id}` not found: {path} does not exist")]
    PageFilter { id: PageId, path: PathBuf },

    /// Directory traversal error.
    #[error("failed to walk page directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Result type for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;

/// Scanner for page-definition files under a page root.
#[derive(Debug, Clone)]
pub struct PageDiscovery {
    root: PathBuf,
    suffix: String,
}

impl PageDiscovery {
    /// Create a scanner for `root`, matching files ending in `suffix`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            suffix: suffix.into(),
        }
    }

    /// Create a scanner from the build configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.build.pages_dir, &config.build.page_suffix)
    }

    /// The page root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The page-definition suffix.
    #[must_use]
    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Discover the pages selected by `filter`.
    ///
    /// Fails with [`DiscoveryError::NotFound`] when nothing matches, and with
    /// [`DiscoveryError::PageFilter`] when an explicitly listed page is missing.
    pub fn discover(&self, filter: &PageFilter) -> Result<Vec<PageId>> {
        info!(root = %self.root.display(), %filter, "discovering pages");

        let pages = match filter {
            PageFilter::All => self.find_all()?,
            PageFilter::Glob(_) => {
                let matcher = filter.matcher();
                self.find_all()?
                    .into_iter()
                    .filter(|id| matcher.as_ref().is_some_and(|m| m.is_match(id.as_str())))
                    .collect()
            }
            PageFilter::List(ids) => self.resolve_list(ids)?,
        };

        if pages.is_empty() {
            return Err(DiscoveryError::NotFound {
                root: self.root.clone(),
                filter: filter.to_string(),
            });
        }

        info!(count = pages.len(), "found pages");
        Ok(pages)
    }

    /// Find every page under the root, sorted by id.
    ///
    /// A missing root yields an empty list.
    pub fn find_all(&self) -> Result<Vec<PageId>> {
        if !self.root.exists() {
            debug!(root = %self.root.display(), "page root does not exist");
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            if let Some(id) = PageId::from_relative_path(relative, &self.suffix) {
                debug!(%id, "found page");
                pages.push(id);
            }
        }

        pages.sort();
        Ok(pages)
    }

    /// Resolve an explicit page list, keeping its order and dropping repeats.
    fn resolve_list(&self, ids: &[PageId]) -> Result<Vec<PageId>> {
        let mut pages: Vec<PageId> = Vec::with_capacity(ids.len());

        for id in ids {
            let path = id.source_path(&self.root, &self.suffix);
            if !path.is_file() {
                return Err(DiscoveryError::PageFilter {
                    id: id.clone(),
                    path,
                });
            }
            if !pages.contains(id) {
                pages.push(id.clone());
            }
        }

        Ok(pages)
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}
