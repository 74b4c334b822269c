//! Page identifiers and the `page` filter parameter.
//!
//! A [`PageId`] is the path of a page-definition file relative to the page
//! root with the page suffix removed, e.g. `src/pages/blog/index.html.page`
//! becomes `blog/index`. It doubles as build-entry name and output stem.

use std::{
    fmt,
    path::{Path, PathBuf},
    str::FromStr,
};

use globset::{Glob, GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Filter value selecting every page.
pub const ALL_PAGES: &str = "**/*";

/// Normalized, `/`-separated page identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    /// Create a page id, normalizing separators and stray slashes.
    pub fn new(id: impl AsRef<str>) -> Self {
        let normalized = id.as_ref().replace('\\', "/");
        Self(normalized.trim_matches('/').to_string())
    }

    /// Derive a page id from a path relative to the page root.
    ///
    /// Returns `None` when the file name does not carry `suffix` or nothing
    /// remains once it is stripped.
    pub fn from_relative_path(relative: &Path, suffix: &str) -> Option<Self> {
        let components: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let joined = components.join("/");
        let stem = joined.strip_suffix(suffix)?;

        if stem.is_empty() || stem.ends_with('/') {
            return None;
        }

        Some(Self::new(stem))
    }

    /// Whether every segment stays below the page root (no `.` or `..`).
    pub fn is_contained(&self) -> bool {
        self.0
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the page-definition file under `root`.
    pub fn source_path(&self, root: &Path, suffix: &str) -> PathBuf {
        root.join(format!("{}{suffix}", self.0))
    }

    /// Path of a sibling side-file (`<id>.<ext>`) under `root`.
    pub fn sibling_path(&self, root: &Path, ext: &str) -> PathBuf {
        root.join(format!("{}.{ext}", self.0))
    }

    /// Path of the rendered HTML document under `output_dir`.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(format!("{}.html", self.0))
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PageId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Restriction of a build invocation to a subset of pages.
///
/// Parsed from the `page` parameter:
///
/// - `**/*` (or no parameter): every page
/// - `prefix[a,b,c]`: exactly the pages `prefix + a`, `prefix + b`, ...
/// - anything else: a glob matched against page ids
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageFilter {
    /// Every discovered page.
    #[default]
    All,
    /// Pages whose id matches the glob.
    Glob(Glob),
    /// An explicit list of page ids, in the listed order.
    List(Vec<PageId>),
}

impl PageFilter {
    /// Parse a `page` parameter.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();

        if trimmed.is_empty() || trimmed == ALL_PAGES {
            return Ok(Self::All);
        }

        if let Some(open) = trimmed.find('[') {
            let prefix = &trimmed[..open];
            let inner = trimmed[open + 1..]
                .strip_suffix(']')
                .ok_or_else(|| CoreError::filter(raw, "missing closing `]`"))?;

            let ids: Vec<_> = inner
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(|name| PageId::new(format!("{prefix}{name}")))
                .collect();

            if ids.is_empty() {
                return Err(CoreError::filter(raw, "page list is empty"));
            }
            if let Some(id) = ids.iter().find(|id| !id.is_contained()) {
                return Err(CoreError::filter(
                    raw,
                    format!("page `{id}` leaves the page root"),
                ));
            }

            return Ok(Self::List(ids));
        }

        // `*` stops at `/`, so `*` selects top-level pages only.
        let glob = GlobBuilder::new(trimmed)
            .literal_separator(true)
            .build()
            .map_err(|e| CoreError::filter(raw, e.to_string()))?;
        Ok(Self::Glob(glob))
    }

    /// Build an explicit list filter for a group of pages.
    pub fn from_ids(ids: &[PageId]) -> Self {
        Self::List(ids.to_vec())
    }

    /// Compiled matcher for glob filters.
    pub fn matcher(&self) -> Option<GlobMatcher> {
        match self {
            Self::Glob(glob) => Some(glob.compile_matcher()),
            _ => None,
        }
    }
}

impl FromStr for PageFilter {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PageFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL_PAGES),
            Self::Glob(glob) => f.write_str(glob.glob()),
            Self::List(ids) => {
                let names: Vec<_> = ids.iter().map(PageId::as_str).collect();
                write!(f, "[{}]", names.join(","))
            }
        }
    }
}
