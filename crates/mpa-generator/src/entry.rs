//! Build entry graph.
//!
//! Maps entry names to the source files the bundler compiles for them. Every
//! graph carries the shared [`COMMON_ENTRY`]; a page gets its own entry only
//! when it has a sibling script or style file.

use std::path::{Path, PathBuf};

use mpa_core::{Config, PageId};
use tracing::debug;

/// Name of the always-present shared entry.
pub const COMMON_ENTRY: &str = "common";

/// A named bundle of source files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Entry name: [`COMMON_ENTRY`] or a page id.
    pub name: String,

    /// Source files in bundling order (script before style).
    pub sources: Vec<PathBuf>,
}

/// Ordered set of build entries: `common` first, then pages in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryGraph {
    entries: Vec<Entry>,
}

impl EntryGraph {
    /// All entries in order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Look up an entry by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Whether `name` has an entry.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of entries, including `common`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the graph has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Chunk names wired into a page's document, in injection order.
    #[must_use]
    pub fn chunks_for<'a>(&'a self, page: &'a PageId) -> Vec<&'a str> {
        let mut chunks = vec![COMMON_ENTRY];
        if self.contains(page.as_str()) {
            chunks.push(page.as_str());
        }
        chunks
    }

    fn insert(&mut self, name: impl Into<String>, sources: Vec<PathBuf>) {
        self.entries.push(Entry {
            name: name.into(),
            sources,
        });
    }
}

/// Builds an [`EntryGraph`] by probing the filesystem for page side-files.
#[derive(Debug, Clone)]
pub struct EntryGraphBuilder {
    pages_dir: PathBuf,
    script_ext: String,
    style_ext: String,
    common: Vec<PathBuf>,
}

impl EntryGraphBuilder {
    /// Create a builder from the build configuration.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            pages_dir: config.build.pages_dir.clone(),
            script_ext: config.build.script_ext.clone(),
            style_ext: config.build.style_ext.clone(),
            common: vec![
                config.build.common_script.clone(),
                config.build.common_style.clone(),
            ],
        }
    }

    /// Override the page root.
    #[must_use]
    pub fn with_pages_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pages_dir = dir.into();
        self
    }

    /// Override the sources of the shared entry.
    #[must_use]
    pub fn with_common(mut self, script: impl Into<PathBuf>, style: impl Into<PathBuf>) -> Self {
        self.common = vec![script.into(), style.into()];
        self
    }

    /// Build the entry graph for `pages`.
    ///
    /// Depends only on which side-files exist, so repeated calls over an
    /// unchanged tree return equal graphs.
    pub fn build(&self, pages: &[PageId]) -> EntryGraph {
        let mut graph = EntryGraph::default();
        graph.insert(COMMON_ENTRY, self.common.clone());

        for page in pages {
            let sources = self.page_sources(page);
            if sources.is_empty() {
                debug!(%page, "no page entry, common chunk only");
                continue;
            }

            debug!(%page, sources = sources.len(), "registered page entry");
            graph.insert(page.as_str(), sources);
        }

        graph
    }

    /// Existing side-files of a page, script first.
    fn page_sources(&self, page: &PageId) -> Vec<PathBuf> {
        [&self.script_ext, &self.style_ext]
            .into_iter()
            .map(|ext| page.sibling_path(&self.pages_dir, ext))
            .filter(|path| path.is_file())
            .collect()
    }

    /// The page root this builder scans.
    #[must_use]
    pub fn pages_dir(&self) -> &Path {
        &self.pages_dir
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn builder(root: &Path) -> EntryGraphBuilder {
        EntryGraphBuilder::new(&Config::default())
            .with_pages_dir(root)
            .with_common(root.join("common.js"), root.join("common.css"))
    }

    #[test]
    fn test_common_entry_always_present() {
        let dir = TempDir::new().unwrap();
        let graph = builder(dir.path()).build(&[]);

        assert_eq!(graph.len(), 1);
        let common = graph.get(COMMON_ENTRY).unwrap();
        assert_eq!(
            common.sources,
            vec![dir.path().join("common.js"), dir.path().join("common.css")]
        );
    }

    #[test]
    fn test_page_with_script_only() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.html.page");
        touch(dir.path(), "b/c.html.page");
        touch(dir.path(), "b/c.js");

        let pages = vec![PageId::new("a"), PageId::new("b/c")];
        let graph = builder(dir.path()).build(&pages);

        assert!(!graph.contains("a"));
        assert_eq!(graph.get("b/c").unwrap().sources, vec![dir.path().join("b/c.js")]);
        assert_eq!(graph.chunks_for(&PageId::new("a")), vec!["common"]);
        assert_eq!(graph.chunks_for(&PageId::new("b/c")), vec!["common", "b/c"]);
    }

    #[test]
    fn test_script_before_style() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "p.css");
        touch(dir.path(), "p.js");

        let graph = builder(dir.path()).build(&[PageId::new("p")]);
        assert_eq!(
            graph.get("p").unwrap().sources,
            vec![dir.path().join("p.js"), dir.path().join("p.css")]
        );
    }

    #[test]
    fn test_style_only_page() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "p.css");

        let graph = builder(dir.path()).build(&[PageId::new("p")]);
        assert_eq!(graph.get("p").unwrap().sources, vec![dir.path().join("p.css")]);
    }

    #[test]
    fn test_entries_follow_page_order() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "z.js");
        touch(dir.path(), "a.js");

        let graph = builder(dir.path()).build(&[PageId::new("z"), PageId::new("a")]);
        let names: Vec<_> = graph.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["common", "z", "a"]);
    }

    #[test]
    fn test_build_is_idempotent() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a.js");
        touch(dir.path(), "b.css");

        let pages = vec![PageId::new("a"), PageId::new("b"), PageId::new("c")];
        let builder = builder(dir.path());
        let first = builder.build(&pages);
        let second = builder.build(&pages);

        assert_eq!(first, second);
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
    }
}
