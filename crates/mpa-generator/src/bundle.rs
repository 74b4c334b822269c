//! Script and style bundling.
//!
//! A [`Bundler`] turns an [`EntryGraph`] into files under the output tree and
//! reports the public URLs emitted for each entry. [`ConcatBundler`] is the
//! built-in implementation: it concatenates each entry's sources into
//! `assets/js/<entry>.js` and `assets/css/<entry>.css`.

use std::{
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use mpa_core::{Config, PageId};
use thiserror::Error;
use tracing::{debug, info};

use crate::entry::{Entry, EntryGraph};

/// Script output directory, relative to the output root.
pub const SCRIPT_DIR: &str = "assets/js";

/// Style output directory, relative to the output root.
pub const STYLE_DIR: &str = "assets/css";

/// Bundling errors.
#[derive(Debug, Error)]
pub enum BundleError {
    /// An entry source file does not exist.
    #[error("entry `{entry}`: source {path} does not exist")]
    MissingSource { entry: String, path: PathBuf },

    /// An entry source is neither a script nor a style.
    #[error("entry `{entry}`: unsupported source {path}")]
    UnsupportedSource { entry: String, path: PathBuf },

    /// IO error while reading a source or writing a bundle.
    #[error("failed to bundle {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for bundling operations.
pub type Result<T> = std::result::Result<T, BundleError>;

/// Public URLs emitted for an entry or page, in injection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmittedAssets {
    pub scripts: Vec<String>,
    pub styles: Vec<String>,
}

impl EmittedAssets {
    /// Append another set of assets after this one.
    pub fn extend(&mut self, other: &Self) {
        self.scripts.extend(other.scripts.iter().cloned());
        self.styles.extend(other.styles.iter().cloned());
    }

    /// Whether nothing was emitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.styles.is_empty()
    }
}

/// Assets emitted per entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleOutput {
    entries: IndexMap<String, EmittedAssets>,
}

impl BundleOutput {
    /// Record the assets of an entry.
    pub fn insert(&mut self, entry: impl Into<String>, assets: EmittedAssets) {
        self.entries.insert(entry.into(), assets);
    }

    /// Assets of a single entry.
    #[must_use]
    pub fn get(&self, entry: &str) -> Option<&EmittedAssets> {
        self.entries.get(entry)
    }

    /// Assets wired into a page: its chunks' assets concatenated in order.
    #[must_use]
    pub fn page_assets(&self, graph: &EntryGraph, page: &PageId) -> EmittedAssets {
        let mut assets = EmittedAssets::default();
        for chunk in graph.chunks_for(page) {
            if let Some(emitted) = self.entries.get(chunk) {
                assets.extend(emitted);
            }
        }
        assets
    }

    /// Number of bundled entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entry was bundled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of files emitted.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.entries
            .values()
            .map(|a| a.scripts.len() + a.styles.len())
            .sum()
    }
}

/// Compiles entries into output files.
pub trait Bundler: Debug + Send + Sync {
    /// Bundle every entry of `graph` into `out_root`.
    fn bundle(&self, graph: &EntryGraph, out_root: &Path) -> Result<BundleOutput>;
}

/// Bundler that concatenates sources verbatim.
#[derive(Debug, Clone)]
pub struct ConcatBundler {
    public_path: String,
    script_ext: String,
    style_ext: String,
}

impl Default for ConcatBundler {
    fn default() -> Self {
        Self::new("/", "js", "css")
    }
}

impl ConcatBundler {
    /// Create a bundler emitting URLs under `public_path`.
    #[must_use]
    pub fn new(
        public_path: impl Into<String>,
        script_ext: impl Into<String>,
        style_ext: impl Into<String>,
    ) -> Self {
        let mut public_path = public_path.into();
        if !public_path.ends_with('/') {
            public_path.push('/');
        }

        Self {
            public_path,
            script_ext: script_ext.into(),
            style_ext: style_ext.into(),
        }
    }

    /// Create a bundler from the build configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.build.public_path,
            &config.build.script_ext,
            &config.build.style_ext,
        )
    }

    /// The public path prefix, always ending in `/`.
    #[must_use]
    pub fn public_path(&self) -> &str {
        &self.public_path
    }

    fn bundle_entry(&self, entry: &Entry, out_root: &Path) -> Result<EmittedAssets> {
        let mut scripts = Vec::new();
        let mut styles = Vec::new();

        for source in &entry.sources {
            if !source.is_file() {
                return Err(BundleError::MissingSource {
                    entry: entry.name.clone(),
                    path: source.clone(),
                });
            }

            let ext = source.extension().map(|e| e.to_string_lossy());
            match ext.as_deref() {
                Some(e) if e == self.script_ext => scripts.push(source.as_path()),
                Some(e) if e == self.style_ext => styles.push(source.as_path()),
                _ => {
                    return Err(BundleError::UnsupportedSource {
                        entry: entry.name.clone(),
                        path: source.clone(),
                    });
                }
            }
        }

        let mut emitted = EmittedAssets::default();
        if !scripts.is_empty() {
            let relative = format!("{SCRIPT_DIR}/{}.js", entry.name);
            write_bundle(&scripts, &out_root.join(&relative))?;
            emitted.scripts.push(format!("{}{relative}", self.public_path));
        }
        if !styles.is_empty() {
            let relative = format!("{STYLE_DIR}/{}.css", entry.name);
            write_bundle(&styles, &out_root.join(&relative))?;
            emitted.styles.push(format!("{}{relative}", self.public_path));
        }

        Ok(emitted)
    }
}

impl Bundler for ConcatBundler {
    fn bundle(&self, graph: &EntryGraph, out_root: &Path) -> Result<BundleOutput> {
        info!(entries = graph.len(), out = %out_root.display(), "bundling entries");

        let mut output = BundleOutput::default();
        for entry in graph.entries() {
            let emitted = self.bundle_entry(entry, out_root)?;
            debug!(
                entry = %entry.name,
                scripts = emitted.scripts.len(),
                styles = emitted.styles.len(),
                "bundled entry"
            );
            output.insert(entry.name.clone(), emitted);
        }

        info!(files = output.file_count(), "bundling complete");
        Ok(output)
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> BundleError {
    let path = path.to_path_buf();
    move |source| BundleError::Io { path, source }
}

fn staging_path(dest: &Path) -> PathBuf {
    let mut name = dest.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{}.tmp", std::process::id()));
    dest.with_file_name(name)
}

fn write_bundle(sources: &[&Path], dest: &Path) -> Result<()> {
    let mut content = String::new();
    for &source in sources {
        let text = fs::read_to_string(source).map_err(io_error(source))?;
        content.push_str(&text);
        if !text.ends_with('\n') {
            content.push('\n');
        }
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }

    // Split groups write the shared `common` bundle concurrently; readers only
    // ever see a complete file.
    let staging = staging_path(dest);
    fs::write(&staging, content).map_err(io_error(&staging))?;
    fs::rename(&staging, dest).map_err(io_error(dest))?;

    Ok(())
}
