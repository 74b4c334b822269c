//! Build orchestration.
//!
//! Runs one build invocation: discover pages, derive entries, bundle, render
//! every page and write the results.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use mpa_core::{Config, CoreError, PageFilter, PageId};
use rayon::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    assets::{AssetError, ImageCopier},
    bundle::{BundleError, Bundler, ConcatBundler},
    component::{FilePage, RenderError},
    discovery::{DiscoveryError, PageDiscovery},
    entry::EntryGraphBuilder,
    render::StaticRenderer,
};

/// Build errors.
#[derive(Debug, Error)]
pub enum BuildError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(#[from] CoreError),

    /// Page discovery error.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Bundling error.
    #[error("bundle error: {0}")]
    Bundle(#[from] BundleError),

    /// A page failed to render.
    #[error("failed to render page `{page}`: {source}")]
    Render {
        page: PageId,
        #[source]
        source: RenderError,
    },

    /// Asset error.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),
}

/// Result type for build operations.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build statistics.
#[derive(Debug, Clone, Default)]
pub struct BuildStats {
    /// Number of pages written.
    pub pages: usize,

    /// Number of bundle entries, including `common`.
    pub entries: usize,

    /// Number of bundle files emitted.
    pub bundles: usize,

    /// Number of images copied.
    pub images: usize,

    /// Build duration in milliseconds.
    pub duration_ms: u64,
}

/// Site builder for a single invocation.
#[derive(Debug)]
pub struct Builder {
    config: Config,
    output_dir: PathBuf,
    bundler: Box<dyn Bundler>,
}

impl Builder {
    /// Create a builder writing to the configured output directory.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let bundler = ConcatBundler::from_config(&config);
        Self {
            output_dir: config.build.output_dir.clone(),
            config,
            bundler: Box::new(bundler),
        }
    }

    /// Override the output directory.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Replace the bundler.
    #[must_use]
    pub fn with_bundler(mut self, bundler: impl Bundler + 'static) -> Self {
        self.bundler = Box::new(bundler);
        self
    }

    /// The output directory.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Build the pages selected by `filter`.
    ///
    /// Nothing is written for any page unless every selected page renders.
    /// The output directory is never cleaned here.
    pub fn build(&self, filter: &PageFilter) -> Result<BuildStats> {
        let start = Instant::now();
        let mut stats = BuildStats::default();

        info!(
            pages = %self.config.build.pages_dir.display(),
            output = %self.output_dir.display(),
            mode = self.config.build.mode.as_str(),
            "starting build"
        );

        self.config.validate()?;

        // 1. Discover pages
        let pages = PageDiscovery::from_config(&self.config).discover(filter)?;

        // 2. Derive entries
        let graph = EntryGraphBuilder::new(&self.config).build(&pages);
        stats.entries = graph.len();

        // 3. Bundle
        fs::create_dir_all(&self.output_dir)?;
        let bundle = self.bundler.bundle(&graph, &self.output_dir)?;
        stats.bundles = bundle.file_count();

        // 4. Render every page before writing any
        let renderer = StaticRenderer::from_config(&self.config);
        let root = &self.config.build.pages_dir;
        let suffix = &self.config.build.page_suffix;

        info!(count = pages.len(), "rendering pages");
        let documents = pages
            .par_iter()
            .map(|id| {
                let page = FilePage::locate(root, id, suffix);
                let assets = bundle.page_assets(&graph, id);
                renderer
                    .render(&page, &assets)
                    .map(|html| (id, html))
                    .map_err(|source| BuildError::Render {
                        page: id.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        // 5. Write pages
        for (id, html) in &documents {
            let path = id.output_path(&self.output_dir);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, html)?;
            debug!(path = %path.display(), "wrote page");
        }
        stats.pages = documents.len();

        // 6. Copy images
        if self.config.copies_images() {
            stats.images = ImageCopier::new(&self.config.build.images_dir)
                .copy_into(&self.output_dir)?;
        }

        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pages = stats.pages,
            entries = stats.entries,
            bundles = stats.bundles,
            images = stats.images,
            duration_ms = stats.duration_ms,
            "build complete"
        );

        Ok(stats)
    }

    /// Remove and recreate the output directory.
    pub fn clean_output(&self) -> Result<()> {
        if self.output_dir.exists() {
            debug!(dir = %self.output_dir.display(), "cleaning output directory");
            fs::remove_dir_all(&self.output_dir)?;
        }
        fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}
