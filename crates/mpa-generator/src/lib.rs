//! mpa Generator Library
//!
//! Page discovery, bundling, static rendering and split-build orchestration
//! for mpa.
//!
//! # Modules
//!
//! - [`discovery`] - Page-definition file discovery and filtering
//! - [`entry`] - Build entry graph (`common` plus per-page entries)
//! - [`bundle`] - Script and style bundling
//! - [`head`] - Per-render document head context
//! - [`component`] - Page components and the HTML comment helper
//! - [`render`] - Static document rendering
//! - [`postprocess`] - Final textual pass over rendered documents
//! - [`format`] - Indentation of finished documents
//! - [`assets`] - Image copying for production builds
//! - [`build`] - Single-invocation build orchestration
//! - [`partition`] - Page partitioning for split builds
//! - [`split`] - Parallel split-build driver

pub mod assets;
pub mod build;
pub mod bundle;
pub mod component;
pub mod discovery;
pub mod entry;
pub mod format;
pub mod head;
pub mod partition;
pub mod postprocess;
pub mod render;
pub mod split;

pub use assets::ImageCopier;
pub use build::{BuildError, BuildStats, Builder};
pub use bundle::{BundleOutput, Bundler, ConcatBundler, EmittedAssets};
pub use component::{Component, FilePage, HtmlComment, RenderError, Rendered};
pub use discovery::{DiscoveryError, PageDiscovery};
pub use entry::{COMMON_ENTRY, EntryGraph, EntryGraphBuilder};
pub use head::Head;
pub use partition::partition;
pub use render::StaticRenderer;
pub use split::{GroupCommand, GroupOutcome, GroupReport, SplitDriver, SplitError, SplitSummary};
