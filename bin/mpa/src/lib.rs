//! mpa CLI Library
//!
//! This library provides the command implementations for the mpa CLI. It is
//! designed to be used by the binary entry point while also exposing public
//! APIs for documentation and integration purposes.
//!
//! # Modules
//!
//! - [`cmd`] - Command implementations (build, split, check, watch)
//! - [`server`] - Development server with live reload
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use mpa::cmd;
//!
//! // Build every page in one process
//! cmd::build::run(Path::new("mpa.toml"), None, None).unwrap();
//! ```

pub mod cmd;
pub mod server;

// Re-export core types for convenience
pub use mpa_core::{Config, PageFilter, PageId};
pub use mpa_generator::{BuildStats, Builder, SplitDriver, SplitSummary};

/// Initialize tracing with the specified verbosity level.
///
/// # Arguments
///
/// * `verbose` - Verbosity level (0 = WARN, 1 = INFO, 2 = DEBUG, 3+ = TRACE)
///
/// # Example
///
/// ```no_run
/// mpa::init_tracing(2); // Enable DEBUG level logging
/// ```
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
