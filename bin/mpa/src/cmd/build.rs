//! Build command - renders pages in a single process

use std::{path::Path, time::Instant};

use color_eyre::eyre::{Result, WrapErr};
use mpa_core::{Config, PageFilter};
use mpa_generator::{BuildStats, Builder};

/// Run the build command.
///
/// Builds the pages selected by `page` (all pages when absent). The output
/// directory is not cleaned, so concurrent groups can share it.
pub fn run(config_path: &Path, page: Option<&str>, output: Option<&Path>) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?page, ?output, "Starting build");

    let mut config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;

    // Override output directory if specified
    if let Some(dir) = output {
        config.build.output_dir = dir.to_path_buf();
    }

    tracing::debug!(?config, "Loaded configuration");

    let filter = match page {
        Some(raw) => PageFilter::parse(raw).wrap_err("Invalid page filter")?,
        None => PageFilter::All,
    };

    let output_dir = config.build.output_dir.clone();
    let mode = config.build.mode;
    let stats = build(config, &filter)?;

    let duration = start.elapsed();

    // Print build statistics
    println!();
    println!("  Build completed successfully!");
    println!();
    println!("  Pages:      {}", stats.pages);
    println!("  Entries:    {}", stats.entries);
    println!("  Bundles:    {}", stats.bundles);
    println!("  Images:     {}", stats.images);
    println!("  Mode:       {}", mode.as_str());
    println!();
    println!("  Duration:   {:.2}s", duration.as_secs_f64());
    println!("  Output:     {}", output_dir.display());
    println!();

    tracing::info!(?stats, ?duration, "Build completed successfully");

    Ok(())
}

/// Build `filter` with an already loaded configuration.
pub fn build(config: Config, filter: &PageFilter) -> Result<BuildStats> {
    Builder::new(config)
        .build(filter)
        .wrap_err_with(|| format!("Build failed for pages `{filter}`"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn site() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/common.js", "");
        write(dir.path(), "src/common.css", "");
        write(dir.path(), "src/pages/index.html.page", "<p>index</p>");

        let mut config = Config::default();
        config.build.pages_dir = dir.path().join("src/pages");
        config.build.output_dir = dir.path().join("dist");
        config.build.common_script = dir.path().join("src/common.js");
        config.build.common_style = dir.path().join("src/common.css");
        (dir, config)
    }

    #[test]
    fn test_build_selected_pages() {
        let (dir, config) = site();

        let stats = build(config, &PageFilter::All).unwrap();

        assert_eq!(stats.pages, 1);
        assert!(dir.path().join("dist/index.html").exists());
    }

    #[test]
    fn test_build_missing_page_reports_filter() {
        let (_dir, config) = site();

        let filter = PageFilter::parse("[missing]").unwrap();
        let err = build(config, &filter).unwrap_err();

        assert!(err.to_string().contains("[missing]"));
    }
}
