//! Check command - validate configuration and report pages and entries

use std::path::Path;

use color_eyre::eyre::{Result, bail};
use mpa_core::{Config, PageFilter};
use mpa_generator::{EntryGraphBuilder, PageDiscovery};

/// Validation result.
#[derive(Debug, Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Run the check command.
///
/// Validates the configuration and reports the discovered pages and entries.
pub fn run(config_path: &Path, strict: bool) -> Result<()> {
    tracing::info!(?config_path, strict, "Checking configuration and pages");

    let mut result = ValidationResult::default();

    // Validate configuration
    println!("Checking configuration...");
    let config = match Config::load_with_env(config_path) {
        Ok(c) => {
            if !config_path.exists() {
                result.add_warning(format!(
                    "{} not found, using defaults",
                    config_path.display()
                ));
            }
            println!("  ✓ Configuration valid");
            Some(c)
        }
        Err(e) => {
            result.add_error(format!("Configuration error: {e}"));
            println!("  ✗ Configuration invalid: {e}");
            None
        }
    };

    if let Some(ref cfg) = config {
        println!("\nChecking pages...");
        check_pages(cfg, &mut result);

        println!("\nChecking shared sources...");
        check_sources(cfg, &mut result);
    }

    // Print summary
    println!();
    println!("Summary:");
    println!("  Errors:   {}", result.errors.len());
    println!("  Warnings: {}", result.warnings.len());

    if result.has_errors() {
        println!();
        println!("Errors:");
        for err in &result.errors {
            println!("  ✗ {err}");
        }
    }

    if result.has_warnings() {
        println!();
        println!("Warnings:");
        for warn in &result.warnings {
            println!("  ⚠ {warn}");
        }
    }

    // Determine exit status
    if result.has_errors() {
        bail!("Validation failed with {} error(s)", result.errors.len());
    }

    if strict && result.has_warnings() {
        bail!(
            "Validation failed with {} warning(s) (strict mode)",
            result.warnings.len()
        );
    }

    println!();
    println!("✓ All checks passed");

    Ok(())
}

/// Discover pages and list the entries they produce.
fn check_pages(config: &Config, result: &mut ValidationResult) {
    let pages = match PageDiscovery::from_config(config).discover(&PageFilter::All) {
        Ok(pages) => pages,
        Err(e) => {
            result.add_error(e.to_string());
            println!("  ✗ {e}");
            return;
        }
    };

    let graph = EntryGraphBuilder::new(config).build(&pages);
    println!("  ✓ {} pages, {} entries", pages.len(), graph.len());

    for page in &pages {
        let chunks = graph.chunks_for(page).join(", ");
        println!("    {page} [{chunks}]");
    }
}

/// Check the shared entry sources, the output path, and the image directory.
fn check_sources(config: &Config, result: &mut ValidationResult) {
    for source in [&config.build.common_script, &config.build.common_style] {
        if source.is_file() {
            println!("  ✓ {} exists", source.display());
        } else {
            result.add_error(format!("Common source missing: {}", source.display()));
            println!("  ✗ {} missing", source.display());
        }
    }

    let output = &config.build.output_dir;
    if output.exists() && !output.is_dir() {
        result.add_error(format!(
            "Output path exists but is not a directory: {}",
            output.display()
        ));
    }

    if config.is_production() && !config.build.images_dir.is_dir() {
        result.add_warning(format!(
            "Image directory missing: {}",
            config.build.images_dir.display()
        ));
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use mpa_core::BuildMode;
    use tempfile::TempDir;

    use super::*;

    fn config_for(root: &Path) -> Config {
        let mut config = Config::default();
        config.build.pages_dir = root.join("pages");
        config.build.output_dir = root.join("dist");
        config.build.common_script = root.join("common.js");
        config.build.common_style = root.join("common.css");
        config.build.images_dir = root.join("images");
        config
    }

    #[test]
    fn test_check_pages_reports_missing_pages() {
        let dir = TempDir::new().unwrap();
        let mut result = ValidationResult::default();

        check_pages(&config_for(dir.path()), &mut result);

        assert!(result.has_errors());
        assert!(result.errors[0].contains("no pages matching"));
    }

    #[test]
    fn test_check_sources() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("common.js"), "").unwrap();
        let mut config = config_for(dir.path());
        config.build.mode = BuildMode::Production;

        let mut result = ValidationResult::default();
        check_sources(&config, &mut result);

        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("common.css"));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_check_valid_site() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pages")).unwrap();
        fs::write(dir.path().join("pages/index.html.page"), "<p></p>").unwrap();
        fs::write(dir.path().join("common.js"), "").unwrap();
        fs::write(dir.path().join("common.css"), "").unwrap();
        let config = config_for(dir.path());

        let mut result = ValidationResult::default();
        check_pages(&config, &mut result);
        check_sources(&config, &mut result);

        assert!(!result.has_errors());
        assert!(!result.has_warnings());
    }
}
