//! Split command - builds all pages across parallel processes

use std::{
    path::{Path, PathBuf},
    time::Instant,
};

use color_eyre::eyre::{Result, WrapErr};
use mpa_core::{Config, PageFilter};
use mpa_generator::{
    Builder, GroupCommand, ImageCopier, PageDiscovery, SplitDriver, SplitSummary, partition,
};

/// Run the split command.
///
/// Partitions every page into groups and runs one `build` process per group
/// concurrently. Fails when any group fails.
pub async fn run(config_path: &Path, groups: Option<usize>, verbose: u8) -> Result<()> {
    let start = Instant::now();
    tracing::info!(?config_path, ?groups, "Starting split build");

    let config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;

    // Sibling groups share the output directory, so it is cleaned once here.
    if config.split.clean {
        Builder::new(config.clone())
            .clean_output()
            .wrap_err("Failed to clean output directory")?;
    }

    let pages = PageDiscovery::from_config(&config)
        .discover(&PageFilter::All)
        .wrap_err("Page discovery failed")?;

    let plan = partition(&pages, groups.unwrap_or(config.split.groups));
    println!();
    println!("  Building {} pages in {} groups", pages.len(), plan.len());

    // Split builds run in production mode. Images are copied once here rather
    // than by every group.
    let images = ImageCopier::new(&config.build.images_dir)
        .copy_into(&config.build.output_dir)
        .wrap_err("Failed to copy images")?;
    tracing::debug!(images, "copied images before fan-out");

    let program = std::env::current_exe().wrap_err("Failed to locate the mpa executable")?;
    let command = child_command(program, config_path, verbose)
        .env(Config::env_key("build", "copy_images"), "false");
    let driver = SplitDriver::from_config(&config, command);

    let summary = driver.run(plan).await.wrap_err("Split build failed")?;
    print_summary(&summary);

    let duration = start.elapsed();
    tracing::info!(?duration, failed = summary.failed().len(), "Split build finished");

    summary.into_result().wrap_err("Split build failed")?;

    println!("  Split build completed successfully!");
    println!();
    println!("  Images:     {images}");
    println!("  Duration:   {:.2}s", duration.as_secs_f64());
    println!("  Output:     {}", config.build.output_dir.display());
    println!();

    Ok(())
}

/// Command template for a child build: `<program> --config <path> [-v..] build`.
fn child_command(program: impl Into<PathBuf>, config_path: &Path, verbose: u8) -> GroupCommand {
    let mut command = GroupCommand::new(program)
        .arg("--config")
        .arg(config_path);

    if verbose > 0 {
        command = command.arg(format!("-{}", "v".repeat(usize::from(verbose))));
    }

    command.arg("build")
}

/// Print each group's result in launch order.
fn print_summary(summary: &SplitSummary) {
    println!();
    for report in &summary.reports {
        println!(
            "  Group {} ({} pages): {} in {:.2}s",
            report.index,
            report.pages.len(),
            report.outcome,
            report.duration.as_secs_f64()
        );

        for line in report.stdout.lines().filter(|l| !l.trim().is_empty()) {
            println!("    | {line}");
        }
        for line in report.stderr.lines().filter(|l| !l.trim().is_empty()) {
            println!("    ! {line}");
        }
    }
    println!();
}
