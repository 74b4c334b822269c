//! Watch command - development server with live reload

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use color_eyre::eyre::{Result, WrapErr};
use mpa_core::{Config, PageFilter};
use mpa_generator::{BuildStats, Builder};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher, event::ModifyKind};
use tokio::{net::TcpListener, sync::mpsc};

use crate::server::{ReloadMessage, ServerState, create_router, inject_livereload};

/// Quiet period after a change before rebuilding.
const DEBOUNCE_MS: u64 = 200;

/// Run the watch command.
///
/// Builds every page, serves the output directory and rebuilds whenever a
/// page, a shared source or an image changes.
pub async fn run(config_path: &Path, port: u16, open_browser: bool) -> Result<()> {
    tracing::info!(?config_path, port, "Starting watch mode");

    let config = Config::load_with_env(config_path).wrap_err("Failed to load configuration")?;
    let output_dir = config.build.output_dir.clone();

    // Initial build
    Builder::new(config.clone())
        .clean_output()
        .wrap_err("Failed to clean output directory")?;
    let stats = build_with_livereload(&config)?;
    print_build_stats(&stats);

    let state = Arc::new(ServerState::new());

    // Setup file watcher
    let (tx, mut rx) = mpsc::channel::<Vec<PathBuf>>(16);
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                // Only trigger on content, rename, create and remove events
                if matches!(
                    event.kind,
                    EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Name(_))
                        | EventKind::Create(_)
                        | EventKind::Remove(_)
                ) {
                    let _ = tx.blocking_send(event.paths);
                }
            }
        },
        notify::Config::default(),
    )
    .wrap_err("Failed to create file watcher")?;

    for (path, mode) in watch_targets(&config) {
        if path.exists() {
            watcher
                .watch(&path, mode)
                .wrap_err_with(|| format!("Failed to watch {}", path.display()))?;
            tracing::debug!(path = %path.display(), "watching");
        }
    }

    // Rebuild task
    let rebuild_state = state.clone();
    let rebuild_config = config.clone();
    tokio::spawn(async move {
        while let Some(mut changed) = rx.recv().await {
            tokio::time::sleep(Duration::from_millis(DEBOUNCE_MS)).await;
            while let Ok(more) = rx.try_recv() {
                changed.extend(more);
            }

            println!();
            println!("  File change detected, rebuilding...");

            let config = rebuild_config.clone();
            let rebuilt = tokio::task::spawn_blocking(move || build_with_livereload(&config)).await;

            match rebuilt {
                Ok(Ok(stats)) => {
                    println!("  ✓ Rebuilt {} pages in {}ms", stats.pages, stats.duration_ms);
                    let message = reload_message(&changed, &rebuild_config.build.style_ext);
                    rebuild_state.notify(message);
                }
                Ok(Err(e)) => {
                    tracing::error!("Rebuild failed: {e:?}");
                    eprintln!("  ✗ Rebuild failed: {e}");
                }
                Err(e) => tracing::error!("Rebuild task failed: {e}"),
            }
        }
    });

    // Start server
    let app = create_router(&output_dir, state);
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("Failed to bind to {addr}"))?;

    println!();
    println!("  Dev server running at http://{addr}");
    println!("  Press Ctrl+C to stop");
    println!();

    if open_browser {
        let _ = open::that(format!("http://{addr}"));
    }

    // Keep watcher alive
    let _watcher = watcher;

    axum::serve(listener, app).await.wrap_err("Server error")?;

    Ok(())
}

/// Paths that trigger a rebuild, with their watch mode.
fn watch_targets(config: &Config) -> Vec<(PathBuf, RecursiveMode)> {
    vec![
        (config.build.pages_dir.clone(), RecursiveMode::Recursive),
        (config.build.common_script.clone(), RecursiveMode::NonRecursive),
        (config.build.common_style.clone(), RecursiveMode::NonRecursive),
        (config.build.images_dir.clone(), RecursiveMode::Recursive),
    ]
}

/// Stylesheet-only changes refresh styles in place; anything else reloads.
fn reload_message(changed: &[PathBuf], style_ext: &str) -> ReloadMessage {
    let styles_only = !changed.is_empty()
        && changed
            .iter()
            .all(|path| path.extension().is_some_and(|ext| ext == style_ext));

    if styles_only {
        ReloadMessage::CssReload
    } else {
        ReloadMessage::Reload
    }
}

/// Build every page and add the live reload client to the written documents.
fn build_with_livereload(config: &Config) -> Result<BuildStats> {
    let stats = Builder::new(config.clone())
        .build(&PageFilter::All)
        .wrap_err("Build failed")?;

    let injected = inject_into_output(&config.build.output_dir)?;
    tracing::debug!(?stats, injected, "Build completed");
    Ok(stats)
}

/// Inject the live reload client into every HTML file under `output_dir`.
fn inject_into_output(output_dir: &Path) -> Result<usize> {
    let mut count = 0;

    for entry in walkdir::WalkDir::new(output_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
    {
        let path = entry.path();
        let content = fs::read_to_string(path)?;
        if let Some(modified) = inject_livereload(&content) {
            fs::write(path, modified)?;
            count += 1;
        }
    }

    Ok(count)
}

fn print_build_stats(stats: &BuildStats) {
    println!();
    println!("  Build Statistics:");
    println!("  ─────────────────────────────────");
    println!("  Pages:        {:>6}", stats.pages);
    println!("  Entries:      {:>6}", stats.entries);
    println!("  Bundles:      {:>6}", stats.bundles);
    println!("  Images:       {:>6}", stats.images);
    println!("  ─────────────────────────────────");
    println!("  Duration:     {:>6}ms", stats.duration_ms);
    println!();
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_reload_message() {
        let css = [PathBuf::from("src/common.css"), PathBuf::from("src/pages/a.css")];
        assert_eq!(reload_message(&css, "css"), ReloadMessage::CssReload);

        let mixed = [PathBuf::from("src/common.css"), PathBuf::from("src/pages/a.html.page")];
        assert_eq!(reload_message(&mixed, "css"), ReloadMessage::Reload);
        assert_eq!(reload_message(&[], "css"), ReloadMessage::Reload);
    }

    #[test]
    fn test_watch_targets_follow_config() {
        let config = Config::default();
        let targets: Vec<_> = watch_targets(&config).into_iter().map(|(p, _)| p).collect();
        assert_eq!(
            targets,
            vec![
                PathBuf::from("src/pages"),
                PathBuf::from("src/common.js"),
                PathBuf::from("src/common.css"),
                PathBuf::from("src/assets/images"),
            ]
        );
    }

    #[test]
    fn test_build_with_livereload() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/common.js", "");
        write(dir.path(), "src/common.css", "");
        write(dir.path(), "src/pages/index.html.page", "<p>index</p>");
        write(dir.path(), "src/pages/blog/post.html.page", "<p>post</p>");

        let mut config = Config::default();
        config.build.pages_dir = dir.path().join("src/pages");
        config.build.output_dir = dir.path().join("dist");
        config.build.common_script = dir.path().join("src/common.js");
        config.build.common_style = dir.path().join("src/common.css");

        let stats = build_with_livereload(&config).unwrap();
        assert_eq!(stats.pages, 2);

        let post = fs::read_to_string(dir.path().join("dist/blog/post.html")).unwrap();
        assert_eq!(post.matches("data-mpa-livereload").count(), 1);

        // A rebuild rewrites the pages and injects the client again, once.
        build_with_livereload(&config).unwrap();
        let index = fs::read_to_string(dir.path().join("dist/index.html")).unwrap();
        assert_eq!(index.matches("data-mpa-livereload").count(), 1);
        assert!(index.contains("</script>\n</body>"));
    }
}
