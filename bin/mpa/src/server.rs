//! Development server with live reload

use std::{convert::Infallible, path::Path, sync::Arc, time::Duration};

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use tokio::sync::broadcast;
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use tower_http::services::ServeDir;

/// Route of the live reload event stream.
pub const LIVERELOAD_PATH: &str = "/__livereload";

/// Live reload message sent to connected pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadMessage {
    /// Reload the whole page.
    Reload,
    /// Only stylesheets changed; refresh them in place.
    CssReload,
}

impl ReloadMessage {
    /// Event payload understood by [`LIVERELOAD_SCRIPT`].
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reload => "reload",
            Self::CssReload => "css-reload",
        }
    }
}

/// Shared server state holding the reload broadcaster.
#[derive(Debug, Clone)]
pub struct ServerState {
    reload_tx: broadcast::Sender<ReloadMessage>,
}

impl ServerState {
    pub fn new() -> Self {
        let (reload_tx, _) = broadcast::channel(16);
        Self { reload_tx }
    }

    /// Send `message` to every connected page. Returns the number of receivers.
    pub fn notify(&self, message: ReloadMessage) -> usize {
        self.reload_tx.send(message).unwrap_or(0)
    }

    /// Subscribe to reload messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadMessage> {
        self.reload_tx.subscribe()
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Router serving `output_dir` plus the live reload stream.
pub fn create_router(output_dir: &Path, state: Arc<ServerState>) -> Router {
    Router::new()
        .route(LIVERELOAD_PATH, get(livereload_handler))
        .fallback_service(ServeDir::new(output_dir))
        .with_state(state)
}

async fn livereload_handler(
    State(state): State<Arc<ServerState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.subscribe()).filter_map(|msg| match msg {
        Ok(message) => Some(Ok(Event::default().data(message.as_str()))),
        // lagged
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

/// Client side of the live reload stream, injected before `</body>`.
pub const LIVERELOAD_SCRIPT: &str = r#"<script data-mpa-livereload>
(function() {
  var source = new EventSource('/__livereload');
  source.onmessage = function(event) {
    if (event.data === 'reload') {
      window.location.reload();
    } else if (event.data === 'css-reload') {
      document.querySelectorAll('link[rel="stylesheet"]').forEach(function(link) {
        link.href = link.href.split('?')[0] + '?v=' + Date.now();
      });
    }
  };
})();
</script>"#;

/// Insert [`LIVERELOAD_SCRIPT`] before the closing body tag.
///
/// Returns `None` when the document already carries the script or has no
/// `</body>`.
pub fn inject_livereload(html: &str) -> Option<String> {
    if html.contains("data-mpa-livereload") {
        return None;
    }
    let at = html.rfind("</body>")?;
    Some(format!("{}{LIVERELOAD_SCRIPT}\n{}", &html[..at], &html[at..]))
}
