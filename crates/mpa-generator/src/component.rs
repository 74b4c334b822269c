//! Page components.
//!
//! A [`Component`] produces body markup and records its head metadata into the
//! [`Head`] it is handed. Page-definition files are loaded as [`FilePage`]s.

use std::{
    fs,
    path::{Path, PathBuf},
};

use mpa_core::{CoreError, PageId, frontmatter::parse_frontmatter};
use thiserror::Error;
use tracing::debug;

use crate::head::Head;

/// Component render errors.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The page-definition file could not be read.
    #[error("failed to load page {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The page frontmatter is invalid.
    #[error(transparent)]
    Frontmatter(#[from] CoreError),

    /// The component itself failed.
    #[error("component `{name}` failed: {message}")]
    Component { name: String, message: String },
}

impl RenderError {
    /// Create a component failure.
    pub fn component(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Component {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type for render operations.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Something that renders to body markup.
pub trait Component: Send + Sync {
    /// Render body markup, recording head metadata into `head`.
    fn render(&self, head: &mut Head) -> Result<String>;
}

impl<F> Component for F
where
    F: Fn(&mut Head) -> Result<String> + Send + Sync,
{
    fn render(&self, head: &mut Head) -> Result<String> {
        self(head)
    }
}

/// Markup and head metadata produced by one render pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub markup: String,
    pub head: Head,
}

/// Render `component` against a fresh head.
pub fn render_component(component: &dyn Component) -> Result<Rendered> {
    let mut head = Head::new();
    let markup = component.render(&mut head)?;
    Ok(Rendered { markup, head })
}

/// A page backed by a page-definition file.
///
/// The file body is the page markup; an optional frontmatter block supplies
/// its head metadata.
#[derive(Debug, Clone)]
pub struct FilePage {
    id: PageId,
    path: PathBuf,
}

impl FilePage {
    /// Create a page from an explicit file path.
    #[must_use]
    pub fn new(id: PageId, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }

    /// Locate the definition file of `id` under `root`.
    #[must_use]
    pub fn locate(root: &Path, id: &PageId, suffix: &str) -> Self {
        Self::new(id.clone(), id.source_path(root, suffix))
    }

    /// The page id.
    #[must_use]
    pub fn id(&self) -> &PageId {
        &self.id
    }

    /// The definition file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Component for FilePage {
    fn render(&self, head: &mut Head) -> Result<String> {
        let content = fs::read_to_string(&self.path).map_err(|source| RenderError::Load {
            path: self.path.clone(),
            source,
        })?;

        let (matter, body) = parse_frontmatter(&content, &self.path)?;
        debug!(page = %self.id, title = ?matter.title, "loaded page");
        head.apply(matter);

        Ok(body)
    }
}

/// Source-level HTML comment.
///
/// Renders a sentinel element that post-processing turns into `<!-- text -->`.
/// The text is emitted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlComment {
    text: String,
}

impl HtmlComment {
    /// Create a comment.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Sentinel markup for this comment.
    #[must_use]
    pub fn to_markup(&self) -> String {
        format!(r#"<pre class="a-comment">{}</pre>"#, self.text)
    }
}

impl Component for HtmlComment {
    fn render(&self, _head: &mut Head) -> Result<String> {
        Ok(self.to_markup())
    }
}
