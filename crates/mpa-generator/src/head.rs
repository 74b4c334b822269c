//! Document head metadata collected while rendering a page.
//!
//! A fresh [`Head`] is handed to every component render and returned with its
//! markup, so each page's metadata is captured in isolation. Tags serialized
//! from a `Head` carry the [`HEAD_MARKER`] attribute, which the final
//! post-processing pass strips.

use mpa_core::{Attributes, HeadMatter, ScriptMatter};

/// Marker attribute emitted on every head-managed tag.
pub const HEAD_MARKER: &str = r#" data-mpa-head="true""#;

/// Head metadata accumulated by one render pass.
///
/// Repeated titles and attributes follow last-write-wins; tag lists append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Head {
    title: Option<String>,
    meta: Vec<Attributes>,
    link: Vec<Attributes>,
    script: Vec<ScriptMatter>,
    style: Vec<String>,
    noscript: Vec<String>,
    base: Option<Attributes>,
    html_attributes: Attributes,
    body_attributes: Attributes,
}

impl Head {
    /// Create an empty head.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the document title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    /// Add a `<meta>` tag.
    pub fn add_meta<K, V>(&mut self, attributes: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.meta.push(collect_attributes(attributes));
    }

    /// Add a `<link>` tag.
    pub fn add_link<K, V>(&mut self, attributes: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.link.push(collect_attributes(attributes));
    }

    /// Add an external script.
    pub fn add_script_src(&mut self, src: impl Into<String>) {
        let mut attributes = Attributes::new();
        attributes.insert("src".to_string(), src.into());
        self.script.push(ScriptMatter {
            content: None,
            attributes,
        });
    }

    /// Add an inline script.
    pub fn add_inline_script(&mut self, content: impl Into<String>) {
        self.script.push(ScriptMatter {
            content: Some(content.into()),
            attributes: Attributes::new(),
        });
    }

    /// Add an inline style block.
    pub fn add_style(&mut self, css: impl Into<String>) {
        self.style.push(css.into());
    }

    /// Add `<noscript>` fallback markup.
    pub fn add_noscript(&mut self, markup: impl Into<String>) {
        self.noscript.push(markup.into());
    }

    /// Set the `<base>` tag.
    pub fn set_base<K, V>(&mut self, attributes: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.base = Some(collect_attributes(attributes));
    }

    /// Set an attribute on `<html>`.
    pub fn set_html_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.html_attributes.insert(name.into(), value.into());
    }

    /// Set an attribute on `<body>`.
    pub fn set_body_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.body_attributes.insert(name.into(), value.into());
    }

    /// Merge metadata declared in page frontmatter.
    pub fn apply(&mut self, matter: HeadMatter) {
        if let Some(title) = matter.title {
            self.title = Some(title);
        }
        self.meta.extend(matter.meta);
        self.link.extend(matter.link);
        self.script.extend(matter.script);
        self.style.extend(matter.style);
        self.noscript.extend(matter.noscript);
        if matter.base.is_some() {
            self.base = matter.base;
        }
        self.html_attributes.extend(matter.html_attributes);
        self.body_attributes.extend(matter.body_attributes);
    }

    /// The document title, if set.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Attributes merged onto `<html>`.
    #[must_use]
    pub fn html_attributes(&self) -> &Attributes {
        &self.html_attributes
    }

    /// Attributes merged onto `<body>`.
    #[must_use]
    pub fn body_attributes(&self) -> &Attributes {
        &self.body_attributes
    }

    /// Serialized `<title>` tag.
    #[must_use]
    pub fn title_html(&self) -> String {
        self.title
            .as_deref()
            .map(|t| format!("<title{HEAD_MARKER}>{}</title>", escape_text(t)))
            .unwrap_or_default()
    }

    /// Serialized `<meta>` tags.
    #[must_use]
    pub fn meta_html(&self) -> String {
        self.meta.iter().map(|a| void_tag("meta", a)).collect()
    }

    /// Serialized `<link>` tags.
    #[must_use]
    pub fn link_html(&self) -> String {
        self.link.iter().map(|a| void_tag("link", a)).collect()
    }

    /// Serialized `<script>` tags.
    #[must_use]
    pub fn script_html(&self) -> String {
        self.script
            .iter()
            .map(|s| {
                format!(
                    "<script{HEAD_MARKER}{}>{}</script>",
                    attributes_html(&s.attributes),
                    s.content.as_deref().unwrap_or_default()
                )
            })
            .collect()
    }

    /// Serialized inline `<style>` tags.
    #[must_use]
    pub fn style_html(&self) -> String {
        self.style
            .iter()
            .map(|css| format!("<style{HEAD_MARKER}>{css}</style>"))
            .collect()
    }

    /// Serialized `<noscript>` tags.
    #[must_use]
    pub fn noscript_html(&self) -> String {
        self.noscript
            .iter()
            .map(|markup| format!("<noscript{HEAD_MARKER}>{markup}</noscript>"))
            .collect()
    }

    /// Serialized `<base>` tag.
    #[must_use]
    pub fn base_html(&self) -> String {
        self.base
            .as_ref()
            .map(|a| void_tag("base", a))
            .unwrap_or_default()
    }
}

fn collect_attributes<K, V>(attributes: impl IntoIterator<Item = (K, V)>) -> Attributes
where
    K: Into<String>,
    V: Into<String>,
{
    attributes
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn void_tag(name: &str, attributes: &Attributes) -> String {
    format!("<{name}{HEAD_MARKER}{}/>", attributes_html(attributes))
}

/// Serialize attributes as ` name="value"` pairs.
pub(crate) fn attributes_html(attributes: &Attributes) -> String {
    attributes
        .iter()
        .map(|(name, value)| format!(r#" {name}="{}""#, escape_attr(value)))
        .collect()
}

/// Escape text content.
pub(crate) fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Escape an attribute value.
pub(crate) fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}
