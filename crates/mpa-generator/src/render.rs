//! Static document rendering.
//!
//! Renders a component, wraps its markup in the document shell together with
//! the collected head metadata and the page's bundled assets, and runs the
//! final post-processing pass, optionally followed by indentation.

use mpa_core::{Attributes, Config};

use crate::{
    bundle::EmittedAssets,
    component::{Component, Rendered, Result, render_component},
    format::beautify,
    head::{Head, attributes_html, escape_attr},
    postprocess::finalize,
};

/// Doctype prefixed to every document.
pub const DOCTYPE: &str = "<!doctype html>";

/// Default `lang` of the `<html>` element.
pub const DEFAULT_LANG: &str = "ja";

/// Head tags emitted ahead of any page metadata.
const REQUIRED_META: &str = concat!(
    r#"<meta charset="UTF-8"/>"#,
    r#"<meta http-equiv="X-UA-Compatible" content="IE=edge"/>"#,
    r#"<meta name="format-detection" content="telephone=no"/>"#,
    r#"<meta name="viewport" content="width=device-width, initial-scale=1.0, viewport-fit=cover"/>"#,
);

const DNS_PREFETCH_META: &str = r#"<meta http-equiv="x-dns-prefetch-control" content="on"/>"#;

/// Renders components into complete static HTML documents.
#[derive(Debug, Clone)]
pub struct StaticRenderer {
    lang: String,
    favicon: Option<String>,
    pretty: bool,
}

impl Default for StaticRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_LANG)
    }
}

impl StaticRenderer {
    /// Create a renderer with the given default document language.
    #[must_use]
    pub fn new(lang: impl Into<String>) -> Self {
        Self {
            lang: lang.into(),
            favicon: Some("/favicon.ico".to_string()),
            pretty: false,
        }
    }

    /// Create a renderer from the site configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.site.lang)
            .with_favicon(config.site.favicon.clone())
            .with_pretty(config.build.pretty)
    }

    /// Set the favicon href; `None` omits the tag.
    #[must_use]
    pub fn with_favicon(mut self, favicon: Option<String>) -> Self {
        self.favicon = favicon;
        self
    }

    /// Indent finished documents instead of writing them on one line.
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Render `component` into a finished document.
    pub fn render(&self, component: &dyn Component, assets: &EmittedAssets) -> Result<String> {
        let Rendered { markup, head } = render_component(component)?;
        let html = finalize(&self.document(&markup, &head, assets));
        Ok(if self.pretty { beautify(&html) } else { html })
    }

    /// Assemble the document shell before post-processing.
    #[must_use]
    pub fn document(&self, markup: &str, head: &Head, assets: &EmittedAssets) -> String {
        let mut html_attributes = Attributes::new();
        html_attributes.insert("lang".to_string(), self.lang.clone());
        html_attributes.extend(
            head.html_attributes()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );

        let favicon = self
            .favicon
            .as_deref()
            .map(|href| {
                format!(
                    r#"<link rel="shortcut icon" href="{}"/>"#,
                    escape_attr(href)
                )
            })
            .unwrap_or_default();

        let stylesheets: String = assets
            .styles
            .iter()
            .map(|href| {
                format!(
                    r#"<link href="{}" rel="stylesheet" type="text/css"/>"#,
                    escape_attr(href)
                )
            })
            .collect();

        let scripts: String = assets
            .scripts
            .iter()
            .map(|src| format!(r#"<script defer src="{}"></script>"#, escape_attr(src)))
            .collect();

        let mut out = String::with_capacity(markup.len() + 1024);
        out.push_str(DOCTYPE);
        out.push_str(&format!("<html{}>", attributes_html(&html_attributes)));

        out.push_str("<head>");
        out.push_str(REQUIRED_META);
        out.push_str(&head.title_html());
        out.push_str(DNS_PREFETCH_META);
        out.push_str(&favicon);
        out.push_str(&head.link_html());
        out.push_str(&head.meta_html());
        out.push_str(&head.noscript_html());
        out.push_str(&stylesheets);
        out.push_str(&head.style_html());
        out.push_str(&scripts);
        out.push_str(&head.script_html());
        out.push_str(&head.base_html());
        out.push_str("</head>");

        out.push_str(&format!(
            "<body{}>{markup}</body>",
            attributes_html(head.body_attributes())
        ));
        out.push_str("</html>");

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::HtmlComment;

    fn assets(scripts: &[&str], styles: &[&str]) -> EmittedAssets {
        EmittedAssets {
            scripts: scripts.iter().map(ToString::to_string).collect(),
            styles: styles.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_document_shell() {
        let page = |head: &mut Head| -> Result<String> {
            head.set_title("INDEX_TITLE");
            Ok("<p>hi</p>".to_string())
        };

        let html = StaticRenderer::default()
            .render(&page, &assets(&["/assets/js/common.js"], &["/assets/css/common.css"]))
            .unwrap();

        assert!(html.starts_with(r#"<!doctype html><html lang="ja"><head><meta charset="UTF-8"/>"#));
        assert!(html.contains("<title>INDEX_TITLE</title>"));
        assert!(html.contains(r#"<link rel="shortcut icon" href="/favicon.ico"/>"#));
        assert!(html.contains(
            r#"<link href="/assets/css/common.css" rel="stylesheet" type="text/css"/>"#
        ));
        assert!(html.contains(r#"<script defer src="/assets/js/common.js"></script>"#));
        assert!(html.ends_with("<body><p>hi</p></body></html>"));
        assert!(!html.contains("data-mpa-head"));
    }

    #[test]
    fn test_head_order() {
        let page = |head: &mut Head| -> Result<String> {
            head.set_base([("href", "/")]);
            head.add_inline_script("var inline;");
            head.add_style("p{}");
            head.add_noscript("<p>no js</p>");
            head.add_meta([("name", "description"), ("content", "d")]);
            head.add_link([("rel", "canonical"), ("href", "/x")]);
            head.set_title("T");
            Ok(String::new())
        };

        let html = StaticRenderer::default()
            .render(&page, &assets(&["/a.js"], &["/a.css"]))
            .unwrap();

        let markers = [
            r#"<meta name="viewport""#,
            "<title>T</title>",
            "x-dns-prefetch-control",
            "shortcut icon",
            r#"<link rel="canonical""#,
            r#"<meta name="description""#,
            "<noscript>",
            r#"<link href="/a.css""#,
            "<style>p{}</style>",
            r#"<script defer src="/a.js">"#,
            "<script>var inline;</script>",
            r#"<base href="/"/>"#,
        ];
        let positions: Vec<_> = markers
            .iter()
            .map(|m| html.find(m).unwrap_or_else(|| panic!("missing {m}")))
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{html}");
    }

    #[test]
    fn test_html_and_body_attributes() {
        let page = |head: &mut Head| -> Result<String> {
            head.set_html_attribute("lang", "en");
            head.set_html_attribute("class", "no-js");
            head.set_body_attribute("id", "top");
            Ok(String::new())
        };

        let html = StaticRenderer::new("ja")
            .render(&page, &EmittedAssets::default())
            .unwrap();
        assert!(html.contains(r#"<html lang="en" class="no-js">"#));
        assert!(html.contains(r#"<body id="top"></body>"#));
    }

    #[test]
    fn test_comment_sentinel_round_trip() {
        let page = |_: &mut Head| -> Result<String> {
            Ok(format!("<div>{}</div>", HtmlComment::new("build marker").to_markup()))
        };

        let html = StaticRenderer::default()
            .render(&page, &EmittedAssets::default())
            .unwrap();
        assert!(html.contains("<div><!-- build marker --></div>"));
        assert!(!html.contains("a-comment"));
    }

    #[test]
    fn test_without_favicon() {
        let renderer = StaticRenderer::default().with_favicon(None);
        let html = renderer
            .render(&|_: &mut Head| -> Result<String> { Ok(String::new()) }, &EmittedAssets::default())
            .unwrap();
        assert!(!html.contains("shortcut icon"));
    }

    #[test]
    fn test_pretty_document() {
        let page = |head: &mut Head| -> Result<String> {
            head.set_title("T");
            Ok(r#"<pre class="a-comment">marker</pre><p>hi</p>"#.to_string())
        };

        let html = StaticRenderer::default()
            .with_favicon(None)
            .with_pretty(true)
            .render(&page, &assets(&["/a.js"], &[]))
            .unwrap();

        let expected = r#"<!doctype html>
<html lang="ja">
  <head>
    <meta charset="UTF-8"/>
    <meta http-equiv="X-UA-Compatible" content="IE=edge"/>
    <meta name="format-detection" content="telephone=no"/>
    <meta name="viewport" content="width=device-width, initial-scale=1.0, viewport-fit=cover"/>
    <title>T</title>
    <meta http-equiv="x-dns-prefetch-control" content="on"/>
    <script defer src="/a.js"></script>
  </head>
  <body>
    <!-- marker -->
    <p>hi</p>
  </body>
</html>"#;
        assert_eq!(html, expected);
    }

    #[test]
    fn test_from_config() {
        let mut config = Config::default();
        config.site.lang = "en".to_string();
        config.site.favicon = Some("/icon.png".to_string());

        let html = StaticRenderer::from_config(&config)
            .render(&|_: &mut Head| -> Result<String> { Ok(String::new()) }, &EmittedAssets::default())
            .unwrap();
        assert!(html.contains(r#"<html lang="en">"#));
        assert!(html.contains(r#"href="/icon.png""#));
    }
}
