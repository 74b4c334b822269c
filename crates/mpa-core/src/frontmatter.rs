//! Frontmatter parsing for page-definition files.
//!
//! A page file may open with a `+++` (TOML) or `---` (YAML) block describing
//! the document head the page contributes:
//!
//! ```toml
//! +++
//! title = "About"
//! html_attributes = { class = "no-js" }
//!
//! [[meta]]
//! name = "description"
//! content = "About this site"
//! +++
//! ```

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Ordered attribute map of a single tag.
pub type Attributes = IndexMap<String, String>;

/// Head metadata declared by a page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeadMatter {
    /// Document title.
    #[serde(default)]
    pub title: Option<String>,

    /// `<meta>` tags.
    #[serde(default)]
    pub meta: Vec<Attributes>,

    /// `<link>` tags.
    #[serde(default)]
    pub link: Vec<Attributes>,

    /// `<script>` tags, inline or external.
    #[serde(default)]
    pub script: Vec<ScriptMatter>,

    /// Inline `<style>` blocks.
    #[serde(default)]
    pub style: Vec<String>,

    /// `<noscript>` fallback markup.
    #[serde(default)]
    pub noscript: Vec<String>,

    /// `<base>` tag attributes.
    #[serde(default)]
    pub base: Option<Attributes>,

    /// Attributes merged onto `<html>`.
    #[serde(default)]
    pub html_attributes: Attributes,

    /// Attributes merged onto `<body>`.
    #[serde(default)]
    pub body_attributes: Attributes,
}

/// A script declared in frontmatter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScriptMatter {
    /// Inline body of the script.
    #[serde(default)]
    pub content: Option<String>,

    /// Remaining tag attributes (`src`, `type`, ...).
    #[serde(default, flatten)]
    pub attributes: Attributes,
}

/// Delimiter types for frontmatter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontmatterFormat {
    /// YAML frontmatter delimited by `---`.
    Yaml,
    /// TOML frontmatter delimited by `+++`.
    Toml,
}

impl FrontmatterFormat {
    /// Get the delimiter string for this format.
    pub fn delimiter(&self) -> &'static str {
        match self {
            Self::Yaml => "---",
            Self::Toml => "+++",
        }
    }
}

/// Split content into frontmatter and body.
pub fn split_frontmatter(content: &str) -> Option<(FrontmatterFormat, &str, &str)> {
    let content = content.trim_start();

    let format = if content.starts_with("---") {
        FrontmatterFormat::Yaml
    } else if content.starts_with("+++") {
        FrontmatterFormat::Toml
    } else {
        return None;
    };

    let delimiter = format.delimiter();

    let after_first = &content[delimiter.len()..];
    let closing_pos = find_closing(after_first, delimiter)?;

    let frontmatter = after_first[..closing_pos].trim();
    let body = after_first[closing_pos + delimiter.len()..].trim_start();

    Some((format, frontmatter, body))
}

/// Byte offset of the first line consisting only of `delimiter`.
///
/// The first segment is the remainder of the opening line and never closes.
fn find_closing(after_first: &str, delimiter: &str) -> Option<usize> {
    let mut offset = 0;
    for (index, line) in after_first.split_inclusive('\n').enumerate() {
        if index > 0 && line.trim_end() == delimiter {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

impl HeadMatter {
    /// Reject attribute names that could not be written into a tag as-is.
    ///
    /// Names are limited to ASCII letters, digits, `_`, `:`, `.` and `-`.
    pub fn validate_attribute_names(&self) -> std::result::Result<(), String> {
        let scripts = self.script.iter().map(|script| &script.attributes);
        let maps = self
            .meta
            .iter()
            .chain(&self.link)
            .chain(scripts)
            .chain(self.base.as_ref())
            .chain([&self.html_attributes, &self.body_attributes]);

        for attributes in maps {
            if let Some(name) = attributes.keys().find(|name| !is_attribute_name(name)) {
                return Err(format!("invalid attribute name `{name}`"));
            }
        }
        Ok(())
    }
}

fn is_attribute_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
}

/// Parse a page file into its head metadata and body markup.
pub fn parse_frontmatter(content: &str, path: &Path) -> Result<(HeadMatter, String)> {
    let Some((format, fm_str, body)) = split_frontmatter(content) else {
        return Ok((HeadMatter::default(), content.to_string()));
    };

    if fm_str.is_empty() {
        return Ok((HeadMatter::default(), body.to_string()));
    }

    let matter: HeadMatter = match format {
        FrontmatterFormat::Yaml => {
            serde_yaml::from_str(fm_str).map_err(|e| CoreError::frontmatter(path, e.to_string()))?
        }
        FrontmatterFormat::Toml => {
            toml::from_str(fm_str).map_err(|e| CoreError::frontmatter(path, e.to_string()))?
        }
    };

    matter
        .validate_attribute_names()
        .map_err(|message| CoreError::frontmatter(path, message))?;

    Ok((matter, body.to_string()))
}
