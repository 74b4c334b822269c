//! Site configuration management.

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Prefix for environment overrides (`MPA__BUILD__MODE=production`).
pub const ENV_PREFIX: &str = "MPA";

/// Separator between nested keys in environment overrides.
pub const ENV_SEPARATOR: &str = "__";

/// Main configuration structure for mpa.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Document-level settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Build settings for a single invocation.
    #[serde(default)]
    pub build: BuildConfig,

    /// Split build (parallel driver) settings.
    #[serde(default)]
    pub split: SplitConfig,
}

/// Document-level configuration applied to every rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Default `lang` attribute of the `<html>` element.
    #[serde(default = "default_lang")]
    pub lang: String,

    /// Favicon href emitted in every document head. `None` omits the tag.
    #[serde(default = "default_favicon")]
    pub favicon: Option<String>,
}

/// Build mode of an invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Local builds: no image copying.
    #[default]
    Development,
    /// Release builds: images are copied into the output.
    Production,
}

impl BuildMode {
    /// Lowercase name used in configuration and environment overrides.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Build mode.
    #[serde(default)]
    pub mode: BuildMode,

    /// Root directory scanned for page-definition files.
    #[serde(default = "default_pages_dir")]
    pub pages_dir: PathBuf,

    /// Output directory for the generated site.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Suffix marking a file as a page definition.
    #[serde(default = "default_page_suffix")]
    pub page_suffix: String,

    /// Extension of a page's sibling script file.
    #[serde(default = "default_script_ext")]
    pub script_ext: String,

    /// Extension of a page's sibling style file.
    #[serde(default = "default_style_ext")]
    pub style_ext: String,

    /// Script source of the shared `common` entry.
    #[serde(default = "default_common_script")]
    pub common_script: PathBuf,

    /// Style source of the shared `common` entry.
    #[serde(default = "default_common_style")]
    pub common_style: PathBuf,

    /// Static images copied verbatim in production mode.
    #[serde(default = "default_images_dir")]
    pub images_dir: PathBuf,

    /// Public URL prefix for emitted assets.
    #[serde(default = "default_public_path")]
    pub public_path: String,

    /// Indent written documents, two spaces per level.
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Copy images in production mode. Split children leave this to the parent.
    #[serde(default = "default_true")]
    pub copy_images: bool,
}

/// Split build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Number of parallel build processes.
    #[serde(default = "default_groups")]
    pub groups: usize,

    /// Memory ceiling handed to each child process, in megabytes.
    #[serde(default = "default_memory_mb")]
    pub memory_mb: u64,

    /// Environment variable carrying the memory ceiling.
    #[serde(default = "default_memory_env")]
    pub memory_env: String,

    /// Per-process timeout in seconds (0 disables).
    #[serde(default)]
    pub timeout_secs: u64,

    /// Kill the remaining processes once one group fails.
    #[serde(default)]
    pub fail_fast: bool,

    /// Treat any stderr output as a failed group.
    #[serde(default)]
    pub fail_on_stderr: bool,

    /// Clear the output directory once before spawning groups.
    #[serde(default = "default_true")]
    pub clean: bool,
}

// Default value functions
fn default_lang() -> String {
    "ja".to_string()
}

fn default_favicon() -> Option<String> {
    Some("/favicon.ico".to_string())
}

fn default_pages_dir() -> PathBuf {
    PathBuf::from("src/pages")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_page_suffix() -> String {
    ".html.page".to_string()
}

fn default_script_ext() -> String {
    "js".to_string()
}

fn default_style_ext() -> String {
    "css".to_string()
}

fn default_common_script() -> PathBuf {
    PathBuf::from("src/common.js")
}

fn default_common_style() -> PathBuf {
    PathBuf::from("src/common.css")
}

fn default_images_dir() -> PathBuf {
    PathBuf::from("src/assets/images")
}

fn default_public_path() -> String {
    "/".to_string()
}

fn default_groups() -> usize {
    4
}

fn default_memory_mb() -> u64 {
    6000
}

fn default_memory_env() -> String {
    "MPA_MAX_MEMORY_MB".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            lang: default_lang(),
            favicon: default_favicon(),
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            mode: BuildMode::default(),
            pages_dir: default_pages_dir(),
            output_dir: default_output_dir(),
            page_suffix: default_page_suffix(),
            script_ext: default_script_ext(),
            style_ext: default_style_ext(),
            common_script: default_common_script(),
            common_style: default_common_style(),
            images_dir: default_images_dir(),
            public_path: default_public_path(),
            pretty: default_true(),
            copy_images: default_true(),
        }
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            groups: default_groups(),
            memory_mb: default_memory_mb(),
            memory_env: default_memory_env(),
            timeout_secs: 0,
            fail_fast: false,
            fail_on_stderr: false,
            clean: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| {
            CoreError::config_with_source(
                format!("Failed to parse config file: {}", path.display()),
                e,
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file if present, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration using the config crate, layering `MPA__*` environment overrides.
    ///
    /// The file is optional; a missing file yields defaults plus overrides.
    pub fn load_with_env(path: &Path) -> Result<Self> {
        Self::load_layered(path, Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR)
    }

    fn load_layered(path: &Path, environment: config::Environment) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path).required(false))
            .add_source(environment)
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if !self.build.page_suffix.starts_with('.') || self.build.page_suffix.len() < 2 {
            return Err(CoreError::config(
                "build.page_suffix must start with '.' and name an extension",
            ));
        }

        if self.build.script_ext.is_empty() || self.build.style_ext.is_empty() {
            return Err(CoreError::config(
                "build.script_ext and build.style_ext cannot be empty",
            ));
        }

        if self.build.script_ext == self.build.style_ext {
            return Err(CoreError::config(
                "build.script_ext and build.style_ext must differ",
            ));
        }

        if self.split.groups == 0 {
            tracing::warn!("split.groups is 0, a single group will be used");
        }

        Ok(())
    }

    /// Per-process timeout for split builds, if enabled.
    pub fn split_timeout(&self) -> Option<Duration> {
        (self.split.timeout_secs > 0).then(|| Duration::from_secs(self.split.timeout_secs))
    }

    /// Whether this invocation builds for production.
    pub fn is_production(&self) -> bool {
        self.build.mode == BuildMode::Production
    }

    /// Whether this invocation copies images into the output.
    pub fn copies_images(&self) -> bool {
        self.is_production() && self.build.copy_images
    }

    /// Environment override key for a nested config field, e.g. `MPA__BUILD__MODE`.
    pub fn env_key(section: &str, field: &str) -> String {
        format!(
            "{ENV_PREFIX}{ENV_SEPARATOR}{}{ENV_SEPARATOR}{}",
            section.to_uppercase(),
            field.to_uppercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn create_test_config() -> String {
        r#"
[site]
lang = "en"
favicon = "/icon.png"

[build]
mode = "production"
pages_dir = "web/pages"
output_dir = "public"
page_suffix = ".page.html"
script_ext = "mjs"

[split]
groups = 8
memory_mb = 4096
timeout_secs = 120
fail_fast = true
"#
        .to_string()
    }

    #[test]
    fn test_load_config() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("mpa.toml");
        let mut file = std::fs::File::create(&config_path).expect("create file");
        file.write_all(create_test_config().as_bytes())
            .expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.lang, "en");
        assert_eq!(config.site.favicon.as_deref(), Some("/icon.png"));
        assert_eq!(config.build.mode, BuildMode::Production);
        assert_eq!(config.build.pages_dir, PathBuf::from("web/pages"));
        assert_eq!(config.build.output_dir, PathBuf::from("public"));
        assert_eq!(config.build.page_suffix, ".page.html");
        assert_eq!(config.build.script_ext, "mjs");
        assert_eq!(config.build.style_ext, "css");
        assert_eq!(config.split.groups, 8);
        assert_eq!(config.split.memory_mb, 4096);
        assert!(config.split.fail_fast);
        assert!(!config.split.fail_on_stderr);
        assert_eq!(config.split_timeout(), Some(Duration::from_secs(120)));
        assert!(config.is_production());
    }

    #[test]
    fn test_config_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("mpa.toml");
        std::fs::write(&config_path, "").expect("write");

        let config = Config::load(&config_path).expect("load config");

        assert_eq!(config.site.lang, "ja");
        assert_eq!(config.site.favicon.as_deref(), Some("/favicon.ico"));
        assert_eq!(config.build.mode, BuildMode::Development);
        assert_eq!(config.build.pages_dir, PathBuf::from("src/pages"));
        assert_eq!(config.build.output_dir, PathBuf::from("dist"));
        assert_eq!(config.build.page_suffix, ".html.page");
        assert_eq!(config.build.public_path, "/");
        assert!(config.build.pretty);
        assert!(config.build.copy_images);
        assert_eq!(config.split.groups, 4);
        assert_eq!(config.split.memory_mb, 6000);
        assert_eq!(config.split.memory_env, "MPA_MAX_MEMORY_MB");
        assert!(config.split.clean);
        assert!(config.split_timeout().is_none());
    }

    #[test]
    fn test_config_validation_bad_suffix() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("mpa.toml");
        std::fs::write(&config_path, "[build]\npage_suffix = \"page\"\n").expect("write");

        let result = Config::load(&config_path);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("page_suffix"));
    }

    #[test]
    fn test_config_validation_same_extensions() {
        let mut config = Config::default();
        config.build.style_ext = "js".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_not_found() {
        let result = Config::load(Path::new("/nonexistent/mpa.toml"));
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("not found"));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default(Path::new("/nonexistent/mpa.toml")).expect("defaults");
        assert_eq!(config.split.groups, 4);
    }

    #[test]
    fn test_load_with_env_reads_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("mpa.toml");
        std::fs::write(&config_path, "[split]\ngroups = 2\n").expect("write");

        let config = Config::load_with_env(&config_path).expect("load config");
        assert_eq!(config.split.groups, 2);
        assert_eq!(config.build.page_suffix, ".html.page");
    }

    #[test]
    fn test_load_with_env_applies_split_overrides() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config_path = dir.path().join("mpa.toml");
        std::fs::write(&config_path, "[build]\nmode = \"development\"\n").expect("write");

        let vars = [
            (Config::env_key("build", "mode"), "production".to_string()),
            (Config::env_key("build", "copy_images"), "false".to_string()),
            ("MPA_MAX_MEMORY_MB".to_string(), "6000".to_string()),
        ];
        let environment = Config::environment().source(Some(vars.into_iter().collect()));

        let config = Config::load_layered(&config_path, environment).expect("load config");
        assert_eq!(config.build.mode, BuildMode::Production);
        assert!(!config.build.copy_images);
        assert!(!config.copies_images());
        assert_eq!(config.split.memory_mb, 6000);
    }

    #[test]
    fn test_env_key() {
        assert_eq!(Config::env_key("build", "mode"), "MPA__BUILD__MODE");
        assert_eq!(BuildMode::Production.as_str(), "production");
    }
}
