//! Configuration schema types for `sitepipe.toml`
//!
//! Defines the structure and validation rules for sitepipe project configuration.
//! Every section is optional; an empty file yields the default pipeline setup.

use serde::{Deserialize, Serialize};

/// Project metadata section
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectConfig {
    /// Project name (defaults to the project root directory name)
    #[serde(default)]
    pub name: String,
}

/// Dev server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on (0 picks a free port)
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

/// HTML pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlConfig {
    /// Prefix for include directives and variables (`@@include(...)`, `@@title`)
    #[serde(default = "default_include_prefix")]
    pub include_prefix: String,
    /// Minify the contents of `<style>` elements
    #[serde(default = "default_true")]
    pub minify_css: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self { include_prefix: default_include_prefix(), minify_css: true }
    }
}

fn default_include_prefix() -> String {
    "@@".to_string()
}

fn default_true() -> bool {
    true
}

/// Style pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StylesConfig {
    /// Browserslist queries used for vendor prefixing
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self { browsers: default_browsers() }
    }
}

fn default_browsers() -> Vec<String> {
    vec!["last 2 versions".to_string()]
}

/// Image pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagesConfig {
    /// Quality used when re-encoding JPEG files (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self { jpeg_quality: default_jpeg_quality() }
    }
}

fn default_jpeg_quality() -> u8 {
    75
}

/// Watch mode configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Debounce delay in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u32,
}

fn default_debounce_ms() -> u32 {
    200
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: default_debounce_ms() }
    }
}

/// Complete sitepipe.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SiteConfig {
    /// Project metadata
    #[serde(default)]
    pub project: ProjectConfig,
    /// Dev server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// HTML pipeline settings
    #[serde(default)]
    pub html: HtmlConfig,
    /// Style pipeline settings
    #[serde(default)]
    pub styles: StylesConfig,
    /// Image pipeline settings
    #[serde(default)]
    pub images: ImagesConfig,
    /// Watch mode settings
    #[serde(default)]
    pub watch: WatchConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "images.jpeg_quality")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sitepipe.toml: '{}' {}", self.field, self.message)
    }
}

impl SiteConfig {
    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.project.name.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "project.name".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.server.host.trim().is_empty() {
            errors.push(ConfigValidationError {
                field: "server.host".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.html.include_prefix.is_empty() {
            errors.push(ConfigValidationError {
                field: "html.include_prefix".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.styles.browsers.is_empty() {
            errors.push(ConfigValidationError {
                field: "styles.browsers".to_string(),
                message: "must contain at least one browserslist query".to_string(),
            });
        } else if let Err(e) = crate::pipelines::styles::resolve_browsers(&self.styles.browsers) {
            errors.push(ConfigValidationError {
                field: "styles.browsers".to_string(),
                message: e.to_string(),
            });
        }

        if !(1..=100).contains(&self.images.jpeg_quality) {
            errors.push(ConfigValidationError {
                field: "images.jpeg_quality".to_string(),
                message: "must be between 1 and 100".to_string(),
            });
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(mut config: SiteConfig) -> SiteConfig {
        config.project.name = "test".to_string();
        config
    }

    #[test]
    fn test_empty_config_parse() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.html.include_prefix, "@@");
        assert!(config.html.minify_css);
        assert_eq!(config.styles.browsers, vec!["last 2 versions".to_string()]);
        assert_eq!(config.images.jpeg_quality, 75);
        assert_eq!(config.watch.debounce_ms, 200);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r###"
[project]
name = "landing"

[server]
host = "0.0.0.0"
port = 8080

[html]
include_prefix = "##"
minify_css = false

[styles]
browsers = ["last 1 version", "> 1%"]

[images]
jpeg_quality = 90

[watch]
debounce_ms = 50
"###;

        let config: SiteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.project.name, "landing");
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.html.include_prefix, "##");
        assert!(!config.html.minify_css);
        assert_eq!(config.styles.browsers.len(), 2);
        assert_eq!(config.images.jpeg_quality, 90);
        assert_eq!(config.watch.debounce_ms, 50);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validation_empty_name() {
        let config: SiteConfig = toml::from_str("[project]\nname = \"\"").unwrap();
        let errors = config.validate();
        assert!(errors.iter().any(|e| e.field == "project.name"));
    }

    #[test]
    fn test_validation_jpeg_quality_range() {
        let mut config = named(SiteConfig::default());
        config.images.jpeg_quality = 0;
        assert!(config.validate().iter().any(|e| e.field == "images.jpeg_quality"));

        config.images.jpeg_quality = 101;
        assert!(config.validate().iter().any(|e| e.field == "images.jpeg_quality"));

        config.images.jpeg_quality = 100;
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_validation_empty_prefix() {
        let mut config = named(SiteConfig::default());
        config.html.include_prefix = String::new();
        assert!(config.validate().iter().any(|e| e.field == "html.include_prefix"));
    }

    #[test]
    fn test_validation_browsers() {
        let mut config = named(SiteConfig::default());
        config.styles.browsers.clear();
        assert!(config.validate().iter().any(|e| e.field == "styles.browsers"));

        config.styles.browsers = vec!["definitely not a browser query".to_string()];
        assert!(config.validate().iter().any(|e| e.field == "styles.browsers"));
    }

    #[test]
    fn test_validation_error_display() {
        let error = ConfigValidationError {
            field: "images.jpeg_quality".to_string(),
            message: "must be between 1 and 100".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "sitepipe.toml: 'images.jpeg_quality' must be between 1 and 100"
        );
    }
}
