//! Configuration loading and discovery for `sitepipe.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::SiteConfig;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the project configuration file
pub const CONFIG_FILE: &str = "sitepipe.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse sitepipe.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", bullet_list(.0))]
    Validation(Vec<String>),
}

fn bullet_list(items: &[String]) -> String {
    items.iter().map(|item| format!("  - {}", item)).collect::<Vec<_>>().join("\n")
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override dev server port
    pub port: Option<u16>,
}

/// A loaded configuration together with the directory it applies to.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// The parsed and validated configuration
    pub config: SiteConfig,
    /// Project root (directory of the config file, or the working directory)
    pub root: PathBuf,
    /// Path of the config file, if one was found
    pub source: Option<PathBuf>,
}

/// Find sitepipe.toml by walking up from a specific directory.
fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load the project configuration.
///
/// With an explicit `path`, that file must exist. Otherwise the nearest
/// `sitepipe.toml` above `start` is used, falling back to defaults rooted
/// at `start` when none exists.
///
/// # Example
/// ```ignore
/// let loaded = load_config(None, &std::env::current_dir()?)?;
/// println!("Project root: {}", loaded.root.display());
/// ```
pub fn load_config(path: Option<&Path>, start: &Path) -> Result<LoadedConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config_from(start.to_path_buf()),
    };

    match config_path {
        Some(p) => {
            let root = p
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| start.to_path_buf());
            let config = load_config_file(&p, &root)?;
            Ok(LoadedConfig { config, root, source: Some(p) })
        }
        None => Ok(LoadedConfig {
            config: default_config(start),
            root: start.to_path_buf(),
            source: None,
        }),
    }
}

/// Load configuration from a specific file path.
fn load_config_file(path: &Path, root: &Path) -> Result<SiteConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let mut config: SiteConfig = toml::from_str(&contents)?;

    if config.project.name.is_empty() {
        config.project.name = project_name(root);
    }

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Create a default configuration when no sitepipe.toml is found.
///
/// The project name is taken from the root directory name.
pub fn default_config(root: &Path) -> SiteConfig {
    let mut config = SiteConfig::default();
    config.project.name = project_name(root);
    config
}

fn project_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "site".to_string())
}

/// Merge CLI overrides into a configuration.
///
/// CLI arguments take precedence over config file values.
pub fn merge_cli_overrides(config: &mut SiteConfig, overrides: &CliOverrides) {
    if let Some(port) = overrides.port {
        config.server.port = port;
    }
}
