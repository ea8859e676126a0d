//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Main configuration struct matching the docset.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub site: SiteConfig,
    pub paths: PathsConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub docs: DocsConfig,

    #[serde(default)]
    pub highlight: HighlightConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    pub description: String,

    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Content root holding the markdown collection
    pub content: PathBuf,
    pub output: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    5173
}

/// Routing and partitioning of the documentation pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocsConfig {
    /// URL prefix every doc page is mounted under
    #[serde(default = "default_route_prefix")]
    pub route_prefix: String,

    /// First path segment marking the second documentation variant
    #[serde(default = "default_partition_segment")]
    pub partition_segment: String,

    /// Bare paths redirected to their default child page
    #[serde(default = "default_redirects")]
    pub redirects: Vec<Redirect>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Redirect {
    pub from: String,
    pub to: String,
}

fn default_route_prefix() -> String {
    String::from("/docs")
}

fn default_partition_segment() -> String {
    String::from("kit")
}

fn default_redirects() -> Vec<Redirect> {
    vec![
        Redirect {
            from: "/docs/svelte".into(),
            to: "/docs/svelte/introduction".into(),
        },
        Redirect {
            from: "/docs/kit".into(),
            to: "/docs/kit/introduction".into(),
        },
    ]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighlightConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_theme() -> String {
    String::from(crate::markdown::highlight::DEFAULT_THEME)
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse configuration from a YAML string (paths stay relative to the cwd)
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(contents)?;
        config.docs.route_prefix = normalize_route_prefix(&config.docs.route_prefix);
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let segment = &self.docs.partition_segment;
        if segment.is_empty() || segment.contains('/') {
            return Err(ConfigError::InvalidValue {
                field: "docs.partition_segment".into(),
                reason: format!("expected a single path segment, got {:?}", segment),
            });
        }
        for redirect in &self.docs.redirects {
            if !redirect.from.starts_with('/') || !redirect.to.starts_with('/') {
                return Err(ConfigError::InvalidValue {
                    field: "docs.redirects".into(),
                    reason: format!(
                        "redirect paths must be absolute: {} -> {}",
                        redirect.from, redirect.to
                    ),
                });
            }
        }
        Ok(())
    }

    /// Get the content directory, resolved relative to config file
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }

    /// Find the redirect target for a request path, if any
    pub fn redirect_for(&self, path: &str) -> Option<&str> {
        let trimmed = path.trim_end_matches('/');
        self.docs
            .redirects
            .iter()
            .find(|r| r.from == trimmed)
            .map(|r| r.to.as_str())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl Default for DocsConfig {
    fn default() -> Self {
        Self {
            route_prefix: default_route_prefix(),
            partition_segment: default_partition_segment(),
            redirects: default_redirects(),
        }
    }
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
        }
    }
}

/// Ensure a route prefix has a leading slash and no trailing slash ("/docs" or "")
pub fn normalize_route_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
