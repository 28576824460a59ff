use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::analysis::DEFAULT_PAGE_SIZE;
use crate::providers::FetchSettings;

const CANDIDATES: [&str; 4] = ["pipemon.toml", "pipemon.json", "pipemon.yaml", "pipemon.yml"];

/// Configuration file structure for pipemon.
///
/// Every section is optional; command-line flags take precedence over
/// anything set here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub gitlab: GitLabConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitLabConfig {
    /// API base override; derived from the repository URL when unset
    pub api_url: Option<String>,

    /// Pipelines requested from the list endpoint
    #[serde(default = "default_per_page")]
    pub per_page: usize,

    /// Pipelines shown per repository
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Pipelines whose details are fetched at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Pretty-print JSON output
    #[serde(default)]
    pub pretty: bool,

    /// Rows per page in the analysis table
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Default directory for CSV exports
    pub export_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StoreConfig {
    /// Credential store file; platform data directory when unset
    pub path: Option<PathBuf>,
}

impl Default for GitLabConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            per_page: default_per_page(),
            limit: default_limit(),
            concurrency: default_concurrency(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            page_size: default_page_size(),
            export_dir: None,
        }
    }
}

fn default_per_page() -> usize {
    FetchSettings::default().per_page
}

fn default_limit() -> usize {
    FetchSettings::default().limit
}

fn default_concurrency() -> usize {
    FetchSettings::default().concurrency
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl GitLabConfig {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            per_page: self.per_page,
            limit: self.limit,
            concurrency: self.concurrency,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./pipemon.toml
    /// 3. ./pipemon.json
    /// 4. ./pipemon.yaml
    /// 5. ./pipemon.yml
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::load_from_path(path),
            Some(path) => {
                warn!("Config file {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => Self::load_from_dir(Path::new(".")),
        }
    }

    fn load_from_dir(dir: &Path) -> Result<Self> {
        for candidate in CANDIDATES {
            let path = dir.join(candidate);
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        debug!("Loading config from {}", path.display());

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }
}
