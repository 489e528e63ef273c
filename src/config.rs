//! Configuration loading using the prefer crate for file discovery.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::llm::LlmConfig;
use crate::verify::VerifyConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Page rendering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Resolution pages are rendered at before being sent to the model
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

fn default_dpi() -> u32 {
    200
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { dpi: default_dpi() }
    }
}

/// Configuration file structure.
///
/// ```toml
/// [llm]
/// model = "gemini-2.5-flash"
///
/// [verify]
/// future_tolerance_years = 10
///
/// [verify.reference_values]
/// escrow_office = "東京法務局"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub verify: VerifyConfig,
    #[serde(default)]
    pub render: RenderConfig,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover `deedcheck.{toml,yaml,json}` in the standard locations.
    ///
    /// Falls back to defaults (with env overrides) when no file is found or
    /// the discovered file cannot be read.
    pub async fn load() -> Self {
        let Ok(discovered) = prefer::load("deedcheck").await else {
            debug!("No deedcheck config file found, using defaults");
            return Self::default();
        };
        let Some(path) = discovered.source_path() else {
            return Self::default();
        };
        match Self::load_from_path(path).await {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring config file: {}", e);
                Self::default()
            }
        }
    }

    /// Load from a specific file, picking the format by extension (JSON when unknown).
    ///
    /// A leading `~` or `$VAR` in the path is expanded.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let path = expand_path(path);
        let contents = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;

        let mut config = Self::parse(&contents, &path)?;
        config.llm = config.llm.with_env_overrides();
        config.source_path = Some(path);
        Ok(config)
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        match ext {
            "toml" => toml::from_str(contents).map_err(|e| parse_error("TOML", e.to_string())),
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|e| parse_error("YAML", e.to_string()))
            }
            _ => serde_json::from_str(contents).map_err(|e| parse_error("JSON", e.to_string())),
        }
    }

    /// Effective configuration as TOML, with the API key masked.
    pub fn to_redacted_toml(&self) -> Result<String, toml::ser::Error> {
        let mut copy = self.clone();
        copy.llm = copy.llm.redacted();
        toml::to_string_pretty(&copy)
    }
}

fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}
