use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ResolutionError};
use crate::registry::HandlerFunction;

pub const DEFAULT_CONFIG_FILE_NAME: &str = "tsfm_config.json";

/// The per-model configuration artifact found next to the model weights.
///
/// Only the fields the dispatcher and the built-in families need are typed; everything else is
/// kept in [`HandlerConfig::extra`] for family factories to interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerConfig {
    #[serde(default)]
    pub model_type: Option<String>,
    #[serde(default)]
    pub model_family: Option<String>,
    /// Capabilities this model may be served with. `None` means every capability.
    #[serde(default)]
    pub handler_functions: Option<Vec<HandlerFunction>>,
    #[serde(default)]
    pub minimum_context_length: Option<usize>,
    #[serde(default)]
    pub maximum_context_length: Option<usize>,
    #[serde(default)]
    pub maximum_prediction_length: Option<usize>,
    #[serde(default = "default_true")]
    pub multivariate_support: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

fn default_true() -> bool {
    true
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            model_type: None,
            model_family: None,
            handler_functions: None,
            minimum_context_length: None,
            maximum_context_length: None,
            maximum_prediction_length: None,
            multivariate_support: true,
            extra: serde_json::Map::new(),
        }
    }
}

impl HandlerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn supports(&self, function: HandlerFunction) -> bool {
        self.handler_functions
            .as_ref()
            .is_none_or(|functions| functions.contains(&function))
    }
}

/// Determines the registry family tag of a configuration artifact.
///
/// `model_family` wins over `model_type`; both are trimmed and lowercased, and blank values are
/// treated as absent.
pub fn resolve_family(config: &HandlerConfig) -> Result<String, ResolutionError> {
    [&config.model_family, &config.model_type]
        .into_iter()
        .flatten()
        .map(|tag| tag.trim().to_lowercase())
        .find(|tag| !tag.is_empty())
        .ok_or(ResolutionError::MissingFamily)
}

/// Settings of the loader itself, read from an optional TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// File name of the configuration artifact inside a model directory.
    pub config_file_name: String,
    /// Base directory for relative local model paths.
    pub model_root: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            config_file_name: DEFAULT_CONFIG_FILE_NAME.to_string(),
            model_root: None,
        }
    }
}

impl ServiceConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }
}
