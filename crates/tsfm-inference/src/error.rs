use std::path::PathBuf;

use thiserror::Error;

use crate::registry::HandlerFunction;

/// Failure half of the envelope returned by `load`, `prepare` and `run`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Service handler has not yet been prepared; call `prepare()` first")]
    NotPrepared,
    #[error("Handler resolution failed: {0}")]
    Resolution(#[from] ResolutionError),
    #[error("Model preparation failed: {0}")]
    Preparation(anyhow::Error),
    #[error("Inference handler execution failed: {0}")]
    Execution(anyhow::Error),
    #[error("Inference handler panicked: {0}")]
    Panicked(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("Model path '{0}' does not exist")]
    PathNotFound(PathBuf),
    #[error("No configuration artifact '{file}' found in '{dir}'")]
    ConfigMissing { dir: PathBuf, file: String },
    #[error("Malformed configuration artifact '{path}': {cause}")]
    ConfigMalformed { path: PathBuf, cause: ConfigError },
    #[error("Configuration artifact declares neither `model_family` nor `model_type`")]
    MissingFamily,
    #[error("Model family '{family}' does not declare the '{function}' capability")]
    CapabilityNotDeclared {
        family: String,
        function: HandlerFunction,
    },
    #[error("No '{function}' handler registered for model family '{family}'")]
    HandlerNotFound {
        family: String,
        function: HandlerFunction,
    },
    #[error("No artifact source can resolve '{0}'")]
    UnsupportedLocation(String),
    #[error("Artifact source '{source_name}' failed to resolve '{location}': {cause}")]
    Source {
        source_name: String,
        location: String,
        cause: anyhow::Error,
    },
    #[error("Handler factory for model family '{family}' failed: {cause}")]
    Factory { family: String, cause: anyhow::Error },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Error, PartialEq)]
pub enum FrameError {
    #[error("Column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("Duplicate column '{0}'")]
    DuplicateColumn(String),
    #[error("Column '{0}' not found")]
    UnknownColumn(String),
    #[error("Column '{column}' has unsupported or mixed values: {reason}")]
    InvalidValues { column: String, reason: String },
    #[error("Expected a JSON object mapping column names to arrays")]
    NotColumnOriented,
}
