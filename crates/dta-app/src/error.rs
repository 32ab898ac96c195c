//! Error types for the dta-app service layer.

use std::path::PathBuf;

/// Application error type that wraps errors from the parsing crates and
/// provides a unified error interface for the CLI and report generators.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Log error: {0}")]
    Log(String),

    #[error("Parameter file error: {0}")]
    Params(String),

    #[error("Failed to read config file: {path}")]
    ConfigFileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Failed to write export file: {path}")]
    ExportFileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for dta-app operations.
pub type AppResult<T> = Result<T, AppError>;

// Conversions from backend error types
impl From<dta_log::LogError> for AppError {
    fn from(err: dta_log::LogError) -> Self {
        AppError::Log(err.to_string())
    }
}

impl From<dta_params::ParamsError> for AppError {
    fn from(err: dta_params::ParamsError) -> Self {
        AppError::Params(err.to_string())
    }
}

impl From<dta_core::CoreError> for AppError {
    fn from(err: dta_core::CoreError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}
