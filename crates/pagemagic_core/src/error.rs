use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::api::ApiError;

/// Unified error type for pagemagic operations
#[derive(Debug, Error)]
pub enum PageMagicError {
    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Config errors
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Could not determine config directory")]
    NoConfigDir,

    // Version history errors
    #[error("Version out of order: expected version {expected}, got {found}")]
    VersionOutOfOrder { expected: u32, found: u32 },

    #[error("No version at index {0}")]
    VersionNotFound(usize),

    #[error("Version history is empty")]
    EmptyHistory,

    // Backend errors
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Polling stopped: {0}")]
    PollStopped(String),
}

/// Result type alias for pagemagic operations
pub type Result<T> = std::result::Result<T, PageMagicError>;

/// A serializable representation of PageMagicError for IPC and JSON output
#[derive(Debug, Clone, Serialize)]
pub struct SerializableError {
    /// Error kind/variant name
    pub kind: String,
    /// Human-readable error message
    pub message: String,
    /// Associated path (if applicable)
    pub path: Option<PathBuf>,
    /// Backend error code (if applicable)
    pub code: Option<String>,
}

impl From<&PageMagicError> for SerializableError {
    fn from(err: &PageMagicError) -> Self {
        let kind = match err {
            PageMagicError::Io(_) => "Io",
            PageMagicError::FileRead { .. } => "FileRead",
            PageMagicError::FileWrite { .. } => "FileWrite",
            PageMagicError::Json(_) => "Json",
            PageMagicError::ConfigParse(_) => "ConfigParse",
            PageMagicError::ConfigSerialize(_) => "ConfigSerialize",
            PageMagicError::NoConfigDir => "NoConfigDir",
            PageMagicError::VersionOutOfOrder { .. } => "VersionOutOfOrder",
            PageMagicError::VersionNotFound(_) => "VersionNotFound",
            PageMagicError::EmptyHistory => "EmptyHistory",
            PageMagicError::Api(ApiError::PlanLimit { .. }) => "PlanLimit",
            PageMagicError::Api(_) => "Api",
            PageMagicError::PollStopped(_) => "PollStopped",
        }
        .to_string();

        let path = match err {
            PageMagicError::FileRead { path, .. } => Some(path.clone()),
            PageMagicError::FileWrite { path, .. } => Some(path.clone()),
            _ => None,
        };

        let code = match err {
            PageMagicError::Api(api) => api.code().map(str::to_string),
            _ => None,
        };

        Self {
            kind,
            message: err.to_string(),
            path,
            code,
        }
    }
}

impl From<PageMagicError> for SerializableError {
    fn from(err: PageMagicError) -> Self {
        SerializableError::from(&err)
    }
}

impl PageMagicError {
    /// Convert to a serializable representation for IPC
    pub fn to_serializable(&self) -> SerializableError {
        SerializableError::from(self)
    }

    /// Whether this error is the backend's plan/quota limit signal.
    pub fn is_plan_limit(&self) -> bool {
        matches!(self, PageMagicError::Api(api) if api.is_plan_limit())
    }
}
