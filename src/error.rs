//! Error types for resource storage, validation and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading a JSON document from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            LoadError::FileNotFound { .. } | LoadError::ReadError { .. } => 3,
            LoadError::InvalidJson { .. } => 2,
        }
    }
}

/// Errors from the resource store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid resource name \"{name}\"")]
    InvalidResourceName { name: String },

    #[error("resource \"{resource}\" not found")]
    NotFound { resource: String },

    #[error(transparent)]
    Load(LoadError),

    #[error("resource \"{resource}\" is not a JSON array")]
    NotACollection { resource: String },

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize resource \"{resource}\": {source}")]
    Serialize {
        resource: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by resource handler operations.
///
/// Every variant carries a message suitable for the `{error}` response envelope.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Resource ID not found!")]
    IdNotFound { id: String },

    #[error("Invalid payload! Details: {}", errors.join(", "))]
    Invalid { errors: Vec<String> },

    #[error("Invalid payload! Details: {message}")]
    SchemaUnavailable { message: String },

    #[error("Invalid payload! Details: request body must be a JSON object")]
    NotAnObject,

    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Errors while loading server configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<LoadError> for ConfigError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::FileNotFound { path } => ConfigError::FileNotFound { path },
            LoadError::ReadError { path, source } => ConfigError::Read { path, source },
            LoadError::InvalidJson { path, source } => ConfigError::Parse { path, source },
        }
    }
}
