//! Server configuration.
//!
//! Read from an optional JSON file shaped as
//! `{"config": {"listenerPort": 3000, "enableAccessLogs": true}}`;
//! any key may be omitted and falls back to its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::loader::load_json;

/// HTTP server and data layout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Host to bind to (default: "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 3000)
    #[serde(default = "default_port")]
    pub listener_port: u16,

    /// Log every HTTP request (default: false)
    #[serde(default)]
    pub enable_access_logs: bool,

    /// Directory holding `<resource>.json` and `<resource>.schema` files (default: "./mock")
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Directory served for non-API paths (default: "./public")
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

/// Top-level layout of the config file.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    config: Option<ServerConfig>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./mock")
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./public")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            listener_port: default_port(),
            enable_access_logs: false,
            data_dir: default_data_dir(),
            static_dir: default_static_dir(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing, unreadable or malformed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let doc = load_json(path)?;
        let file: ConfigFile =
            serde_json::from_value(doc).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(file.config.unwrap_or_default())
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.listener_port)
    }
}
