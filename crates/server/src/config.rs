use std::fs::read_to_string;
use std::path::PathBuf;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::database::connection::DbConfig;

/// Config file expected next to the binary's working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address, e.g. "127.0.0.1:8080".
    pub address: String,
}

/// Top-level devshelf configuration: where to listen and which SQLite
/// file holds the bookmarks.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DbConfig,
}

impl AppConfig {
    pub fn from_yaml_file<P: Into<PathBuf>>(path: P) -> Result<Self, anyhow::Error> {
        let path = path.into();
        let content = read_to_string(&path).with_context(|| format!("path: {path:?}"))?;
        Ok(serde_yaml::from_str(&content)?)
    }
}
