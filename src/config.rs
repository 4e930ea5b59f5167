use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Fileshare configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address to bind to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Root directory to serve files from
    #[serde(default = "default_root")]
    pub root: PathBuf,

    /// Log raw request bodies and verbose pipeline diagnostics
    #[serde(default)]
    pub debug: bool,

    /// Maximum accumulated request body size (in bytes)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: u64,
}

/// Ceiling for a buffered request body.
pub const DEFAULT_MAX_BODY_SIZE: u64 = 100 * 1024 * 1024; // 100 MiB

fn default_port() -> u16 {
    8080
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_body_size() -> u64 {
    DEFAULT_MAX_BODY_SIZE
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            root: default_root(),
            debug: false,
            max_body_size: default_max_body_size(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Socket address string in `bind:port` form
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
