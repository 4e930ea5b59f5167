//! File share library: serves a directory tree over HTTP with browsable
//! listings and multipart uploads.
//!
//! The crate can be used as a standalone binary or embedded by building a
//! router with [`routes::app`].

pub mod body;
pub mod config;
pub mod context;
pub mod error;
pub mod handlers;
pub mod listing;
pub mod multipart;
pub mod pipeline;
pub mod router;
pub mod routes;
pub mod security;

use std::path::PathBuf;
use std::sync::Arc;

pub use config::Config;
pub use error::ServeError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Root directory to serve files from (absolute, normalized)
    pub root_dir: PathBuf,
    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState with the given root directory and default config.
    pub fn new(root_dir: PathBuf) -> Self {
        Self::with_config(root_dir, Config::default())
    }

    /// Create a new AppState with the given root directory and config.
    pub fn with_config(root_dir: PathBuf, config: Config) -> Self {
        let root_dir = match std::path::absolute(&root_dir) {
            Ok(absolute) => context::normalize_path(&absolute),
            Err(_) => context::normalize_path(&root_dir),
        };
        Self {
            root_dir,
            config: Arc::new(config),
        }
    }
}
