use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DIST_DIR: &str = "dist";
pub const DEFAULT_LOG_FILTER: &str = "webview_map_devhost=info,tower_http=info";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("invalid PORT {value:?}: {reason}")]
    InvalidPort { value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    /// Output directory of the web bundle (`index.html` plus `assets/`).
    pub dist_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source so tests need not touch the
    /// process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidPort {
                    value: raw.clone(),
                    reason: e.to_string(),
                })?,
            None => DEFAULT_PORT,
        };
        let dist_dir = lookup("DIST_DIR")
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_DIST_DIR.to_string());

        Ok(Config {
            port,
            dist_dir: PathBuf::from(dist_dir),
        })
    }
}
