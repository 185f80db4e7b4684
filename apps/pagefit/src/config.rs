use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    /// Renderer command line; `<input.json> <output.pdf>` is appended per call.
    pub render_command: String,
    pub render_timeout: Duration,
    /// 0 disables the render cache.
    pub render_cache_capacity: usize,
    /// Optional JSON file overriding the built-in `FitConfig` for its document kind.
    pub fit_config_path: Option<PathBuf>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            render_command: require_env("RENDER_COMMAND")?,
            render_timeout: Duration::from_secs(
                optional_env("RENDER_TIMEOUT_SECS", "60")
                    .parse::<u64>()
                    .context("RENDER_TIMEOUT_SECS must be a whole number of seconds")?,
            ),
            render_cache_capacity: optional_env("RENDER_CACHE_CAPACITY", "64")
                .parse::<usize>()
                .context("RENDER_CACHE_CAPACITY must be a non-negative integer")?,
            fit_config_path: std::env::var("FIT_CONFIG_PATH").ok().map(PathBuf::from),
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
