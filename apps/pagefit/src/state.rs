use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use crate::config::Config;
use crate::layout::{DocumentKind, FitConfig};
use crate::render::RenderOracle;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub cv: Arc<FitConfig>,
    pub cover_letter: Arc<FitConfig>,
    /// Pluggable renderer. Default: `CommandRenderOracle`, cached when enabled.
    pub oracle: Arc<dyn RenderOracle>,
}

impl AppState {
    /// Builds state from the built-in profiles, replacing the one named by the
    /// optional `FIT_CONFIG_PATH` file.
    pub fn new(config: Config, oracle: Arc<dyn RenderOracle>) -> Result<Self> {
        let mut cv = FitConfig::for_kind(DocumentKind::Cv);
        let mut cover_letter = FitConfig::for_kind(DocumentKind::CoverLetter);

        if let Some(path) = &config.fit_config_path {
            let loaded = FitConfig::from_json_file(path)?;
            info!(path = %path.display(), kind = ?loaded.kind, "Loaded fit config override");
            match loaded.kind {
                DocumentKind::Cv => cv = loaded,
                DocumentKind::CoverLetter => cover_letter = loaded,
            }
        }

        Ok(Self {
            config,
            cv: Arc::new(cv),
            cover_letter: Arc::new(cover_letter),
            oracle,
        })
    }

    pub fn fit_config(&self, kind: DocumentKind) -> &FitConfig {
        match kind {
            DocumentKind::Cv => &self.cv,
            DocumentKind::CoverLetter => &self.cover_letter,
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> Config {
    Config {
        render_command: "render-cv".to_string(),
        render_timeout: std::time::Duration::from_secs(5),
        render_cache_capacity: 0,
        fit_config_path: None,
        port: 0,
        rust_log: "debug".to_string(),
    }
}
