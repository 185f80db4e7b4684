//! Render Oracle — the authoritative, opaque renderer behind a trait.
//!
//! The estimator only predicts. The oracle renders the real document and its
//! page count is ground truth. Backends:
//! - `CommandRenderOracle`: hands the content to an external renderer process.
//! - `CachedRenderOracle`: content-digest LRU in front of any other oracle.
//!
//! `AppState` holds an `Arc<dyn RenderOracle>`, chosen at startup from config.

pub mod cache;
pub mod command;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::models::ContentModel;

pub use cache::CachedRenderOracle;
pub use command::CommandRenderOracle;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to start renderer '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Renderer exited with {status}: {stderr}")]
    Process { status: String, stderr: String },

    #[error("Renderer timed out after {timeout:?}")]
    Timeout { timeout: std::time::Duration },

    #[error("Renderer I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unreadable PDF: {0}")]
    Pdf(String),

    #[error("Failed to serialize content: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The renderer trait. Implement this to swap backends without touching the
/// fit loop or the handlers.
#[async_trait]
pub trait RenderOracle: Send + Sync {
    /// Renders `content` to the final document bytes.
    async fn render(&self, content: &ContentModel) -> Result<Bytes, RenderError>;

    /// Counts the pages of a rendered document.
    fn count_pages(&self, document: &[u8]) -> Result<u32, RenderError>;
}

/// Result of rendering a candidate and checking it against the target.
#[derive(Debug)]
pub enum RenderOutcome {
    /// Exactly the target page count.
    Fits { document: Bytes, pages: u32 },
    /// Rendered, but on the wrong number of pages.
    PageMismatch { pages: u32 },
    /// The backend itself failed.
    Failed(RenderError),
}

/// Renders `content` and compares its real page count with `target_pages`.
pub async fn render_checked(
    oracle: &dyn RenderOracle,
    content: &ContentModel,
    target_pages: u32,
) -> RenderOutcome {
    let document = match oracle.render(content).await {
        Ok(document) => document,
        Err(e) => return RenderOutcome::Failed(e),
    };
    match oracle.count_pages(&document) {
        Ok(pages) if pages == target_pages => RenderOutcome::Fits { document, pages },
        Ok(pages) => RenderOutcome::PageMismatch { pages },
        Err(e) => RenderOutcome::Failed(e),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Test oracles
// ────────────────────────────────────────────────────────────────────────────
