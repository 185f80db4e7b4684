//! Content-hash-keyed LRU cache in front of another oracle.
//!
//! The renderer is deterministic for identical input, so a SHA-256 digest of
//! the content's JSON is a sound key. Only successful renders are stored and
//! entries never change once written.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::models::ContentModel;
use crate::render::{RenderError, RenderOracle};

#[derive(Default)]
struct LruState {
    entries: HashMap<String, Bytes>,
    /// Least recently used at the front.
    order: VecDeque<String>,
}

impl LruState {
    fn get(&mut self, key: &str) -> Option<Bytes> {
        let hit = self.entries.get(key).cloned()?;
        self.touch(key);
        Some(hit)
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }

    fn insert(&mut self, key: String, document: Bytes, capacity: usize) {
        if self.entries.contains_key(&key) {
            self.touch(&key);
            return;
        }
        while self.entries.len() >= capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, document);
    }
}

pub struct CachedRenderOracle<O> {
    inner: O,
    capacity: usize,
    state: Mutex<LruState>,
}

impl<O: RenderOracle> CachedRenderOracle<O> {
    pub fn new(inner: O, capacity: usize) -> Self {
        Self {
            inner,
            capacity: capacity.max(1),
            state: Mutex::new(LruState::default()),
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }
}

/// Hex SHA-256 of the content's JSON serialization.
pub fn content_digest(content: &ContentModel) -> Result<String, RenderError> {
    let json = serde_json::to_vec(content)?;
    let digest = Sha256::digest(&json);
    Ok(format!("{digest:x}"))
}

#[async_trait]
impl<O: RenderOracle> RenderOracle for CachedRenderOracle<O> {
    async fn render(&self, content: &ContentModel) -> Result<Bytes, RenderError> {
        let key = content_digest(content)?;

        // A poisoned lock only means another render panicked; skip the cache.
        if let Ok(mut state) = self.state.lock() {
            if let Some(hit) = state.get(&key) {
                debug!(digest = %key, "Render cache hit");
                return Ok(hit);
            }
        }

        let document = self.inner.render(content).await?;
        if let Ok(mut state) = self.state.lock() {
            state.insert(key, document.clone(), self.capacity);
        }
        Ok(document)
    }

    fn count_pages(&self, document: &[u8]) -> Result<u32, RenderError> {
        self.inner.count_pages(document)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
