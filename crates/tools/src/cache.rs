//! Short-lived cache of extracted pages, keyed by retrieval mode and URL.

use crate::page::PageDocument;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// How a cached page was retrieved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheMode {
    Fetch,
    Render,
}

pub struct PageCache {
    ttl: Duration,
    entries: Mutex<HashMap<(CacheMode, String), (Instant, PageDocument)>>,
}

impl PageCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// A fresh entry, if any. Expired entries are evicted on read.
    pub fn get(&self, mode: CacheMode, url: &str) -> Option<PageDocument> {
        let mut entries = self.entries.lock().ok()?;
        let key = (mode, url.to_string());
        match entries.get(&key) {
            Some((stored, doc)) if stored.elapsed() <= self.ttl => {
                debug!(url, ?mode, "Page cache hit");
                Some(doc.clone())
            }
            Some(_) => {
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, mode: CacheMode, url: &str, doc: PageDocument) {
        if self.ttl.is_zero() {
            return;
        }
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, (stored, _)| stored.elapsed() <= ttl);
            entries.insert((mode, url.to_string()), (Instant::now(), doc));
        }
    }
}
