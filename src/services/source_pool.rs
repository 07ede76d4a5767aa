//! The current working set of origin image URLs

use rand::Rng;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// Single slot holding the latest URL list; replaced wholesale, never edited
#[derive(Clone, Default)]
pub struct SourcePool {
    current: Arc<RwLock<Arc<Vec<String>>>>,
}

impl SourcePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pool seeded with a fixed list
    pub fn with_urls(urls: Vec<String>) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(urls))),
        }
    }

    /// The complete list as of now; later replacements do not affect it
    pub async fn snapshot(&self) -> Arc<Vec<String>> {
        self.current.read().await.clone()
    }

    /// Swap in a new list, returning the size of the one it replaced
    pub async fn replace(&self, urls: Vec<String>) -> usize {
        let new_len = urls.len();
        let previous = {
            let mut current = self.current.write().await;
            std::mem::replace(&mut *current, Arc::new(urls))
        };
        info!(
            "Source pool replaced: {} -> {} URLs",
            previous.len(),
            new_len
        );
        previous.len()
    }

    pub async fn len(&self) -> usize {
        self.current.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.current.read().await.is_empty()
    }

    /// Uniformly random URL from the current snapshot
    pub async fn pick_random(&self) -> Option<String> {
        let snapshot = self.snapshot().await;
        if snapshot.is_empty() {
            return None;
        }
        let index = rand::rng().random_range(0..snapshot.len());
        Some(snapshot[index].clone())
    }
}
