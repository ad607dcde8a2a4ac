//! Analytics client-id resolution with one-shot caching.
//!
//! The id is independent of auth state and purely best-effort: a request
//! must go out with or without it, so resolution failures are absorbed
//! here and never surface as errors.

use async_trait::async_trait;
use tokio::sync::OnceCell;

/// Source of the stable per-device analytics identifier, typically backed
/// by the analytics host SDK.
#[async_trait]
pub trait ClientIdSource: Send + Sync {
    /// Resolve the client id. `None` means unavailable right now.
    async fn resolve(&self) -> Option<String>;
}

/// Caches the first successful resolution; later calls return the cached
/// value without touching the source. Failed resolutions are not cached,
/// so a temporarily unavailable SDK gets another chance on the next call.
pub struct CachedClientId {
    source: Box<dyn ClientIdSource>,
    cell: OnceCell<String>,
}

impl CachedClientId {
    pub fn new(source: Box<dyn ClientIdSource>) -> Self {
        CachedClientId {
            source,
            cell: OnceCell::new(),
        }
    }

    pub async fn get(&self) -> Option<String> {
        if let Some(cached) = self.cell.get() {
            return Some(cached.clone());
        }
        match self.source.resolve().await {
            Some(id) => {
                // A concurrent resolution may have won; either value is fine.
                let _ = self.cell.set(id.clone());
                Some(id)
            }
            None => {
                tracing::debug!("client id unavailable, continuing without attribution");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: Arc<AtomicUsize>,
        value: Option<String>,
    }

    #[async_trait]
    impl ClientIdSource for CountingSource {
        async fn resolve(&self) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.value.clone()
        }
    }

    #[tokio::test]
    async fn successful_resolution_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cached = CachedClientId::new(Box::new(CountingSource {
            calls: calls.clone(),
            value: Some("17123.456".to_string()),
        }));

        assert_eq!(cached.get().await.as_deref(), Some("17123.456"));
        assert_eq!(cached.get().await.as_deref(), Some("17123.456"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_resolution_is_retried_next_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cached = CachedClientId::new(Box::new(CountingSource {
            calls: calls.clone(),
            value: None,
        }));

        assert!(cached.get().await.is_none());
        assert!(cached.get().await.is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
