//! Query client
//!
//! Registry of live queries by key. The client holds weak references only:
//! a query lives as long as some view holds it, and invalidating a key whose
//! views are gone does nothing.
//!
//! # Example
//!
//! ```ignore
//! let client = QueryClient::new();
//! let donations = client.query("donations", move || {
//!     let backend = backend.clone();
//!     async move { backend.get_all_donations().await }
//! });
//!
//! // Later, after a write
//! client.invalidate("donations");
//! ```

use crate::query::{fetcher, Query, QueryKey, QueryShared};
use crate::state::QueryState;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, Weak};

/// Type-erased query for the registry
trait AnyQuery: Send + Sync {
    fn invalidate_erased(self: Arc<Self>);
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Send + Sync + 'static> AnyQuery for QueryShared<T> {
    fn invalidate_erased(self: Arc<Self>) {
        self.invalidate();
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Shared registry of queries
#[derive(Clone, Default)]
pub struct QueryClient {
    queries: Arc<Mutex<FxHashMap<QueryKey, Weak<dyn AnyQuery>>>>,
}

impl QueryClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the live query for `key`, or create one with `fetch`
    ///
    /// If a query of the same type is already registered and alive, it is
    /// returned and `fetch` is dropped. A live query of a different type is
    /// replaced.
    pub fn query<T, E, F, Fut>(&self, key: impl Into<QueryKey>, fetch: F) -> Query<T>
    where
        T: Send + Sync + 'static,
        E: fmt::Display,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        let key = key.into();
        let mut queries = self.queries.lock().unwrap();

        if let Some(existing) = queries.get(&key).and_then(Weak::upgrade) {
            match existing.into_any().downcast::<QueryShared<T>>() {
                Ok(shared) => return Query { shared },
                Err(_) => {
                    tracing::warn!(key = %key, "replacing query registered with another type");
                }
            }
        }

        let query = Query::new(key.clone(), fetcher(fetch));
        let shared: Arc<dyn AnyQuery> = query.shared.clone();
        queries.insert(key, Arc::downgrade(&shared));
        query
    }

    /// Look up a live query without creating one
    pub fn get<T: Send + Sync + 'static>(&self, key: impl Into<QueryKey>) -> Option<Query<T>> {
        let key = key.into();
        let existing = self.queries.lock().unwrap().get(&key).and_then(Weak::upgrade)?;
        existing
            .into_any()
            .downcast::<QueryShared<T>>()
            .ok()
            .map(|shared| Query { shared })
    }

    /// Last good data cached for `key`
    pub fn get_query_data<T: Send + Sync + 'static>(
        &self,
        key: impl Into<QueryKey>,
    ) -> Option<Arc<T>> {
        self.get::<T>(key).and_then(|q| q.data())
    }

    /// Full state snapshot of the live query for `key`
    pub fn get_state<T: Send + Sync + 'static>(
        &self,
        key: impl Into<QueryKey>,
    ) -> Option<QueryState<T>> {
        self.get::<T>(key).map(|q| q.state())
    }

    /// Mark `key` stale and refetch it for live observers
    ///
    /// Returns false if no live query is registered under `key`.
    pub fn invalidate(&self, key: impl Into<QueryKey>) -> bool {
        let key = key.into();
        let existing = {
            let mut queries = self.queries.lock().unwrap();
            match queries.get(&key).and_then(Weak::upgrade) {
                Some(query) => query,
                None => {
                    queries.remove(&key);
                    tracing::debug!(key = %key, "invalidate: no live query");
                    return false;
                }
            }
        };
        // Registry lock is released before refetching
        existing.invalidate_erased();
        true
    }

    /// Invalidate every live query, returning how many were hit
    pub fn invalidate_all(&self) -> usize {
        let live: Vec<Arc<dyn AnyQuery>> = {
            let mut queries = self.queries.lock().unwrap();
            queries.retain(|_, q| q.strong_count() > 0);
            queries.values().filter_map(Weak::upgrade).collect()
        };
        let count = live.len();
        for query in live {
            query.invalidate_erased();
        }
        count
    }

    /// Drop registry entries whose queries are gone
    pub fn prune(&self) -> usize {
        let mut queries = self.queries.lock().unwrap();
        let before = queries.len();
        queries.retain(|_, q| q.strong_count() > 0);
        before - queries.len()
    }

    /// Keys with a live query
    pub fn keys(&self) -> Vec<QueryKey> {
        self.queries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, q)| q.strong_count() > 0)
            .map(|(k, _)| k.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::observer::QueryOptions;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::time::Duration;

    fn register(client: &QueryClient, key: &str, calls: Arc<AtomicU64>) -> Query<u64> {
        client.query(key, move || {
            let calls = calls.clone();
            async move { Ok::<_, QueryError>(calls.fetch_add(1, Ordering::SeqCst) + 1) }
        })
    }

    #[tokio::test]
    async fn test_same_key_shares_entry() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicU64::new(0));

        let a = register(&client, "stats", calls.clone());
        let b = register(&client, "stats", calls.clone());

        a.fetch().await.unwrap();
        assert_eq!(b.data().as_deref(), Some(&1));
        assert_eq!(client.get_query_data::<u64>("stats").as_deref(), Some(&1));
        assert_eq!(client.keys(), vec![QueryKey::from("stats")]);

        let state = client.get_state::<u64>("stats").unwrap();
        assert_eq!(state.fetch_count(), 1);
        assert!(client.get_state::<String>("stats").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_refetches_observed_query() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicU64::new(0));
        let query = register(&client, "stats", calls.clone());

        let _observer = query.observe(QueryOptions::new());
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert!(client.invalidate("stats"));
        tokio::time::sleep(Duration::from_millis(1)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(query.data().as_deref(), Some(&2));
    }

    #[tokio::test]
    async fn test_invalidate_after_drop_is_noop() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicU64::new(0));
        {
            let query = register(&client, "donations", calls.clone());
            query.fetch().await.unwrap();
        }

        assert!(!client.invalidate("donations"));
        assert!(!client.invalidate("never-registered"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(client.keys().is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_all_and_prune() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicU64::new(0));

        let stats = register(&client, "stats", calls.clone());
        let gone = register(&client, "gone", calls.clone());
        drop(gone);

        assert_eq!(client.invalidate_all(), 1);
        assert!(stats.state().is_invalidated);
        assert_eq!(client.prune(), 0);

        let temp = register(&client, "temp", calls);
        drop(temp);
        assert_eq!(client.prune(), 1);
    }

    #[tokio::test]
    async fn test_type_mismatch_replaces_entry() {
        let client = QueryClient::new();
        let calls = Arc::new(AtomicU64::new(0));
        let _numbers = register(&client, "shared-key", calls);

        let text: Query<String> = client.query("shared-key", || async {
            Ok::<_, QueryError>("hello".to_string())
        });
        assert_eq!(text.fetch().await.unwrap().as_str(), "hello");
        assert!(client.get::<u64>("shared-key").is_none());
    }
}
