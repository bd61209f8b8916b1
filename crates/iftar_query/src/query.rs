//! Keyed queries
//!
//! A `Query<T>` owns the cache entry for one key: the fetch function, the
//! current `QueryState`, and the bookkeeping that keeps concurrent fetches
//! honest. State changes are published on a `watch` channel so views can
//! await the next update.

use crate::error::{QueryError, Result};
use crate::observer::{QueryObserver, QueryOptions};
use crate::state::QueryState;
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;

/// Type-erased fetch function
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// Cache key
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Arc<str>);

impl QueryKey {
    pub fn new(key: &str) -> Self {
        Self(Arc::from(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QueryKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for QueryKey {
    fn from(key: String) -> Self {
        Self(Arc::from(key))
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wrap a plain async function as a `Fetcher`
pub fn fetcher<T, E, F, Fut>(f: F) -> Fetcher<T>
where
    T: Send + 'static,
    E: fmt::Display,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
{
    Arc::new(move || {
        let fut = f();
        Box::pin(async move { fut.await.map_err(QueryError::failed) })
    })
}

pub(crate) struct QueryShared<T> {
    key: QueryKey,
    fetcher: Fetcher<T>,
    state: watch::Sender<QueryState<T>>,
    observers: AtomicUsize,
    /// Observers allowed to fetch; only these trigger refetch on invalidation
    enabled_observers: AtomicUsize,
}

impl<T: Send + Sync + 'static> QueryShared<T> {
    /// Start a fetch, or join the one already in flight
    ///
    /// With `force` a new fetch is started even if one is running; the newer
    /// one wins. Returns the sequence number to wait for.
    pub(crate) fn start_fetch(self: &Arc<Self>, force: bool) -> Result<u64> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| QueryError::NoRuntime)?;

        let mut wait_seq = 0;
        let mut started = None;
        self.state.send_if_modified(|s| {
            if s.in_flight > 0 && !force {
                wait_seq = s.started_seq;
                return false;
            }
            s.started_seq += 1;
            s.in_flight += 1;
            wait_seq = s.started_seq;
            started = Some(s.started_seq);
            true
        });

        if let Some(seq) = started {
            tracing::debug!(key = %self.key, seq, force, "query fetch started");
            let future = (self.fetcher)();
            let weak = Arc::downgrade(self);
            runtime.spawn(async move {
                let result = future.await;
                if let Some(shared) = weak.upgrade() {
                    shared.settle(seq, result);
                }
            });
        }

        Ok(wait_seq)
    }

    fn settle(&self, seq: u64, result: Result<T>) {
        let key = &self.key;
        self.state.send_modify(|s| {
            s.in_flight = s.in_flight.saturating_sub(1);

            if seq <= s.applied_seq {
                tracing::debug!(key = %key, seq, applied = s.applied_seq, "discarding out-of-date response");
                return;
            }
            s.applied_seq = seq;

            match result {
                Ok(value) => {
                    s.data = Some(Arc::new(value));
                    s.error = None;
                    s.data_updated_at = Some(Instant::now());
                    if seq == s.started_seq {
                        s.is_invalidated = false;
                    }
                    tracing::debug!(key = %key, seq, "query resolved");
                }
                Err(err) => {
                    tracing::warn!(
                        key = %key,
                        seq,
                        has_data = s.data.is_some(),
                        "query fetch failed, keeping last data: {}",
                        err
                    );
                    s.error = Some(err);
                }
            }
        });
    }

    async fn wait_for(&self, seq: u64) -> Result<Arc<T>> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|s| s.applied_seq >= seq)
            .await
            .map_err(|_| QueryError::Dropped)?;
        state.outcome()
    }

    pub(crate) fn invalidate(self: &Arc<Self>) {
        self.state.send_modify(|s| {
            s.is_invalidated = true;
            s.invalidations += 1;
        });

        let observers = self.observers.load(Ordering::Acquire);
        let enabled = self.enabled_observers.load(Ordering::Acquire);
        tracing::debug!(key = %self.key, observers, enabled, "query invalidated");
        if enabled > 0 {
            if let Err(err) = self.start_fetch(true) {
                tracing::warn!(key = %self.key, "could not refetch invalidated query: {}", err);
            }
        }
    }

    pub(crate) fn add_observer(&self, enabled: bool) {
        self.observers.fetch_add(1, Ordering::AcqRel);
        if enabled {
            self.enabled_observers.fetch_add(1, Ordering::AcqRel);
        }
    }

    pub(crate) fn remove_observer(&self, enabled: bool) {
        self.observers.fetch_sub(1, Ordering::AcqRel);
        if enabled {
            self.enabled_observers.fetch_sub(1, Ordering::AcqRel);
        }
    }

    pub(crate) fn snapshot(&self) -> QueryState<T> {
        self.state.borrow().clone()
    }
}

/// Handle to one cache entry
///
/// Clones share the same entry. The entry lives as long as any handle or
/// observer does; the client only keeps a weak reference.
pub struct Query<T> {
    pub(crate) shared: Arc<QueryShared<T>>,
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Send + Sync + 'static> Query<T> {
    /// Create a standalone query (not registered with any client)
    pub fn new(key: impl Into<QueryKey>, fetcher: Fetcher<T>) -> Self {
        Self {
            shared: Arc::new(QueryShared {
                key: key.into(),
                fetcher,
                state: watch::Sender::new(QueryState::new()),
                observers: AtomicUsize::new(0),
                enabled_observers: AtomicUsize::new(0),
            }),
        }
    }

    pub fn key(&self) -> &QueryKey {
        &self.shared.key
    }

    /// Fetch, sharing any request already in flight for this key
    pub async fn fetch(&self) -> Result<Arc<T>> {
        let seq = self.shared.start_fetch(false)?;
        self.shared.wait_for(seq).await
    }

    /// Start a new fetch even if one is in flight
    pub async fn refetch(&self) -> Result<Arc<T>> {
        let seq = self.shared.start_fetch(true)?;
        self.shared.wait_for(seq).await
    }

    /// Mark the data stale; refetches right away if anyone is observing
    pub fn invalidate(&self) {
        self.shared.invalidate();
    }

    /// Mount a view on this query
    pub fn observe(&self, options: QueryOptions) -> QueryObserver<T> {
        QueryObserver::new(self.clone(), options)
    }

    /// Current state snapshot
    pub fn state(&self) -> QueryState<T> {
        self.shared.snapshot()
    }

    /// Last good data, if any
    pub fn data(&self) -> Option<Arc<T>> {
        self.shared.state.borrow().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.shared.state.borrow().is_loading()
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.shared.state.subscribe()
    }

    pub fn observer_count(&self) -> usize {
        self.shared.observers.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::time::Duration;
    use tokio::sync::Notify;

    fn counting_query(calls: Arc<AtomicU64>) -> Query<u64> {
        Query::new(
            "count",
            fetcher(move || {
                let calls = calls.clone();
                async move { Ok::<_, QueryError>(calls.fetch_add(1, Ordering::SeqCst) + 1) }
            }),
        )
    }

    #[tokio::test]
    async fn test_fetch_resolves() {
        let calls = Arc::new(AtomicU64::new(0));
        let query = counting_query(calls.clone());

        assert_eq!(*query.fetch().await.unwrap(), 1);
        assert_eq!(query.data().as_deref(), Some(&1));
        assert!(!query.is_loading());
        assert_eq!(query.state().fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_fetches_coalesce() {
        let calls = Arc::new(AtomicU64::new(0));
        let gate = Arc::new(Notify::new());

        let (c, g) = (calls.clone(), gate.clone());
        let query = Query::new(
            "gated",
            fetcher(move || {
                let (c, g) = (c.clone(), g.clone());
                async move {
                    g.notified().await;
                    Ok::<_, QueryError>(c.fetch_add(1, Ordering::SeqCst) + 1)
                }
            }),
        );

        let a = tokio::spawn({
            let q = query.clone();
            async move { q.fetch().await }
        });
        let b = tokio::spawn({
            let q = query.clone();
            async move { q.fetch().await }
        });
        tokio::task::yield_now().await;
        assert!(query.state().is_loading());

        gate.notify_one();
        assert_eq!(*a.await.unwrap().unwrap(), 1);
        assert_eq!(*b.await.unwrap().unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_newest_response_wins() {
        let calls = Arc::new(AtomicU64::new(0));
        let c = calls.clone();
        let query = Query::new(
            "race",
            fetcher(move || {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    // The first request is slower than the second
                    let delay = if n == 1 { 100 } else { 10 };
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    Ok::<_, QueryError>(n)
                }
            }),
        );

        let slow = tokio::spawn({
            let q = query.clone();
            async move { q.fetch().await }
        });
        tokio::task::yield_now().await;

        assert_eq!(*query.refetch().await.unwrap(), 2);
        // The slow first response settles later and is discarded
        assert_eq!(*slow.await.unwrap().unwrap(), 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(query.data().as_deref(), Some(&2));
        assert!(!query.state().is_fetching());
    }

    #[tokio::test]
    async fn test_failed_refetch_keeps_data() {
        let fail = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let f = fail.clone();
        let query = Query::new(
            "flaky",
            fetcher(move || {
                let fail = f.load(Ordering::SeqCst);
                async move {
                    if fail {
                        Err("network down")
                    } else {
                        Ok(42u32)
                    }
                }
            }),
        );

        query.fetch().await.unwrap();
        fail.store(true, Ordering::SeqCst);

        let err = query.fetch().await.unwrap_err();
        assert_eq!(err, QueryError::Failed("network down".into()));

        let state = query.state();
        assert_eq!(state.data.as_deref(), Some(&42));
        assert_eq!(state.status(), crate::QueryStatus::StaleError);
        assert!(!state.is_loading());

        fail.store(false, Ordering::SeqCst);
        query.fetch().await.unwrap();
        assert_eq!(query.state().status(), crate::QueryStatus::Resolved);
    }

    #[test]
    fn test_fetch_without_runtime_fails() {
        let calls = Arc::new(AtomicU64::new(0));
        let query = counting_query(calls);
        assert_eq!(
            query.shared.start_fetch(false).unwrap_err(),
            QueryError::NoRuntime
        );
    }

    #[tokio::test]
    async fn test_invalidate_without_observers_only_marks_stale() {
        let calls = Arc::new(AtomicU64::new(0));
        let query = counting_query(calls.clone());
        query.fetch().await.unwrap();

        query.invalidate();
        let state = query.state();
        assert!(state.is_invalidated);
        assert_eq!(state.invalidations, 1);
        assert!(!state.is_fetching());
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        query.fetch().await.unwrap();
        assert!(!query.state().is_invalidated);
    }

    #[test]
    fn test_query_key() {
        let key = QueryKey::from("campaign-stats");
        assert_eq!(key.as_str(), "campaign-stats");
        assert_eq!(key.to_string(), "campaign-stats");
        assert_eq!(key, QueryKey::from(String::from("campaign-stats")));
    }
}
