//! Query observers
//!
//! An observer is a mounted view of a query. Creating one fetches the query
//! (joining any fetch already in flight) and, if asked, starts a polling task.
//! The polling task belongs to the observer: dropping the observer aborts it,
//! so no timer outlives the view that wanted it.

use crate::error::Result;
use crate::query::Query;
use crate::state::QueryState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// How an observer drives its query
#[derive(Clone, Debug)]
pub struct QueryOptions {
    /// Fetch on mount and poll; a disabled observer only reads the cache
    pub enabled: bool,
    /// Poll period while mounted; zero disables polling
    pub refetch_interval: Option<Duration>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn refetch_interval(mut self, interval: Duration) -> Self {
        self.refetch_interval = Some(interval);
        self
    }
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            refetch_interval: None,
        }
    }
}

/// A mounted view of a query
pub struct QueryObserver<T: Send + Sync + 'static> {
    query: Query<T>,
    options: QueryOptions,
    poller: Option<JoinHandle<()>>,
}

impl<T: Send + Sync + 'static> QueryObserver<T> {
    pub(crate) fn new(query: Query<T>, options: QueryOptions) -> Self {
        query.shared.add_observer(options.enabled);

        let mut observer = Self {
            query,
            options,
            poller: None,
        };

        if observer.options.enabled {
            if let Err(err) = observer.query.shared.start_fetch(false) {
                tracing::warn!(key = %observer.query.key(), "initial fetch not started: {}", err);
            }
            // A zero period means no polling
            if let Some(period) = observer.options.refetch_interval.filter(|p| !p.is_zero()) {
                observer.poller = observer.spawn_poller(period);
            }
        }

        observer
    }

    fn spawn_poller(&self, period: Duration) -> Option<JoinHandle<()>> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let weak = Arc::downgrade(&self.query.shared);
        let key = self.query.key().clone();

        tracing::debug!(key = %key, ?period, "polling started");
        Some(runtime.spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let Some(shared) = weak.upgrade() else {
                    break;
                };
                if let Err(err) = shared.start_fetch(false) {
                    tracing::warn!(key = %key, "poll fetch not started: {}", err);
                }
            }
        }))
    }

    pub fn query(&self) -> &Query<T> {
        &self.query
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn state(&self) -> QueryState<T> {
        self.query.state()
    }

    pub fn data(&self) -> Option<Arc<T>> {
        self.query.data()
    }

    pub fn is_loading(&self) -> bool {
        self.query.is_loading()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.as_ref().is_some_and(|p| !p.is_finished())
    }

    /// Refetch now, regardless of the polling schedule
    pub async fn refetch(&self) -> Result<Arc<T>> {
        self.query.refetch().await
    }

    pub fn subscribe(&self) -> watch::Receiver<QueryState<T>> {
        self.query.subscribe()
    }
}

impl<T: Send + Sync + 'static> Drop for QueryObserver<T> {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
            tracing::debug!(key = %self.query.key(), "polling stopped");
        }
        self.query.shared.remove_observer(self.options.enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::query::fetcher;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn counting_query(calls: Arc<AtomicU64>) -> Query<u64> {
        Query::new(
            "poll",
            fetcher(move || {
                let calls = calls.clone();
                async move { Ok::<_, QueryError>(calls.fetch_add(1, Ordering::SeqCst) + 1) }
            }),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_observe_fetches_on_mount() {
        let calls = Arc::new(AtomicU64::new(0));
        let query = counting_query(calls.clone());

        let observer = query.observe(QueryOptions::new());
        assert!(observer.is_loading());
        assert_eq!(query.observer_count(), 1);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(observer.data().as_deref(), Some(&1));
        assert!(!observer.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_refetches_on_interval() {
        let calls = Arc::new(AtomicU64::new(0));
        let query = counting_query(calls.clone());

        let observer =
            query.observe(QueryOptions::new().refetch_interval(Duration::from_secs(30)));
        assert!(observer.is_polling());

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(observer.data().as_deref(), Some(&3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_polling() {
        let calls = Arc::new(AtomicU64::new(0));
        let query = counting_query(calls.clone());

        let observer =
            query.observe(QueryOptions::new().refetch_interval(Duration::from_secs(30)));
        tokio::time::sleep(Duration::from_secs(1)).await;
        drop(observer);
        assert_eq!(query.observer_count(), 0);

        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_observer_does_not_fetch() {
        let calls = Arc::new(AtomicU64::new(0));
        let query = counting_query(calls.clone());

        let observer = query.observe(
            QueryOptions::new()
                .enabled(false)
                .refetch_interval(Duration::from_secs(30)),
        );
        tokio::time::sleep(Duration::from_secs(120)).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(observer.data().is_none());
        assert!(!observer.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_refetches_for_observers() {
        let calls = Arc::new(AtomicU64::new(0));
        let query = counting_query(calls.clone());

        let observer = query.observe(QueryOptions::new());
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(observer.data().as_deref(), Some(&1));

        query.invalidate();
        tokio::time::sleep(Duration::from_millis(1)).await;

        let state = observer.state();
        assert_eq!(state.data.as_deref(), Some(&2));
        assert_eq!(state.invalidations, 1);
        assert!(!state.is_invalidated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_does_not_poll() {
        let calls = Arc::new(AtomicU64::new(0));
        let query = counting_query(calls.clone());

        let observer = query.observe(QueryOptions::new().refetch_interval(Duration::ZERO));
        assert!(!observer.is_polling());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(observer.data().as_deref(), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_skips_disabled_observers() {
        let calls = Arc::new(AtomicU64::new(0));
        let query = counting_query(calls.clone());

        let observer = query.observe(QueryOptions::new().enabled(false));
        query.invalidate();
        tokio::time::sleep(Duration::from_millis(1)).await;

        let state = observer.state();
        assert!(state.is_invalidated);
        assert_eq!(state.invalidations, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // An enabled observer alongside it makes invalidation refetch again
        let _live = query.observe(QueryOptions::new());
        tokio::time::sleep(Duration::from_millis(1)).await;
        query.invalidate();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
