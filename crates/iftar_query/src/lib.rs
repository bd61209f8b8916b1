//! Iftar Fund Query Cache
//!
//! A key-addressed async cache in the spirit of a UI query client. Each key
//! owns one `Query<T>`; views observe it and the cache does the rest:
//!
//! - **Coalescing**: overlapping fetches for a key share one in-flight request
//! - **Newest wins**: a response older than the last applied one is discarded
//! - **Stale on error**: a failed fetch keeps the last good data visible
//! - **Polling**: observers own their refetch interval and stop it on drop
//! - **Invalidation**: `invalidate(key)` marks data stale and refetches it for
//!   live observers; keys nobody holds any more are a no-op
//! - **Mutations**: one-shot async writes with a pending flag and no retries
//!
//! # Example
//!
//! ```ignore
//! use iftar_query::{QueryClient, QueryOptions};
//! use std::time::Duration;
//!
//! let client = QueryClient::new();
//! let stats = client.query("campaign-stats", move || {
//!     let backend = backend.clone();
//!     async move { backend.get_campaign_stats().await }
//! });
//!
//! let observer = stats.observe(QueryOptions::new().refetch_interval(Duration::from_secs(30)));
//! client.invalidate("campaign-stats");
//! ```

pub mod client;
pub mod error;
pub mod mutation;
pub mod observer;
pub mod query;
pub mod state;

pub use client::QueryClient;
pub use error::{QueryError, Result};
pub use mutation::{Mutation, MutationStatus};
pub use observer::{QueryObserver, QueryOptions};
pub use query::{Fetcher, Query, QueryKey};
pub use state::{QueryState, QueryStatus};
