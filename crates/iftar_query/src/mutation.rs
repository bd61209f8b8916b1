//! Mutations
//!
//! A mutation is a one-shot async write. It tracks whether a call is in
//! flight and how the last call ended. It never retries and never touches
//! cached query data; callers invalidate the affected keys on success.

use crate::error::{QueryError, Result};
use futures::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Outcome of the most recent call
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationStatus {
    Idle,
    Pending,
    Success,
    Error(QueryError),
}

type MutationFn<A, R> = Arc<dyn Fn(A) -> BoxFuture<'static, Result<R>> + Send + Sync>;

/// An async write operation
pub struct Mutation<A, R> {
    func: MutationFn<A, R>,
    pending: Arc<AtomicUsize>,
    last: Arc<Mutex<MutationStatus>>,
}

impl<A, R> Clone for Mutation<A, R> {
    fn clone(&self) -> Self {
        Self {
            func: Arc::clone(&self.func),
            pending: Arc::clone(&self.pending),
            last: Arc::clone(&self.last),
        }
    }
}

/// Decrements the pending count even if the call is cancelled
struct PendingGuard(Arc<AtomicUsize>);

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<A: Send + 'static, R: Send + 'static> Mutation<A, R> {
    pub fn new<E, F, Fut>(f: F) -> Self
    where
        E: fmt::Display,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
    {
        let func: MutationFn<A, R> = Arc::new(move |arg| {
            let fut = f(arg);
            Box::pin(async move { fut.await.map_err(QueryError::failed) })
        });
        Self {
            func,
            pending: Arc::new(AtomicUsize::new(0)),
            last: Arc::new(Mutex::new(MutationStatus::Idle)),
        }
    }

    /// Run the mutation once
    pub async fn mutate(&self, arg: A) -> Result<R> {
        self.pending.fetch_add(1, Ordering::AcqRel);
        let _guard = PendingGuard(Arc::clone(&self.pending));
        *self.last.lock().unwrap() = MutationStatus::Pending;

        let result = (self.func)(arg).await;

        *self.last.lock().unwrap() = match &result {
            Ok(_) => MutationStatus::Success,
            Err(err) => MutationStatus::Error(err.clone()),
        };
        result
    }

    /// Check if any call is in flight
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire) > 0
    }

    pub fn status(&self) -> MutationStatus {
        self.last.lock().unwrap().clone()
    }
}
