//! Query state snapshots

use crate::error::{QueryError, Result};
use std::sync::Arc;
use tokio::time::Instant;

/// Lifecycle of a query
///
/// `Idle -> Fetching -> {Resolved | StaleError}`. A refetch moves back to
/// `Fetching` without dropping the data it already has.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched
    Idle,
    /// At least one fetch in flight
    Fetching,
    /// Last applied fetch succeeded
    Resolved,
    /// Last applied fetch failed; any earlier data is kept
    StaleError,
}

/// Snapshot of one query's cache entry
#[derive(Debug)]
pub struct QueryState<T> {
    /// Last successfully fetched value
    pub data: Option<Arc<T>>,
    /// Error from the last applied fetch, cleared by the next success
    pub error: Option<QueryError>,
    /// When `data` was last replaced
    pub data_updated_at: Option<Instant>,
    /// Data is known to be out of date and a refetch is due
    pub is_invalidated: bool,
    /// Number of times the query has been invalidated
    pub invalidations: u64,
    pub(crate) in_flight: u32,
    pub(crate) started_seq: u64,
    pub(crate) applied_seq: u64,
}

impl<T> QueryState<T> {
    pub(crate) fn new() -> Self {
        Self {
            data: None,
            error: None,
            data_updated_at: None,
            is_invalidated: false,
            invalidations: 0,
            in_flight: 0,
            started_seq: 0,
            applied_seq: 0,
        }
    }

    pub fn status(&self) -> QueryStatus {
        if self.in_flight > 0 {
            QueryStatus::Fetching
        } else if self.applied_seq == 0 {
            QueryStatus::Idle
        } else if self.error.is_some() {
            QueryStatus::StaleError
        } else {
            QueryStatus::Resolved
        }
    }

    /// True only while the very first fetch has not settled
    ///
    /// Once any fetch has settled this stays false, so a view never falls
    /// back to a blank loading state.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0 && self.applied_seq == 0
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight > 0
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Number of fetches started so far
    pub fn fetch_count(&self) -> u64 {
        self.started_seq
    }

    pub(crate) fn outcome(&self) -> Result<Arc<T>> {
        match (&self.error, &self.data) {
            (Some(err), _) => Err(err.clone()),
            (None, Some(data)) => Ok(Arc::clone(data)),
            (None, None) => Err(QueryError::NoData),
        }
    }
}

impl<T> Clone for QueryState<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            error: self.error.clone(),
            data_updated_at: self.data_updated_at,
            is_invalidated: self.is_invalidated,
            invalidations: self.invalidations,
            in_flight: self.in_flight,
            started_seq: self.started_seq,
            applied_seq: self.applied_seq,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::new()
    }
}
