//! Backend interface
//!
//! The campaign backend is a remote actor reached through an opaque
//! procedure-call interface. The client only ever sees this trait; the
//! transport behind it is somebody else's concern.
//!
//! `MemoryBackend` keeps everything in process. It backs the CLI's local mode
//! and the test suites, and can be switched offline to exercise the
//! stale-data paths.

use crate::error::{BackendError, Result};
use crate::stats::{
    fallback_percentage, CampaignStats, Donation, DEFAULT_TARGET_MEALS, MEAL_COST_RUPEES,
};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Remote campaign actor
///
/// Every call is asynchronous and may fail. Implementations must be shareable
/// across tasks; the query layer holds them behind an `Arc`.
pub trait CampaignBackend: Send + Sync + 'static {
    /// Fetch one atomic snapshot of the campaign figures
    fn get_campaign_stats(&self) -> impl Future<Output = Result<CampaignStats>> + Send;

    /// Fetch every donation, oldest first
    fn get_all_donations(&self) -> impl Future<Output = Result<Vec<Donation>>> + Send;

    /// Fetch the meals sponsored so far
    fn get_meals_sponsored(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Fetch the total rupees raised so far
    fn get_total_amount_raised(&self) -> impl Future<Output = Result<u64>> + Send;

    /// Record a new donation of `amount` rupees
    fn make_donation(&self, amount: u64) -> impl Future<Output = Result<()>> + Send;
}

/// In-process campaign backend
pub struct MemoryBackend {
    donations: Mutex<Vec<Donation>>,
    target_meals: u64,
    offline: AtomicBool,
    stats_calls: AtomicUsize,
    donation_calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::with_target(DEFAULT_TARGET_MEALS)
    }

    /// Create a backend with a custom campaign goal
    pub fn with_target(target_meals: u64) -> Self {
        Self {
            donations: Mutex::new(Vec::new()),
            target_meals,
            offline: AtomicBool::new(false),
            stats_calls: AtomicUsize::new(0),
            donation_calls: AtomicUsize::new(0),
        }
    }

    /// Seed the backend with existing donations
    pub fn with_donations(self, donations: impl IntoIterator<Item = Donation>) -> Self {
        self.donations.lock().unwrap().extend(donations);
        self
    }

    /// Simulate a transient outage; every call fails while offline
    pub fn set_offline(&self, offline: bool) {
        tracing::debug!("MemoryBackend: set_offline({})", offline);
        self.offline.store(offline, Ordering::Release);
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::Acquire)
    }

    /// Number of `get_campaign_stats` calls received
    pub fn stats_calls(&self) -> usize {
        self.stats_calls.load(Ordering::Relaxed)
    }

    /// Number of `make_donation` calls received
    pub fn donation_calls(&self) -> usize {
        self.donation_calls.load(Ordering::Relaxed)
    }

    fn check_online(&self) -> Result<()> {
        if self.is_offline() {
            return Err(BackendError::Unavailable("memory backend is offline".into()));
        }
        Ok(())
    }

    fn total(&self) -> u64 {
        self.donations.lock().unwrap().iter().map(|d| d.amount).sum()
    }

    fn snapshot(&self) -> CampaignStats {
        let total_amount = self.total();
        let meals_sponsored = total_amount / MEAL_COST_RUPEES;
        CampaignStats {
            total_amount,
            meals_sponsored,
            target_meals: self.target_meals,
            percentage_complete: fallback_percentage(meals_sponsored, self.target_meals),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

impl CampaignBackend for MemoryBackend {
    async fn get_campaign_stats(&self) -> Result<CampaignStats> {
        self.stats_calls.fetch_add(1, Ordering::Relaxed);
        self.check_online()?;
        Ok(self.snapshot())
    }

    async fn get_all_donations(&self) -> Result<Vec<Donation>> {
        self.check_online()?;
        Ok(self.donations.lock().unwrap().clone())
    }

    async fn get_meals_sponsored(&self) -> Result<u64> {
        self.check_online()?;
        Ok(self.total() / MEAL_COST_RUPEES)
    }

    async fn get_total_amount_raised(&self) -> Result<u64> {
        self.check_online()?;
        Ok(self.total())
    }

    async fn make_donation(&self, amount: u64) -> Result<()> {
        self.donation_calls.fetch_add(1, Ordering::Relaxed);
        self.check_online()?;
        if amount == 0 {
            return Err(BackendError::Rejected("amount must be positive".into()));
        }

        let mut donations = self.donations.lock().unwrap();
        // Timestamps stay monotonic even if the wall clock steps back
        let timestamp = donations
            .last()
            .map(|d| d.timestamp.max(now_nanos()))
            .unwrap_or_else(now_nanos);
        donations.push(Donation { timestamp, amount });
        tracing::debug!("MemoryBackend: recorded donation of {}", amount);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_backend_snapshot() {
        let backend = MemoryBackend::new();
        let stats = backend.get_campaign_stats().await.unwrap();

        assert_eq!(stats.total_amount, 0);
        assert_eq!(stats.meals_sponsored, 0);
        assert_eq!(stats.target_meals, DEFAULT_TARGET_MEALS);
        assert_eq!(stats.percentage_complete, 0.0);
    }

    #[tokio::test]
    async fn test_donations_update_totals() {
        let backend = MemoryBackend::new();
        backend.make_donation(500).await.unwrap();
        backend.make_donation(120).await.unwrap();

        assert_eq!(backend.get_total_amount_raised().await.unwrap(), 620);
        assert_eq!(backend.get_meals_sponsored().await.unwrap(), 12);

        let stats = backend.get_campaign_stats().await.unwrap();
        assert_eq!(stats.meals_sponsored, 12);
        assert!((stats.percentage_complete - 1.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_donation_history_is_ordered() {
        let backend = MemoryBackend::new().with_donations([Donation {
            timestamp: 1,
            amount: 50,
        }]);
        backend.make_donation(1000).await.unwrap();

        let history = backend.get_all_donations().await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].amount, 50);
        assert_eq!(history[1].amount, 1000);
        assert!(history[0].timestamp <= history[1].timestamp);
    }

    #[tokio::test]
    async fn test_offline_backend_fails_every_call() {
        let backend = MemoryBackend::new();
        backend.set_offline(true);

        assert!(matches!(
            backend.get_campaign_stats().await,
            Err(BackendError::Unavailable(_))
        ));
        assert!(backend.make_donation(50).await.is_err());
        assert_eq!(backend.donation_calls(), 1);
        assert_eq!(backend.stats_calls(), 1);

        backend.set_offline(false);
        assert!(backend.make_donation(50).await.is_ok());
        assert_eq!(backend.get_total_amount_raised().await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_zero_donation_rejected() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.make_donation(0).await,
            Err(BackendError::Rejected(_))
        ));
        assert_eq!(backend.get_total_amount_raised().await.unwrap(), 0);
    }
}
