//! Campaign statistics synchronizer
//!
//! Keeps the page in step with the backend:
//!
//! - the stats snapshot is polled every 30 seconds while mounted
//! - the donation history is fetched once per mount
//! - recording a donation invalidates both and lets the refetch update the page
//!
//! Nothing here adjusts a cached figure locally. Every number on the page
//! comes from an authoritative snapshot; the backend may round or deduct in
//! ways the client cannot know.

use crate::amount::DonationAmount;
use crate::error::{AppError, Result};
use crate::notify::{Notification, Notifier};
use iftar_core::{CampaignBackend, CampaignStats, Donation};
use iftar_query::{Mutation, QueryClient, QueryObserver, QueryOptions, QueryState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Cache key of the campaign snapshot
pub const STATS_KEY: &str = "campaign-stats";

/// Cache key of the donation history
pub const DONATIONS_KEY: &str = "donations";

/// How long the donation thank-you toast stays up
const DONATION_TOAST_DURATION: Duration = Duration::from_millis(5000);

/// Synchronizer settings
#[derive(Clone, Debug)]
pub struct SyncOptions {
    /// Stats poll period while mounted
    pub poll_interval: Duration,
    /// Whether the backend actor is ready; a disabled synchronizer only reads
    /// the cache and refuses donations
    pub enabled: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            enabled: true,
        }
    }
}

/// What the stats display renders
#[derive(Clone, Debug)]
pub struct StatsView {
    /// Last good snapshot
    pub stats: Option<Arc<CampaignStats>>,
    /// First fetch still running
    pub is_loading: bool,
}

impl StatsView {
    fn from_state(state: &QueryState<CampaignStats>) -> Self {
        Self {
            stats: state.data.clone(),
            is_loading: state.is_loading(),
        }
    }
}

/// What the donation list renders
#[derive(Clone, Debug)]
pub struct HistoryView {
    pub donations: Option<Arc<Vec<Donation>>>,
    pub is_loading: bool,
}

/// Mounted stats synchronizer
///
/// Dropping it unmounts: polling stops and later invalidations of its keys
/// are no-ops.
pub struct StatsSynchronizer {
    client: QueryClient,
    stats: QueryObserver<CampaignStats>,
    donations: QueryObserver<Vec<Donation>>,
    donate: Mutation<u64, ()>,
    notifier: Arc<dyn Notifier>,
    enabled: bool,
}

impl StatsSynchronizer {
    /// Mount against `backend`, sharing cache entries through `client`
    ///
    /// Must be called from within a tokio runtime for fetching and polling
    /// to start.
    pub fn mount<B: CampaignBackend>(
        client: QueryClient,
        backend: Arc<B>,
        notifier: Arc<dyn Notifier>,
        options: SyncOptions,
    ) -> Self {
        let stats_backend = Arc::clone(&backend);
        let stats = client
            .query(STATS_KEY, move || {
                let backend = Arc::clone(&stats_backend);
                async move { backend.get_campaign_stats().await }
            })
            .observe(
                QueryOptions::new()
                    .enabled(options.enabled)
                    .refetch_interval(options.poll_interval),
            );

        let history_backend = Arc::clone(&backend);
        let donations = client
            .query(DONATIONS_KEY, move || {
                let backend = Arc::clone(&history_backend);
                async move { backend.get_all_donations().await }
            })
            .observe(QueryOptions::new().enabled(options.enabled));

        let donate = Mutation::new(move |amount: u64| {
            let backend = Arc::clone(&backend);
            async move { backend.make_donation(amount).await }
        });

        tracing::debug!(?options, "stats synchronizer mounted");

        Self {
            client,
            stats,
            donations,
            donate,
            notifier,
            enabled: options.enabled,
        }
    }

    /// Latest snapshot and whether the first fetch is still running
    pub fn get_stats(&self) -> StatsView {
        StatsView::from_state(&self.stats.state())
    }

    /// Donation history fetched on mount
    pub fn get_donation_history(&self) -> HistoryView {
        let state = self.donations.state();
        HistoryView {
            donations: state.data.clone(),
            is_loading: state.is_loading(),
        }
    }

    /// Full cache state of the stats query
    pub fn stats_state(&self) -> QueryState<CampaignStats> {
        self.stats.state()
    }

    /// Full cache state of the donation history query
    pub fn donations_state(&self) -> QueryState<Vec<Donation>> {
        self.donations.state()
    }

    /// Receive every change to the stats query
    pub fn subscribe_stats(&self) -> watch::Receiver<QueryState<CampaignStats>> {
        self.stats.subscribe()
    }

    /// Receive every change to the donation history query
    pub fn subscribe_donations(&self) -> watch::Receiver<QueryState<Vec<Donation>>> {
        self.donations.subscribe()
    }

    /// Refetch the snapshot now
    ///
    /// Failures keep the previous snapshot and are not surfaced to the page.
    pub async fn refresh(&self) -> StatsView {
        if let Err(err) = self.stats.refetch().await {
            tracing::debug!("manual stats refresh failed: {}", err);
        }
        self.get_stats()
    }

    /// A donation is being recorded
    pub fn is_recording_donation(&self) -> bool {
        self.donate.is_pending()
    }

    /// Record a donation of `amount` rupees
    ///
    /// The amount is checked before any backend call. On success both cached
    /// queries are invalidated once and a thank-you toast names the number of
    /// meals. On failure an error toast is shown; nothing is retried and no
    /// cached figure changes. Returns the meals the donation pays for.
    pub async fn record_donation(&self, amount: u64) -> Result<u64> {
        let amount = match DonationAmount::new(amount) {
            Ok(amount) => amount,
            Err(err) => return Err(self.reject_amount(err.into())),
        };
        self.submit(amount).await
    }

    /// Record a donation typed by the visitor
    pub async fn record_donation_input(&self, input: &str) -> Result<u64> {
        let amount = match DonationAmount::parse(input) {
            Ok(amount) => amount,
            Err(err) => return Err(self.reject_amount(err.into())),
        };
        self.submit(amount).await
    }

    fn reject_amount(&self, err: AppError) -> AppError {
        tracing::debug!("donation rejected before submission: {}", err);
        self.notifier
            .notify(Notification::error("Please enter a valid amount").description(err.to_string()));
        err
    }

    async fn submit(&self, amount: DonationAmount) -> Result<u64> {
        let rupees = amount.rupees();
        if !self.enabled {
            tracing::warn!("donation of ₹{} refused: backend not ready", rupees);
            self.notifier.notify(Notification::error(
                "Failed to record donation. Please try again.",
            ));
            return Err(AppError::NotReady);
        }
        match self.donate.mutate(rupees).await {
            Ok(()) => {
                self.client.invalidate(STATS_KEY);
                self.client.invalidate(DONATIONS_KEY);

                let meals = amount.meals();
                tracing::info!("donation of ₹{} recorded ({} meals)", rupees, meals);
                self.notifier.notify(
                    Notification::success(format!(
                        "Thank you! Your donation of ₹{} has been recorded.",
                        rupees
                    ))
                    .description(format!("This will feed {} person(s).", meals))
                    .duration(DONATION_TOAST_DURATION),
                );
                Ok(meals)
            }
            Err(err) => {
                tracing::warn!("recording donation of ₹{} failed: {}", rupees, err);
                self.notifier.notify(Notification::error(
                    "Failed to record donation. Please try again.",
                ));
                Err(AppError::Donation(err))
            }
        }
    }
}
