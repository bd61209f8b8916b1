//! Campaign view model
//!
//! Drives the animated figures on the page from stats snapshots. A snapshot
//! is applied as a whole: the meal, percentage, and total counters always
//! retarget from the same fetch.

use crate::sync::StatsView;
use iftar_animation::{AnimatedCounter, CounterFormat, SchedulerHandle, DEFAULT_DURATION_MS};
use iftar_core::{fallback_percentage, CampaignStats, DEFAULT_TARGET_MEALS};
use serde::Serialize;
use std::sync::Arc;

/// Text for every figure on the page at one instant
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CampaignFrame {
    pub meals: String,
    pub percentage: String,
    pub total: String,
    pub target_meals: u64,
    pub progress_label: String,
    /// Progress bar fill, 0 to 100
    pub progress: f64,
}

/// Animated campaign figures
pub struct CampaignView {
    meals: AnimatedCounter,
    percentage: AnimatedCounter,
    total: AnimatedCounter,
    default_target: u64,
    snapshot: Option<Arc<CampaignStats>>,
    is_loading: bool,
}

impl CampaignView {
    pub fn new(handle: SchedulerHandle) -> Self {
        Self::with_options(handle, DEFAULT_TARGET_MEALS, DEFAULT_DURATION_MS)
    }

    /// Create a view with a fallback goal and counter tween length
    pub fn with_options(handle: SchedulerHandle, default_target: u64, duration_ms: u32) -> Self {
        let counter = |format: CounterFormat| {
            let mut counter = AnimatedCounter::new(handle.clone(), format);
            counter.set_duration(duration_ms);
            counter.snap_to_target();
            counter
        };

        Self {
            meals: counter(CounterFormat::new().decimals(0)),
            percentage: counter(CounterFormat::new().suffix("%").decimals(1)),
            total: counter(CounterFormat::new().prefix("₹").decimals(0)),
            default_target,
            snapshot: None,
            is_loading: true,
        }
    }

    /// Retarget every counter from the view's snapshot
    ///
    /// Returns true if a new snapshot was applied. Re-applying the snapshot
    /// already on screen is a no-op.
    pub fn apply(&mut self, view: &StatsView) -> bool {
        self.is_loading = view.is_loading;

        let Some(stats) = &view.stats else {
            return false;
        };
        if self
            .snapshot
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, stats))
        {
            return false;
        }

        self.meals.set_target(stats.meals_sponsored as f64);
        self.percentage.set_target(stats.percentage_complete);
        self.total.set_target(stats.total_amount as f64);
        self.snapshot = Some(Arc::clone(stats));
        tracing::debug!(
            meals = stats.meals_sponsored,
            pct = stats.percentage_complete,
            total = stats.total_amount,
            "applied campaign snapshot"
        );
        true
    }

    pub fn snapshot(&self) -> Option<&Arc<CampaignStats>> {
        self.snapshot.as_ref()
    }

    /// Campaign goal from the snapshot, or the configured fallback
    pub fn target_meals(&self) -> u64 {
        self.snapshot
            .as_ref()
            .map(|s| s.target_meals)
            .unwrap_or(self.default_target)
    }

    /// Progress percentage from the snapshot
    ///
    /// Before the first snapshot arrives nothing has been sponsored yet, so
    /// this is 0% of the configured goal; afterwards the backend value is
    /// used as-is.
    pub fn percentage_complete(&self) -> f64 {
        match &self.snapshot {
            Some(stats) => stats.percentage_complete,
            None => fallback_percentage(0, self.default_target),
        }
    }

    /// `"—"` while the first fetch runs, otherwise `"12.3% complete"`
    pub fn progress_label(&self) -> String {
        if self.is_loading {
            "—".to_string()
        } else {
            format!("{:.1}% complete", self.percentage_complete())
        }
    }

    pub fn is_animating(&self) -> bool {
        self.meals.is_animating() || self.percentage.is_animating() || self.total.is_animating()
    }

    /// Current text of every figure
    pub fn frame(&self) -> CampaignFrame {
        CampaignFrame {
            meals: self.meals.text(),
            percentage: self.percentage.text(),
            total: self.total.text(),
            target_meals: self.target_meals(),
            progress_label: self.progress_label(),
            progress: self.percentage_complete().clamp(0.0, 100.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iftar_animation::FrameScheduler;

    fn view_of(stats: CampaignStats) -> StatsView {
        StatsView {
            stats: Some(Arc::new(stats)),
            is_loading: false,
        }
    }

    #[test]
    fn test_initial_frame() {
        let scheduler = FrameScheduler::new();
        let view = CampaignView::new(scheduler.handle());

        let frame = view.frame();
        assert_eq!(frame.meals, "0");
        assert_eq!(frame.percentage, "0.0%");
        assert_eq!(frame.total, "₹0");
        assert_eq!(frame.target_meals, 1000);
        assert_eq!(frame.progress_label, "—");
        assert!(!view.is_animating());
        assert_eq!(scheduler.pending_frames(), 0);
    }

    #[test]
    fn test_snapshot_animates_all_counters() {
        let scheduler = FrameScheduler::new();
        let mut view = CampaignView::new(scheduler.handle());

        assert!(view.apply(&view_of(CampaignStats::new(850, 17, 1000, 1.7))));
        assert!(view.is_animating());
        assert_eq!(view.frame().progress_label, "1.7% complete");

        scheduler.tick(0.0);
        scheduler.tick(2000.0);

        let frame = view.frame();
        assert_eq!(frame.meals, "17");
        assert_eq!(frame.percentage, "1.7%");
        assert_eq!(frame.total, "₹850");
        assert!(!view.is_animating());
    }

    #[test]
    fn test_same_snapshot_is_not_reapplied() {
        let scheduler = FrameScheduler::new();
        let mut view = CampaignView::new(scheduler.handle());
        let stats = view_of(CampaignStats::new(850, 3, 1000, 0.3));

        assert!(view.apply(&stats));
        assert!(!view.apply(&stats));
    }

    #[test]
    fn test_loading_without_snapshot_keeps_fallback() {
        let scheduler = FrameScheduler::new();
        let mut view = CampaignView::with_options(scheduler.handle(), 500, 1000);

        let applied = view.apply(&StatsView {
            stats: None,
            is_loading: false,
        });
        assert!(!applied);
        assert_eq!(view.target_meals(), 500);
        assert_eq!(view.percentage_complete(), 0.0);
        assert_eq!(view.progress_label(), "0.0% complete");
    }

    #[test]
    fn test_progress_is_clamped_for_the_bar() {
        let scheduler = FrameScheduler::new();
        let mut view = CampaignView::new(scheduler.handle());
        view.apply(&view_of(CampaignStats::new(60_000, 1200, 1000, 120.0)));

        let frame = view.frame();
        assert_eq!(frame.progress, 100.0);
        assert_eq!(frame.progress_label, "120.0% complete");
    }

    #[test]
    fn test_frame_serializes_for_display() {
        let scheduler = FrameScheduler::new();
        let mut view = CampaignView::new(scheduler.handle());
        view.apply(&view_of(CampaignStats::new(850, 17, 1000, 1.7)));
        scheduler.tick(0.0);
        scheduler.tick(2000.0);

        let json = serde_json::to_value(view.frame()).unwrap();
        assert_eq!(json["meals"], "17");
        assert_eq!(json["total"], "₹850");
        assert_eq!(json["target_meals"], 1000);
    }
}
