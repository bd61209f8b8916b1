//! Campaign snapshot and donation records

use serde::{Deserialize, Serialize};

/// Rupees needed to sponsor one meal
pub const MEAL_COST_RUPEES: u64 = 50;

/// Campaign goal used until the backend reports its own
pub const DEFAULT_TARGET_MEALS: u64 = 1000;

/// A single atomically-fetched set of aggregate fundraising figures
///
/// Every field comes from the same backend call. Views must apply a snapshot
/// as a whole and never mix fields from two fetches.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignStats {
    /// Total rupees raised
    pub total_amount: u64,
    /// Meals sponsored, as computed by the backend
    pub meals_sponsored: u64,
    /// Campaign goal in meals
    pub target_meals: u64,
    /// Progress towards the goal, 0 to 100
    pub percentage_complete: f64,
}

impl CampaignStats {
    pub fn new(
        total_amount: u64,
        meals_sponsored: u64,
        target_meals: u64,
        percentage_complete: f64,
    ) -> Self {
        Self {
            total_amount,
            meals_sponsored,
            target_meals,
            percentage_complete,
        }
    }

    /// Meals still needed to reach the goal
    pub fn meals_remaining(&self) -> u64 {
        self.target_meals.saturating_sub(self.meals_sponsored)
    }
}

/// An append-only donation record owned by the backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Donation {
    /// Nanoseconds since the Unix epoch
    pub timestamp: i64,
    /// Rupees donated
    pub amount: u64,
}

/// Number of meals a donation of `amount` rupees pays for
pub fn meals_for_amount(amount: u64) -> u64 {
    amount / MEAL_COST_RUPEES
}

/// Progress percentage computed locally from meal counts
///
/// Only used while no snapshot has been fetched yet; the backend value is
/// authoritative once one exists.
pub fn fallback_percentage(meals_sponsored: u64, target_meals: u64) -> f64 {
    if target_meals == 0 {
        return 0.0;
    }
    meals_sponsored as f64 / target_meals as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meals_for_amount_floors() {
        assert_eq!(meals_for_amount(0), 0);
        assert_eq!(meals_for_amount(49), 0);
        assert_eq!(meals_for_amount(50), 1);
        assert_eq!(meals_for_amount(1000), 20);
        assert_eq!(meals_for_amount(1049), 20);
    }

    #[test]
    fn test_fallback_percentage() {
        assert!((fallback_percentage(3, 1000) - 0.3).abs() < 1e-9);
        assert_eq!(fallback_percentage(0, DEFAULT_TARGET_MEALS), 0.0);
        assert_eq!(fallback_percentage(10, 0), 0.0);
    }

    #[test]
    fn test_meals_remaining_saturates() {
        let stats = CampaignStats::new(60_000, 1200, 1000, 120.0);
        assert_eq!(stats.meals_remaining(), 0);

        let stats = CampaignStats::new(850, 3, 1000, 0.3);
        assert_eq!(stats.meals_remaining(), 997);
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let stats = CampaignStats::new(850, 3, 1000, 0.3);
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"totalAmount\":850"));
        assert!(json.contains("\"mealsSponsored\":3"));
        assert!(json.contains("\"percentageComplete\":0.3"));
    }
}
