//! Iftar Fund Core
//!
//! Foundational types shared by every Iftar Fund crate:
//!
//! - **Campaign snapshots**: `CampaignStats`, fetched atomically from the backend
//! - **Donations**: append-only `Donation` records
//! - **Backend interface**: the `CampaignBackend` trait the client talks to
//! - **Memory backend**: an in-process `CampaignBackend` for local runs and tests
//!
//! # Example
//!
//! ```rust
//! use iftar_core::{meals_for_amount, MEAL_COST_RUPEES};
//!
//! assert_eq!(MEAL_COST_RUPEES, 50);
//! assert_eq!(meals_for_amount(120), 2);
//! ```

pub mod backend;
pub mod error;
pub mod stats;

pub use backend::{CampaignBackend, MemoryBackend};
pub use error::{BackendError, Result};
pub use stats::{
    fallback_percentage, meals_for_amount, CampaignStats, Donation, DEFAULT_TARGET_MEALS,
    MEAL_COST_RUPEES,
};
