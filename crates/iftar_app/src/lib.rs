//! Iftar Fund Application Layer
//!
//! Everything the campaign page does that isn't markup:
//!
//! - **Stats sync**: polled campaign snapshot, donation history, donation recording
//! - **Campaign view**: animated meal, percentage, and total counters fed from one snapshot
//! - **Payments**: UPI deep links for mobile visitors, manual instructions otherwise
//! - **Actions**: copy the UPI ID, share the campaign
//! - **Notifications**: toast-style feedback for every user action
//!
//! # Example
//!
//! ```ignore
//! use iftar_app::prelude::*;
//!
//! let toasts = Arc::new(ToastQueue::new());
//! let sync = StatsSynchronizer::mount(
//!     QueryClient::new(),
//!     Arc::new(MemoryBackend::new()),
//!     toasts.clone(),
//!     SyncOptions::default(),
//! );
//!
//! sync.record_donation(500).await?;
//! let stats = sync.get_stats();
//! ```

mod amount;
mod clipboard;
mod error;
mod notify;
mod payment;
mod share;
mod sync;
mod view;


pub use amount::{AmountError, DonationAmount, MIN_DONATION_RUPEES, PRESET_AMOUNTS};
pub use clipboard::{copy_upi_id, Clipboard, ClipboardError, MemoryClipboard};
pub use error::{AppError, Result};
pub use notify::{LogNotifier, Notification, NotificationLevel, Notifier, ToastQueue};
pub use payment::{encode_uri_component, plan_payment, Payee, PaymentAction, UpiIntent, UserAgent};
pub use share::{share_campaign, ShareData, ShareError, ShareOutcome, ShareTarget};
pub use sync::{
    HistoryView, StatsSynchronizer, StatsView, SyncOptions, DONATIONS_KEY, STATS_KEY,
};
pub use view::{CampaignFrame, CampaignView};

/// Prelude module - import everything commonly needed
pub mod prelude {
    pub use crate::amount::DonationAmount;
    pub use crate::error::{AppError, Result};
    pub use crate::notify::{Notification, NotificationLevel, Notifier, ToastQueue};
    pub use crate::payment::{plan_payment, Payee, PaymentAction, UserAgent};
    pub use crate::sync::{StatsSynchronizer, SyncOptions};
    pub use crate::view::CampaignView;

    pub use iftar_animation::FrameScheduler;
    pub use iftar_core::{CampaignBackend, CampaignStats, Donation, MemoryBackend};
    pub use iftar_query::QueryClient;

    pub use std::sync::Arc;
}
