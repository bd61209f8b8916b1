//! Campaign configuration file handling
//!
//! Settings live in `iftar.toml` next to the donation ledger. Every field has
//! a default, so a partial file (or none at all) is fine.

use anyhow::{Context, Result};
use iftar_app::{Payee, ShareData, SyncOptions};
use iftar_core::DEFAULT_TARGET_MEALS;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Configuration file name
pub const CONFIG_FILE: &str = "iftar.toml";

/// Campaign configuration stored in iftar.toml
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CampaignConfig {
    #[serde(default)]
    pub campaign: CampaignSection,
    #[serde(default)]
    pub payment: PaymentSection,
    #[serde(default)]
    pub sync: SyncSection,
    #[serde(default)]
    pub animation: AnimationSection,
}

/// What the campaign is and how it is shared
#[derive(Debug, Deserialize, Serialize)]
pub struct CampaignSection {
    #[serde(default = "default_name")]
    pub name: String,
    /// Link handed out when sharing
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_share_text")]
    pub share_text: String,
    /// Goal shown before the first snapshot arrives
    #[serde(default = "default_target_meals")]
    pub target_meals: u64,
}

fn default_name() -> String {
    "Ramadan Iftar Fund".to_string()
}

fn default_url() -> String {
    "https://iftar-fund.example.org".to_string()
}

fn default_share_text() -> String {
    "Support Iftar for the needy this Ramadan.".to_string()
}

fn default_target_meals() -> u64 {
    DEFAULT_TARGET_MEALS
}

impl Default for CampaignSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            url: default_url(),
            share_text: default_share_text(),
            target_meals: default_target_meals(),
        }
    }
}

/// UPI payee
#[derive(Debug, Deserialize, Serialize)]
pub struct PaymentSection {
    #[serde(default = "default_upi_id")]
    pub upi_id: String,
    #[serde(default = "default_name")]
    pub payee_name: String,
}

fn default_upi_id() -> String {
    "rohankhan3161@oksbi".to_string()
}

impl Default for PaymentSection {
    fn default() -> Self {
        Self {
            upi_id: default_upi_id(),
            payee_name: default_name(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SyncSection {
    /// Seconds between stats refreshes
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 {
    30
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AnimationSection {
    /// Counter tween length in milliseconds
    #[serde(default = "default_counter_duration")]
    pub counter_duration_ms: u32,
    /// Frames per second when rendering in the terminal
    #[serde(default = "default_fps")]
    pub fps: u32,
}

fn default_counter_duration() -> u32 {
    2000
}

fn default_fps() -> u32 {
    30
}

impl Default for AnimationSection {
    fn default() -> Self {
        Self {
            counter_duration_ms: default_counter_duration(),
            fps: default_fps(),
        }
    }
}

impl CampaignConfig {
    /// Load configuration from iftar.toml in `path`
    pub fn load_from_dir(path: &Path) -> Result<Self> {
        let config_path = path.join(CONFIG_FILE);

        if !config_path.exists() {
            anyhow::bail!(
                "No {} found in {}. Run `iftar init` to create one.",
                CONFIG_FILE,
                path.display()
            );
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;

        let config: CampaignConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load iftar.toml if present, otherwise use the defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.join(CONFIG_FILE).exists() {
            Self::load_from_dir(path)
        } else {
            tracing::debug!("no {} in {}, using defaults", CONFIG_FILE, path.display());
            Ok(Self::default())
        }
    }

    /// Write iftar.toml into `path`
    pub fn save_to_dir(&self, path: &Path) -> Result<()> {
        let config_path = path.join(CONFIG_FILE);
        fs::write(&config_path, self.to_toml()?)
            .with_context(|| format!("Failed to write {}", config_path.display()))
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize campaign config")
    }

    fn validate(&self) -> Result<()> {
        if self.payment.upi_id.trim().is_empty() {
            anyhow::bail!("payment.upi_id must not be empty");
        }
        if self.sync.poll_interval_secs == 0 {
            anyhow::bail!("sync.poll_interval_secs must be at least 1");
        }
        if self.animation.fps == 0 {
            anyhow::bail!("animation.fps must be at least 1");
        }
        Ok(())
    }

    pub fn payee(&self) -> Payee {
        Payee::new(&self.payment.upi_id, &self.payment.payee_name)
    }

    pub fn share_data(&self) -> ShareData {
        ShareData {
            title: self.campaign.name.clone(),
            text: self.campaign.share_text.clone(),
            url: self.campaign.url.clone(),
        }
    }

    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            poll_interval: Duration::from_secs(self.sync.poll_interval_secs),
            ..SyncOptions::default()
        }
    }
}
