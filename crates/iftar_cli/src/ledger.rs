//! Donation ledger persistence
//!
//! The in-process backend forgets everything on exit, so the CLI keeps the
//! donation log in `iftar-ledger.json` and replays it on startup.

use anyhow::{Context, Result};
use iftar_core::Donation;
use std::fs;
use std::path::Path;

pub const LEDGER_FILE: &str = "iftar-ledger.json";

/// Read the donation log, oldest first; a missing file is an empty log
pub fn load(dir: &Path) -> Result<Vec<Donation>> {
    let path = dir.join(LEDGER_FILE);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let donations: Vec<Donation> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::debug!("loaded {} donations from {}", donations.len(), path.display());
    Ok(donations)
}

/// Replace the donation log
pub fn save(dir: &Path, donations: &[Donation]) -> Result<()> {
    let path = dir.join(LEDGER_FILE);
    let content =
        serde_json::to_string_pretty(donations).context("Failed to serialize donation ledger")?;
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_ledger_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let donations = vec![
            Donation {
                timestamp: 1_700_000_000_000_000_000,
                amount: 500,
            },
            Donation {
                timestamp: 1_700_000_100_000_000_000,
                amount: 50,
            },
        ];

        save(dir.path(), &donations).unwrap();
        assert_eq!(load(dir.path()).unwrap(), donations);
    }

    #[test]
    fn test_corrupt_ledger_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(LEDGER_FILE), "not json").unwrap();

        let err = load(dir.path()).unwrap_err();
        assert!(err.to_string().contains(LEDGER_FILE));
    }
}
