//! Live position persistence with atomic file writes.
//!
//! The book is rewritten after every tick so a restarted tracker resumes
//! with the same open spreads.
//!
//! # Safety
//! - Uses atomic file writes (write to temp, fsync, rename) for durability

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::live::PairPosition;
use crate::strategy::SpreadSignal;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted view of one pair.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PositionSnapshot {
    pub pair: String,
    pub signal: SpreadSignal,
    pub z_score: f64,
    pub hedge_ratio: f64,
    pub sector: String,
    pub entry_z: Option<f64>,
    pub entry_time: Option<DateTime<Utc>>,
}

impl PositionSnapshot {
    pub fn from_position(position: &PairPosition, z_score: f64) -> Self {
        Self {
            pair: position.label(),
            signal: position.signal,
            z_score,
            hedge_ratio: position.hedge_ratio,
            sector: position.sector.clone(),
            entry_z: position.entry_z,
            entry_time: position.entry_time,
        }
    }

    /// Copies the persisted state onto a freshly configured position.
    pub fn restore_into(&self, position: &mut PairPosition) {
        position.signal = self.signal;
        position.entry_z = self.entry_z;
        position.entry_time = self.entry_time;
    }
}

/// Pair label to snapshot, saved as pretty JSON.
#[derive(Serialize, Deserialize, Debug, Default, Clone)]
pub struct PositionBook {
    pub updated_at: Option<DateTime<Utc>>,
    pub positions: BTreeMap<String, PositionSnapshot>,
}

impl PositionBook {
    /// Load the book, returning an empty one if the file doesn't exist or is corrupted.
    pub fn load(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Position book unreadable, starting empty");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Persist the book atomically.
    ///
    /// 1. Write to a temporary file next to the target
    /// 2. Sync to disk (fsync)
    /// 3. Rename over the target
    pub fn save(&self, path: &Path) -> Result<(), StateError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        let mut temp_path = PathBuf::from(path);
        temp_path.set_extension("json.tmp");

        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, path)?;

        debug!(
            path = %path.display(),
            pairs = self.positions.len(),
            active = self.active_count(),
            "Position book saved"
        );
        Ok(())
    }

    pub fn get(&self, pair: &str) -> Option<&PositionSnapshot> {
        self.positions.get(pair)
    }

    pub fn upsert(&mut self, snapshot: PositionSnapshot) {
        self.positions.insert(snapshot.pair.clone(), snapshot);
    }

    /// Number of pairs holding a spread position.
    pub fn active_count(&self) -> usize {
        self.positions.values().filter(|s| !s.signal.is_flat()).count()
    }

    /// Drops flat entries for pairs no longer in `configured` and returns how many went.
    ///
    /// Open entries for unconfigured pairs are kept so the position stays visible
    /// until it is closed at the broker.
    pub fn retain_configured(&mut self, configured: &[String]) -> usize {
        let before = self.positions.len();
        self.positions.retain(|pair, snapshot| {
            if configured.contains(pair) {
                return true;
            }
            if snapshot.signal.is_flat() {
                return false;
            }
            warn!(
                pair = %pair,
                signal = %snapshot.signal,
                "Open spread in position book is no longer configured"
            );
            true
        });
        before - self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::PairConfig;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_and_restore() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("positions.json");

        let config = PairConfig::new("GS", "MS", 1.1, "Financials");
        let mut live = PairPosition::new(&config);
        live.update(-2.4, 2.0, 0.5, Utc::now());

        let mut book = PositionBook::default();
        book.upsert(PositionSnapshot::from_position(&live, -2.4));
        book.save(&path).unwrap();
        assert!(!dir.path().join("state").join("positions.json.tmp").exists());

        let loaded = PositionBook::load(&path);
        assert_eq!(loaded.active_count(), 1);

        let mut restored = PairPosition::new(&config);
        loaded.get("GS/MS").unwrap().restore_into(&mut restored);
        assert_eq!(restored.signal, SpreadSignal::LongSpread);
        assert_eq!(restored.entry_z, Some(-2.4));
    }

    #[test]
    fn test_retain_configured_drops_stale_flat_entries() {
        let mut book = PositionBook::default();
        let kept = PairConfig::new("KO", "PEP", 1.0, "Consumer Staples");
        let stale_flat = PairConfig::new("XOM", "CVX", 0.9, "Energy");
        let stale_open = PairConfig::new("GS", "MS", 1.1, "Financials");

        let mut open = PairPosition::new(&stale_open);
        open.update(2.5, 2.0, 0.5, Utc::now());
        book.upsert(PositionSnapshot::from_position(&PairPosition::new(&kept), 0.1));
        book.upsert(PositionSnapshot::from_position(&PairPosition::new(&stale_flat), 0.3));
        book.upsert(PositionSnapshot::from_position(&open, 2.5));

        let removed = book.retain_configured(&["KO/PEP".to_string()]);
        assert_eq!(removed, 1);
        assert!(book.get("XOM/CVX").is_none());
        assert!(book.get("KO/PEP").is_some());
        assert_eq!(book.get("GS/MS").map(|s| s.signal), Some(SpreadSignal::ShortSpread));
        assert_eq!(book.active_count(), 1);
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("positions.json");
        fs::write(&path, "{not json").unwrap();
        assert!(PositionBook::load(&path).positions.is_empty());
        assert!(PositionBook::load(&dir.path().join("missing.json")).positions.is_empty());
    }
}
