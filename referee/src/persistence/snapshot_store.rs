use std::path::{Path, PathBuf};

use match_core::{MatchEvent, PendingSubstitution, PlayerSession, TeamRef};
use serde::{Deserialize, Serialize};

use super::PersistenceError;

/// Everything needed to rebuild a live session exactly where it left
/// off: clock position, roster with open-stint bookkeeping, the full
/// ledger (synced flags included), score counters and the substitution
/// slot. Unsynced entries stay pending across the suspend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuspendedMatchData {
    pub fixture_id: String,
    pub home: TeamRef,
    pub away: TeamRef,
    pub elapsed_seconds: u32,
    pub finalized: bool,
    pub home_score: u32,
    pub away_score: u32,
    pub players: Vec<PlayerSession>,
    pub events: Vec<MatchEvent>,
    pub pending_substitution: Option<PendingSubstitution>,
    pub auto_sync_enabled: bool,
    pub suspended_at: u64,
}

/// One JSON file per suspended fixture under the data directory.
pub struct MatchSnapshotStore {
    dir: PathBuf,
}

impl MatchSnapshotStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store rooted at the configured data directory.
    pub fn at_default_location() -> Self {
        Self::new(crate::config::snapshots_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, fixture_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", fixture_id))
    }

    /// Save a suspended session, overwriting any previous snapshot for
    /// the same fixture. Returns the fixture id.
    pub fn save(&self, data: &SuspendedMatchData) -> Result<String, PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string_pretty(data)?;
        std::fs::write(self.file_path(&data.fixture_id), json)?;
        Ok(data.fixture_id.clone())
    }

    /// Load a suspended session by fixture id. Returns None if absent.
    pub fn load(&self, fixture_id: &str) -> Result<Option<SuspendedMatchData>, PersistenceError> {
        let path = self.file_path(fixture_id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// All readable snapshots, skipping files that fail to parse.
    pub fn list(&self) -> Result<Vec<SuspendedMatchData>, PersistenceError> {
        if !self.dir.exists() {
            return Ok(vec![]);
        }
        let mut items = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match std::fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str(&contents) {
                    Ok(data) => items.push(data),
                    Err(e) => {
                        tracing::warn!("Skipping unreadable snapshot {:?}: {}", path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read snapshot file {:?}: {}", path, e);
                }
            }
        }
        Ok(items)
    }

    pub fn delete(&self, fixture_id: &str) -> Result<(), PersistenceError> {
        let path = self.file_path(fixture_id);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}
