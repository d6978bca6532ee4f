pub mod actor;
pub mod commands;
pub mod events;
pub mod handle;
pub mod snapshot;
pub mod state;

use std::collections::HashMap;
use std::sync::Arc;

use league_store::LeagueStore;
use match_core::TeamRef;
use tokio::sync::{broadcast, mpsc, RwLock};

use crate::persistence::{MatchSnapshotStore, SuspendedMatchData};
use crate::sync::SyncConfig;
use actor::run_session_actor;
pub use commands::{CardKind, SessionError};
pub use events::SessionEvent;
pub use handle::SessionHandle;
pub use snapshot::{PlayerSnapshot, SessionSnapshot};
use state::SessionState;

/// Manages the live sessions. Spawns an actor task per fixture.
///
/// One referee session per fixture at a time: a second open for the
/// same fixture is refused rather than risking two engines editing the
/// same match.
pub struct SessionManager {
    sessions: RwLock<HashMap<String, SessionHandle>>,
    store: Arc<dyn LeagueStore>,
    snapshots: MatchSnapshotStore,
    sync_config: SyncConfig,
}

impl SessionManager {
    pub fn new(store: Arc<dyn LeagueStore>, snapshots: MatchSnapshotStore) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            store,
            snapshots,
            sync_config: SyncConfig::default(),
        }
    }

    pub fn with_sync_config(mut self, sync_config: SyncConfig) -> Self {
        self.sync_config = sync_config;
        self
    }

    /// Open a live session for a fixture, loading the team references
    /// from the remote store.
    pub async fn open_session(&self, fixture_id: &str) -> Result<SessionSnapshot, String> {
        if self.sessions.read().await.contains_key(fixture_id) {
            return Err(format!("Session already active for fixture: {}", fixture_id));
        }

        let fixture = self
            .store
            .fetch_fixture(fixture_id)
            .await
            .map_err(|e| e.to_string())?;
        let home = TeamRef::new(fixture.home_team_id, fixture.home_team_name);
        let away = TeamRef::new(fixture.away_team_id, fixture.away_team_name);

        let state = SessionState::new(
            fixture_id.to_string(),
            home,
            away,
            self.sync_config.clone(),
        );
        self.spawn_session(state).await
    }

    async fn spawn_session(&self, state: SessionState) -> Result<SessionSnapshot, String> {
        let fixture_id = state.fixture_id.clone();
        if self.sessions.read().await.contains_key(&fixture_id) {
            return Err(format!("Session already active for fixture: {}", fixture_id));
        }
        let initial_snapshot = state.snapshot();

        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (event_tx, _) = broadcast::channel(100);

        tokio::spawn(run_session_actor(state, self.store.clone(), cmd_rx, event_tx));

        let handle = SessionHandle::new(fixture_id.clone(), cmd_tx);
        self.sessions.write().await.insert(fixture_id, handle);

        Ok(initial_snapshot)
    }

    pub async fn get_handle(&self, fixture_id: &str) -> Result<SessionHandle, String> {
        self.sessions
            .read()
            .await
            .get(fixture_id)
            .cloned()
            .ok_or_else(|| format!("Session not found: {}", fixture_id))
    }

    /// Close a session after a best-effort final flush. Unsynced
    /// entries that fail to land are lost with the session; suspend
    /// instead when that matters.
    pub async fn close_session(&self, fixture_id: &str) -> Result<(), String> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(fixture_id)
            .ok_or_else(|| format!("Session not found: {}", fixture_id))?;

        if let Err(e) = handle.flush().await {
            tracing::warn!(fixture = %fixture_id, "Final flush failed on close: {}", e);
        }
        handle.shutdown().await;
        Ok(())
    }

    /// Suspend a session to the local snapshot store. The session keeps
    /// its unsynced entries; they go out after the next resume.
    pub async fn suspend_session(&self, fixture_id: &str) -> Result<String, String> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(fixture_id)
            .ok_or_else(|| format!("Session not found: {}", fixture_id))?;

        let data = handle.suspend().await.map_err(|e| e.to_string())?;
        let saved = self.snapshots.save(&data).map_err(|e| e.to_string())?;
        handle.shutdown().await;
        tracing::info!(fixture = %fixture_id, "Session suspended");
        Ok(saved)
    }

    /// Resume a suspended session exactly where it left off.
    pub async fn resume_session(&self, fixture_id: &str) -> Result<SessionSnapshot, String> {
        let data = self
            .snapshots
            .load(fixture_id)
            .map_err(|e| e.to_string())?
            .ok_or_else(|| format!("No suspended session for fixture: {}", fixture_id))?;

        let state =
            SessionState::from_suspended(data, self.sync_config.clone()).map_err(|e| e.to_string())?;
        let snapshot = self.spawn_session(state).await?;
        self.snapshots.delete(fixture_id).map_err(|e| e.to_string())?;
        Ok(snapshot)
    }

    pub fn list_suspended(&self) -> Result<Vec<SuspendedMatchData>, String> {
        self.snapshots.list().map_err(|e| e.to_string())
    }

    pub fn delete_suspended(&self, fixture_id: &str) -> Result<(), String> {
        self.snapshots.delete(fixture_id).map_err(|e| e.to_string())
    }
}
