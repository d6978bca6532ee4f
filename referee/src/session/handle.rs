use match_core::{PlayerEntry, TeamSide};
use tokio::sync::{broadcast, mpsc, oneshot};

use super::commands::*;
use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;
use crate::integrity::IntegrityReport;
use crate::persistence::SuspendedMatchData;
use crate::sync::SyncReport;

/// Cheap, cloneable handle to a session actor.
#[derive(Clone)]
pub struct SessionHandle {
    fixture_id: String,
    cmd_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub(crate) fn new(fixture_id: String, cmd_tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { fixture_id, cmd_tx }
    }

    pub fn fixture_id(&self) -> &str {
        &self.fixture_id
    }

    pub async fn start_clock(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::StartClock { reply })
            .await?
    }

    pub async fn pause_clock(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::PauseClock { reply })
            .await?
    }

    pub async fn reset_match(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::ResetMatch { reply })
            .await?
    }

    pub async fn track_player(&self, entry: PlayerEntry) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::TrackPlayer { entry, reply })
            .await?
    }

    pub async fn untrack_player(
        &self,
        player_id: impl Into<String>,
    ) -> Result<SessionSnapshot, SessionError> {
        let player_id = player_id.into();
        self.request(|reply| SessionCommand::UntrackPlayer { player_id, reply })
            .await?
    }

    pub async fn toggle_player(
        &self,
        player_id: impl Into<String>,
    ) -> Result<SessionSnapshot, SessionError> {
        let player_id = player_id.into();
        self.request(|reply| SessionCommand::TogglePlayer { player_id, reply })
            .await?
    }

    pub async fn cancel_pending_substitution(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::CancelPendingSubstitution { reply })
            .await?
    }

    pub async fn record_goal(
        &self,
        player_id: Option<String>,
        player_name: impl Into<String>,
        team_id: impl Into<String>,
        own_goal: bool,
    ) -> Result<SessionSnapshot, SessionError> {
        let player_name = player_name.into();
        let team_id = team_id.into();
        self.request(|reply| SessionCommand::RecordGoal {
            player_id,
            player_name,
            team_id,
            own_goal,
            reply,
        })
        .await?
    }

    pub async fn remove_goal(&self, side: TeamSide) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::RemoveGoal { side, reply })
            .await?
    }

    pub async fn record_assist(
        &self,
        player_id: Option<String>,
        player_name: impl Into<String>,
        team_id: impl Into<String>,
    ) -> Result<SessionSnapshot, SessionError> {
        let player_name = player_name.into();
        let team_id = team_id.into();
        self.request(|reply| SessionCommand::RecordAssist {
            player_id,
            player_name,
            team_id,
            reply,
        })
        .await?
    }

    pub async fn record_card(
        &self,
        player_id: Option<String>,
        player_name: impl Into<String>,
        team_id: impl Into<String>,
        kind: CardKind,
    ) -> Result<SessionSnapshot, SessionError> {
        let player_name = player_name.into();
        let team_id = team_id.into();
        self.request(|reply| SessionCommand::RecordCard {
            player_id,
            player_name,
            team_id,
            kind,
            reply,
        })
        .await?
    }

    pub async fn set_auto_sync(&self, enabled: bool) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::SetAutoSync { enabled, reply })
            .await?
    }

    /// Force an immediate sync, resolving once the batch lands or fails.
    pub async fn flush(&self) -> Result<SyncReport, SessionError> {
        self.request(|reply| SessionCommand::Flush { reply }).await?
    }

    pub async fn finalize(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::Finalize { reply })
            .await?
    }

    pub async fn rate_member(
        &self,
        player_id: impl Into<String>,
        rater_id: impl Into<String>,
        rating: u8,
    ) -> Result<(), SessionError> {
        let player_id = player_id.into();
        let rater_id = rater_id.into();
        self.request(|reply| SessionCommand::RateMember {
            player_id,
            rater_id,
            rating,
            reply,
        })
        .await?
    }

    pub async fn get_snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        self.request(|reply| SessionCommand::GetSnapshot { reply })
            .await
    }

    pub async fn get_integrity_report(&self) -> Result<IntegrityReport, SessionError> {
        self.request(|reply| SessionCommand::GetIntegrityReport { reply })
            .await
    }

    pub(crate) async fn suspend(&self) -> Result<SuspendedMatchData, SessionError> {
        self.request(|reply| SessionCommand::Suspend { reply }).await
    }

    pub async fn subscribe(
        &self,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SessionEvent>), SessionError> {
        self.request(|reply| SessionCommand::Subscribe { reply })
            .await
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(SessionCommand::Shutdown).await;
    }

    /// Send a command and await its oneshot reply.
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand,
    ) -> Result<T, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| SessionError::Internal("Session actor closed".into()))?;
        rx.await
            .map_err(|_| SessionError::Internal("Reply dropped".into()))
    }
}
