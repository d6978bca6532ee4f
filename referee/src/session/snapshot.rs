use match_core::{
    CountValidation, PendingSubstitution, PlayerRole, PlaytimeStatus, Severity, TeamRef, TeamSide,
};

use crate::integrity::IntegrityReport;
use crate::sync::SyncSnapshot;

/// Complete, immutable snapshot of session state.
/// Sent to subscribers on every state change and on subscribe.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub fixture_id: String,
    pub home: TeamRef,
    pub away: TeamRef,
    pub elapsed_seconds: u32,
    /// "MM:SS" rendering of the clock.
    pub clock_display: String,
    pub running: bool,
    pub current_half: u8,
    pub finalized: bool,
    pub home_score: u32,
    pub away_score: u32,
    pub players: Vec<PlayerSnapshot>,
    pub pending_substitution: Option<PendingSubstitution>,
    pub event_count: usize,
    pub home_count: CountValidation,
    pub away_count: CountValidation,
    pub sync: SyncSnapshot,
    pub integrity: IntegrityReport,
}

/// One tracked player with live-derived time accounting.
#[derive(Debug, Clone)]
pub struct PlayerSnapshot {
    pub player_id: String,
    pub name: String,
    pub team: TeamSide,
    pub role: PlayerRole,
    pub is_playing: bool,
    /// Banked time plus the open stint.
    pub total_seconds: u32,
    pub current_half_seconds: u32,
    pub status: PlaytimeStatus,
    pub severity: Severity,
}

impl SessionSnapshot {
    pub fn player(&self, player_id: &str) -> Option<&PlayerSnapshot> {
        self.players.iter().find(|p| p.player_id == player_id)
    }
}
