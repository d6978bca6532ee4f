use serde::{Deserialize, Serialize};

use crate::roles::Severity;
use crate::types::{PlayerRole, TeamSide, TARGET_FIELD_PLAYERS};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterError {
    #[error("player already tracked: {0}")]
    DuplicateTracking(String),
    #[error("player not tracked: {0}")]
    NotTracked(String),
    #[error("invalid player state: {0}")]
    InvalidPlayerState(String),
}

/// Per-match tracking state for one roster player.
///
/// Invariant: `start_time` is `Some` exactly when `is_playing` is true.
/// `total_time` holds closed stints only; the open stint is accounted
/// for by [`RosterTracker::effective_total`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSession {
    pub player_id: String,
    pub name: String,
    pub team: TeamSide,
    pub role: PlayerRole,
    pub is_playing: bool,
    pub start_time: Option<u32>,
    pub total_time: u32,
    pub current_half_time: u32,
}

/// Input for starting to track a player.
#[derive(Debug, Clone)]
pub struct PlayerEntry {
    pub player_id: String,
    pub name: String,
    pub team: TeamSide,
    pub role: PlayerRole,
}

/// What a toggle did to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToggleOutcome {
    pub now_playing: bool,
    /// Length of the stint that was closed, if the player left the field.
    pub closed_stint: Option<u32>,
}

/// On-field headcount check for one side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountValidation {
    pub is_valid: bool,
    pub severity: Severity,
    pub active_count: usize,
    pub message: String,
}

/// Tracks every player the referee has added to the match, in insertion
/// order. Rosters are small, so lookups are linear scans.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterTracker {
    players: Vec<PlayerSession>,
}

impl RosterTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from suspended state, re-checking the stint invariant.
    pub fn from_players(players: Vec<PlayerSession>) -> Result<Self, RosterError> {
        for p in &players {
            if p.is_playing != p.start_time.is_some() {
                return Err(RosterError::InvalidPlayerState(p.player_id.clone()));
            }
        }
        Ok(Self { players })
    }

    /// Start tracking a player. New players go straight onto the field
    /// with a stint opening at `now`.
    pub fn add_player(&mut self, entry: PlayerEntry, now: u32) -> Result<&PlayerSession, RosterError> {
        if self.index_of(&entry.player_id).is_some() {
            return Err(RosterError::DuplicateTracking(entry.player_id));
        }
        let idx = self.players.len();
        self.players.push(PlayerSession {
            player_id: entry.player_id,
            name: entry.name,
            team: entry.team,
            role: entry.role,
            is_playing: true,
            start_time: Some(now),
            total_time: 0,
            current_half_time: 0,
        });
        Ok(&self.players[idx])
    }

    /// Stop tracking a player, returning the removed session.
    pub fn remove_player(&mut self, player_id: &str) -> Result<PlayerSession, RosterError> {
        let idx = self
            .index_of(player_id)
            .ok_or_else(|| RosterError::NotTracked(player_id.to_string()))?;
        Ok(self.players.remove(idx))
    }

    /// Flip a player between on-field and off-field at clock time `now`.
    pub fn toggle(&mut self, player_id: &str, now: u32) -> Result<ToggleOutcome, RosterError> {
        let idx = self
            .index_of(player_id)
            .ok_or_else(|| RosterError::NotTracked(player_id.to_string()))?;
        let player = &mut self.players[idx];

        if player.is_playing {
            let start = player.start_time.ok_or_else(|| {
                RosterError::InvalidPlayerState(format!("{} playing without a stint start", player_id))
            })?;
            let stint = now.saturating_sub(start);
            player.total_time += stint;
            player.start_time = None;
            player.is_playing = false;
            Ok(ToggleOutcome {
                now_playing: false,
                closed_stint: Some(stint),
            })
        } else {
            player.start_time = Some(now);
            player.is_playing = true;
            Ok(ToggleOutcome {
                now_playing: true,
                closed_stint: None,
            })
        }
    }

    /// Accrue one second of half time for everyone on the field.
    /// Driven by the same tick that advances the match clock.
    pub fn on_clock_tick(&mut self) {
        for p in &mut self.players {
            if p.is_playing {
                p.current_half_time += 1;
            }
        }
    }

    /// Zero per-half accumulators at the half boundary.
    pub fn start_second_half(&mut self) {
        for p in &mut self.players {
            p.current_half_time = 0;
        }
    }

    /// Close every open stint at clock time `now` (match finalization).
    pub fn close_open_stints(&mut self, now: u32) {
        for p in &mut self.players {
            if p.is_playing {
                if let Some(start) = p.start_time.take() {
                    p.total_time += now.saturating_sub(start);
                }
                p.is_playing = false;
            }
        }
    }

    pub fn get(&self, player_id: &str) -> Option<&PlayerSession> {
        self.index_of(player_id).map(|i| &self.players[i])
    }

    pub fn players(&self) -> &[PlayerSession] {
        &self.players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Banked time plus the open stint as of clock time `now`.
    pub fn effective_total(&self, player: &PlayerSession, now: u32) -> u32 {
        match player.start_time {
            Some(start) if player.is_playing => {
                player.total_time + now.saturating_sub(start)
            }
            _ => player.total_time,
        }
    }

    pub fn playing_count(&self, team: TeamSide) -> usize {
        self.players
            .iter()
            .filter(|p| p.team == team && p.is_playing)
            .count()
    }

    /// Headcount rule: exactly 7 on the field per side is the target.
    /// Deviation is a warning, never a hard error, since the referee may be
    /// mid-substitution.
    pub fn count_validation(&self, team: TeamSide) -> CountValidation {
        let active_count = self.playing_count(team);
        if active_count == TARGET_FIELD_PLAYERS {
            CountValidation {
                is_valid: true,
                severity: Severity::Ok,
                active_count,
                message: format!("{} players on the field", active_count),
            }
        } else {
            let direction = if active_count < TARGET_FIELD_PLAYERS {
                "short of"
            } else {
                "over"
            };
            CountValidation {
                is_valid: false,
                severity: Severity::Warning,
                active_count,
                message: format!(
                    "{} on the field, {} the target of {}",
                    active_count, direction, TARGET_FIELD_PLAYERS
                ),
            }
        }
    }

    /// Drop all tracking state (full match reset).
    pub fn reset(&mut self) {
        self.players.clear();
    }

    fn index_of(&self, player_id: &str) -> Option<usize> {
        self.players.iter().position(|p| p.player_id == player_id)
    }
}
