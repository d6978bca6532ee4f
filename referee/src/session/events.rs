use match_core::{PlaytimeStatus, TeamSide};

use super::commands::CardKind;
use super::snapshot::SessionSnapshot;
use crate::sync::SyncSnapshot;

/// Events broadcast from the session actor to all subscribers.
#[derive(Debug, Clone)]
#[allow(clippy::large_enum_variant)]
pub enum SessionEvent {
    /// Full state snapshot after any mutation.
    StateChanged(SessionSnapshot),
    /// One-second clock advance (frequent, lightweight).
    ClockTick { elapsed_seconds: u32, display: String },
    GoalRecorded {
        event_id: String,
        player_name: String,
        /// None when the goal's team id matched neither fixture side.
        side: Option<TeamSide>,
        home_score: u32,
        away_score: u32,
    },
    CardIssued {
        event_id: String,
        player_name: String,
        kind: CardKind,
    },
    SubstitutionCompleted {
        outgoing_id: String,
        outgoing_name: String,
        incoming_id: String,
        incoming_name: String,
    },
    /// A player crossed a role-rule threshold during a clock tick.
    PlaytimeAlert {
        player_id: String,
        player_name: String,
        status: PlaytimeStatus,
    },
    SyncStatus(SyncSnapshot),
    /// An event row appeared in the remote store with no local
    /// counterpart: another client recorded it.
    RemoteChange {
        event_id: String,
        unassigned_goal: bool,
    },
    /// Error notification.
    Error(String),
}
