use match_core::{MatchEventKind, PlayerEntry, RosterError, SubError, TeamSide};
use tokio::sync::{broadcast, oneshot};

use super::events::SessionEvent;
use super::snapshot::SessionSnapshot;
use crate::integrity::IntegrityReport;
use crate::persistence::SuspendedMatchData;
use crate::sync::SyncReport;

#[derive(Debug, Clone, thiserror::Error)]
pub enum SessionError {
    #[error("player already tracked: {0}")]
    DuplicateTracking(String),
    #[error("player not tracked: {0}")]
    NotTracked(String),
    #[error("invalid player state: {0}")]
    InvalidPlayerState(String),
    #[error("a substitution is already pending for {0}")]
    SubstitutionAlreadyPending(String),
    #[error("duplicate {kind} for {player} at {time}s")]
    DuplicateEvent {
        kind: String,
        player: String,
        time: u32,
    },
    #[error("match already finalized")]
    AlreadyFinalized,
    #[error("sync failed: {0}")]
    SyncFailed(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<RosterError> for SessionError {
    fn from(e: RosterError) -> Self {
        match e {
            RosterError::DuplicateTracking(id) => Self::DuplicateTracking(id),
            RosterError::NotTracked(id) => Self::NotTracked(id),
            RosterError::InvalidPlayerState(msg) => Self::InvalidPlayerState(msg),
        }
    }
}

impl From<SubError> for SessionError {
    fn from(e: SubError) -> Self {
        match e {
            SubError::AlreadyPending(name) => Self::SubstitutionAlreadyPending(name),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Yellow,
    Red,
}

impl CardKind {
    pub fn event_kind(self) -> MatchEventKind {
        match self {
            Self::Yellow => MatchEventKind::YellowCard,
            Self::Red => MatchEventKind::RedCard,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yellow => "yellow card",
            Self::Red => "red card",
        }
    }
}

/// Commands sent to the session actor. Each embeds a oneshot for the
/// reply. Mutations reply with the post-mutation snapshot.
pub enum SessionCommand {
    StartClock {
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    PauseClock {
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    ResetMatch {
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    TrackPlayer {
        entry: PlayerEntry,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    UntrackPlayer {
        player_id: String,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    TogglePlayer {
        player_id: String,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    CancelPendingSubstitution {
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    RecordGoal {
        player_id: Option<String>,
        player_name: String,
        team_id: String,
        own_goal: bool,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    RemoveGoal {
        side: TeamSide,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    RecordAssist {
        player_id: Option<String>,
        player_name: String,
        team_id: String,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    RecordCard {
        player_id: Option<String>,
        player_name: String,
        team_id: String,
        kind: CardKind,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    SetAutoSync {
        enabled: bool,
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    /// Force an immediate push, bypassing the debounce. Resolves when
    /// the batch lands or fails.
    Flush {
        reply: oneshot::Sender<Result<SyncReport, SessionError>>,
    },
    Finalize {
        reply: oneshot::Sender<Result<SessionSnapshot, SessionError>>,
    },
    RateMember {
        player_id: String,
        rater_id: String,
        rating: u8,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    GetSnapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    GetIntegrityReport {
        reply: oneshot::Sender<IntegrityReport>,
    },
    /// Pause the clock and export the full session state for the local
    /// snapshot store.
    Suspend {
        reply: oneshot::Sender<SuspendedMatchData>,
    },
    Subscribe {
        reply: oneshot::Sender<(SessionSnapshot, broadcast::Receiver<SessionEvent>)>,
    },
    Shutdown,
}
