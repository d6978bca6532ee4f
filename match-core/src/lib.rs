pub mod clock;
pub mod events;
pub mod roles;
pub mod roster;
pub mod score;
pub mod substitution;
pub mod types;

pub use clock::{format_time, MatchClock};
pub use events::{EventLedger, MatchEvent, MatchEventKind};
pub use roles::{role_status, PlaytimeStatus, Severity};
pub use roster::{
    CountValidation, PlayerEntry, PlayerSession, RosterError, RosterTracker, ToggleOutcome,
};
pub use score::{derive_score, resolve_side, DerivedScore, Scoreboard};
pub use substitution::{
    PendingSubstitution, SubCoordinator, SubError, SubInitiation, TapOutcome,
};
pub use types::{
    PlayerRole, TeamRef, TeamSide, HALF_DURATION_SECS, MATCH_DURATION_SECS, SCLASS_HALF_CAP_SECS,
    SCLASS_WARNING_SECS, STARTER_MIN_TOTAL_SECS, STARTER_URGENCY_WINDOW_SECS,
    TARGET_FIELD_PLAYERS,
};
