//! Append-only match event ledger.
//!
//! Every referee action lands here as a [`MatchEvent`]. Entries are
//! never mutated after the fact except for the `synced` flag, and never
//! removed except by a full match reset. The ledger is the audit trail;
//! the scoreboard (see [`crate::score`]) is the authoritative score.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchEventKind {
    Goal,
    Assist,
    YellowCard,
    RedCard,
    PlayerAdded,
    PlayerRemoved,
    Timer,
    Reset,
    Other,
}

impl MatchEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Goal => "goal",
            Self::Assist => "assist",
            Self::YellowCard => "yellow_card",
            Self::RedCard => "red_card",
            Self::PlayerAdded => "player_added",
            Self::PlayerRemoved => "player_removed",
            Self::Timer => "timer",
            Self::Reset => "reset",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "goal" => Self::Goal,
            "assist" => Self::Assist,
            "yellow_card" => Self::YellowCard,
            "red_card" => Self::RedCard,
            "player_added" => Self::PlayerAdded,
            "player_removed" => Self::PlayerRemoved,
            "timer" => Self::Timer,
            "reset" => Self::Reset,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for MatchEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One ledger entry. The id is generated locally and echoed to the
/// remote store, which is what makes re-sent batches idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub id: String,
    pub kind: MatchEventKind,
    pub player_id: Option<String>,
    pub player_name: String,
    pub team_id: String,
    /// Clock seconds at which the event was recorded.
    pub time: u32,
    pub description: String,
    pub is_own_goal: bool,
    pub synced: bool,
}

impl MatchEvent {
    pub fn new(kind: MatchEventKind, time: u32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            kind,
            player_id: None,
            player_name: String::new(),
            team_id: String::new(),
            time,
            description: String::new(),
            is_own_goal: false,
            synced: false,
        }
    }

    pub fn with_player(mut self, id: Option<String>, name: impl Into<String>) -> Self {
        self.player_id = id;
        self.player_name = name.into();
        self
    }

    pub fn with_team(mut self, team_id: impl Into<String>) -> Self {
        self.team_id = team_id.into();
        self
    }

    pub fn own_goal(mut self, is_own_goal: bool) -> Self {
        self.is_own_goal = is_own_goal;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The identity tuple used for duplicate detection: two events with
    /// the same player, second, team, kind and own-goal flag are
    /// considered one action recorded twice.
    fn dedup_key(&self) -> (Option<&str>, u32, &str, MatchEventKind, bool) {
        (
            self.player_id.as_deref(),
            self.time,
            self.team_id.as_str(),
            self.kind,
            self.is_own_goal,
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventLedger {
    events: Vec<MatchEvent>,
}

impl EventLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_events(events: Vec<MatchEvent>) -> Self {
        Self { events }
    }

    /// Append an entry. Timestamps are clamped so `time` never moves
    /// backwards in insertion order; ties are broken by insertion order.
    pub fn append(&mut self, mut event: MatchEvent) -> &MatchEvent {
        if let Some(last) = self.events.last() {
            if event.time < last.time {
                event.time = last.time;
            }
        }
        let idx = self.events.len();
        self.events.push(event);
        &self.events[idx]
    }

    /// Idempotency guard for retried UI actions: find an existing goal
    /// or assist with the same identity tuple as `candidate`. The
    /// caller decides whether to skip or warn.
    pub fn find_duplicate(&self, candidate: &MatchEvent) -> Option<&MatchEvent> {
        if !matches!(candidate.kind, MatchEventKind::Goal | MatchEventKind::Assist) {
            return None;
        }
        self.events
            .iter()
            .find(|e| e.dedup_key() == candidate.dedup_key())
    }

    pub fn unsynced(&self) -> Vec<&MatchEvent> {
        self.events.iter().filter(|e| !e.synced).collect()
    }

    pub fn unsynced_count(&self) -> usize {
        self.events.iter().filter(|e| !e.synced).count()
    }

    /// Flip the `synced` flag on exactly the given ids.
    pub fn mark_synced(&mut self, ids: &[String]) {
        for e in &mut self.events {
            if ids.iter().any(|id| id == &e.id) {
                e.synced = true;
            }
        }
    }

    pub fn events(&self) -> &[MatchEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Full match reset: the only operation that discards entries.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal(player: &str, time: u32, team: &str) -> MatchEvent {
        MatchEvent::new(MatchEventKind::Goal, time)
            .with_player(Some(player.to_string()), format!("Player {}", player))
            .with_team(team)
    }

    #[test]
    fn test_append_assigns_unique_ids() {
        let mut ledger = EventLedger::new();
        let a = ledger.append(goal("3", 600, "home")).id.clone();
        let b = ledger.append(goal("4", 700, "home")).id.clone();
        assert_ne!(a, b);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_times_non_decreasing() {
        let mut ledger = EventLedger::new();
        ledger.append(goal("1", 600, "home"));
        // A stale timestamp is clamped up to the previous entry's time.
        ledger.append(goal("2", 300, "home"));
        let times: Vec<u32> = ledger.events().iter().map(|e| e.time).collect();
        assert_eq!(times, vec![600, 600]);
    }

    #[test]
    fn test_find_duplicate_matches_identity_tuple() {
        let mut ledger = EventLedger::new();
        ledger.append(goal("3", 600, "home"));

        let dup = goal("3", 600, "home");
        assert!(ledger.find_duplicate(&dup).is_some());

        // Any field of the tuple differing means no duplicate.
        assert!(ledger.find_duplicate(&goal("3", 601, "home")).is_none());
        assert!(ledger.find_duplicate(&goal("4", 600, "home")).is_none());
        assert!(ledger.find_duplicate(&goal("3", 600, "away")).is_none());
        assert!(ledger
            .find_duplicate(&goal("3", 600, "home").own_goal(true))
            .is_none());
    }

    #[test]
    fn test_find_duplicate_ignores_non_scoring_kinds() {
        let mut ledger = EventLedger::new();
        ledger.append(MatchEvent::new(MatchEventKind::Timer, 0).describe("clock started"));
        let again = MatchEvent::new(MatchEventKind::Timer, 0).describe("clock started");
        assert!(ledger.find_duplicate(&again).is_none());
    }

    #[test]
    fn test_mark_synced_flips_only_listed_ids() {
        let mut ledger = EventLedger::new();
        let a = ledger.append(goal("1", 10, "home")).id.clone();
        let _b = ledger.append(goal("2", 20, "home")).id.clone();

        assert_eq!(ledger.unsynced_count(), 2);
        ledger.mark_synced(&[a.clone()]);
        assert_eq!(ledger.unsynced_count(), 1);
        assert!(ledger.events()[0].synced);
        assert!(!ledger.events()[1].synced);

        // Marking the same id again is harmless.
        ledger.mark_synced(&[a]);
        assert_eq!(ledger.unsynced_count(), 1);
    }

    #[test]
    fn test_clear_empties_ledger() {
        let mut ledger = EventLedger::new();
        ledger.append(goal("1", 10, "home"));
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
