//! Score tracking and derivation.
//!
//! The [`Scoreboard`] counters are the single source of truth for the
//! displayed score; the ledger is an audit trail. [`derive_score`]
//! recomputes a score from ledger goal entries so the two can be
//! cross-checked, and reports entries whose team attribution failed
//! instead of dropping them silently.

use serde::{Deserialize, Serialize};

use crate::events::{EventLedger, MatchEventKind};
use crate::types::{TeamRef, TeamSide};

/// Directly-mutated score counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub home: u32,
    pub away: u32,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_goal(&mut self, side: TeamSide) {
        match side {
            TeamSide::Home => self.home += 1,
            TeamSide::Away => self.away += 1,
        }
    }

    /// Remove a goal. Saturates at zero; the score can never go
    /// negative however many removals arrive.
    pub fn remove_goal(&mut self, side: TeamSide) {
        match side {
            TeamSide::Home => self.home = self.home.saturating_sub(1),
            TeamSide::Away => self.away = self.away.saturating_sub(1),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Score recomputed from the ledger, with the count of goal entries
/// whose team identifier matched neither side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedScore {
    pub home: u32,
    pub away: u32,
    pub unmatched: u32,
}

/// Resolve a raw team identifier against the fixture sides.
///
/// Comparison is case- and whitespace-normalized on the team id, with a
/// fallback to the team name for entries recorded before ids existed.
pub fn resolve_side(team_id: &str, home: &TeamRef, away: &TeamRef) -> Option<TeamSide> {
    let needle = normalize(team_id);
    if needle.is_empty() {
        return None;
    }
    if needle == normalize(&home.id) || needle == normalize(&home.name) {
        Some(TeamSide::Home)
    } else if needle == normalize(&away.id) || needle == normalize(&away.name) {
        Some(TeamSide::Away)
    } else {
        None
    }
}

/// Recompute the score from ledger goal entries. Own goals credit the
/// opposite side. Deterministic: re-running over the same ledger yields
/// the same result.
pub fn derive_score(ledger: &EventLedger, home: &TeamRef, away: &TeamRef) -> DerivedScore {
    let mut score = DerivedScore::default();
    for event in ledger.events() {
        if event.kind != MatchEventKind::Goal {
            continue;
        }
        match resolve_side(&event.team_id, home, away) {
            Some(side) => {
                let credited = if event.is_own_goal { side.opposite() } else { side };
                match credited {
                    TeamSide::Home => score.home += 1,
                    TeamSide::Away => score.away += 1,
                }
            }
            None => score.unmatched += 1,
        }
    }
    score
}

fn normalize(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MatchEvent;

    fn teams() -> (TeamRef, TeamRef) {
        (
            TeamRef::new("team-red", "Red Lions"),
            TeamRef::new("team-blue", "Blue Rovers"),
        )
    }

    fn goal(team: &str, time: u32, own: bool) -> MatchEvent {
        MatchEvent::new(MatchEventKind::Goal, time)
            .with_team(team)
            .own_goal(own)
    }

    #[test]
    fn test_scoreboard_counters() {
        let mut board = Scoreboard::new();
        board.record_goal(TeamSide::Home);
        board.record_goal(TeamSide::Home);
        board.record_goal(TeamSide::Away);
        assert_eq!((board.home, board.away), (2, 1));

        board.remove_goal(TeamSide::Away);
        board.remove_goal(TeamSide::Away);
        assert_eq!((board.home, board.away), (2, 0));
    }

    #[test]
    fn test_derive_score_by_id_and_name() {
        let (home, away) = teams();
        let mut ledger = EventLedger::new();
        ledger.append(goal("team-red", 100, false));
        ledger.append(goal("  TEAM-BLUE ", 200, false));
        ledger.append(goal("blue rovers", 300, false));

        let score = derive_score(&ledger, &home, &away);
        assert_eq!((score.home, score.away), (1, 2));
        assert_eq!(score.unmatched, 0);
    }

    #[test]
    fn test_own_goal_credits_opposite_side() {
        let (home, away) = teams();
        let mut ledger = EventLedger::new();
        ledger.append(goal("team-red", 100, true));

        let score = derive_score(&ledger, &home, &away);
        assert_eq!((score.home, score.away), (0, 1));
    }

    #[test]
    fn test_unmatched_entries_are_counted_not_dropped() {
        let (home, away) = teams();
        let mut ledger = EventLedger::new();
        ledger.append(goal("team-red", 100, false));
        ledger.append(goal("team-green", 200, false));
        ledger.append(goal("", 300, false));

        let score = derive_score(&ledger, &home, &away);
        assert_eq!((score.home, score.away), (1, 0));
        assert_eq!(score.unmatched, 2);
        // The entries themselves stay in the ledger.
        assert_eq!(ledger.len(), 3);
    }

    #[test]
    fn test_derive_score_deterministic() {
        let (home, away) = teams();
        let mut ledger = EventLedger::new();
        for t in [60, 120, 180] {
            ledger.append(goal("team-red", t, false));
        }
        let first = derive_score(&ledger, &home, &away);
        let second = derive_score(&ledger, &home, &away);
        assert_eq!(first, second);
        assert_eq!(first.home, 3);
    }

    #[test]
    fn test_non_goal_events_ignored() {
        let (home, away) = teams();
        let mut ledger = EventLedger::new();
        ledger.append(MatchEvent::new(MatchEventKind::Assist, 100).with_team("team-red"));
        ledger.append(MatchEvent::new(MatchEventKind::YellowCard, 200).with_team("team-red"));

        let score = derive_score(&ledger, &home, &away);
        assert_eq!((score.home, score.away, score.unmatched), (0, 0, 0));
    }
}
