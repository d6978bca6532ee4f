//! Data-integrity sweep.
//!
//! Detects the quiet ways a live session's records drift: goals nobody
//! was credited for, events whose team attribution fails, entries with
//! missing fields, and tracked players with no recorded time. Findings
//! are surfaced as counts for the UI to badge, never auto-corrected.

use match_core::{derive_score, EventLedger, MatchEventKind, RosterTracker, TeamRef};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntegrityReport {
    /// Goal entries with no player attribution.
    pub unassigned_goals: usize,
    /// Goal entries whose team id matched neither fixture side.
    pub unmatched_team_events: usize,
    /// Scoring/card entries missing a team id.
    pub incomplete_events: usize,
    /// Tracked players with zero accumulated time who are off the field
    /// (usually a sign tracking started late or a sync was missed).
    pub zero_time_players: usize,
    /// Rows seen in the remote store with no local counterpart
    /// (recorded by another client).
    pub remote_only_events: usize,
}

impl IntegrityReport {
    pub fn issue_count(&self) -> usize {
        self.unassigned_goals
            + self.unmatched_team_events
            + self.incomplete_events
            + self.zero_time_players
            + self.remote_only_events
    }

    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }
}

pub fn check(
    ledger: &EventLedger,
    roster: &RosterTracker,
    home: &TeamRef,
    away: &TeamRef,
    now: u32,
    remote_only_events: usize,
) -> IntegrityReport {
    let mut report = IntegrityReport {
        remote_only_events,
        ..IntegrityReport::default()
    };

    for event in ledger.events() {
        let needs_team = matches!(
            event.kind,
            MatchEventKind::Goal
                | MatchEventKind::Assist
                | MatchEventKind::YellowCard
                | MatchEventKind::RedCard
        );
        if needs_team && event.team_id.trim().is_empty() {
            report.incomplete_events += 1;
        }
        if event.kind == MatchEventKind::Goal && event.player_id.is_none() {
            report.unassigned_goals += 1;
        }
    }

    report.unmatched_team_events = derive_score(ledger, home, away).unmatched as usize;

    report.zero_time_players = roster
        .players()
        .iter()
        .filter(|p| !p.is_playing && roster.effective_total(p, now) == 0)
        .count();

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use match_core::{MatchEvent, PlayerEntry, PlayerRole, TeamSide};

    fn teams() -> (TeamRef, TeamRef) {
        (
            TeamRef::new("team-red", "Red Lions"),
            TeamRef::new("team-blue", "Blue Rovers"),
        )
    }

    #[test]
    fn test_clean_session_reports_nothing() {
        let (home, away) = teams();
        let mut ledger = EventLedger::new();
        ledger.append(
            MatchEvent::new(MatchEventKind::Goal, 100)
                .with_player(Some("p1".to_string()), "Player 1")
                .with_team("team-red"),
        );
        let roster = RosterTracker::new();

        let report = check(&ledger, &roster, &home, &away, 200, 0);
        assert!(report.is_clean());
    }

    #[test]
    fn test_unassigned_and_unmatched_goals_counted() {
        let (home, away) = teams();
        let mut ledger = EventLedger::new();
        // No player attribution.
        ledger.append(MatchEvent::new(MatchEventKind::Goal, 100).with_team("team-red"));
        // Team matches neither side.
        ledger.append(
            MatchEvent::new(MatchEventKind::Goal, 200)
                .with_player(Some("p9".to_string()), "Player 9")
                .with_team("team-green"),
        );
        let roster = RosterTracker::new();

        let report = check(&ledger, &roster, &home, &away, 300, 0);
        assert_eq!(report.unassigned_goals, 1);
        assert_eq!(report.unmatched_team_events, 1);
        assert_eq!(report.issue_count(), 2);
    }

    #[test]
    fn test_incomplete_card_event_counted() {
        let (home, away) = teams();
        let mut ledger = EventLedger::new();
        ledger.append(
            MatchEvent::new(MatchEventKind::YellowCard, 50)
                .with_player(Some("p1".to_string()), "Player 1"),
        );
        let roster = RosterTracker::new();

        let report = check(&ledger, &roster, &home, &away, 60, 0);
        assert_eq!(report.incomplete_events, 1);
    }

    #[test]
    fn test_zero_time_player_counted_only_off_field() {
        let (home, away) = teams();
        let ledger = EventLedger::new();
        let mut roster = RosterTracker::new();
        roster
            .add_player(
                PlayerEntry {
                    player_id: "p1".to_string(),
                    name: "Player 1".to_string(),
                    team: TeamSide::Home,
                    role: PlayerRole::Other,
                },
                100,
            )
            .unwrap();
        // Still on the field with an open stint: not flagged.
        assert_eq!(check(&ledger, &roster, &home, &away, 100, 0).zero_time_players, 0);

        // Toggled off at the same second they entered: zero time, flagged.
        roster.toggle("p1", 100).unwrap();
        assert_eq!(check(&ledger, &roster, &home, &away, 100, 0).zero_time_players, 1);
    }
}
