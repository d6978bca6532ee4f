use std::collections::HashMap;

use league_store::{MatchEventRecord, MemberStatDelta};
use match_core::{
    format_time, resolve_side, role_status, EventLedger, MatchClock, MatchEvent, MatchEventKind,
    PlayerEntry, PlaytimeStatus, RosterTracker, Scoreboard, SubCoordinator, SubInitiation,
    TapOutcome, TeamRef, TeamSide, HALF_DURATION_SECS,
};

use super::commands::{CardKind, SessionError};
use super::snapshot::{PlayerSnapshot, SessionSnapshot};
use crate::integrity;
use crate::persistence::{now_timestamp, SuspendedMatchData};
use crate::sync::{PendingFinalize, SyncConfig, SyncController};

/// Internal mutable state, owned entirely by the session actor. No locks.
pub(crate) struct SessionState {
    pub fixture_id: String,
    pub home: TeamRef,
    pub away: TeamRef,
    pub clock: MatchClock,
    pub roster: RosterTracker,
    pub subs: SubCoordinator,
    pub ledger: EventLedger,
    pub scoreboard: Scoreboard,
    pub finalized: bool,
    pub sync: SyncController,
    /// Fixture/member writes waiting for an in-flight push to finish.
    pub pending_finalize: Option<PendingFinalize>,
    /// Remote rows with no local counterpart, updated by the
    /// reconciliation sweep and the change feed.
    pub remote_only_events: usize,
    /// Last playtime status per player, for edge-triggered alerts.
    alert_latch: HashMap<String, PlaytimeStatus>,
}

/// What a toggle turned out to be, for the actor to broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ToggleEffect {
    Pending(SubInitiation),
    Substitution {
        outgoing_id: String,
        outgoing_name: String,
        incoming_id: String,
        incoming_name: String,
    },
    Toggled {
        player_id: String,
        now_playing: bool,
    },
}

/// Threshold crossings produced by one clock tick.
pub(crate) struct TickEffects {
    pub alerts: Vec<(String, String, PlaytimeStatus)>,
}

impl SessionState {
    pub fn new(fixture_id: String, home: TeamRef, away: TeamRef, config: SyncConfig) -> Self {
        Self {
            fixture_id,
            home,
            away,
            clock: MatchClock::new(),
            roster: RosterTracker::new(),
            subs: SubCoordinator::new(),
            ledger: EventLedger::new(),
            scoreboard: Scoreboard::new(),
            finalized: false,
            sync: SyncController::new(config),
            pending_finalize: None,
            remote_only_events: 0,
            alert_latch: HashMap::new(),
        }
    }

    /// Rebuild a session from a locally-saved snapshot. Unsynced ledger
    /// entries come back still pending; the clock comes back paused.
    pub fn from_suspended(
        data: SuspendedMatchData,
        config: SyncConfig,
    ) -> Result<Self, SessionError> {
        let roster = RosterTracker::from_players(data.players)?;
        let mut sync = SyncController::new(config);
        sync.set_auto(data.auto_sync_enabled);
        Ok(Self {
            fixture_id: data.fixture_id,
            home: data.home,
            away: data.away,
            clock: MatchClock::resume_at(data.elapsed_seconds),
            roster,
            subs: SubCoordinator::with_pending(data.pending_substitution),
            ledger: EventLedger::from_events(data.events),
            scoreboard: Scoreboard {
                home: data.home_score,
                away: data.away_score,
            },
            finalized: data.finalized,
            sync,
            pending_finalize: None,
            remote_only_events: 0,
            alert_latch: HashMap::new(),
        })
    }

    /// Pause the clock and export everything the snapshot store needs.
    pub fn export_suspended(&mut self) -> SuspendedMatchData {
        self.clock.pause();
        SuspendedMatchData {
            fixture_id: self.fixture_id.clone(),
            home: self.home.clone(),
            away: self.away.clone(),
            elapsed_seconds: self.clock.elapsed(),
            finalized: self.finalized,
            home_score: self.scoreboard.home,
            away_score: self.scoreboard.away,
            players: self.roster.players().to_vec(),
            events: self.ledger.events().to_vec(),
            pending_substitution: self.subs.pending().cloned(),
            auto_sync_enabled: self.sync.auto_enabled(),
            suspended_at: now_timestamp(),
        }
    }

    /// Build a full snapshot of the current state.
    pub fn snapshot(&self) -> SessionSnapshot {
        let now = self.clock.elapsed();
        let players: Vec<PlayerSnapshot> = self
            .roster
            .players()
            .iter()
            .map(|p| {
                let total = self.roster.effective_total(p, now);
                let status = role_status(p.role, total, p.current_half_time, now);
                PlayerSnapshot {
                    player_id: p.player_id.clone(),
                    name: p.name.clone(),
                    team: p.team,
                    role: p.role,
                    is_playing: p.is_playing,
                    total_seconds: total,
                    current_half_seconds: p.current_half_time,
                    status,
                    severity: status.severity(),
                }
            })
            .collect();

        SessionSnapshot {
            fixture_id: self.fixture_id.clone(),
            home: self.home.clone(),
            away: self.away.clone(),
            elapsed_seconds: now,
            clock_display: format_time(now),
            running: self.clock.is_running(),
            current_half: self.clock.current_half(),
            finalized: self.finalized,
            home_score: self.scoreboard.home,
            away_score: self.scoreboard.away,
            players,
            pending_substitution: self.subs.pending().cloned(),
            event_count: self.ledger.len(),
            home_count: self.roster.count_validation(TeamSide::Home),
            away_count: self.roster.count_validation(TeamSide::Away),
            sync: self.sync.to_snapshot(self.ledger.unsynced_count()),
            integrity: self.integrity_report(),
        }
    }

    pub fn integrity_report(&self) -> crate::integrity::IntegrityReport {
        integrity::check(
            &self.ledger,
            &self.roster,
            &self.home,
            &self.away,
            self.clock.elapsed(),
            self.remote_only_events,
        )
    }

    /// One clock second: advance, accrue half time, fire the half
    /// boundary exactly once, and collect threshold crossings.
    pub fn tick(&mut self) -> TickEffects {
        self.clock.tick();
        self.roster.on_clock_tick();
        if self.clock.elapsed() == HALF_DURATION_SECS {
            self.roster.start_second_half();
            tracing::info!("Half-time boundary crossed, per-half accumulators reset");
        }

        let now = self.clock.elapsed();
        let statuses: Vec<(String, String, PlaytimeStatus)> = self
            .roster
            .players()
            .iter()
            .map(|p| {
                let status = role_status(
                    p.role,
                    self.roster.effective_total(p, now),
                    p.current_half_time,
                    now,
                );
                (p.player_id.clone(), p.name.clone(), status)
            })
            .collect();

        let mut alerts = Vec::new();
        for (id, name, status) in statuses {
            let prev = self.alert_latch.insert(id.clone(), status);
            if prev != Some(status) && status.is_alert() {
                alerts.push((id, name, status));
            }
        }
        TickEffects { alerts }
    }

    pub fn apply_start_clock(&mut self) -> Result<(), SessionError> {
        self.guard_not_finalized()?;
        if !self.clock.is_running() {
            self.clock.start();
            self.append(
                MatchEvent::new(MatchEventKind::Timer, self.clock.elapsed())
                    .describe("clock started"),
            );
        }
        Ok(())
    }

    pub fn apply_pause_clock(&mut self) -> Result<(), SessionError> {
        self.guard_not_finalized()?;
        if self.clock.is_running() {
            self.clock.pause();
            self.append(
                MatchEvent::new(MatchEventKind::Timer, self.clock.elapsed())
                    .describe("clock paused"),
            );
        }
        Ok(())
    }

    /// Full match reset: the one operation allowed to discard ledger
    /// entries. A single `Reset` entry survives so the remote store
    /// learns the session restarted.
    pub fn apply_reset(&mut self) {
        self.clock.reset();
        self.roster.reset();
        self.subs.cancel();
        self.scoreboard.reset();
        self.ledger.clear();
        self.finalized = false;
        self.pending_finalize = None;
        self.alert_latch.clear();
        self.append(MatchEvent::new(MatchEventKind::Reset, 0).describe("match reset"));
        tracing::info!("Match session reset");
    }

    pub fn apply_track_player(&mut self, entry: PlayerEntry) -> Result<(), SessionError> {
        self.guard_not_finalized()?;
        let now = self.clock.elapsed();
        let team_id = self.team_id_for(entry.team).to_string();
        let added = self.roster.add_player(entry, now)?;
        let event = MatchEvent::new(MatchEventKind::PlayerAdded, now)
            .with_player(Some(added.player_id.clone()), added.name.clone())
            .with_team(team_id);
        self.append(event);
        Ok(())
    }

    pub fn apply_untrack_player(&mut self, player_id: &str) -> Result<(), SessionError> {
        self.guard_not_finalized()?;
        let now = self.clock.elapsed();
        let removed = self.roster.remove_player(player_id)?;
        // A pending substitution referencing the removed player is stale.
        if self.subs.pending().is_some_and(|p| p.player_id == player_id) {
            self.subs.cancel();
        }
        let event = MatchEvent::new(MatchEventKind::PlayerRemoved, now)
            .with_player(Some(removed.player_id), removed.name)
            .with_team(self.team_id_for(removed.team).to_string());
        self.append(event);
        Ok(())
    }

    /// Route a player tap through the substitution coordinator, then
    /// perform whatever toggling it decided on.
    pub fn apply_toggle(&mut self, player_id: &str) -> Result<ToggleEffect, SessionError> {
        self.guard_not_finalized()?;
        let target = self
            .roster
            .get(player_id)
            .cloned()
            .ok_or_else(|| SessionError::NotTracked(player_id.to_string()))?;
        let now = self.clock.elapsed();

        match self.subs.tap(&target, now)? {
            TapOutcome::PendingRecorded(initiation) => Ok(ToggleEffect::Pending(initiation)),
            TapOutcome::Complete { incoming } => {
                self.roster.toggle(player_id, now)?;
                self.roster.toggle(&incoming.player_id, now)?;
                let event = MatchEvent::new(MatchEventKind::Other, now)
                    .with_player(Some(target.player_id.clone()), target.name.clone())
                    .with_team(self.team_id_for(target.team).to_string())
                    .describe(format!(
                        "substitution: {} on for {}",
                        incoming.player_name, target.name
                    ));
                self.append(event);
                Ok(ToggleEffect::Substitution {
                    outgoing_id: target.player_id,
                    outgoing_name: target.name,
                    incoming_id: incoming.player_id,
                    incoming_name: incoming.player_name,
                })
            }
            TapOutcome::Toggle | TapOutcome::ToggleClearedPending => {
                let out = self.roster.toggle(player_id, now)?;
                Ok(ToggleEffect::Toggled {
                    player_id: player_id.to_string(),
                    now_playing: out.now_playing,
                })
            }
        }
    }

    /// Record a goal. Returns the ledger id and the credited side
    /// (None when the team id matched neither fixture side; the entry
    /// is kept in the ledger and surfaces in the integrity report).
    pub fn apply_record_goal(
        &mut self,
        player_id: Option<String>,
        player_name: String,
        team_id: String,
        own_goal: bool,
    ) -> Result<(String, Option<TeamSide>), SessionError> {
        self.guard_not_finalized()?;
        let now = self.clock.elapsed();
        let event = MatchEvent::new(MatchEventKind::Goal, now)
            .with_player(player_id, player_name.clone())
            .with_team(team_id.clone())
            .own_goal(own_goal);

        if let Some(existing) = self.ledger.find_duplicate(&event) {
            return Err(SessionError::DuplicateEvent {
                kind: "goal".to_string(),
                player: player_name,
                time: existing.time,
            });
        }

        let credited = resolve_side(&team_id, &self.home, &self.away)
            .map(|side| if own_goal { side.opposite() } else { side });
        match credited {
            Some(side) => self.scoreboard.record_goal(side),
            None => {
                tracing::warn!(
                    team = %team_id,
                    "Goal with unrecognized team id, kept in the ledger but not scored"
                );
            }
        }

        let id = self.append(event);
        Ok((id, credited))
    }

    /// Decrement the scoreboard and leave a compensating audit entry;
    /// the ledger itself stays append-only.
    pub fn apply_remove_goal(&mut self, side: TeamSide) -> Result<(), SessionError> {
        self.guard_not_finalized()?;
        self.scoreboard.remove_goal(side);
        let now = self.clock.elapsed();
        let event = MatchEvent::new(MatchEventKind::Other, now)
            .with_team(self.team_id_for(side).to_string())
            .describe(format!("goal removed ({})", side));
        self.append(event);
        Ok(())
    }

    pub fn apply_record_assist(
        &mut self,
        player_id: Option<String>,
        player_name: String,
        team_id: String,
    ) -> Result<String, SessionError> {
        self.guard_not_finalized()?;
        let now = self.clock.elapsed();
        let event = MatchEvent::new(MatchEventKind::Assist, now)
            .with_player(player_id, player_name.clone())
            .with_team(team_id);

        if let Some(existing) = self.ledger.find_duplicate(&event) {
            return Err(SessionError::DuplicateEvent {
                kind: "assist".to_string(),
                player: player_name,
                time: existing.time,
            });
        }
        Ok(self.append(event))
    }

    pub fn apply_record_card(
        &mut self,
        player_id: Option<String>,
        player_name: String,
        team_id: String,
        kind: CardKind,
    ) -> Result<String, SessionError> {
        self.guard_not_finalized()?;
        let now = self.clock.elapsed();
        let event = MatchEvent::new(kind.event_kind(), now)
            .with_player(player_id, player_name)
            .with_team(team_id)
            .describe(kind.as_str());
        Ok(self.append(event))
    }

    /// Close the match locally: stop the clock, bank every open stint,
    /// and compute the member-stat increments for the final push.
    pub fn apply_finalize(&mut self) -> Result<Vec<MemberStatDelta>, SessionError> {
        self.guard_not_finalized()?;
        let now = self.clock.elapsed();
        self.clock.pause();
        self.roster.close_open_stints(now);
        self.subs.cancel();
        self.append(MatchEvent::new(MatchEventKind::Timer, now).describe("match finalized"));
        self.finalized = true;
        tracing::info!(
            home = self.scoreboard.home,
            away = self.scoreboard.away,
            "Match finalized"
        );
        Ok(self.member_deltas())
    }

    /// Aggregate per-member stat increments from the ledger and roster.
    /// Own goals are not credited to the scorer's tally.
    pub fn member_deltas(&self) -> Vec<MemberStatDelta> {
        let mut deltas: HashMap<String, MemberStatDelta> = HashMap::new();
        for event in self.ledger.events() {
            let Some(player_id) = &event.player_id else {
                continue;
            };
            let delta = deltas
                .entry(player_id.clone())
                .or_insert_with(|| MemberStatDelta {
                    member_id: player_id.clone(),
                    ..MemberStatDelta::default()
                });
            match event.kind {
                MatchEventKind::Goal if !event.is_own_goal => delta.goals += 1,
                MatchEventKind::Assist => delta.assists += 1,
                MatchEventKind::YellowCard => delta.yellow_cards += 1,
                MatchEventKind::RedCard => delta.red_cards += 1,
                _ => {}
            }
        }
        for player in self.roster.players() {
            let minutes = player.total_time / 60;
            if minutes > 0 {
                let delta = deltas
                    .entry(player.player_id.clone())
                    .or_insert_with(|| MemberStatDelta {
                        member_id: player.player_id.clone(),
                        ..MemberStatDelta::default()
                    });
                delta.minutes_played = minutes;
            }
        }
        deltas.into_values().collect()
    }

    /// Unsynced ledger entries as remote-store rows, in append order.
    pub fn unsynced_records(&self) -> Vec<MatchEventRecord> {
        self.ledger
            .unsynced()
            .into_iter()
            .map(|e| MatchEventRecord {
                id: e.id.clone(),
                fixture_id: self.fixture_id.clone(),
                kind: e.kind.as_str().to_string(),
                player_id: e.player_id.clone(),
                player_name: e.player_name.clone(),
                team_id: e.team_id.clone(),
                time: e.time,
                description: e.description.clone(),
                is_own_goal: e.is_own_goal,
            })
            .collect()
    }

    pub fn team_id_for(&self, side: TeamSide) -> &str {
        match side {
            TeamSide::Home => &self.home.id,
            TeamSide::Away => &self.away.id,
        }
    }

    fn guard_not_finalized(&self) -> Result<(), SessionError> {
        if self.finalized {
            Err(SessionError::AlreadyFinalized)
        } else {
            Ok(())
        }
    }

    /// Append and arm the sync debounce in one step: every new ledger
    /// entry is an unsynced change.
    fn append(&mut self, event: MatchEvent) -> String {
        let id = self.ledger.append(event).id.clone();
        self.sync.arm();
        id
    }
}
