use std::collections::HashSet;
use std::sync::Arc;

use league_store::{
    FixturePatch, FixtureStatus, LeagueStore, MatchEventRecord, PlayerRatingRecord, StoreChange,
};
use match_core::format_time;
use tokio::sync::{broadcast, mpsc};
use tokio::time;
use tracing::Instrument;

use super::commands::{SessionCommand, SessionError};
use super::events::SessionEvent;
use super::state::{SessionState, TickEffects, ToggleEffect};
use crate::persistence::now_timestamp;
use crate::sync::{PendingFinalize, SyncOutcome, SyncReport};

/// The main session actor loop.
/// Owns all mutable state. Processes commands, clock ticks, sync
/// completions and remote change notifications sequentially.
pub(crate) async fn run_session_actor(
    state: SessionState,
    store: Arc<dyn LeagueStore>,
    cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    let fixture_id = state.fixture_id.clone();
    run_session_actor_inner(state, store, cmd_rx, event_tx)
        .instrument(tracing::info_span!("session", fixture = %fixture_id))
        .await;
}

async fn run_session_actor_inner(
    mut state: SessionState,
    store: Arc<dyn LeagueStore>,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    event_tx: broadcast::Sender<SessionEvent>,
) {
    tracing::info!("Session actor started");

    // Spawned store calls report back on this channel.
    let (outcome_tx, mut outcome_rx) = mpsc::channel::<SyncOutcome>(8);

    let mut change_rx = match store.subscribe_match_events(&state.fixture_id).await {
        Ok(rx) => Some(rx),
        Err(e) => {
            tracing::warn!("Change feed unavailable: {}", e);
            None
        }
    };

    let mut tick_interval = time::interval(time::Duration::from_secs(1));
    tick_interval.set_missed_tick_behavior(time::MissedTickBehavior::Burst);

    let reconcile_period = state.sync.config().reconcile_interval;
    let mut reconcile_interval =
        time::interval_at(time::Instant::now() + reconcile_period, reconcile_period);
    reconcile_interval.set_missed_tick_behavior(time::MissedTickBehavior::Skip);

    // A resumed session may come back with entries still unsynced.
    if state.ledger.unsynced_count() > 0 {
        state.sync.arm();
    }

    loop {
        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(SessionCommand::Shutdown) | None => {
                        tracing::info!("Session actor shutting down");
                        break;
                    }
                    Some(cmd) => {
                        let was_running = state.clock.is_running();
                        handle_command(&mut state, cmd, &store, &outcome_tx, &event_tx);
                        // A freshly started clock must not replay ticks
                        // queued while it was paused.
                        if state.clock.is_running() && !was_running {
                            tick_interval.reset();
                        }
                    }
                }
            }

            Some(outcome) = outcome_rx.recv() => {
                apply_sync_outcome(&mut state, outcome, &event_tx);
                continue_sync(&mut state, &store, &outcome_tx);
            }

            _ = tick_interval.tick(), if state.clock.is_running() => {
                let TickEffects { alerts } = state.tick();
                let _ = event_tx.send(SessionEvent::ClockTick {
                    elapsed_seconds: state.clock.elapsed(),
                    display: format_time(state.clock.elapsed()),
                });
                for (player_id, player_name, status) in alerts {
                    tracing::info!(player = %player_name, ?status, "Playtime threshold crossed");
                    let _ = event_tx.send(SessionEvent::PlaytimeAlert {
                        player_id,
                        player_name,
                        status,
                    });
                }
            }

            _ = state.sync.wait_deadline(), if state.sync.deadline_armed() && !state.sync.is_syncing() => {
                tracing::debug!("Debounce window elapsed, pushing unsynced entries");
                start_push(&mut state, &store, &outcome_tx, None);
            }

            _ = reconcile_interval.tick(), if state.sync.auto_enabled() && !state.sync.is_syncing() => {
                tracing::debug!("Starting reconciliation sweep");
                start_reconcile(&mut state, &store, &outcome_tx);
            }

            Some(change) = next_change(&mut change_rx) => {
                handle_store_change(&mut state, change, &event_tx);
            }
        }
    }

    tracing::info!("Session actor exited");
}

fn handle_command(
    state: &mut SessionState,
    cmd: SessionCommand,
    store: &Arc<dyn LeagueStore>,
    outcome_tx: &mpsc::Sender<SyncOutcome>,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    match cmd {
        SessionCommand::StartClock { reply } => {
            let result = state.apply_start_clock().map(|_| state.snapshot());
            broadcast_ok(&result, event_tx);
            let _ = reply.send(result);
        }
        SessionCommand::PauseClock { reply } => {
            let result = state.apply_pause_clock().map(|_| state.snapshot());
            broadcast_ok(&result, event_tx);
            let _ = reply.send(result);
        }
        SessionCommand::ResetMatch { reply } => {
            state.apply_reset();
            let snap = state.snapshot();
            let _ = event_tx.send(SessionEvent::StateChanged(snap.clone()));
            let _ = reply.send(Ok(snap));
        }
        SessionCommand::TrackPlayer { entry, reply } => {
            let result = state.apply_track_player(entry).map(|_| state.snapshot());
            broadcast_ok(&result, event_tx);
            let _ = reply.send(result);
        }
        SessionCommand::UntrackPlayer { player_id, reply } => {
            let result = state
                .apply_untrack_player(&player_id)
                .map(|_| state.snapshot());
            broadcast_ok(&result, event_tx);
            let _ = reply.send(result);
        }
        SessionCommand::TogglePlayer { player_id, reply } => {
            match state.apply_toggle(&player_id) {
                Ok(effect) => {
                    if let ToggleEffect::Substitution {
                        outgoing_id,
                        outgoing_name,
                        incoming_id,
                        incoming_name,
                    } = effect
                    {
                        tracing::info!(
                            outgoing = %outgoing_name,
                            incoming = %incoming_name,
                            "Substitution completed"
                        );
                        let _ = event_tx.send(SessionEvent::SubstitutionCompleted {
                            outgoing_id,
                            outgoing_name,
                            incoming_id,
                            incoming_name,
                        });
                    }
                    let snap = state.snapshot();
                    let _ = event_tx.send(SessionEvent::StateChanged(snap.clone()));
                    let _ = reply.send(Ok(snap));
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            }
        }
        SessionCommand::CancelPendingSubstitution { reply } => {
            state.subs.cancel();
            let snap = state.snapshot();
            let _ = event_tx.send(SessionEvent::StateChanged(snap.clone()));
            let _ = reply.send(Ok(snap));
        }
        SessionCommand::RecordGoal {
            player_id,
            player_name,
            team_id,
            own_goal,
            reply,
        } => match state.apply_record_goal(player_id, player_name.clone(), team_id, own_goal) {
            Ok((event_id, side)) => {
                let _ = event_tx.send(SessionEvent::GoalRecorded {
                    event_id,
                    player_name,
                    side,
                    home_score: state.scoreboard.home,
                    away_score: state.scoreboard.away,
                });
                let snap = state.snapshot();
                let _ = event_tx.send(SessionEvent::StateChanged(snap.clone()));
                let _ = reply.send(Ok(snap));
            }
            Err(e) => {
                let _ = reply.send(Err(e));
            }
        },
        SessionCommand::RemoveGoal { side, reply } => {
            let result = state.apply_remove_goal(side).map(|_| state.snapshot());
            broadcast_ok(&result, event_tx);
            let _ = reply.send(result);
        }
        SessionCommand::RecordAssist {
            player_id,
            player_name,
            team_id,
            reply,
        } => {
            let result = state
                .apply_record_assist(player_id, player_name, team_id)
                .map(|_| state.snapshot());
            broadcast_ok(&result, event_tx);
            let _ = reply.send(result);
        }
        SessionCommand::RecordCard {
            player_id,
            player_name,
            team_id,
            kind,
            reply,
        } => match state.apply_record_card(player_id, player_name.clone(), team_id, kind) {
            Ok(event_id) => {
                let _ = event_tx.send(SessionEvent::CardIssued {
                    event_id,
                    player_name,
                    kind,
                });
                let snap = state.snapshot();
                let _ = event_tx.send(SessionEvent::StateChanged(snap.clone()));
                let _ = reply.send(Ok(snap));
            }
            Err(e) => {
                let _ = reply.send(Err(e));
            }
        },
        SessionCommand::SetAutoSync { enabled, reply } => {
            state.sync.set_auto(enabled);
            if enabled && state.ledger.unsynced_count() > 0 {
                state.sync.arm();
            }
            let snap = state.snapshot();
            let _ = event_tx.send(SessionEvent::StateChanged(snap.clone()));
            let _ = reply.send(Ok(snap));
        }
        SessionCommand::Flush { reply } => {
            if state.sync.is_syncing() {
                state.sync.add_waiter(reply);
            } else if state.ledger.unsynced_count() == 0 {
                let _ = reply.send(Ok(SyncReport {
                    pushed: 0,
                    timestamp: now_timestamp(),
                }));
            } else {
                state.sync.add_waiter(reply);
                start_push(state, store, outcome_tx, None);
            }
        }
        SessionCommand::Finalize { reply } => match state.apply_finalize() {
            Ok(deltas) => {
                let finalize = PendingFinalize {
                    patch: FixturePatch {
                        home_score: Some(state.scoreboard.home),
                        away_score: Some(state.scoreboard.away),
                        status: Some(FixtureStatus::Finished),
                    },
                    deltas,
                };
                if state.sync.is_syncing() {
                    state.pending_finalize = Some(finalize);
                } else {
                    start_push(state, store, outcome_tx, Some(finalize));
                }
                let snap = state.snapshot();
                let _ = event_tx.send(SessionEvent::StateChanged(snap.clone()));
                let _ = reply.send(Ok(snap));
            }
            Err(e) => {
                let _ = reply.send(Err(e));
            }
        },
        SessionCommand::RateMember {
            player_id,
            rater_id,
            rating,
            reply,
        } => {
            let record =
                PlayerRatingRecord::new(state.fixture_id.clone(), player_id, rater_id, rating);
            let store = store.clone();
            tokio::spawn(async move {
                let result = store
                    .save_rating(&record)
                    .await
                    .map_err(|e| SessionError::SyncFailed(e.to_string()));
                let _ = reply.send(result);
            });
        }
        SessionCommand::GetSnapshot { reply } => {
            let _ = reply.send(state.snapshot());
        }
        SessionCommand::GetIntegrityReport { reply } => {
            let _ = reply.send(state.integrity_report());
        }
        SessionCommand::Suspend { reply } => {
            let _ = reply.send(state.export_suspended());
        }
        SessionCommand::Subscribe { reply } => {
            let snapshot = state.snapshot();
            let rx = event_tx.subscribe();
            let _ = reply.send((snapshot, rx));
        }
        SessionCommand::Shutdown => unreachable!(),
    }
}

fn broadcast_ok(
    result: &Result<super::snapshot::SessionSnapshot, SessionError>,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    if let Ok(snap) = result {
        let _ = event_tx.send(SessionEvent::StateChanged(snap.clone()));
    }
}

/// Snapshot the unsynced entries and spawn the store call. New appends
/// while the call is in flight simply stay unsynced for the next cycle.
fn start_push(
    state: &mut SessionState,
    store: &Arc<dyn LeagueStore>,
    outcome_tx: &mpsc::Sender<SyncOutcome>,
    finalize: Option<PendingFinalize>,
) {
    let records = state.unsynced_records();
    if records.is_empty() && finalize.is_none() {
        state.sync.disarm();
        state.sync.notify_waiters(Ok(SyncReport {
            pushed: 0,
            timestamp: now_timestamp(),
        }));
        return;
    }

    let event_ids: Vec<String> = records.iter().map(|r| r.id.clone()).collect();
    state.sync.begin();

    let fixture_id = state.fixture_id.clone();
    let store = store.clone();
    let tx = outcome_tx.clone();
    tokio::spawn(async move {
        let result = push_batch(store, fixture_id, records, finalize).await;
        let _ = tx.send(SyncOutcome::Push { event_ids, result }).await;
    });
}

async fn push_batch(
    store: Arc<dyn LeagueStore>,
    fixture_id: String,
    records: Vec<MatchEventRecord>,
    finalize: Option<PendingFinalize>,
) -> Result<usize, league_store::StoreError> {
    let mut inserted = 0;
    if !records.is_empty() {
        inserted = store.insert_match_events(&records).await?;
    }
    if let Some(finalize) = finalize {
        store.update_fixture(&fixture_id, finalize.patch).await?;
        if !finalize.deltas.is_empty() {
            store.apply_member_stats(&finalize.deltas).await?;
        }
    }
    Ok(inserted)
}

fn start_reconcile(
    state: &mut SessionState,
    store: &Arc<dyn LeagueStore>,
    outcome_tx: &mpsc::Sender<SyncOutcome>,
) {
    state.sync.begin();
    let fixture_id = state.fixture_id.clone();
    let store = store.clone();
    let tx = outcome_tx.clone();
    tokio::spawn(async move {
        let result = store.fetch_match_events(&fixture_id).await;
        let _ = tx.send(SyncOutcome::Reconcile { result }).await;
    });
}

fn apply_sync_outcome(
    state: &mut SessionState,
    outcome: SyncOutcome,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    state.sync.end();
    match outcome {
        SyncOutcome::Push { event_ids, result } => match result {
            Ok(_) => {
                state.ledger.mark_synced(&event_ids);
                let report = SyncReport {
                    pushed: event_ids.len(),
                    timestamp: now_timestamp(),
                };
                state.sync.complete_ok(report.timestamp);
                state.sync.notify_waiters(Ok(report));
                tracing::info!(pushed = event_ids.len(), "Sync batch landed");
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!("Sync failed: {}", message);
                state.sync.record_error(message.clone());
                state
                    .sync
                    .notify_waiters(Err(SessionError::SyncFailed(message)));
            }
        },
        SyncOutcome::Reconcile { result } => match result {
            Ok(remote_rows) => {
                let remote_ids: HashSet<&str> =
                    remote_rows.iter().map(|r| r.id.as_str()).collect();
                let already_there: Vec<String> = state
                    .ledger
                    .unsynced()
                    .into_iter()
                    .filter(|e| remote_ids.contains(e.id.as_str()))
                    .map(|e| e.id.clone())
                    .collect();
                if !already_there.is_empty() {
                    tracing::debug!(
                        count = already_there.len(),
                        "Reconcile confirmed entries already stored remotely"
                    );
                    state.ledger.mark_synced(&already_there);
                }

                let local_ids: HashSet<&str> =
                    state.ledger.events().iter().map(|e| e.id.as_str()).collect();
                state.remote_only_events = remote_rows
                    .iter()
                    .filter(|r| !local_ids.contains(r.id.as_str()))
                    .count();
            }
            Err(e) => {
                tracing::debug!("Reconcile sweep failed: {}", e);
            }
        },
    }
    let _ = event_tx.send(SessionEvent::SyncStatus(
        state.sync.to_snapshot(state.ledger.unsynced_count()),
    ));
}

/// After a completed store call: flush anything still owed, or re-arm
/// the debounce for entries appended mid-flight.
fn continue_sync(
    state: &mut SessionState,
    store: &Arc<dyn LeagueStore>,
    outcome_tx: &mpsc::Sender<SyncOutcome>,
) {
    if let Some(finalize) = state.pending_finalize.take() {
        start_push(state, store, outcome_tx, Some(finalize));
    } else if state.sync.has_waiters() && state.ledger.unsynced_count() > 0 {
        start_push(state, store, outcome_tx, None);
    } else if state.ledger.unsynced_count() > 0 {
        state.sync.arm();
    }
}

fn handle_store_change(
    state: &mut SessionState,
    change: StoreChange,
    event_tx: &broadcast::Sender<SessionEvent>,
) {
    let StoreChange::EventInserted(record) = change else {
        return;
    };
    if record.fixture_id != state.fixture_id {
        return;
    }
    let known = state.ledger.events().iter().any(|e| e.id == record.id);
    if known {
        return;
    }
    state.remote_only_events += 1;
    let unassigned_goal = match_core::MatchEventKind::parse(&record.kind)
        == match_core::MatchEventKind::Goal
        && record.player_id.is_none();
    if unassigned_goal {
        tracing::warn!(event = %record.id, "Unassigned goal recorded by another client");
    }
    let _ = event_tx.send(SessionEvent::RemoteChange {
        event_id: record.id,
        unassigned_goal,
    });
}

async fn next_change(
    rx: &mut Option<broadcast::Receiver<StoreChange>>,
) -> Option<StoreChange> {
    match rx.as_mut() {
        Some(receiver) => match receiver.recv().await {
            Ok(change) => Some(change),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Change feed lagged");
                None
            }
            Err(broadcast::error::RecvError::Closed) => {
                *rx = None;
                None
            }
        },
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::commands::CardKind;
    use crate::sync::SyncConfig;
    use league_store::{FixtureRecord, FixtureStatus, MockLeagueStore};
    use match_core::{PlayerEntry, PlayerRole, TeamRef, TeamSide};
    use std::time::Duration;

    fn fixture() -> FixtureRecord {
        FixtureRecord {
            id: "fx-1".to_string(),
            home_team_id: "team-red".to_string(),
            home_team_name: "Red Lions".to_string(),
            away_team_id: "team-blue".to_string(),
            away_team_name: "Blue Rovers".to_string(),
            home_score: 0,
            away_score: 0,
            status: FixtureStatus::Live,
            kickoff: "2026-08-01T10:00:00Z".to_string(),
            venue: "Pitch 2".to_string(),
        }
    }

    fn entry(id: &str, team: TeamSide, role: PlayerRole) -> PlayerEntry {
        PlayerEntry {
            player_id: id.to_string(),
            name: format!("Player {}", id),
            team,
            role,
        }
    }

    async fn spawn_test_actor(
        store: Arc<MockLeagueStore>,
    ) -> (
        super::super::handle::SessionHandle,
        broadcast::Receiver<SessionEvent>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let (event_tx, event_rx) = broadcast::channel(100);
        let state = SessionState::new(
            "fx-1".to_string(),
            TeamRef::new("team-red", "Red Lions"),
            TeamRef::new("team-blue", "Blue Rovers"),
            SyncConfig::default(),
        );
        let store: Arc<dyn LeagueStore> = store;
        tokio::spawn(run_session_actor(state, store, cmd_rx, event_tx.clone()));
        let handle = super::super::handle::SessionHandle::new("fx-1".to_string(), cmd_tx);
        (handle, event_rx)
    }

    #[tokio::test]
    async fn test_goal_via_actor_updates_score() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, mut events) = spawn_test_actor(store).await;

        let snap = handle
            .record_goal(Some("p1".to_string()), "Player p1", "team-red", false)
            .await
            .unwrap();
        assert_eq!(snap.home_score, 1);
        assert_eq!(snap.event_count, 1);

        let event = events.recv().await.unwrap();
        assert!(matches!(event, SessionEvent::GoalRecorded { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_goal_rejected_via_actor() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, _) = spawn_test_actor(store).await;

        handle
            .record_goal(Some("p1".to_string()), "Player p1", "team-red", false)
            .await
            .unwrap();
        let err = handle
            .record_goal(Some("p1".to_string()), "Player p1", "team-red", false)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::DuplicateEvent { .. }));

        let snap = handle.get_snapshot().await.unwrap();
        assert_eq!(snap.home_score, 1);
        assert_eq!(snap.event_count, 1);
    }

    #[tokio::test]
    async fn test_flush_pushes_batch_and_marks_synced() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, _) = spawn_test_actor(store.clone()).await;

        handle
            .record_goal(Some("p1".to_string()), "Player p1", "team-red", false)
            .await
            .unwrap();
        handle
            .record_card(Some("p2".to_string()), "Player p2", "team-blue", CardKind::Yellow)
            .await
            .unwrap();

        let report = handle.flush().await.unwrap();
        assert_eq!(report.pushed, 2);
        assert_eq!(store.event_count(), 2);

        let snap = handle.get_snapshot().await.unwrap();
        assert_eq!(snap.sync.pending_changes, 0);
        assert!(snap.sync.last_sync_timestamp.is_some());
    }

    #[tokio::test]
    async fn test_flush_twice_is_idempotent_remotely() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, _) = spawn_test_actor(store.clone()).await;

        handle
            .record_goal(Some("p1".to_string()), "Player p1", "team-red", false)
            .await
            .unwrap();

        handle.flush().await.unwrap();
        let report = handle.flush().await.unwrap();
        assert_eq!(report.pushed, 0);
        assert_eq!(store.event_count(), 1);
    }

    #[tokio::test]
    async fn test_offline_flush_records_error_and_recovers() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, _) = spawn_test_actor(store.clone()).await;

        handle
            .record_goal(Some("p1".to_string()), "Player p1", "team-red", false)
            .await
            .unwrap();

        store.set_offline(true);
        let err = handle.flush().await.unwrap_err();
        assert!(matches!(err, SessionError::SyncFailed(_)));

        let snap = handle.get_snapshot().await.unwrap();
        assert_eq!(snap.sync.pending_changes, 1);
        assert_eq!(snap.sync.sync_errors.len(), 1);

        // Connectivity restored: the same entries land in one batch.
        store.set_offline(false);
        let report = handle.flush().await.unwrap();
        assert_eq!(report.pushed, 1);
        assert_eq!(store.event_count(), 1);

        let snap = handle.get_snapshot().await.unwrap();
        assert_eq!(snap.sync.pending_changes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_auto_sync_fires_within_one_debounce_window() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, _) = spawn_test_actor(store.clone()).await;

        handle
            .record_goal(Some("p1".to_string()), "Player p1", "team-red", false)
            .await
            .unwrap();
        // A second change shortly after must not push the deadline back.
        tokio::time::advance(Duration::from_secs(3)).await;
        handle
            .record_goal(Some("p2".to_string()), "Player p2", "team-blue", false)
            .await
            .unwrap();

        assert_eq!(store.insert_calls(), 0);
        tokio::time::advance(Duration::from_secs(3)).await;
        for _ in 0..20 {
            tokio::task::yield_now().await;
        }

        // One batch, both entries, within the first window.
        assert_eq!(store.insert_calls(), 1);
        assert_eq!(store.event_count(), 2);
    }

    #[tokio::test]
    async fn test_toggle_without_history_is_plain() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, _) = spawn_test_actor(store).await;

        handle
            .track_player(entry("in", TeamSide::Home, PlayerRole::Other))
            .await
            .unwrap();

        // Clock never ran, so "in" has no banked time: both toggles are
        // plain flips, never substitution legs.
        handle.toggle_player("in").await.unwrap();
        let snap = handle.toggle_player("in").await.unwrap();
        assert!(snap.player("in").unwrap().is_playing);
        assert!(snap.pending_substitution.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_substitution_completed_broadcast() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, mut events) = spawn_test_actor(store).await;

        handle.start_clock().await.unwrap();
        handle
            .track_player(entry("out", TeamSide::Home, PlayerRole::Other))
            .await
            .unwrap();
        handle
            .track_player(entry("in", TeamSide::Home, PlayerRole::Other))
            .await
            .unwrap();

        // Let a minute of match clock tick through the actor.
        tokio::time::advance(Duration::from_secs(60)).await;
        for _ in 0..70 {
            tokio::task::yield_now().await;
        }
        let snap = handle.get_snapshot().await.unwrap();
        assert!(snap.elapsed_seconds >= 60);

        // "in" leaves with banked time, then taps back: first leg.
        handle.toggle_player("in").await.unwrap();
        let snap = handle.toggle_player("in").await.unwrap();
        assert!(snap.pending_substitution.is_some());

        // Tapping the on-field "out" completes the pair.
        let snap = handle.toggle_player("out").await.unwrap();
        assert!(snap.pending_substitution.is_none());
        assert!(!snap.player("out").unwrap().is_playing);
        assert!(snap.player("in").unwrap().is_playing);

        loop {
            match events.recv().await.unwrap() {
                SessionEvent::SubstitutionCompleted {
                    outgoing_id,
                    incoming_id,
                    ..
                } => {
                    assert_eq!(outgoing_id, "out");
                    assert_eq!(incoming_id, "in");
                    break;
                }
                _ => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_finalize_pushes_score_and_member_stats() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, _) = spawn_test_actor(store.clone()).await;

        handle
            .track_player(entry("p1", TeamSide::Home, PlayerRole::Starter))
            .await
            .unwrap();
        handle
            .record_goal(Some("p1".to_string()), "Player p1", "team-red", false)
            .await
            .unwrap();

        let snap = handle.finalize().await.unwrap();
        assert!(snap.finalized);

        // Wait for the finalize push to land.
        handle.flush().await.unwrap();

        let fx = store.fetch_fixture("fx-1").await.unwrap();
        assert_eq!(fx.home_score, 1);
        assert_eq!(fx.status, FixtureStatus::Finished);
        assert_eq!(store.member("p1").unwrap().goals, 1);

        // Post-finalize mutations are refused.
        let err = handle
            .record_goal(Some("p9".to_string()), "Player p9", "team-red", false)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyFinalized));
    }

    #[tokio::test]
    async fn test_remote_change_raises_unassigned_goal_alert() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, mut events) = spawn_test_actor(store.clone()).await;

        // Make sure the actor has subscribed before pushing.
        handle.get_snapshot().await.unwrap();

        store.push_remote_event(MatchEventRecord {
            id: "remote-1".to_string(),
            fixture_id: "fx-1".to_string(),
            kind: "goal".to_string(),
            player_id: None,
            player_name: String::new(),
            team_id: "team-red".to_string(),
            time: 480,
            description: String::new(),
            is_own_goal: false,
        });

        loop {
            match events.recv().await.unwrap() {
                SessionEvent::RemoteChange {
                    event_id,
                    unassigned_goal,
                } => {
                    assert_eq!(event_id, "remote-1");
                    assert!(unassigned_goal);
                    break;
                }
                _ => continue,
            }
        }

        let report = handle.get_integrity_report().await.unwrap();
        assert_eq!(report.remote_only_events, 1);
    }

    #[tokio::test]
    async fn test_rate_member_stored() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, _) = spawn_test_actor(store.clone()).await;

        handle.rate_member("p1", "rater-9", 8).await.unwrap();
        assert_eq!(store.rating("fx-1", "p1", "rater-9").unwrap().rating, 8);
    }

    #[tokio::test]
    async fn test_shutdown() {
        let store = Arc::new(MockLeagueStore::new().with_fixture(fixture()));
        let (handle, _) = spawn_test_actor(store).await;
        handle.shutdown().await;
        assert!(handle.get_snapshot().await.is_err());
    }
}
