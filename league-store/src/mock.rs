//! In-memory LeagueStore implementation for testing

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::{StoreError, StoreResult};
use crate::traits::LeagueStore;
use crate::types::*;

/// Mock store for testing - only compiled in test mode or with the
/// `mock` feature. Tables live in memory; `set_offline` makes every
/// call fail the way an unreachable backend would.
pub struct MockLeagueStore {
    fixtures: Mutex<HashMap<String, FixtureRecord>>,
    events: Mutex<HashMap<String, MatchEventRecord>>,
    members: Mutex<HashMap<String, MemberRecord>>,
    ratings: Mutex<HashMap<(String, String, String), PlayerRatingRecord>>,
    offline: AtomicBool,
    insert_calls: AtomicUsize,
    change_tx: broadcast::Sender<StoreChange>,
}

impl Default for MockLeagueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockLeagueStore {
    pub fn new() -> Self {
        let (change_tx, _) = broadcast::channel(64);
        Self {
            fixtures: Mutex::new(HashMap::new()),
            events: Mutex::new(HashMap::new()),
            members: Mutex::new(HashMap::new()),
            ratings: Mutex::new(HashMap::new()),
            offline: AtomicBool::new(false),
            insert_calls: AtomicUsize::new(0),
            change_tx,
        }
    }

    /// Seed a fixture row.
    pub fn with_fixture(self, fixture: FixtureRecord) -> Self {
        self.fixtures
            .lock()
            .unwrap()
            .insert(fixture.id.clone(), fixture);
        self
    }

    /// Seed a member row.
    pub fn with_member(self, member: MemberRecord) -> Self {
        self.members
            .lock()
            .unwrap()
            .insert(member.id.clone(), member);
        self
    }

    /// Toggle simulated connectivity loss.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `insert_match_events` calls that reached the store.
    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    /// Current contents of the match-events table, unordered.
    pub fn event_rows(&self) -> Vec<MatchEventRecord> {
        self.events.lock().unwrap().values().cloned().collect()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn member(&self, id: &str) -> Option<MemberRecord> {
        self.members.lock().unwrap().get(id).cloned()
    }

    pub fn rating(&self, fixture: &str, player: &str, rater: &str) -> Option<PlayerRatingRecord> {
        self.ratings
            .lock()
            .unwrap()
            .get(&(fixture.to_string(), player.to_string(), rater.to_string()))
            .cloned()
    }

    /// Simulate another client inserting an event row; subscribers see
    /// the change notification.
    pub fn push_remote_event(&self, event: MatchEventRecord) {
        self.events
            .lock()
            .unwrap()
            .insert(event.id.clone(), event.clone());
        let _ = self.change_tx.send(StoreChange::EventInserted(event));
    }

    fn check_online(&self, op: &str) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Offline(format!("{}: connection refused", op)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LeagueStore for MockLeagueStore {
    async fn fetch_fixture(&self, fixture_id: &str) -> StoreResult<FixtureRecord> {
        self.check_online("fetch_fixture")?;
        self.fixtures
            .lock()
            .unwrap()
            .get(fixture_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("fixture {}", fixture_id)))
    }

    async fn update_fixture(
        &self,
        fixture_id: &str,
        patch: FixturePatch,
    ) -> StoreResult<FixtureRecord> {
        self.check_online("update_fixture")?;
        let mut fixtures = self.fixtures.lock().unwrap();
        let fixture = fixtures
            .get_mut(fixture_id)
            .ok_or_else(|| StoreError::NotFound(format!("fixture {}", fixture_id)))?;
        if let Some(home) = patch.home_score {
            fixture.home_score = home;
        }
        if let Some(away) = patch.away_score {
            fixture.away_score = away;
        }
        if let Some(status) = patch.status {
            fixture.status = status;
        }
        Ok(fixture.clone())
    }

    async fn insert_match_events(&self, events: &[MatchEventRecord]) -> StoreResult<usize> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        self.check_online("insert_match_events")?;
        let mut table = self.events.lock().unwrap();
        let mut inserted = 0;
        for event in events {
            match table.insert(event.id.clone(), event.clone()) {
                None => {
                    inserted += 1;
                    let _ = self
                        .change_tx
                        .send(StoreChange::EventInserted(event.clone()));
                }
                Some(_) => {
                    // Upsert: an echoed id overwrites the existing row.
                    let _ = self.change_tx.send(StoreChange::EventUpdated(event.clone()));
                }
            }
        }
        Ok(inserted)
    }

    async fn fetch_match_events(&self, fixture_id: &str) -> StoreResult<Vec<MatchEventRecord>> {
        self.check_online("fetch_match_events")?;
        let mut rows: Vec<MatchEventRecord> = self
            .events
            .lock()
            .unwrap()
            .values()
            .filter(|e| e.fixture_id == fixture_id)
            .cloned()
            .collect();
        rows.sort_by_key(|e| e.time);
        Ok(rows)
    }

    async fn apply_member_stats(&self, deltas: &[MemberStatDelta]) -> StoreResult<()> {
        self.check_online("apply_member_stats")?;
        let mut members = self.members.lock().unwrap();
        for delta in deltas {
            let member = members.entry(delta.member_id.clone()).or_insert_with(|| {
                MemberRecord {
                    id: delta.member_id.clone(),
                    name: String::new(),
                    role: String::new(),
                    goals: 0,
                    assists: 0,
                    yellow_cards: 0,
                    red_cards: 0,
                    minutes_played: 0,
                }
            });
            member.goals += delta.goals;
            member.assists += delta.assists;
            member.yellow_cards += delta.yellow_cards;
            member.red_cards += delta.red_cards;
            member.minutes_played += delta.minutes_played;
        }
        Ok(())
    }

    async fn save_rating(&self, rating: &PlayerRatingRecord) -> StoreResult<()> {
        self.check_online("save_rating")?;
        let key = (
            rating.fixture_id.clone(),
            rating.player_id.clone(),
            rating.rater_id.clone(),
        );
        self.ratings.lock().unwrap().insert(key, rating.clone());
        Ok(())
    }

    async fn subscribe_match_events(
        &self,
        _fixture_id: &str,
    ) -> StoreResult<broadcast::Receiver<StoreChange>> {
        self.check_online("subscribe_match_events")?;
        Ok(self.change_tx.subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, fixture: &str, time: u32) -> MatchEventRecord {
        MatchEventRecord {
            id: id.to_string(),
            fixture_id: fixture.to_string(),
            kind: "goal".to_string(),
            player_id: Some("p1".to_string()),
            player_name: "Player 1".to_string(),
            team_id: "team-red".to_string(),
            time,
            description: String::new(),
            is_own_goal: false,
        }
    }

    #[tokio::test]
    async fn test_insert_is_idempotent_by_id() {
        let store = MockLeagueStore::new();
        let batch = vec![event("e1", "f1", 10), event("e2", "f1", 20)];

        assert_eq!(store.insert_match_events(&batch).await.unwrap(), 2);
        // Resending the same batch creates no new rows.
        assert_eq!(store.insert_match_events(&batch).await.unwrap(), 0);
        assert_eq!(store.event_count(), 2);
    }

    #[tokio::test]
    async fn test_offline_fails_without_losing_table_state() {
        let store = MockLeagueStore::new();
        store
            .insert_match_events(&[event("e1", "f1", 10)])
            .await
            .unwrap();

        store.set_offline(true);
        let err = store
            .insert_match_events(&[event("e2", "f1", 20)])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Offline(_)));
        assert_eq!(store.event_count(), 1);

        store.set_offline(false);
        store
            .insert_match_events(&[event("e2", "f1", 20)])
            .await
            .unwrap();
        assert_eq!(store.event_count(), 2);
    }

    #[tokio::test]
    async fn test_fetch_match_events_filters_and_sorts() {
        let store = MockLeagueStore::new();
        store
            .insert_match_events(&[
                event("e2", "f1", 300),
                event("e1", "f1", 100),
                event("e3", "other", 50),
            ])
            .await
            .unwrap();

        let rows = store.fetch_match_events("f1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "e1");
        assert_eq!(rows[1].id, "e2");
    }

    #[tokio::test]
    async fn test_member_stats_accumulate() {
        let store = MockLeagueStore::new().with_member(MemberRecord {
            id: "m1".to_string(),
            name: "Member 1".to_string(),
            role: "starter".to_string(),
            goals: 3,
            assists: 1,
            yellow_cards: 0,
            red_cards: 0,
            minutes_played: 90,
        });

        store
            .apply_member_stats(&[MemberStatDelta {
                member_id: "m1".to_string(),
                goals: 2,
                assists: 0,
                yellow_cards: 1,
                red_cards: 0,
                minutes_played: 40,
            }])
            .await
            .unwrap();

        let m = store.member("m1").unwrap();
        assert_eq!(m.goals, 5);
        assert_eq!(m.yellow_cards, 1);
        assert_eq!(m.minutes_played, 130);
    }

    #[tokio::test]
    async fn test_rating_replaced_per_rater() {
        let store = MockLeagueStore::new();
        store
            .save_rating(&PlayerRatingRecord::new("f1", "p1", "u1", 6))
            .await
            .unwrap();
        store
            .save_rating(&PlayerRatingRecord::new("f1", "p1", "u1", 8))
            .await
            .unwrap();

        assert_eq!(store.rating("f1", "p1", "u1").unwrap().rating, 8);
    }

    #[tokio::test]
    async fn test_change_feed_delivers_remote_inserts() {
        let store = MockLeagueStore::new();
        let mut rx = store.subscribe_match_events("f1").await.unwrap();

        store.push_remote_event(event("remote-1", "f1", 500));

        match rx.recv().await.unwrap() {
            StoreChange::EventInserted(e) => assert_eq!(e.id, "remote-1"),
            other => panic!("expected insert notification, got {:?}", other),
        }
    }
}
