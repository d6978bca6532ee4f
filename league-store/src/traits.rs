//! LeagueStore trait abstraction over the hosted backend.
//!
//! Implemented by the production HTTP client (owned by the application
//! shell, out of this workspace) and by `MockLeagueStore` for tests.

use crate::error::StoreResult;
use crate::types::*;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Remote store of record for league data.
///
/// The engine holds this behind `Arc<dyn LeagueStore>`; methods take
/// `&self` and implementations are responsible for their own interior
/// synchronization.
#[async_trait]
pub trait LeagueStore: Send + Sync {
    /// Fetch one fixture row.
    async fn fetch_fixture(&self, fixture_id: &str) -> StoreResult<FixtureRecord>;

    /// Patch a fixture row, returning the updated record.
    async fn update_fixture(
        &self,
        fixture_id: &str,
        patch: FixturePatch,
    ) -> StoreResult<FixtureRecord>;

    /// Upsert a batch of match events keyed by client-generated id.
    ///
    /// Re-sending rows that already exist must update in place rather
    /// than duplicate; the sync engine relies on this for retries.
    /// Returns the number of rows that were newly inserted.
    async fn insert_match_events(&self, events: &[MatchEventRecord]) -> StoreResult<usize>;

    /// All stored events for one fixture.
    async fn fetch_match_events(&self, fixture_id: &str) -> StoreResult<Vec<MatchEventRecord>>;

    /// Apply cumulative stat increments to member rows.
    async fn apply_member_stats(&self, deltas: &[MemberStatDelta]) -> StoreResult<()>;

    /// Store a player rating, replacing any previous rating by the same
    /// rater for the same fixture/player pair.
    async fn save_rating(&self, rating: &PlayerRatingRecord) -> StoreResult<()>;

    /// Subscribe to insert/update/delete notifications for a fixture's
    /// match events (used to notice rows created by other clients).
    async fn subscribe_match_events(
        &self,
        fixture_id: &str,
    ) -> StoreResult<broadcast::Receiver<StoreChange>>;
}
