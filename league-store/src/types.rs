//! Row shapes for the hosted league backend's tables.
//!
//! These mirror the remote schema, so fields are wire-typed (string
//! ids, string event kinds). Domain enums live in `match-core`; the
//! session engine converts at the boundary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureStatus {
    Scheduled,
    Live,
    Finished,
}

/// One row of the fixtures table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRecord {
    pub id: String,
    pub home_team_id: String,
    pub home_team_name: String,
    pub away_team_id: String,
    pub away_team_name: String,
    pub home_score: u32,
    pub away_score: u32,
    pub status: FixtureStatus,
    /// Kickoff date/time as stored by the backend (ISO 8601 string).
    pub kickoff: String,
    pub venue: String,
}

/// Partial update for a fixture row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixturePatch {
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub status: Option<FixtureStatus>,
}

/// One row of the match-events table. `id` is generated by the client
/// and echoed back, which lets the store upsert instead of duplicating
/// when a batch is re-sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEventRecord {
    pub id: String,
    pub fixture_id: String,
    pub kind: String,
    pub player_id: Option<String>,
    pub player_name: String,
    pub team_id: String,
    pub time: u32,
    pub description: String,
    pub is_own_goal: bool,
}

/// One row of the members table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: String,
    pub name: String,
    pub role: String,
    pub goals: u32,
    pub assists: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub minutes_played: u32,
}

/// Cumulative-stat increments applied to a member row when a match is
/// finalized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberStatDelta {
    pub member_id: String,
    pub goals: u32,
    pub assists: u32,
    pub yellow_cards: u32,
    pub red_cards: u32,
    pub minutes_played: u32,
}

/// One row of the player-ratings table. Ratings are 0–10; the
/// constructor clamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRatingRecord {
    pub fixture_id: String,
    pub player_id: String,
    pub rater_id: String,
    pub rating: u8,
}

impl PlayerRatingRecord {
    pub fn new(
        fixture_id: impl Into<String>,
        player_id: impl Into<String>,
        rater_id: impl Into<String>,
        rating: u8,
    ) -> Self {
        Self {
            fixture_id: fixture_id.into(),
            player_id: player_id.into(),
            rater_id: rater_id.into(),
            rating: rating.min(10),
        }
    }
}

/// Change-feed notification for the match-events table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    EventInserted(MatchEventRecord),
    EventUpdated(MatchEventRecord),
    EventDeleted { id: String },
}
