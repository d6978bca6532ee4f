//! Canonical team and role types for the project.
//! Remote-store row shapes are owned by the `league-store` crate; these
//! are the in-session representations.

use serde::{Deserialize, Serialize};

/// Full match length for a 7-a-side fixture: 50 minutes.
pub const MATCH_DURATION_SECS: u32 = 3000;

/// One half: 25 minutes.
pub const HALF_DURATION_SECS: u32 = 1500;

/// S-class players may not exceed 20 minutes per half.
pub const SCLASS_HALF_CAP_SECS: u32 = 1200;

/// Warning threshold for S-class players: 18 minutes into the half cap.
pub const SCLASS_WARNING_SECS: u32 = 1080;

/// Starters must accumulate at least 10 minutes over the match.
pub const STARTER_MIN_TOTAL_SECS: u32 = 600;

/// With less than 5 minutes left, an unmet starter minimum becomes urgent.
pub const STARTER_URGENCY_WINDOW_SECS: u32 = 300;

/// Target on-field count per team.
pub const TARGET_FIELD_PLAYERS: usize = 7;

/// Which side of the fixture a player belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamSide {
    Home,
    Away,
}

impl TeamSide {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Away => "away",
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }
}

impl std::fmt::Display for TeamSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Playtime rule class for a rostered player.
///
/// Unrecognized role strings from the members table map to `Other`,
/// which carries no playtime restrictions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerRole {
    Captain,
    SClass,
    Starter,
    Other,
}

impl PlayerRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Captain => "captain",
            Self::SClass => "s-class",
            Self::Starter => "starter",
            Self::Other => "other",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "captain" => Self::Captain,
            "s-class" | "sclass" => Self::SClass,
            "starter" => Self::Starter,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for PlayerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identifies one side of a fixture for score attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: String,
    pub name: String,
}

impl TeamRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}
