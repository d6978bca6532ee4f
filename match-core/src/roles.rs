//! Role-based playtime rules.
//!
//! Pure queries over accumulated time; nothing here mutates state or
//! blocks an action. A referee can always keep recording; limits are
//! advisory and surfaced through [`Severity`].

use crate::types::{
    PlayerRole, MATCH_DURATION_SECS, SCLASS_HALF_CAP_SECS, SCLASS_WARNING_SECS,
    STARTER_MIN_TOTAL_SECS, STARTER_URGENCY_WINDOW_SECS,
};
use serde::{Deserialize, Serialize};

/// Playtime standing for one player under their role's rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaytimeStatus {
    /// S-class: under the warning threshold.
    WithinLimit,
    /// S-class: within two minutes of the per-half cap.
    ApproachingLimit,
    /// S-class: at or over the per-half cap.
    AtLimit,
    /// Starter: the 10-minute minimum has been met.
    MinimumMet,
    /// Starter: minimum unmet with under five minutes of match left.
    NeedsTime,
    /// Starter: minimum unmet, but there is still time.
    InProgress,
    /// Captain or unrecognized role: unrestricted.
    NoLimits,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Ok,
    Warning,
    Error,
}

impl PlaytimeStatus {
    pub fn severity(self) -> Severity {
        match self {
            Self::WithinLimit | Self::MinimumMet => Severity::Ok,
            Self::ApproachingLimit | Self::NeedsTime => Severity::Warning,
            Self::AtLimit => Severity::Error,
            Self::InProgress | Self::NoLimits => Severity::Info,
        }
    }

    /// True for the statuses worth pushing at the referee unprompted.
    pub fn is_alert(self) -> bool {
        matches!(
            self,
            Self::ApproachingLimit | Self::AtLimit | Self::NeedsTime
        )
    }
}

/// Classify a player's playtime standing.
///
/// `total_secs` should include the currently open stint; callers that
/// track open stints separately must add them in first (see
/// `RosterTracker::effective_total`).
pub fn role_status(
    role: PlayerRole,
    total_secs: u32,
    current_half_secs: u32,
    match_secs: u32,
) -> PlaytimeStatus {
    match role {
        PlayerRole::SClass => {
            if current_half_secs >= SCLASS_HALF_CAP_SECS {
                PlaytimeStatus::AtLimit
            } else if current_half_secs >= SCLASS_WARNING_SECS {
                PlaytimeStatus::ApproachingLimit
            } else {
                PlaytimeStatus::WithinLimit
            }
        }
        PlayerRole::Starter => {
            if total_secs >= STARTER_MIN_TOTAL_SECS {
                PlaytimeStatus::MinimumMet
            } else if MATCH_DURATION_SECS.saturating_sub(match_secs) <= STARTER_URGENCY_WINDOW_SECS
            {
                PlaytimeStatus::NeedsTime
            } else {
                PlaytimeStatus::InProgress
            }
        }
        PlayerRole::Captain | PlayerRole::Other => PlaytimeStatus::NoLimits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sclass_thresholds() {
        assert_eq!(
            role_status(PlayerRole::SClass, 0, 1079, 1200),
            PlaytimeStatus::WithinLimit
        );
        assert_eq!(
            role_status(PlayerRole::SClass, 0, 1080, 1200),
            PlaytimeStatus::ApproachingLimit
        );
        assert_eq!(
            role_status(PlayerRole::SClass, 0, 1200, 1300),
            PlaytimeStatus::AtLimit
        );
    }

    #[test]
    fn test_starter_minimum_met() {
        assert_eq!(
            role_status(PlayerRole::Starter, 600, 0, 100),
            PlaytimeStatus::MinimumMet
        );
    }

    #[test]
    fn test_starter_needs_time_only_near_full_time() {
        // 540s played, 45:00 on the match clock: the urgency window opens.
        assert_eq!(
            role_status(PlayerRole::Starter, 540, 0, 2700),
            PlaytimeStatus::NeedsTime
        );
        // Same total earlier in the match is merely in progress.
        assert_eq!(
            role_status(PlayerRole::Starter, 540, 0, 2000),
            PlaytimeStatus::InProgress
        );
        assert_eq!(
            role_status(PlayerRole::Starter, 540, 0, 2699),
            PlaytimeStatus::InProgress
        );
    }

    #[test]
    fn test_captain_and_other_unrestricted() {
        assert_eq!(
            role_status(PlayerRole::Captain, 9999, 9999, 9999),
            PlaytimeStatus::NoLimits
        );
        assert_eq!(
            role_status(PlayerRole::Other, 0, 0, 0),
            PlaytimeStatus::NoLimits
        );
    }

    #[test]
    fn test_severity_mapping() {
        assert_eq!(PlaytimeStatus::AtLimit.severity(), Severity::Error);
        assert_eq!(
            PlaytimeStatus::ApproachingLimit.severity(),
            Severity::Warning
        );
        assert_eq!(PlaytimeStatus::MinimumMet.severity(), Severity::Ok);
        assert_eq!(PlaytimeStatus::NoLimits.severity(), Severity::Info);
        assert!(PlaytimeStatus::AtLimit.is_alert());
        assert!(!PlaytimeStatus::WithinLimit.is_alert());
    }
}
