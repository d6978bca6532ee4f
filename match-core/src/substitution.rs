//! Two-step substitution protocol.
//!
//! A substitution is two independent taps: one marks a player, the
//! second matches them with a partner. The coordinator is a single-slot
//! state machine (`Idle` or `Pending`), never a queue. A pending
//! record persists until it is completed, cancelled, or the match
//! session resets.

use serde::{Deserialize, Serialize};

use crate::roster::PlayerSession;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubError {
    #[error("a substitution is already pending for {0}")]
    AlreadyPending(String),
}

/// Which leg of the protocol opened the pending record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubInitiation {
    /// The incoming player was marked first.
    SubIn,
    /// The outgoing player was marked first.
    SubOut,
}

/// The armed half of a substitution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSubstitution {
    pub player_id: String,
    pub player_name: String,
    /// Clock seconds when the first leg was tapped.
    pub initiated_at: u32,
    pub initiation: SubInitiation,
}

/// What a tap resolved to. The caller owns the roster and performs any
/// toggles; the coordinator only decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TapOutcome {
    /// First leg recorded; do not toggle yet.
    PendingRecorded(SubInitiation),
    /// Matched pair: toggle the tapped player off and `incoming` on.
    /// The slot has been cleared.
    Complete { incoming: PendingSubstitution },
    /// Ordinary toggle, no substitution bookkeeping.
    Toggle,
    /// Ordinary toggle; the target's own stale pending record was
    /// discarded because its subject is changing sides of the line.
    ToggleClearedPending,
}

/// Single-slot substitution coordinator.
///
/// Slot invariants: a `SubIn` pending always refers to an off-field
/// player, a `SubOut` pending to an on-field player. Both are upheld
/// because every path that moves the pending player across the line
/// clears the slot first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubCoordinator {
    pending: Option<PendingSubstitution>,
}

impl SubCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pending(pending: Option<PendingSubstitution>) -> Self {
        Self { pending }
    }

    pub fn pending(&self) -> Option<&PendingSubstitution> {
        self.pending.as_ref()
    }

    /// Clear any pending record. Safe to call when none exists.
    pub fn cancel(&mut self) -> Option<PendingSubstitution> {
        self.pending.take()
    }

    /// Classify a tap on `target` and update the slot accordingly.
    ///
    /// The four-way classification:
    /// 1. off-field target with prior playtime, slot idle: arm `SubIn`;
    /// 2. on-field target with a `SubIn` armed: complete the pair;
    /// 3. on-field target with prior playtime, slot idle: arm `SubOut`;
    /// 4. anything else: plain toggle (a new player with no history
    ///    enters immediately, leaving any armed record untouched).
    ///
    /// A second initiation while the slot is occupied is rejected with
    /// [`SubError::AlreadyPending`]; tapping the subject of the armed
    /// record again discards it and falls back to a plain toggle.
    pub fn tap(&mut self, target: &PlayerSession, now: u32) -> Result<TapOutcome, SubError> {
        if target.is_playing {
            match self.pending.take() {
                Some(p) if p.initiation == SubInitiation::SubIn => {
                    Ok(TapOutcome::Complete { incoming: p })
                }
                Some(p) if p.player_id == target.player_id => {
                    Ok(TapOutcome::ToggleClearedPending)
                }
                Some(p) => {
                    let name = p.player_name.clone();
                    self.pending = Some(p);
                    Err(SubError::AlreadyPending(name))
                }
                None if target.total_time > 0 => Ok(TapOutcome::PendingRecorded(
                    self.arm(target, SubInitiation::SubOut, now),
                )),
                None => Ok(TapOutcome::Toggle),
            }
        } else {
            match self.pending.take() {
                Some(p) if p.player_id == target.player_id => {
                    Ok(TapOutcome::ToggleClearedPending)
                }
                Some(p) if target.total_time > 0 => {
                    let name = p.player_name.clone();
                    self.pending = Some(p);
                    Err(SubError::AlreadyPending(name))
                }
                // A fresh player enters immediately; an armed record for
                // someone else stays armed.
                Some(p) => {
                    self.pending = Some(p);
                    Ok(TapOutcome::Toggle)
                }
                None if target.total_time > 0 => Ok(TapOutcome::PendingRecorded(
                    self.arm(target, SubInitiation::SubIn, now),
                )),
                None => Ok(TapOutcome::Toggle),
            }
        }
    }

    fn arm(&mut self, target: &PlayerSession, initiation: SubInitiation, now: u32) -> SubInitiation {
        self.pending = Some(PendingSubstitution {
            player_id: target.player_id.clone(),
            player_name: target.name.clone(),
            initiated_at: now,
            initiation,
        });
        initiation
    }
}
