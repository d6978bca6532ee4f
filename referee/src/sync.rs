//! Debounce scheduling and bookkeeping for the sync engine.
//!
//! The actual store calls are spawned by the session actor; this module
//! owns the timing policy and status the actor consults. The debounce
//! is leading-edge: the first unsynced change arms a deadline and later
//! changes never push it back, so a sync attempt is guaranteed within
//! one window of the first change.

use std::collections::VecDeque;
use std::time::Duration;

use league_store::{FixturePatch, MatchEventRecord, MemberStatDelta, StoreError};
use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::session::commands::SessionError;

/// Tuning for the sync engine.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Delay between the first unsynced change and the push attempt.
    pub debounce: Duration,
    /// Cadence of the full-table reconciliation sweep.
    pub reconcile_interval: Duration,
    /// Most-recent errors retained for the status display.
    pub max_errors: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(5),
            reconcile_interval: Duration::from_secs(300),
            max_errors: 10,
        }
    }
}

/// Result of a completed push, reported to manual flush callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries whose `synced` flag was flipped by this push.
    pub pushed: usize,
    pub timestamp: u64,
}

/// Sync status as exposed in session snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSnapshot {
    pub is_syncing: bool,
    pub last_sync_timestamp: Option<u64>,
    pub sync_errors: Vec<String>,
    pub pending_changes: usize,
    pub auto_sync_enabled: bool,
}

/// Completion message from a spawned store call back to the actor.
#[derive(Debug)]
pub enum SyncOutcome {
    Push {
        /// Ids of the entries the batch contained.
        event_ids: Vec<String>,
        result: Result<usize, StoreError>,
    },
    Reconcile {
        result: Result<Vec<MatchEventRecord>, StoreError>,
    },
}

/// Fixture/member writes queued behind an in-flight push at finalize
/// time, sent with the next batch.
#[derive(Debug, Clone)]
pub struct PendingFinalize {
    pub patch: FixturePatch,
    pub deltas: Vec<MemberStatDelta>,
}

/// Per-session sync state. Owned by the actor alongside the ledger;
/// never shared.
pub struct SyncController {
    config: SyncConfig,
    auto_enabled: bool,
    is_syncing: bool,
    deadline: Option<Instant>,
    last_sync_timestamp: Option<u64>,
    errors: VecDeque<String>,
    flush_waiters: Vec<oneshot::Sender<Result<SyncReport, SessionError>>>,
}

impl SyncController {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            auto_enabled: true,
            is_syncing: false,
            deadline: None,
            last_sync_timestamp: None,
            errors: VecDeque::new(),
            flush_waiters: Vec::new(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Arm the debounce deadline for a new unsynced change.
    /// Leading-edge: a deadline that is already armed stays put.
    pub fn arm(&mut self) {
        if self.auto_enabled && !self.is_syncing && self.deadline.is_none() {
            self.deadline = Some(Instant::now() + self.config.debounce);
        }
    }

    pub fn disarm(&mut self) {
        self.deadline = None;
    }

    pub fn deadline_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Sleep until the armed deadline; pends forever when disarmed so
    /// the actor's select branch stays quiet.
    pub async fn wait_deadline(&self) {
        match self.deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }

    pub fn set_auto(&mut self, enabled: bool) {
        self.auto_enabled = enabled;
        if !enabled {
            self.deadline = None;
        }
    }

    pub fn auto_enabled(&self) -> bool {
        self.auto_enabled
    }

    /// Mark a store call in flight and clear the deadline.
    pub fn begin(&mut self) {
        self.is_syncing = true;
        self.deadline = None;
    }

    pub fn end(&mut self) {
        self.is_syncing = false;
    }

    pub fn is_syncing(&self) -> bool {
        self.is_syncing
    }

    pub fn complete_ok(&mut self, timestamp: u64) {
        self.last_sync_timestamp = Some(timestamp);
    }

    pub fn last_sync_timestamp(&self) -> Option<u64> {
        self.last_sync_timestamp
    }

    /// Record a failure, keeping only the most recent `max_errors`.
    pub fn record_error(&mut self, message: String) {
        self.errors.push_back(message);
        while self.errors.len() > self.config.max_errors {
            self.errors.pop_front();
        }
    }

    pub fn add_waiter(&mut self, waiter: oneshot::Sender<Result<SyncReport, SessionError>>) {
        self.flush_waiters.push(waiter);
    }

    pub fn has_waiters(&self) -> bool {
        !self.flush_waiters.is_empty()
    }

    /// Resolve every pending manual flush with the same result.
    pub fn notify_waiters(&mut self, result: Result<SyncReport, SessionError>) {
        for waiter in self.flush_waiters.drain(..) {
            let _ = waiter.send(result.clone());
        }
    }

    pub fn to_snapshot(&self, pending_changes: usize) -> SyncSnapshot {
        SyncSnapshot {
            is_syncing: self.is_syncing,
            last_sync_timestamp: self.last_sync_timestamp,
            sync_errors: self.errors.iter().cloned().collect(),
            pending_changes,
            auto_sync_enabled: self.auto_enabled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_arm_is_leading_edge() {
        let mut sync = SyncController::new(SyncConfig::default());
        sync.arm();
        let first = sync.deadline;
        assert!(first.is_some());

        // A later change must not move the armed deadline.
        tokio::time::advance(Duration::from_secs(3)).await;
        sync.arm();
        assert_eq!(sync.deadline, first);
    }

    #[tokio::test]
    async fn test_arm_respects_auto_flag_and_in_flight() {
        let mut sync = SyncController::new(SyncConfig::default());
        sync.set_auto(false);
        sync.arm();
        assert!(!sync.deadline_armed());

        sync.set_auto(true);
        sync.begin();
        sync.arm();
        assert!(!sync.deadline_armed());
    }

    #[tokio::test]
    async fn test_disabling_auto_disarms() {
        let mut sync = SyncController::new(SyncConfig::default());
        sync.arm();
        assert!(sync.deadline_armed());
        sync.set_auto(false);
        assert!(!sync.deadline_armed());
    }

    #[test]
    fn test_error_list_bounded() {
        let mut sync = SyncController::new(SyncConfig {
            max_errors: 3,
            ..SyncConfig::default()
        });
        for i in 0..5 {
            sync.record_error(format!("failure {}", i));
        }
        let snap = sync.to_snapshot(0);
        assert_eq!(snap.sync_errors.len(), 3);
        assert_eq!(snap.sync_errors[0], "failure 2");
        assert_eq!(snap.sync_errors[2], "failure 4");
    }

    #[tokio::test]
    async fn test_waiters_all_notified() {
        let mut sync = SyncController::new(SyncConfig::default());
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        sync.add_waiter(tx1);
        sync.add_waiter(tx2);

        let report = SyncReport {
            pushed: 2,
            timestamp: 123,
        };
        sync.notify_waiters(Ok(report.clone()));
        assert!(!sync.has_waiters());
        assert_eq!(rx1.await.unwrap().unwrap(), report);
        assert_eq!(rx2.await.unwrap().unwrap(), report);
    }
}
