//! Live match session engine for refereeing 7-a-side fixtures.
//!
//! One actor task per fixture owns the match clock, roster tracking,
//! substitution coordination, the event ledger and the sync engine.
//! UI layers talk to it through [`SessionHandle`] and subscribe to
//! [`SessionEvent`] broadcasts; the remote league backend sits behind
//! the `league-store` trait.

pub mod config;
pub mod integrity;
pub mod persistence;
pub mod session;
pub mod sync;

pub use integrity::IntegrityReport;
pub use persistence::{MatchSnapshotStore, SuspendedMatchData};
pub use session::{
    CardKind, PlayerSnapshot, SessionError, SessionEvent, SessionHandle, SessionManager,
    SessionSnapshot,
};
pub use sync::{SyncConfig, SyncReport, SyncSnapshot};
