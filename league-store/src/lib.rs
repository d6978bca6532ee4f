pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod traits;
pub mod types;

pub use error::{StoreError, StoreResult};
#[cfg(any(test, feature = "mock"))]
pub use mock::MockLeagueStore;
pub use traits::LeagueStore;
pub use types::{
    FixturePatch, FixtureRecord, FixtureStatus, MatchEventRecord, MemberRecord, MemberStatDelta,
    PlayerRatingRecord, StoreChange,
};
