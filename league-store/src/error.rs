//! Error types for the league store boundary

use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Offline(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("store returned invalid data: {0}")]
    InvalidData(String),
}
