//! Configuration for the referee engine
//!
//! Handles the local data directory (suspended-session snapshots) with
//! the following precedence:
//! 1. MATCHDAY_DATA_DIR environment variable
//! 2. ~/.config/matchday/data (production default)
//! 3. ./data (fallback for development)

use std::path::PathBuf;

const DATA_DIR_ENV: &str = "MATCHDAY_DATA_DIR";
const DEFAULT_CONFIG_DIR: &str = ".config/matchday/data";
const DEV_DATA_DIR: &str = "./data";
const SNAPSHOTS_SUBDIR: &str = "sessions";

/// Get the data directory for local persistence.
pub fn get_data_dir() -> PathBuf {
    std::env::var(DATA_DIR_ENV)
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(DEFAULT_CONFIG_DIR)))
        .unwrap_or_else(|_| PathBuf::from(DEV_DATA_DIR))
}

/// Where suspended-session snapshots live under the data directory.
pub fn snapshots_dir() -> PathBuf {
    get_data_dir().join(SNAPSHOTS_SUBDIR)
}
