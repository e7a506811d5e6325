//! Environment configuration for the `review` binary.

use anyhow::{anyhow, Result};
use review_core::{Direction, SchedulerConfig};
use std::path::PathBuf;

/// Resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub namespace: String,
    pub profile: String,
    pub default_direction: Direction,
}

impl Config {
    /// Read settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`, falling back to defaults for unset names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let default_direction = match lookup("REVIEW_DEFAULT_DIRECTION") {
            Some(raw) => Direction::from_str(&raw)
                .ok_or_else(|| anyhow!("REVIEW_DEFAULT_DIRECTION: unknown direction {raw:?}"))?,
            None => Direction::default(),
        };

        Ok(Self {
            db_path: lookup("REVIEW_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_db_path),
            namespace: lookup("REVIEW_NAMESPACE").unwrap_or_else(|| "vocab".to_string()),
            profile: lookup("REVIEW_PROFILE").unwrap_or_else(|| "default".to_string()),
            default_direction,
        })
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            default_direction: self.default_direction,
        }
    }
}

fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vocab-review")
        .join("review.db")
}
