//! Shared fixtures for CLI integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use review_cli::db::SqliteStore;
use review_cli::Scheduler;
use review_core::{KeyValueStore, NamespacedProfiles, SchedulerConfig, UnifiedSpacedRepetition};

pub const NOW_MS: i64 = 1_700_000_000_000;

pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(NOW_MS).expect("valid timestamp")
}

pub fn scheduler_over(store: SqliteStore) -> Scheduler {
    UnifiedSpacedRepetition::new(
        store,
        NamespacedProfiles::new("vocab", "default"),
        SchedulerConfig::default(),
    )
    .with_clock(fixed_now)
}

/// Scheduler over an in-memory database seeded with raw values.
pub fn scheduler_with(entries: &[(&str, &str)]) -> Scheduler {
    let mut store = SqliteStore::open_in_memory().expect("in-memory database");
    for (key, value) in entries {
        store.set(key, value).expect("seed write");
    }
    scheduler_over(store)
}

pub fn legacy_record() -> String {
    serde_json::json!({
        "easinessFactor": 2.1,
        "repetitions": 4,
        "interval": 10,
        "streak": 3,
        "nextReviewDate": "2023-11-01T00:00:00.000Z",
        "lastReviewDate": "2023-10-22T00:00:00.000Z"
    })
    .to_string()
}
