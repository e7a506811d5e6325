//! Shared fixtures for review-core integration tests.

#![allow(dead_code)]

use chrono::{DateTime, Utc};
use review_core::{
    KeyValueStore, MemoryStore, NamespacedProfiles, SchedulerConfig, UnifiedSpacedRepetition,
};

pub const NAMESPACE: &str = "vocab";
pub const NOW_MS: i64 = 1_700_000_000_000;

pub type TestScheduler = UnifiedSpacedRepetition<MemoryStore, NamespacedProfiles>;

pub fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(NOW_MS).expect("valid timestamp")
}

/// Scheduler over `medium` with profile "anna" active and a frozen clock.
pub fn scheduler_with(medium: MemoryStore) -> TestScheduler {
    UnifiedSpacedRepetition::new(
        medium,
        NamespacedProfiles::new(NAMESPACE, "anna"),
        SchedulerConfig::default(),
    )
    .with_clock(fixed_now)
}

pub fn scheduler() -> TestScheduler {
    scheduler_with(MemoryStore::new())
}

/// Medium pre-seeded with raw values.
pub fn seeded(entries: &[(&str, &str)]) -> MemoryStore {
    let mut medium = MemoryStore::new();
    for (key, value) in entries {
        medium.set(key, value).expect("seed write");
    }
    medium
}

pub fn legacy_record(ease: f64, repetitions: u32, interval: u32, streak: u32) -> String {
    serde_json::json!({
        "easinessFactor": ease,
        "repetitions": repetitions,
        "interval": interval,
        "streak": streak,
        "nextReviewDate": "2023-11-01T00:00:00.000Z",
        "lastReviewDate": "2023-10-22T00:00:00.000Z",
        "totalReviews": 6,
        "correctAnswers": 5
    })
    .to_string()
}
