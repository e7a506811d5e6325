//! Legacy migration and its event log.

use anyhow::Result;
use review_core::{Direction, KeyValueStore, ProfileKeyResolver, UnifiedSpacedRepetition};

pub fn migrate<S: KeyValueStore, R: ProfileKeyResolver>(
    sr: &mut UnifiedSpacedRepetition<S, R>,
    direction: Direction,
) -> Result<String> {
    let report = sr.migrate_all_legacy(direction);
    Ok(format!(
        "migrated {}, skipped {}, failed {}",
        report.migrated, report.skipped, report.failed
    ))
}

/// Events recorded by this process only; the log is not persisted.
pub fn log<S: KeyValueStore, R: ProfileKeyResolver>(
    sr: &UnifiedSpacedRepetition<S, R>,
) -> Result<String> {
    Ok(serde_json::to_string_pretty(&sr.get_migration_log())?)
}
