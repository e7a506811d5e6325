//! In-memory record of detection and migration events. Not persisted.

use crate::generation::Generation;
use crate::types::{Direction, MigrationReport};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MigrationEvent {
    /// Legacy keys found at start-up.
    Detection { count: usize },
    /// Records without a phase found at start-up.
    PhaselessDetection { count: usize },
    /// One record moved forward.
    Migration {
        #[serde(rename = "itemId")]
        item_id: String,
        direction: Direction,
        from: Generation,
        to: Generation,
    },
    BatchMigration { results: MigrationReport },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationLogEntry {
    pub timestamp: i64,
    #[serde(flatten)]
    pub event: MigrationEvent,
}

/// Append-only event list.
#[derive(Debug, Clone, Default)]
pub struct MigrationLog {
    entries: Vec<MigrationLogEntry>,
}

impl MigrationLog {
    pub fn record(&mut self, timestamp: i64, event: MigrationEvent) {
        tracing::debug!(?event, "migration log");
        self.entries.push(MigrationLogEntry { timestamp, event });
    }

    pub fn entries(&self) -> &[MigrationLogEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_serialize_flat() {
        let mut log = MigrationLog::default();
        log.record(
            42,
            MigrationEvent::Migration {
                item_id: "haus".into(),
                direction: Direction::SourceToTarget,
                from: Generation::Legacy,
                to: Generation::Profiled,
            },
        );
        let json = serde_json::to_value(&log.entries()[0]).unwrap();
        assert_eq!(json["type"], "migration");
        assert_eq!(json["timestamp"], 42);
        assert_eq!(json["itemId"], "haus");
        assert_eq!(json["from"], "legacy");
    }
}
