//! Review-record persistence on top of a [`KeyValueStore`].

use super::KeyValueStore;
use crate::error::Result;
use crate::generation::{parse_any_generation, StoredRecord};
use crate::keys::ReviewKey;
use crate::types::ReviewState;

/// A storage key that parsed as a review-record key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedKey {
    pub key: String,
    pub parsed: ReviewKey,
}

/// Loads, saves and enumerates review records.
#[derive(Debug)]
pub struct ReviewStateStore<S> {
    medium: S,
}

impl<S: KeyValueStore> ReviewStateStore<S> {
    pub fn new(medium: S) -> Self {
        Self { medium }
    }

    pub fn medium(&self) -> &S {
        &self.medium
    }

    pub fn medium_mut(&mut self) -> &mut S {
        &mut self.medium
    }

    /// Read and classify the record at `key`.
    ///
    /// Missing, unreadable and malformed records all come back as `None`.
    pub fn load(&self, key: &str) -> Option<StoredRecord> {
        let raw = match self.medium.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read review record");
                return None;
            }
        };

        match parse_any_generation(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(key, error = %e, "ignoring malformed review record");
                None
            }
        }
    }

    /// Whether any value is stored at `key`, readable or not.
    pub fn contains(&self, key: &str) -> bool {
        matches!(self.medium.get(key), Ok(Some(_)))
    }

    pub fn save(&mut self, key: &str, state: &ReviewState) -> Result<()> {
        let data = serde_json::to_string(state)?;
        self.medium.set(key, &data)?;
        Ok(())
    }

    pub fn remove(&mut self, key: &str) -> Result<()> {
        self.medium.remove(key)?;
        Ok(())
    }

    /// Every review-record key under `namespace`. Full scan of the medium.
    pub fn scan(&self, namespace: &str) -> Result<Vec<ScannedKey>> {
        let keys = self.medium.keys()?;
        Ok(keys
            .into_iter()
            .filter_map(|key| {
                ReviewKey::parse(namespace, &key).map(|parsed| ScannedKey { key, parsed })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::Generation;
    use crate::store::MemoryStore;

    #[test]
    fn malformed_records_read_as_missing() {
        let mut medium = MemoryStore::new();
        medium.set("vocab:review:broken", "{not json").unwrap();
        medium.set("vocab:review:array", "[1]").unwrap();
        let store = ReviewStateStore::new(medium);
        assert!(store.load("vocab:review:broken").is_none());
        assert!(store.load("vocab:review:array").is_none());
        assert!(store.load("vocab:review:absent").is_none());
        assert!(store.contains("vocab:review:broken"));
    }

    #[test]
    fn scan_keeps_only_review_keys() {
        let mut medium = MemoryStore::new();
        medium.set("vocab:review:a", r#"{"easinessFactor": 2.0}"#).unwrap();
        medium.set("vocab:anna:review_b_A→B", "{}").unwrap();
        medium.set("vocab:active_profile", "anna").unwrap();
        medium.set("elsewhere:review:c", "{}").unwrap();
        let store = ReviewStateStore::new(medium);

        let scanned = store.scan("vocab").unwrap();
        assert_eq!(scanned.len(), 2);
        assert_eq!(scanned[0].parsed.generation(), Generation::Profiled);
        assert_eq!(scanned[1].parsed.generation(), Generation::Legacy);
    }
}
