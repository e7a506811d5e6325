//! Unified spaced repetition scheduler.
//!
//! Ties together the SM-2 algorithm, the phase calculator, profile-scoped
//! storage and the forward migration of older record generations.
//!
//! Due-item, statistics and export queries scan every key in the medium.
//! There is no profile or direction index; item counts are expected to stay
//! in the low thousands.

use crate::algorithm::sm2::Sm2;
use crate::algorithm::ReviewAlgorithm;
use crate::error::{Result, SchedulerError};
use crate::feedback;
use crate::generation::{classify_value, Generation, NormalizeContext, StoredRecord};
use crate::keys::{ProfileKeyResolver, ReviewKey};
use crate::migration_log::{MigrationEvent, MigrationLog, MigrationLogEntry};
use crate::phase::{PhaseCalculator, PhaseStatistics};
use crate::store::{KeyValueStore, ReviewStateStore, ScannedKey};
use crate::types::{
    Direction, GradeFeedback, ImportReport, MigrationReport, ReviewState, ReviewStats,
    CURRENT_SCHEMA_VERSION, MAX_GRADE,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Scheduler settings. The key namespace comes from the resolver.
#[derive(Debug, Clone, Default)]
pub struct SchedulerConfig {
    /// Direction used when a record or caller does not name one.
    pub default_direction: Direction,
}

/// Exported snapshot of the active profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub version: u32,
    pub exported: i64,
    pub states: BTreeMap<String, ReviewState>,
}

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// Review scheduler over an injected medium and profile resolver.
pub struct UnifiedSpacedRepetition<S, R> {
    store: ReviewStateStore<S>,
    resolver: R,
    config: SchedulerConfig,
    algorithm: Box<dyn ReviewAlgorithm>,
    phases: PhaseCalculator,
    log: MigrationLog,
    clock: Clock,
}

impl<S: KeyValueStore, R: ProfileKeyResolver> UnifiedSpacedRepetition<S, R> {
    /// Create a scheduler and report any legacy or phase-less records found.
    pub fn new(medium: S, resolver: R, config: SchedulerConfig) -> Self {
        let mut scheduler = Self {
            store: ReviewStateStore::new(medium),
            resolver,
            config,
            algorithm: Box::new(Sm2::default()),
            phases: PhaseCalculator::default(),
            log: MigrationLog::default(),
            clock: Box::new(Utc::now),
        };

        tracing::info!(
            namespace = scheduler.resolver.namespace(),
            profile = %scheduler.resolver.active_profile_id(),
            algorithm = scheduler.algorithm.name(),
            "initialized review scheduler"
        );
        scheduler.detect_stale_records();
        scheduler
    }

    pub fn with_algorithm(mut self, algorithm: impl ReviewAlgorithm + 'static) -> Self {
        self.algorithm = Box::new(algorithm);
        self
    }

    pub fn with_phase_calculator(mut self, phases: PhaseCalculator) -> Self {
        self.phases = phases;
        self
    }

    /// Replace the wall clock, mainly for deterministic callers.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn phases(&self) -> &PhaseCalculator {
        &self.phases
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn medium(&self) -> &S {
        self.store.medium()
    }

    pub fn medium_mut(&mut self) -> &mut S {
        self.store.medium_mut()
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }

    fn profiled_key(&self, item_id: &str, direction: Direction) -> String {
        self.resolver
            .namespaced_key(&ReviewKey::logical(item_id, direction), None)
    }

    fn enhanced_key(&self, item_id: &str, direction: Direction) -> String {
        ReviewKey::Enhanced {
            item_id: item_id.to_string(),
            direction,
        }
        .render(self.resolver.namespace())
    }

    fn normalize(
        &self,
        record: StoredRecord,
        item_id: &str,
        direction: Direction,
        now: i64,
    ) -> ReviewState {
        record.normalize(&NormalizeContext {
            item_id,
            direction,
            phases: &self.phases,
            now,
        })
    }

    fn detect_stale_records(&mut self) {
        let scanned = match self.store.scan(self.resolver.namespace()) {
            Ok(scanned) => scanned,
            Err(e) => {
                tracing::warn!(error = %e, "failed to scan for legacy review states");
                return;
            }
        };

        let legacy = scanned
            .iter()
            .filter(|s| s.parsed.generation() == Generation::Legacy)
            .count();
        let phaseless = scanned
            .iter()
            .filter(|s| s.parsed.generation() != Generation::Legacy)
            .filter(|s| matches!(self.store.load(&s.key), Some(StoredRecord::Enhanced(_))))
            .count();

        let now = self.now_ms();
        if legacy > 0 {
            tracing::info!(count = legacy, "found legacy review states, migration available");
            self.log.record(now, MigrationEvent::Detection { count: legacy });
        }
        if phaseless > 0 {
            tracing::info!(
                count = phaseless,
                "found review states without phase, migrating on next load"
            );
            self.log
                .record(now, MigrationEvent::PhaselessDetection { count: phaseless });
        }
    }

    /// Fresh state for an item that has never been reviewed. Not persisted.
    pub fn init_review_state(&self, item_id: &str, direction: Direction) -> ReviewState {
        self.algorithm
            .initial_state(item_id, direction, &self.phases, self.now())
    }

    /// Grade a review and return the updated state. Does not persist.
    ///
    /// `direction` overrides the state's own direction when given.
    pub fn schedule_next(
        &self,
        state: &ReviewState,
        grade: u8,
        direction: Option<Direction>,
    ) -> Result<ReviewState> {
        if grade > MAX_GRADE {
            return Err(SchedulerError::InvalidGrade(grade));
        }
        if state.item_id.is_empty() {
            return Err(SchedulerError::MissingField("itemId"));
        }

        let direction = direction.unwrap_or(state.direction);
        let result = self
            .algorithm
            .schedule(state, grade, direction, &self.phases, self.now());

        if result.phase_changed() {
            tracing::info!(
                item = %state.item_id,
                from = result.previous_phase.number(),
                to = result.new_state.phase.number(),
                ease = result.new_state.ease_factor,
                "phase transition"
            );
        }
        Ok(result.new_state)
    }

    /// Load the state for an item, migrating older generations forward.
    ///
    /// Looks at the profiled key, then the unprofiled enhanced key, then the
    /// legacy key. Falls back to a fresh, unsaved state.
    pub fn load_state(&mut self, item_id: &str, direction: Direction) -> ReviewState {
        let now = self.now_ms();
        let profiled_key = self.profiled_key(item_id, direction);

        if let Some(record) = self.store.load(&profiled_key) {
            let generation = record.generation();
            let state = self.normalize(record, item_id, direction, now);
            if generation != Generation::Profiled {
                match self.store.save(&profiled_key, &state) {
                    Ok(()) => {
                        tracing::info!(
                            item = item_id,
                            phase = state.phase.number(),
                            "backfilled phase"
                        );
                        self.log_migration(&state, generation, now);
                    }
                    Err(e) => tracing::warn!(
                        key = %profiled_key,
                        error = %e,
                        "failed to persist backfilled phase"
                    ),
                }
            }
            return state;
        }

        let enhanced_key = self.enhanced_key(item_id, direction);
        if let Some(record) = self.store.load(&enhanced_key) {
            let generation = record.generation();
            let state = self.normalize(record, item_id, direction, now);
            self.promote(&enhanced_key, &profiled_key, &state, generation, now);
            return state;
        }

        let legacy_key = ReviewKey::Legacy {
            item_id: item_id.to_string(),
        }
        .render(self.resolver.namespace());
        if let Some(record) = self.store.load(&legacy_key) {
            tracing::info!(item = item_id, %direction, "migrating legacy state");
            let generation = record.generation();
            let state = self.normalize(record, item_id, direction, now);
            self.promote(&legacy_key, &profiled_key, &state, generation, now);
            return state;
        }

        self.init_review_state(item_id, direction)
    }

    /// Write `state` under `new_key` and drop `old_key` once that succeeded.
    fn promote(
        &mut self,
        old_key: &str,
        new_key: &str,
        state: &ReviewState,
        from: Generation,
        now: i64,
    ) -> bool {
        if let Err(e) = self.store.save(new_key, state) {
            tracing::warn!(key = new_key, error = %e, "failed to persist migrated state");
            return false;
        }
        if let Err(e) = self.store.remove(old_key) {
            tracing::warn!(key = old_key, error = %e, "failed to remove superseded record");
        }
        self.log_migration(state, from, now);
        true
    }

    fn log_migration(&mut self, state: &ReviewState, from: Generation, now: i64) {
        self.log.record(
            now,
            MigrationEvent::Migration {
                item_id: state.item_id.clone(),
                direction: state.direction,
                from,
                to: Generation::Profiled,
            },
        );
    }

    /// Persist `state` under the active profile.
    pub fn save_state(&mut self, state: &ReviewState) -> Result<()> {
        if state.item_id.is_empty() {
            tracing::warn!("cannot save review state without item id");
            return Err(SchedulerError::MissingField("itemId"));
        }

        let key = self.profiled_key(&state.item_id, state.direction);
        self.store.save(&key, state).map_err(|e| {
            tracing::warn!(key = %key, error = %e, "failed to save review state");
            e
        })
    }

    /// Convert one legacy record into the current layout.
    pub fn migrate_legacy_state(
        &self,
        legacy: crate::generation::LegacyRecord,
        item_id: &str,
        direction: Direction,
    ) -> ReviewState {
        self.normalize(StoredRecord::Legacy(legacy), item_id, direction, self.now_ms())
    }

    fn active_states(&self, direction: Option<Direction>) -> Vec<ReviewState> {
        let profile = self.resolver.active_profile_id();
        let scanned = match self.store.scan(self.resolver.namespace()) {
            Ok(scanned) => scanned,
            Err(e) => {
                tracing::warn!(error = %e, "failed to scan review states");
                return Vec::new();
            }
        };

        let now = self.now_ms();
        scanned
            .into_iter()
            .filter(|s| s.parsed.is_owned_by(&profile))
            .filter(|s| direction.map_or(true, |d| s.parsed.direction() == Some(d)))
            .filter_map(|s| self.load_scanned(&s, now))
            .filter(|state| direction.map_or(true, |d| state.direction == d))
            .collect()
    }

    fn load_scanned(&self, scanned: &ScannedKey, now: i64) -> Option<ReviewState> {
        let record = self.store.load(&scanned.key)?;
        let direction = scanned
            .parsed
            .direction()
            .unwrap_or(self.config.default_direction);
        Some(self.normalize(record, scanned.parsed.item_id(), direction, now))
    }

    /// States of the active profile that are due now.
    pub fn get_due_items(&self, direction: Option<Direction>) -> Vec<ReviewState> {
        let now = self.now_ms();
        self.active_states(direction)
            .into_iter()
            .filter(|state| state.is_due(now))
            .collect()
    }

    /// Aggregate statistics for the active profile.
    pub fn get_stats(&self, direction: Option<Direction>) -> ReviewStats {
        let now = self.now_ms();
        let states = self.active_states(direction);

        let total = states.len();
        let due = states.iter().filter(|s| s.is_due(now)).count();
        let ease_sum: f64 = states.iter().map(|s| s.ease_factor).sum();
        let accuracies: Vec<f64> = states.iter().filter_map(ReviewState::accuracy).collect();

        let avg_ease_factor = if total > 0 {
            (ease_sum / total as f64 * 100.0).round() / 100.0
        } else {
            2.5
        };
        let avg_accuracy = if accuracies.is_empty() {
            0
        } else {
            (accuracies.iter().sum::<f64>() / accuracies.len() as f64).round() as u32
        };

        ReviewStats {
            total,
            due,
            avg_ease_factor,
            avg_accuracy,
            direction,
        }
    }

    /// Phase distribution for the active profile.
    pub fn phase_statistics(&self, direction: Option<Direction>) -> PhaseStatistics {
        self.phases.phase_statistics(&self.active_states(direction))
    }

    /// Move every legacy record into the active profile under `default_direction`.
    ///
    /// Items that already have a profiled or enhanced record for that direction
    /// are skipped and their legacy record is left alone. Unreadable legacy
    /// records count as failed. Running it twice migrates nothing
    /// the second time.
    pub fn migrate_all_legacy(&mut self, default_direction: Direction) -> MigrationReport {
        let mut report = MigrationReport::default();
        let now = self.now_ms();

        let legacy: Vec<ScannedKey> = match self.store.scan(self.resolver.namespace()) {
            Ok(scanned) => scanned
                .into_iter()
                .filter(|s| s.parsed.generation() == Generation::Legacy)
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "batch migration could not enumerate keys");
                return report;
            }
        };

        for scanned in legacy {
            let item_id = scanned.parsed.item_id();
            let Some(record) = self.store.load(&scanned.key) else {
                report.failed += 1;
                continue;
            };

            let target = self.profiled_key(item_id, default_direction);
            let enhanced = self.enhanced_key(item_id, default_direction);
            if self.store.contains(&target) || self.store.contains(&enhanced) {
                report.skipped += 1;
                continue;
            }

            let from = record.generation();
            let state = self.normalize(record, item_id, default_direction, now);
            if self.promote(&scanned.key, &target, &state, from, now) {
                tracing::debug!(item = item_id, "migrated legacy state");
                report.migrated += 1;
            } else {
                report.failed += 1;
            }
        }

        tracing::info!(
            migrated = report.migrated,
            skipped = report.skipped,
            failed = report.failed,
            "batch legacy migration finished"
        );
        self.log
            .record(now, MigrationEvent::BatchMigration { results: report });
        report
    }

    /// Snapshot of the active profile as pretty-printed JSON.
    pub fn export_data(&self) -> Result<String> {
        let profile = self.resolver.active_profile_id();
        let now = self.now_ms();
        let mut states = BTreeMap::new();

        for scanned in self.store.scan(self.resolver.namespace())? {
            if !scanned.parsed.is_owned_by(&profile) {
                continue;
            }
            if let Some(state) = self.load_scanned(&scanned, now) {
                states.insert(scanned.key, state);
            }
        }

        let snapshot = ExportSnapshot {
            version: CURRENT_SCHEMA_VERSION,
            exported: now,
            states,
        };
        Ok(serde_json::to_string_pretty(&snapshot)?)
    }

    /// Restore a snapshot into the active profile.
    ///
    /// Records missing `itemId`, `direction`, a numeric `easeFactor` or a
    /// numeric `interval` are skipped; the rest of the import proceeds.
    pub fn import_data(&mut self, json: &str) -> Result<ImportReport> {
        let document: Value =
            serde_json::from_str(json).map_err(|e| SchedulerError::InvalidExport(e.to_string()))?;
        let states = document
            .get("states")
            .and_then(Value::as_object)
            .ok_or_else(|| SchedulerError::InvalidExport("missing states object".to_string()))?;

        let now = self.now_ms();
        let mut report = ImportReport::default();

        for (key, value) in states {
            let Some((item_id, direction)) = validate_record(value) else {
                tracing::debug!(key = %key, "skipping invalid import record");
                report.skipped += 1;
                continue;
            };

            let record = match classify_value(value.clone()) {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "skipping undecodable import record");
                    report.skipped += 1;
                    continue;
                }
            };

            let state = self.normalize(record, &item_id, direction, now);
            match self.save_state(&state) {
                Ok(()) => report.imported += 1,
                Err(_) => report.failed += 1,
            }
        }

        tracing::info!(
            imported = report.imported,
            skipped = report.skipped,
            failed = report.failed,
            "import complete"
        );
        Ok(report)
    }

    pub fn get_migration_log(&self) -> Vec<MigrationLogEntry> {
        self.log.entries().to_vec()
    }

    /// Learner-facing summary of a graded review.
    pub fn grade_feedback(&self, grade: u8, state: &ReviewState) -> GradeFeedback {
        feedback::grade_feedback(grade, state, &self.phases)
    }
}

/// Shape check for imported records: returns item id and direction when valid.
fn validate_record(value: &Value) -> Option<(String, Direction)> {
    let object = value.as_object()?;
    let item_id = object.get("itemId")?.as_str().filter(|id| !id.is_empty())?;
    let direction: Direction = serde_json::from_value(object.get("direction")?.clone()).ok()?;
    if !object.get("easeFactor")?.is_number() || !object.get("interval")?.is_number() {
        return None;
    }
    Some((item_id.to_string(), direction))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::NamespacedProfiles;
    use crate::store::MemoryStore;
    use crate::types::Phase;

    fn scheduler() -> UnifiedSpacedRepetition<MemoryStore, NamespacedProfiles> {
        UnifiedSpacedRepetition::new(
            MemoryStore::new(),
            NamespacedProfiles::new("vocab", "anna"),
            SchedulerConfig::default(),
        )
    }

    #[test]
    fn rejects_out_of_range_grade() {
        let sr = scheduler();
        let state = sr.init_review_state("haus", Direction::SourceToTarget);
        let err = sr.schedule_next(&state, 6, None).unwrap_err();
        assert!(matches!(err, SchedulerError::InvalidGrade(6)));
    }

    #[test]
    fn rejects_state_without_item_id() {
        let mut sr = scheduler();
        let state = sr.init_review_state("", Direction::SourceToTarget);
        assert!(matches!(
            sr.schedule_next(&state, 4, None),
            Err(SchedulerError::MissingField("itemId"))
        ));
        assert!(matches!(sr.save_state(&state), Err(SchedulerError::MissingField(_))));
    }

    #[test]
    fn direction_override_changes_record_direction() {
        let sr = scheduler();
        let state = sr.init_review_state("haus", Direction::SourceToTarget);
        let next = sr
            .schedule_next(&state, 4, Some(Direction::TargetToSource))
            .unwrap();
        assert_eq!(next.direction, Direction::TargetToSource);
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut sr = scheduler();
        let state = sr.init_review_state("haus", Direction::TargetToSource);
        let graded = sr.schedule_next(&state, 5, None).unwrap();
        sr.save_state(&graded).unwrap();

        assert!(sr.medium().get("vocab:anna:review_haus_B→A").unwrap().is_some());
        let loaded = sr.load_state("haus", Direction::TargetToSource);
        assert_eq!(loaded, graded);
        assert!(sr.get_migration_log().is_empty());
    }

    #[test]
    fn unknown_item_is_not_persisted() {
        let mut sr = scheduler();
        let state = sr.load_state("neu", Direction::SourceToTarget);
        assert_eq!(state.phase, Phase::Known);
        assert!(sr.medium().is_empty().unwrap());
    }

    #[test]
    fn quota_failure_is_reported() {
        let mut sr = UnifiedSpacedRepetition::new(
            MemoryStore::with_quota(16),
            NamespacedProfiles::new("vocab", "anna"),
            SchedulerConfig::default(),
        );
        let state = sr.init_review_state("haus", Direction::SourceToTarget);
        assert!(matches!(sr.save_state(&state), Err(SchedulerError::Store(_))));
    }

    #[test]
    fn stats_for_empty_profile() {
        let sr = scheduler();
        let stats = sr.get_stats(None);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.avg_ease_factor, 2.5);
        assert_eq!(stats.avg_accuracy, 0);
    }

    #[test]
    fn tuned_algorithm_and_phases() {
        let sr = scheduler()
            .with_algorithm(Sm2 {
                first_interval: 2,
                second_interval: 5,
                ..Sm2::default()
            })
            .with_phase_calculator(PhaseCalculator {
                min_reviews_to_advance: 1,
                ..PhaseCalculator::default()
            });

        let state = sr.init_review_state("haus", Direction::SourceToTarget);
        let first = sr.schedule_next(&state, 4, None).unwrap();
        assert_eq!(first.interval, 2);
        assert_eq!(sr.schedule_next(&first, 4, None).unwrap().interval, 5);

        let mut struggling = sr.init_review_state("baum", Direction::SourceToTarget);
        struggling.ease_factor = 1.95;
        struggling.phase = Phase::New;
        assert_eq!(sr.schedule_next(&struggling, 5, None).unwrap().phase, Phase::Learning);
        assert_eq!(scheduler().schedule_next(&struggling, 5, None).unwrap().phase, Phase::New);
    }

    #[test]
    fn scans_use_the_resolver_namespace() {
        let mut sr = UnifiedSpacedRepetition::new(
            MemoryStore::new(),
            NamespacedProfiles::new("words", "anna"),
            SchedulerConfig::default(),
        );
        let state = sr.init_review_state("haus", Direction::SourceToTarget);
        sr.save_state(&state).unwrap();

        assert!(sr.medium().get("words:anna:review_haus_A→B").unwrap().is_some());
        assert_eq!(sr.get_due_items(None).len(), 1);
        assert_eq!(sr.get_stats(None).total, 1);

        sr.medium_mut()
            .set("words:review:baum", r#"{"easinessFactor": 2.2}"#)
            .unwrap();
        assert_eq!(sr.migrate_all_legacy(Direction::SourceToTarget).migrated, 1);
        assert_eq!(sr.get_stats(None).total, 2);
    }
}
