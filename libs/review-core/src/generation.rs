//! The three persisted record generations and their normalisation into
//! the current [`ReviewState`] layout.
//!
//! * Legacy: no direction, no phase, `easinessFactor`, ISO-string dates.
//! * Enhanced (v2): direction and epoch-ms dates, no phase.
//! * Profiled (v3): the current layout, phase included.

use crate::error::{Result, SchedulerError};
use crate::phase::PhaseCalculator;
use crate::types::{Direction, Phase, ReviewState, CURRENT_SCHEMA_VERSION};
use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_EASE: f64 = 2.5;
const MINIMUM_EASE: f64 = 1.3;

/// On-disk record generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Generation {
    Legacy,
    Enhanced,
    Profiled,
}

/// Date as written by older clients: epoch milliseconds or an ISO string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LegacyDate {
    Millis(i64),
    Text(String),
}

impl LegacyDate {
    pub fn to_millis(&self) -> Option<i64> {
        match self {
            Self::Millis(ms) => Some(*ms),
            Self::Text(text) => {
                if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
                    return Some(parsed.timestamp_millis());
                }
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc().timestamp_millis())
            }
        }
    }
}

/// Oldest layout, keyed by item id only.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRecord {
    pub easiness_factor: Option<f64>,
    pub ease_factor: Option<f64>,
    pub interval: Option<u32>,
    pub repetitions: Option<u32>,
    pub next_review_date: Option<LegacyDate>,
    pub last_review_date: Option<LegacyDate>,
    pub total_reviews: Option<u32>,
    pub correct_answers: Option<u32>,
    pub streak: Option<u32>,
    pub correct_streak: Option<u32>,
    pub created: Option<LegacyDate>,
}

/// Direction-aware layout written before phases existed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnhancedRecord {
    pub item_id: Option<String>,
    pub direction: Direction,
    pub schema_version: Option<u32>,
    pub ease_factor: Option<f64>,
    pub interval: Option<u32>,
    pub repetitions: Option<u32>,
    pub next_review: Option<i64>,
    pub last_review: Option<i64>,
    pub total_reviews: Option<u32>,
    pub correct_answers: Option<u32>,
    pub correct_streak: Option<u32>,
    pub created: Option<i64>,
}

/// Current layout as read back from storage. Any field may be missing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfiledRecord {
    pub item_id: Option<String>,
    pub direction: Direction,
    pub ease_factor: Option<f64>,
    pub interval: Option<u32>,
    pub repetitions: Option<u32>,
    /// Kept raw so an out-of-range phase falls back to a recomputed one.
    pub phase: Option<Value>,
    pub next_review: Option<i64>,
    pub last_review: Option<i64>,
    pub total_reviews: Option<u32>,
    pub correct_answers: Option<u32>,
    pub correct_streak: Option<u32>,
    pub created: Option<i64>,
    pub updated: Option<i64>,
}

/// A persisted record tagged with its generation.
#[derive(Debug, Clone)]
pub enum StoredRecord {
    Legacy(LegacyRecord),
    Enhanced(EnhancedRecord),
    Profiled(ProfiledRecord),
}

/// Everything a record may be missing, supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext<'a> {
    pub item_id: &'a str,
    /// Used for legacy records, which predate directions.
    pub direction: Direction,
    pub phases: &'a PhaseCalculator,
    pub now: i64,
}

/// Classify and decode a raw stored value.
///
/// No `direction` means legacy, `direction` without `phase` means enhanced,
/// both means profiled.
pub fn parse_any_generation(raw: &str) -> Result<StoredRecord> {
    let value: Value = serde_json::from_str(raw)?;
    classify_value(value)
}

/// Classify an already parsed JSON value. See [`parse_any_generation`].
pub fn classify_value(value: Value) -> Result<StoredRecord> {
    let object = value.as_object().ok_or(SchedulerError::NotAnObject)?;

    let has_direction = object.contains_key("direction");
    let has_phase = object.get("phase").is_some_and(|phase| !phase.is_null());

    let record = match (has_direction, has_phase) {
        (false, _) => StoredRecord::Legacy(serde_json::from_value(value)?),
        (true, false) => StoredRecord::Enhanced(serde_json::from_value(value)?),
        (true, true) => StoredRecord::Profiled(serde_json::from_value(value)?),
    };
    Ok(record)
}

impl StoredRecord {
    pub fn generation(&self) -> Generation {
        match self {
            Self::Legacy(_) => Generation::Legacy,
            Self::Enhanced(_) => Generation::Enhanced,
            Self::Profiled(_) => Generation::Profiled,
        }
    }

    /// Convert into the current layout.
    pub fn normalize(self, ctx: &NormalizeContext<'_>) -> ReviewState {
        match self {
            Self::Legacy(record) => record.normalize(ctx),
            Self::Enhanced(record) => record.normalize(ctx),
            Self::Profiled(record) => record.normalize(ctx),
        }
    }
}

impl ProfiledRecord {
    /// Fills missing fields with defaults and keeps a stored phase in 0-6.
    pub fn normalize(self, ctx: &NormalizeContext<'_>) -> ReviewState {
        let ease_factor = sane_ease(self.ease_factor);
        let repetitions = self.repetitions.unwrap_or(0);
        let phase = self
            .phase
            .as_ref()
            .and_then(Value::as_u64)
            .and_then(|n| u8::try_from(n).ok())
            .and_then(Phase::from_number)
            .unwrap_or_else(|| ctx.phases.calculate_phase(ease_factor, repetitions));

        ReviewState {
            item_id: self
                .item_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| ctx.item_id.to_string()),
            direction: self.direction,
            schema_version: CURRENT_SCHEMA_VERSION,
            ease_factor,
            interval: self.interval.filter(|i| *i > 0).unwrap_or(1),
            repetitions,
            phase,
            next_review: self.next_review.unwrap_or(ctx.now),
            last_review: self.last_review,
            total_reviews: self.total_reviews.unwrap_or(0),
            correct_answers: self.correct_answers.unwrap_or(0),
            correct_streak: self.correct_streak.unwrap_or(0),
            created: self.created.unwrap_or(ctx.now),
            updated: self.updated.unwrap_or(ctx.now),
        }
    }
}

impl LegacyRecord {
    /// Legacy to current: renames fields, converts dates and computes a fresh phase.
    pub fn normalize(self, ctx: &NormalizeContext<'_>) -> ReviewState {
        let ease_factor = sane_ease(self.easiness_factor.or(self.ease_factor));
        let repetitions = self.repetitions.unwrap_or(0);

        ReviewState {
            item_id: ctx.item_id.to_string(),
            direction: ctx.direction,
            schema_version: CURRENT_SCHEMA_VERSION,
            ease_factor,
            interval: self.interval.filter(|i| *i > 0).unwrap_or(1),
            repetitions,
            phase: ctx.phases.calculate_phase(ease_factor, repetitions),
            next_review: self
                .next_review_date
                .as_ref()
                .and_then(LegacyDate::to_millis)
                .unwrap_or(ctx.now),
            last_review: self.last_review_date.as_ref().and_then(LegacyDate::to_millis),
            total_reviews: self.total_reviews.unwrap_or(0),
            correct_answers: self.correct_answers.unwrap_or(0),
            correct_streak: self.streak.or(self.correct_streak).unwrap_or(0),
            created: self
                .created
                .as_ref()
                .and_then(LegacyDate::to_millis)
                .unwrap_or(ctx.now),
            updated: ctx.now,
        }
    }
}

impl EnhancedRecord {
    /// Enhanced to current: backfills the phase and bumps the schema version.
    pub fn normalize(self, ctx: &NormalizeContext<'_>) -> ReviewState {
        let ease_factor = sane_ease(self.ease_factor);
        let repetitions = self.repetitions.unwrap_or(0);
        let phase: Phase = ctx.phases.calculate_phase(ease_factor, repetitions);

        ReviewState {
            item_id: self
                .item_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| ctx.item_id.to_string()),
            direction: self.direction,
            schema_version: CURRENT_SCHEMA_VERSION,
            ease_factor,
            interval: self.interval.filter(|i| *i > 0).unwrap_or(1),
            repetitions,
            phase,
            next_review: self.next_review.unwrap_or(ctx.now),
            last_review: self.last_review,
            total_reviews: self.total_reviews.unwrap_or(0),
            correct_answers: self.correct_answers.unwrap_or(0),
            correct_streak: self.correct_streak.unwrap_or(0),
            created: self.created.unwrap_or(ctx.now),
            updated: ctx.now,
        }
    }
}

fn sane_ease(ease: Option<f64>) -> f64 {
    ease.filter(|e| e.is_finite() && *e > 0.0)
        .unwrap_or(DEFAULT_EASE)
        .max(MINIMUM_EASE)
}
