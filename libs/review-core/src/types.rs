//! Core types for the review scheduler.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Milliseconds in one scheduling day.
pub const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Layout generation written by this crate.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// Highest accepted review grade.
pub const MAX_GRADE: u8 = 5;

/// Grades at or above this value count as a successful recall.
pub const PASSING_GRADE: u8 = 3;

/// Translation direction tracked by a review record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "A→B")]
    SourceToTarget,
    #[serde(rename = "B→A")]
    TargetToSource,
}

impl Default for Direction {
    fn default() -> Self {
        Self::SourceToTarget
    }
}

impl Direction {
    /// Get the direction label used in storage keys and JSON.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SourceToTarget => "A→B",
            Self::TargetToSource => "B→A",
        }
    }

    /// Parse from a label. ASCII spellings are accepted for shells.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "A→B" | "A->B" | "a-b" => Some(Self::SourceToTarget),
            "B→A" | "B->A" | "b-a" => Some(Self::TargetToSource),
            _ => None,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discrete mastery band. Stored as an integer: 0 is Learned, 1-6 are the bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Phase {
    Learned,
    New,
    Learning,
    Familiar,
    Known,
    Mastered,
    Expert,
}

impl Phase {
    /// All phases in ascending mastery order.
    pub const ASCENDING: [Phase; 7] = [
        Phase::New,
        Phase::Learning,
        Phase::Familiar,
        Phase::Known,
        Phase::Mastered,
        Phase::Expert,
        Phase::Learned,
    ];

    /// Stored phase number (0-6).
    pub fn number(self) -> u8 {
        match self {
            Self::Learned => 0,
            Self::New => 1,
            Self::Learning => 2,
            Self::Familiar => 3,
            Self::Known => 4,
            Self::Mastered => 5,
            Self::Expert => 6,
        }
    }

    /// Create from stored phase number.
    pub fn from_number(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Learned),
            1 => Some(Self::New),
            2 => Some(Self::Learning),
            3 => Some(Self::Familiar),
            4 => Some(Self::Known),
            5 => Some(Self::Mastered),
            6 => Some(Self::Expert),
            _ => None,
        }
    }

    /// Position on the mastery ladder: New is 1, Learned is 7.
    pub fn rank(self) -> u8 {
        match self {
            Self::Learned => 7,
            other => other.number(),
        }
    }

    /// Phase for a ladder position, clamped to the ladder.
    pub fn from_rank(rank: u8) -> Self {
        match rank {
            0 | 1 => Self::New,
            7.. => Self::Learned,
            n => Self::from_number(n).unwrap_or(Self::New),
        }
    }

    /// Next phase up the ladder, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Learned => None,
            other => Some(Self::from_rank(other.rank() + 1)),
        }
    }
}

impl From<Phase> for u8 {
    fn from(phase: Phase) -> u8 {
        phase.number()
    }
}

impl TryFrom<u8> for Phase {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        Self::from_number(value).ok_or_else(|| format!("phase out of range: {}", value))
    }
}

/// Review state for one item in one direction, scoped to a profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    pub item_id: String,
    pub direction: Direction,
    pub schema_version: u32,
    pub ease_factor: f64,
    pub interval: u32,
    pub repetitions: u32,
    pub phase: Phase,
    pub next_review: i64,
    pub last_review: Option<i64>,
    pub total_reviews: u32,
    pub correct_answers: u32,
    pub correct_streak: u32,
    pub created: i64,
    pub updated: i64,
}

impl ReviewState {
    /// Whether the item is due at `now` (epoch ms).
    pub fn is_due(&self, now: i64) -> bool {
        self.next_review <= now
    }

    /// Share of correct answers in percent, if reviewed at all.
    pub fn accuracy(&self) -> Option<f64> {
        if self.total_reviews == 0 {
            None
        } else {
            Some(self.correct_answers as f64 / self.total_reviews as f64 * 100.0)
        }
    }
}

/// Aggregate statistics over the active profile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    pub total: usize,
    pub due: usize,
    pub avg_ease_factor: f64,
    pub avg_accuracy: u32,
    #[serde(serialize_with = "serialize_direction_filter")]
    pub direction: Option<Direction>,
}

fn serialize_direction_filter<S: serde::Serializer>(
    direction: &Option<Direction>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(direction.map(|d| d.as_str()).unwrap_or("all"))
}

/// Outcome counts of a batch legacy migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub migrated: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Outcome counts of an import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Summary shown to the learner after grading.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeFeedback {
    pub grade: u8,
    pub interval: u32,
    pub phase: Phase,
    pub phase_name: &'static str,
    pub next_review: DateTime<Utc>,
    pub message: String,
}

/// Convert epoch milliseconds into a UTC timestamp.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(ms).unwrap_or_default()
}
