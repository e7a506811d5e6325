//! Spaced repetition algorithm implementations.

pub mod sm2;

use crate::phase::PhaseCalculator;
use crate::types::{Direction, Phase, ReviewState};
use chrono::{DateTime, Utc};

/// Result of scheduling an item after review.
#[derive(Debug, Clone)]
pub struct SchedulingResult {
    pub new_state: ReviewState,
    pub previous_phase: Phase,
}

impl SchedulingResult {
    pub fn phase_changed(&self) -> bool {
        self.previous_phase != self.new_state.phase
    }
}

/// Trait for spaced repetition algorithms.
pub trait ReviewAlgorithm {
    /// Algorithm identifier.
    fn name(&self) -> &'static str;

    /// Calculate next review state after a review. `grade` is already validated.
    fn schedule(
        &self,
        state: &ReviewState,
        grade: u8,
        direction: Direction,
        phases: &PhaseCalculator,
        now: DateTime<Utc>,
    ) -> SchedulingResult;

    /// Initial state for a new item.
    fn initial_state(
        &self,
        item_id: &str,
        direction: Direction,
        phases: &PhaseCalculator,
        now: DateTime<Utc>,
    ) -> ReviewState;
}
