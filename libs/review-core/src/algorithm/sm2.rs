//! SM-2 spaced repetition algorithm.
//!
//! Based on SuperMemo 2 with per-direction interval multipliers and the
//! phase progression from [`crate::phase`].

use super::{ReviewAlgorithm, SchedulingResult};
use crate::phase::PhaseCalculator;
use crate::types::{
    Direction, Phase, ReviewState, CURRENT_SCHEMA_VERSION, MAX_GRADE, MS_PER_DAY, PASSING_GRADE,
};
use chrono::{DateTime, Utc};

/// SM-2 algorithm with configurable parameters.
#[derive(Debug, Clone)]
pub struct Sm2 {
    pub initial_ease: f64,
    pub minimum_ease: f64,
    pub lapse_penalty: f64,
    pub first_interval: u32,
    pub second_interval: u32,
    pub source_to_target_multiplier: f64,
    /// Recalling the source word from the target is harder, so it stretches faster.
    pub target_to_source_multiplier: f64,
}

impl Default for Sm2 {
    fn default() -> Self {
        Self {
            initial_ease: 2.5,
            minimum_ease: 1.3,
            lapse_penalty: 0.2,
            first_interval: 1,
            second_interval: 6,
            source_to_target_multiplier: 1.1,
            target_to_source_multiplier: 1.2,
        }
    }
}

impl ReviewAlgorithm for Sm2 {
    fn name(&self) -> &'static str {
        "sm2"
    }

    fn initial_state(
        &self,
        item_id: &str,
        direction: Direction,
        phases: &PhaseCalculator,
        now: DateTime<Utc>,
    ) -> ReviewState {
        let now = now.timestamp_millis();
        ReviewState {
            item_id: item_id.to_string(),
            direction,
            schema_version: CURRENT_SCHEMA_VERSION,
            ease_factor: self.initial_ease,
            interval: self.first_interval,
            repetitions: 0,
            phase: phases.calculate_phase(self.initial_ease, 0),
            next_review: now,
            last_review: None,
            total_reviews: 0,
            correct_answers: 0,
            correct_streak: 0,
            created: now,
            updated: now,
        }
    }

    fn schedule(
        &self,
        state: &ReviewState,
        grade: u8,
        direction: Direction,
        phases: &PhaseCalculator,
        now: DateTime<Utc>,
    ) -> SchedulingResult {
        let now_ms = now.timestamp_millis();
        let mut next = state.clone();
        next.direction = direction;
        next.schema_version = CURRENT_SCHEMA_VERSION;
        next.last_review = Some(now_ms);
        next.updated = now_ms;
        next.total_reviews = state.total_reviews.saturating_add(1);

        if grade >= PASSING_GRADE {
            next.correct_answers = state.correct_answers.saturating_add(1);
            next.correct_streak = state.correct_streak.saturating_add(1);
            next.ease_factor = self.ease_after_success(state.ease_factor, grade);
            next.interval = match state.repetitions {
                0 => self.first_interval,
                1 => self.second_interval,
                _ => {
                    let stretched = state.interval as f64
                        * next.ease_factor
                        * self.direction_multiplier(direction);
                    (stretched.round() as u32).max(1)
                }
            };
            next.repetitions = state.repetitions.saturating_add(1);
        } else {
            next.correct_streak = 0;
            next.repetitions = 0;
            next.interval = self.first_interval;
            let lapsed = (state.ease_factor - self.lapse_penalty).max(self.minimum_ease);
            next.ease_factor = round_ease(lapsed);
        }

        next.phase =
            phases.calculate_new_phase(state.phase, grade, next.ease_factor, next.repetitions);
        if next.phase == Phase::Learned {
            let stretched = next.interval as f64 * phases.phase_interval_multiplier(Phase::Learned);
            next.interval = (stretched.round() as u32).max(1);
        }

        next.next_review = now_ms + next.interval as i64 * MS_PER_DAY;

        SchedulingResult {
            previous_phase: state.phase,
            new_state: next,
        }
    }
}

impl Sm2 {
    /// Interval multiplier applied from the third successful repetition on.
    pub fn direction_multiplier(&self, direction: Direction) -> f64 {
        match direction {
            Direction::SourceToTarget => self.source_to_target_multiplier,
            Direction::TargetToSource => self.target_to_source_multiplier,
        }
    }

    fn ease_after_success(&self, ease: f64, grade: u8) -> f64 {
        let miss = MAX_GRADE.saturating_sub(grade) as f64;
        let adjusted = ease + (0.1 - miss * (0.08 + miss * 0.02));
        round_ease(adjusted.max(self.minimum_ease))
    }
}

fn round_ease(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn fresh(sm2: &Sm2, direction: Direction) -> ReviewState {
        sm2.initial_state("w1", direction, &PhaseCalculator::default(), now())
    }

    fn review(sm2: &Sm2, state: &ReviewState, grade: u8) -> ReviewState {
        sm2.schedule(state, grade, state.direction, &PhaseCalculator::default(), now())
            .new_state
    }

    #[test]
    fn new_item_defaults() {
        let sm2 = Sm2::default();
        let state = fresh(&sm2, Direction::SourceToTarget);
        assert_eq!(state.ease_factor, 2.5);
        assert_eq!(state.interval, 1);
        assert_eq!(state.repetitions, 0);
        assert_eq!(state.phase, Phase::Known);
        assert_eq!(state.last_review, None);
    }

    #[test]
    fn first_two_successes_use_fixed_intervals() {
        let sm2 = Sm2::default();
        let mut state = fresh(&sm2, Direction::TargetToSource);
        state.ease_factor = 1.5;
        let first = review(&sm2, &state, 3);
        assert_eq!(first.interval, 1);
        let second = review(&sm2, &first, 3);
        assert_eq!(second.interval, 6);
    }

    #[test]
    fn ease_formula_by_grade() {
        let sm2 = Sm2::default();
        let state = fresh(&sm2, Direction::SourceToTarget);
        assert_eq!(review(&sm2, &state, 5).ease_factor, 2.6);
        assert_eq!(review(&sm2, &state, 4).ease_factor, 2.5);
        assert_eq!(review(&sm2, &state, 3).ease_factor, 2.36);
    }

    #[test]
    fn harder_direction_stretches_faster() {
        let sm2 = Sm2::default();
        let mut forward = fresh(&sm2, Direction::SourceToTarget);
        forward.repetitions = 2;
        forward.interval = 12;
        let mut backward = forward.clone();
        backward.direction = Direction::TargetToSource;

        let forward = review(&sm2, &forward, 4);
        let backward = review(&sm2, &backward, 4);
        assert_eq!(forward.interval, 33);
        assert_eq!(backward.interval, 36);
    }

    #[test]
    fn lapse_resets_progress() {
        let sm2 = Sm2::default();
        let mut state = fresh(&sm2, Direction::SourceToTarget);
        state.repetitions = 4;
        state.interval = 40;
        state.correct_streak = 4;
        let next = review(&sm2, &state, 1);
        assert_eq!(next.repetitions, 0);
        assert_eq!(next.interval, 1);
        assert_eq!(next.correct_streak, 0);
        assert_eq!(next.ease_factor, 2.3);
        assert_eq!(next.total_reviews, 1);
        assert_eq!(next.correct_answers, 0);
    }

    #[test]
    fn ease_factor_never_below_minimum() {
        let sm2 = Sm2::default();
        let mut state = fresh(&sm2, Direction::SourceToTarget);
        for grade in [0, 1, 2, 0, 0, 1, 2, 0, 3, 0, 0] {
            state = review(&sm2, &state, grade);
            assert!(state.ease_factor >= sm2.minimum_ease);
        }
        assert_eq!(state.ease_factor, 1.3);
    }

    #[test]
    fn next_review_follows_interval() {
        let sm2 = Sm2::default();
        let at = now();
        let state = fresh(&sm2, Direction::SourceToTarget);
        let result = sm2.schedule(&state, 4, state.direction, &PhaseCalculator::default(), at);
        let last = result.new_state.last_review.unwrap();
        assert_eq!(last, at.timestamp_millis());
        assert_eq!(
            result.new_state.next_review,
            last + result.new_state.interval as i64 * MS_PER_DAY
        );
    }

    #[test]
    fn learned_items_get_stretched_interval() {
        let sm2 = Sm2::default();
        let mut state = fresh(&sm2, Direction::SourceToTarget);
        state.phase = Phase::Expert;
        state.ease_factor = 3.0;
        state.repetitions = 5;
        state.interval = 20;
        let result = sm2.schedule(&state, 5, state.direction, &PhaseCalculator::default(), now());
        assert_eq!(result.new_state.phase, Phase::Learned);
        assert!(result.phase_changed());
        // round(20 * 3.1 * 1.1) = 68, then tripled.
        assert_eq!(result.new_state.interval, 204);
    }
}
