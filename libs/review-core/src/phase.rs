//! Six-phase mastery progression layered on top of the SM-2 ease factor.
//!
//! | Phase | Name     | Ease factor |
//! |-------|----------|-------------|
//! | 1     | New      | < 2.0       |
//! | 2     | Learning | 2.0 - 2.2   |
//! | 3     | Familiar | 2.2 - 2.4   |
//! | 4     | Known    | 2.4 - 2.6   |
//! | 5     | Mastered | 2.6 - 2.8   |
//! | 6     | Expert   | 2.8 - 3.0   |
//! | 0     | Learned  | >= 3.0 with enough repetitions |
//!
//! Lower bounds are inclusive, so a boundary value belongs to the higher band.

use crate::types::{Phase, ReviewState, MS_PER_DAY, PASSING_GRADE};
use serde::Serialize;

const MINIMUM_EASE: f64 = 1.3;
const LEARNED_EASE: f64 = 3.0;

/// Display and threshold data for one phase.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseDetails {
    pub phase: Phase,
    pub name: &'static str,
    pub icon: &'static str,
    pub color: &'static str,
    pub min_ease: f64,
    /// `None` for the open-ended Learned band.
    pub max_ease: Option<f64>,
}

/// Count and share of items in one phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PhaseBucket {
    pub count: usize,
    /// Percentage of the total, rounded to one decimal.
    pub percentage: f64,
}

/// Distribution of review states over the phases.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhaseStatistics {
    pub learned: PhaseBucket,
    pub phase1: PhaseBucket,
    pub phase2: PhaseBucket,
    pub phase3: PhaseBucket,
    pub phase4: PhaseBucket,
    pub phase5: PhaseBucket,
    pub phase6: PhaseBucket,
    pub total: usize,
}

impl PhaseStatistics {
    /// Bucket for a given phase.
    pub fn bucket(&self, phase: Phase) -> &PhaseBucket {
        match phase {
            Phase::Learned => &self.learned,
            Phase::New => &self.phase1,
            Phase::Learning => &self.phase2,
            Phase::Familiar => &self.phase3,
            Phase::Known => &self.phase4,
            Phase::Mastered => &self.phase5,
            Phase::Expert => &self.phase6,
        }
    }

    fn bucket_mut(&mut self, phase: Phase) -> &mut PhaseBucket {
        match phase {
            Phase::Learned => &mut self.learned,
            Phase::New => &mut self.phase1,
            Phase::Learning => &mut self.phase2,
            Phase::Familiar => &mut self.phase3,
            Phase::Known => &mut self.phase4,
            Phase::Mastered => &mut self.phase5,
            Phase::Expert => &mut self.phase6,
        }
    }
}

/// Maps ease factor and repetitions to phases and gates phase transitions.
#[derive(Debug, Clone)]
pub struct PhaseCalculator {
    /// Successful repetitions needed before an item may leave phase 1.
    pub min_reviews_to_advance: u32,
    /// Successful repetitions needed, on top of ease >= 3.0, to count as Learned.
    pub learned_min_repetitions: u32,
}

impl Default for PhaseCalculator {
    fn default() -> Self {
        Self {
            min_reviews_to_advance: 3,
            learned_min_repetitions: 5,
        }
    }
}

impl PhaseCalculator {
    /// Phase for an ease factor and repetition count.
    pub fn calculate_phase(&self, ease_factor: f64, repetitions: u32) -> Phase {
        let ef = ease_factor.max(MINIMUM_EASE);

        if ef >= LEARNED_EASE && repetitions >= self.learned_min_repetitions {
            return Phase::Learned;
        }
        Self::band_for_ease(ef)
    }

    fn band_for_ease(ef: f64) -> Phase {
        if ef < 2.0 {
            Phase::New
        } else if ef < 2.2 {
            Phase::Learning
        } else if ef < 2.4 {
            Phase::Familiar
        } else if ef < 2.6 {
            Phase::Known
        } else if ef < 2.8 {
            Phase::Mastered
        } else {
            // Ease >= 3.0 without enough repetitions stays Expert.
            Phase::Expert
        }
    }

    /// Phase after a graded review.
    ///
    /// Moves at most one band up per review, and only when
    /// [`can_advance_to_next_phase`](Self::can_advance_to_next_phase) allows it.
    /// A failed review always leaves Learned and never moves the item up.
    pub fn calculate_new_phase(
        &self,
        current: Phase,
        grade: u8,
        new_ease_factor: f64,
        repetitions: u32,
    ) -> Phase {
        if grade < PASSING_GRADE {
            let recomputed = Self::band_for_ease(new_ease_factor.max(MINIMUM_EASE));
            let ceiling = match current {
                Phase::Learned => Phase::Expert,
                other => other,
            };
            return if recomputed.rank() > ceiling.rank() {
                ceiling
            } else {
                recomputed
            };
        }

        let target = self.calculate_phase(new_ease_factor, repetitions);
        if target.rank() <= current.rank() {
            return target;
        }

        if self.can_advance_to_next_phase(current, repetitions, new_ease_factor) {
            current.next().unwrap_or(current)
        } else {
            current
        }
    }

    /// Whether an item in `current` has earned the next band up.
    pub fn can_advance_to_next_phase(
        &self,
        current: Phase,
        repetitions: u32,
        ease_factor: f64,
    ) -> bool {
        let next = match current.next() {
            Some(next) => next,
            None => return false,
        };

        if current == Phase::New && repetitions < self.min_reviews_to_advance {
            return false;
        }
        if next == Phase::Learned && repetitions < self.learned_min_repetitions {
            return false;
        }

        ease_factor >= self.phase_details(next).min_ease
    }

    /// Extra interval stretch per phase. The scheduler applies it to Learned items.
    pub fn phase_interval_multiplier(&self, phase: Phase) -> f64 {
        match phase {
            Phase::Learned => 3.0,
            Phase::Expert => 2.0,
            Phase::Mastered => 1.5,
            Phase::Known => 1.2,
            Phase::Familiar => 1.0,
            Phase::Learning => 0.9,
            Phase::New => 0.8,
        }
    }

    pub fn phase_details(&self, phase: Phase) -> PhaseDetails {
        let (name, icon, color, min_ease, max_ease) = match phase {
            Phase::New => ("New", "🌱", "#ef4444", 0.0, Some(2.0)),
            Phase::Learning => ("Learning", "📖", "#f97316", 2.0, Some(2.2)),
            Phase::Familiar => ("Familiar", "👁️", "#eab308", 2.2, Some(2.4)),
            Phase::Known => ("Known", "✅", "#84cc16", 2.4, Some(2.6)),
            Phase::Mastered => ("Mastered", "⭐", "#22c55e", 2.6, Some(2.8)),
            Phase::Expert => ("Expert", "🏆", "#10b981", 2.8, Some(LEARNED_EASE)),
            Phase::Learned => ("Learned", "🎓", "#06b6d4", LEARNED_EASE, None),
        };
        PhaseDetails {
            phase,
            name,
            icon,
            color,
            min_ease,
            max_ease,
        }
    }

    /// Progress through the current band, 0-100. Learned is always 100.
    pub fn phase_progress(&self, phase: Phase, ease_factor: f64) -> f64 {
        let details = self.phase_details(phase);
        match details.max_ease {
            None => 100.0,
            Some(max) => {
                let progress = (ease_factor - details.min_ease) / (max - details.min_ease);
                (progress * 100.0).clamp(0.0, 100.0)
            }
        }
    }

    /// Count review states per phase.
    pub fn phase_statistics(&self, reviews: &[ReviewState]) -> PhaseStatistics {
        let mut stats = PhaseStatistics {
            total: reviews.len(),
            ..Default::default()
        };
        if reviews.is_empty() {
            return stats;
        }

        for review in reviews {
            stats.bucket_mut(review.phase).count += 1;
        }

        let total = stats.total as f64;
        for phase in Phase::ASCENDING {
            let bucket = stats.bucket_mut(phase);
            bucket.percentage = (bucket.count as f64 / total * 1000.0).round() / 10.0;
        }
        stats
    }

    /// Whether a Learned item has gone untouched long enough to need a check-up.
    ///
    /// The allowed gap is 90 days, widened to 120 days at ease >= 3.2 and
    /// 180 days at ease >= 3.5.
    pub fn needs_maintenance_review(
        &self,
        last_review: Option<i64>,
        ease_factor: f64,
        now: i64,
    ) -> bool {
        let Some(last) = last_review else {
            return true;
        };

        let window_days = if ease_factor >= 3.5 {
            180
        } else if ease_factor >= 3.2 {
            120
        } else {
            90
        };

        now - last >= window_days * MS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn calc() -> PhaseCalculator {
        PhaseCalculator::default()
    }

    #[test]
    fn bands_follow_ease_factor() {
        let c = calc();
        assert_eq!(c.calculate_phase(1.3, 0), Phase::New);
        assert_eq!(c.calculate_phase(2.1, 0), Phase::Learning);
        assert_eq!(c.calculate_phase(2.3, 0), Phase::Familiar);
        assert_eq!(c.calculate_phase(2.5, 0), Phase::Known);
        assert_eq!(c.calculate_phase(2.7, 0), Phase::Mastered);
        assert_eq!(c.calculate_phase(2.9, 0), Phase::Expert);
    }

    #[test]
    fn boundaries_resolve_to_higher_band() {
        let c = calc();
        assert_eq!(c.calculate_phase(2.0, 0), Phase::Learning);
        assert_eq!(c.calculate_phase(2.2, 0), Phase::Familiar);
        assert_eq!(c.calculate_phase(2.4, 0), Phase::Known);
        assert_eq!(c.calculate_phase(2.6, 0), Phase::Mastered);
        assert_eq!(c.calculate_phase(2.8, 0), Phase::Expert);
    }

    #[test]
    fn learned_needs_ease_and_repetitions() {
        let c = calc();
        assert_eq!(c.calculate_phase(3.2, 0), Phase::Expert);
        assert_eq!(c.calculate_phase(3.2, 4), Phase::Expert);
        assert_eq!(c.calculate_phase(3.0, 5), Phase::Learned);
        assert_eq!(c.calculate_phase(2.9, 10), Phase::Expert);
    }

    #[test]
    fn ease_below_floor_is_clamped() {
        assert_eq!(calc().calculate_phase(0.4, 0), Phase::New);
    }

    #[test]
    fn advances_at_most_one_band() {
        let c = calc();
        let next = c.calculate_new_phase(Phase::Learning, 5, 2.9, 4);
        assert_eq!(next, Phase::Familiar);
    }

    #[test]
    fn never_more_than_one_band_up_across_inputs() {
        let c = calc();
        for current in Phase::ASCENDING {
            for grade in 0..=5u8 {
                for reps in 0..8u32 {
                    for step in 0..30 {
                        let ease = 1.3 + step as f64 * 0.07;
                        let next = c.calculate_new_phase(current, grade, ease, reps);
                        assert!(
                            next.rank() <= current.rank() + 1,
                            "{:?} -> {:?} (grade {}, ease {}, reps {})",
                            current, next, grade, ease, reps
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn phase_one_requires_minimum_reviews() {
        let c = calc();
        assert_eq!(c.calculate_new_phase(Phase::New, 5, 2.1, 2), Phase::New);
        assert_eq!(c.calculate_new_phase(Phase::New, 5, 2.1, 3), Phase::Learning);
    }

    #[test]
    fn expert_graduates_to_learned() {
        let c = calc();
        assert_eq!(c.calculate_new_phase(Phase::Expert, 5, 3.1, 5), Phase::Learned);
        assert_eq!(c.calculate_new_phase(Phase::Expert, 5, 3.1, 4), Phase::Expert);
    }

    #[test]
    fn failure_leaves_learned() {
        let c = calc();
        let next = c.calculate_new_phase(Phase::Learned, 1, 3.4, 0);
        assert_eq!(next, Phase::Expert);
    }

    #[test]
    fn failure_never_moves_up() {
        let c = calc();
        assert_eq!(c.calculate_new_phase(Phase::Learning, 2, 2.7, 0), Phase::Learning);
        assert_eq!(c.calculate_new_phase(Phase::Mastered, 2, 2.3, 0), Phase::Familiar);
    }

    #[test]
    fn can_advance_checks_next_threshold() {
        let c = calc();
        assert!(c.can_advance_to_next_phase(Phase::Known, 3, 2.6));
        assert!(!c.can_advance_to_next_phase(Phase::Known, 3, 2.59));
        assert!(!c.can_advance_to_next_phase(Phase::Learned, 10, 4.0));
    }

    #[test]
    fn only_learned_gets_large_multiplier() {
        let c = calc();
        assert_eq!(c.phase_interval_multiplier(Phase::Learned), 3.0);
        assert_eq!(c.phase_interval_multiplier(Phase::New), 0.8);
    }

    #[test]
    fn details_and_progress() {
        let c = calc();
        let details = c.phase_details(Phase::Familiar);
        assert_eq!(details.name, "Familiar");
        assert_eq!(details.min_ease, 2.2);
        assert!((c.phase_progress(Phase::Familiar, 2.3) - 50.0).abs() < 1e-9);
        assert_eq!(c.phase_progress(Phase::Learned, 3.1), 100.0);
        assert_eq!(c.phase_progress(Phase::New, 2.5), 100.0);
    }

    #[test]
    fn maintenance_window_scales_with_ease() {
        let c = calc();
        let now = 200 * MS_PER_DAY;
        assert!(c.needs_maintenance_review(None, 3.0, now));
        assert!(c.needs_maintenance_review(Some(now - 90 * MS_PER_DAY), 3.0, now));
        assert!(!c.needs_maintenance_review(Some(now - 100 * MS_PER_DAY), 3.3, now));
        assert!(!c.needs_maintenance_review(Some(now - 150 * MS_PER_DAY), 3.6, now));
        assert!(c.needs_maintenance_review(Some(now - 180 * MS_PER_DAY), 3.6, now));
    }

    #[test]
    fn statistics_for_empty_input() {
        let stats = calc().phase_statistics(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.learned.count, 0);
        assert_eq!(stats.phase1.percentage, 0.0);
    }
}
