//! Short English summaries of a graded review.

use crate::phase::PhaseCalculator;
use crate::types::{from_millis, GradeFeedback, ReviewState, PASSING_GRADE};

const GRADE_NAMES: [&str; 6] = ["Again", "Hard", "Good", "Good", "Easy", "Easy"];

/// Human readable interval: days, then weeks, months and years.
pub fn format_interval(days: u32) -> String {
    let scaled = |unit: f64| (days as f64 / unit).round() as u32;
    match days {
        1 => "1 day".to_string(),
        0..=6 => format!("{} days", days),
        7..=29 => format!("{} weeks", scaled(7.0)),
        30..=364 => format!("{} months", scaled(30.0)),
        _ => format!("{} years", scaled(365.0)),
    }
}

/// Feedback for `state`, the record returned after grading with `grade`.
pub fn grade_feedback(grade: u8, state: &ReviewState, phases: &PhaseCalculator) -> GradeFeedback {
    let grade_name = GRADE_NAMES.get(grade as usize).copied().unwrap_or("Unknown");
    let phase_name = phases.phase_details(state.phase).name;

    let message = if grade < PASSING_GRADE {
        let plural = if state.interval == 1 { "" } else { "s" };
        format!("{} - Review again in {} day{}", grade_name, state.interval, plural)
    } else {
        format!(
            "{} - Next review in {} ({})",
            grade_name,
            format_interval(state.interval),
            phase_name
        )
    };

    GradeFeedback {
        grade,
        interval: state.interval,
        phase: state.phase,
        phase_name,
        next_review: from_millis(state.next_review),
        message,
    }
}
