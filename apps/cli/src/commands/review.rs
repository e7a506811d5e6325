//! Grading and inspecting single items.

use anyhow::{Context, Result};
use chrono::Utc;
use review_core::{Direction, KeyValueStore, Phase, ProfileKeyResolver, UnifiedSpacedRepetition};
use serde_json::json;

/// Load, grade and persist one item. Returns the learner-facing message.
pub fn grade<S: KeyValueStore, R: ProfileKeyResolver>(
    sr: &mut UnifiedSpacedRepetition<S, R>,
    item: &str,
    grade: u8,
    direction: Direction,
) -> Result<String> {
    let state = sr.load_state(item, direction);
    let next = sr
        .schedule_next(&state, grade, None)
        .with_context(|| format!("grading {item} {direction}"))?;
    sr.save_state(&next)
        .with_context(|| format!("saving {item} {direction}"))?;

    tracing::debug!(item, grade, interval = next.interval, "review stored");
    Ok(sr.grade_feedback(grade, &next).message)
}

pub fn show<S: KeyValueStore, R: ProfileKeyResolver>(
    sr: &mut UnifiedSpacedRepetition<S, R>,
    item: &str,
    direction: Direction,
) -> Result<String> {
    let state = sr.load_state(item, direction);
    let phases = sr.phases();
    let details = phases.phase_details(state.phase);
    let maintenance_due = state.phase == Phase::Learned
        && phases.needs_maintenance_review(
            state.last_review,
            state.ease_factor,
            Utc::now().timestamp_millis(),
        );

    let view = json!({
        "state": state,
        "phaseName": details.name,
        "progress": phases.phase_progress(state.phase, state.ease_factor).round(),
        "maintenanceDue": maintenance_due,
    });
    Ok(serde_json::to_string_pretty(&view)?)
}
