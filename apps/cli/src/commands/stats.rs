//! Read-only queries over the active profile.

use anyhow::Result;
use review_core::{Direction, KeyValueStore, ProfileKeyResolver, UnifiedSpacedRepetition};
use std::fmt::Write;

/// One line per due item.
pub fn due<S: KeyValueStore, R: ProfileKeyResolver>(
    sr: &UnifiedSpacedRepetition<S, R>,
    direction: Option<Direction>,
) -> Result<String> {
    let due = sr.get_due_items(direction);
    if due.is_empty() {
        return Ok("Nothing due.".to_string());
    }

    let mut out = format!("{} due\n", due.len());
    for state in &due {
        let details = sr.phases().phase_details(state.phase);
        writeln!(
            out,
            "{:<24} {}  {} {:<9} ease {:.2}",
            state.item_id, state.direction, details.icon, details.name, state.ease_factor
        )?;
    }
    Ok(out.trim_end().to_string())
}

pub fn stats<S: KeyValueStore, R: ProfileKeyResolver>(
    sr: &UnifiedSpacedRepetition<S, R>,
    direction: Option<Direction>,
) -> Result<String> {
    Ok(serde_json::to_string_pretty(&sr.get_stats(direction))?)
}

pub fn phases<S: KeyValueStore, R: ProfileKeyResolver>(
    sr: &UnifiedSpacedRepetition<S, R>,
    direction: Option<Direction>,
) -> Result<String> {
    Ok(serde_json::to_string_pretty(&sr.phase_statistics(direction))?)
}
