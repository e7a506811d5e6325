//! JSON export and import of the active profile.

use anyhow::{Context, Result};
use review_core::{KeyValueStore, ProfileKeyResolver, UnifiedSpacedRepetition};
use std::path::Path;

pub fn export<S: KeyValueStore, R: ProfileKeyResolver>(
    sr: &UnifiedSpacedRepetition<S, R>,
    out: Option<&Path>,
) -> Result<String> {
    let json = sr.export_data()?;
    match out {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("writing export to {}", path.display()))?;
            Ok(format!("exported to {}", path.display()))
        }
        None => Ok(json),
    }
}

pub fn import<S: KeyValueStore, R: ProfileKeyResolver>(
    sr: &mut UnifiedSpacedRepetition<S, R>,
    file: &Path,
) -> Result<String> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let report = sr.import_data(&json)?;
    Ok(format!(
        "imported {}, skipped {}, failed {}",
        report.imported, report.skipped, report.failed
    ))
}
