//! Subcommands of the `review` binary.
//!
//! Every command runs against an already constructed scheduler and returns
//! the text to print, so the same code serves the binary and the tests.

pub mod migrate;
pub mod review;
pub mod stats;
pub mod transfer;

use anyhow::Result;
use clap::{Args, Subcommand};
use review_core::{Direction, KeyValueStore, ProfileKeyResolver, UnifiedSpacedRepetition};
use std::path::PathBuf;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List items due for review
    Due(DirectionArgs),
    /// Totals, due count, average ease and accuracy
    Stats(DirectionArgs),
    /// Grade one review (0-5) and store the result
    Grade(GradeArgs),
    /// Show the stored state of one item
    Show(ItemArgs),
    /// Move every legacy record into the active profile
    Migrate(DirectionArgs),
    /// Write the active profile as JSON
    Export(ExportArgs),
    /// Restore a JSON export into the active profile
    Import(ImportArgs),
    /// Distribution of items over the mastery phases
    Phases(DirectionArgs),
    /// Migration events recorded while opening the store
    Log,
}

#[derive(Debug, Args)]
pub struct DirectionArgs {
    /// Restrict to one direction (A→B, B→A, A->B, B->A)
    #[arg(long, short, value_parser = parse_direction)]
    pub direction: Option<Direction>,
}

#[derive(Debug, Args)]
pub struct ItemArgs {
    pub item: String,
    #[arg(long, short, value_parser = parse_direction)]
    pub direction: Option<Direction>,
}

#[derive(Debug, Args)]
pub struct GradeArgs {
    pub item: String,
    /// 0 = again ... 5 = easy
    pub grade: u8,
    #[arg(long, short, value_parser = parse_direction)]
    pub direction: Option<Direction>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    /// Write to this file instead of stdout
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    pub file: PathBuf,
}

pub fn parse_direction(raw: &str) -> std::result::Result<Direction, String> {
    Direction::from_str(raw)
        .ok_or_else(|| format!("unknown direction {raw:?}, expected A→B or B→A"))
}

/// Run `command` and return its output.
pub fn execute<S: KeyValueStore, R: ProfileKeyResolver>(
    sr: &mut UnifiedSpacedRepetition<S, R>,
    command: Command,
) -> Result<String> {
    let default_direction = sr.config().default_direction;
    match command {
        Command::Due(args) => stats::due(sr, args.direction),
        Command::Stats(args) => stats::stats(sr, args.direction),
        Command::Phases(args) => stats::phases(sr, args.direction),
        Command::Grade(args) => review::grade(
            sr,
            &args.item,
            args.grade,
            args.direction.unwrap_or(default_direction),
        ),
        Command::Show(args) => {
            review::show(sr, &args.item, args.direction.unwrap_or(default_direction))
        }
        Command::Migrate(args) => migrate::migrate(sr, args.direction.unwrap_or(default_direction)),
        Command::Log => migrate::log(sr),
        Command::Export(args) => transfer::export(sr, args.out.as_deref()),
        Command::Import(args) => transfer::import(sr, &args.file),
    }
}
