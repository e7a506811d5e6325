pub mod commands;
pub mod config;
pub mod db;

use anyhow::Context;
use clap::Parser;
use review_core::{NamespacedProfiles, UnifiedSpacedRepetition};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::Command;
use crate::config::Config;
use crate::db::SqliteStore;

pub type Scheduler = UnifiedSpacedRepetition<SqliteStore, NamespacedProfiles>;

/// Spaced repetition reviews for vocabulary, stored in a local SQLite file.
#[derive(Debug, Parser)]
#[command(name = "review", version)]
pub struct Cli {
    /// Database file (overrides REVIEW_DB_PATH)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Learner profile (overrides REVIEW_PROFILE)
    #[arg(long, short, global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Build a scheduler over the configured database.
pub fn open_scheduler(config: &Config) -> anyhow::Result<Scheduler> {
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    let profiles = NamespacedProfiles::new(config.namespace.clone(), config.profile.clone());
    Ok(UnifiedSpacedRepetition::new(store, profiles, config.scheduler_config()))
}

pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(profile) = cli.profile {
        config.profile = profile;
    }

    tracing::info!(
        db = %config.db_path.display(),
        profile = %config.profile,
        "opening review store"
    );
    let mut scheduler = open_scheduler(&config)?;

    let output = commands::execute(&mut scheduler, cli.command)?;
    println!("{output}");
    Ok(())
}
