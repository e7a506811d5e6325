//! Vocabulary review scheduling shared by the CLI and embedding applications.
//!
//! Provides:
//! - Direction-aware SM-2 scheduling
//! - Six-phase mastery progression on top of the ease factor
//! - Transparent migration of legacy, enhanced and profiled record layouts
//! - Profile-isolated storage over any string key-value medium

pub mod algorithm;
pub mod error;
pub mod feedback;
pub mod generation;
pub mod keys;
pub mod migration_log;
pub mod phase;
pub mod scheduler;
pub mod store;
pub mod types;

pub use algorithm::{ReviewAlgorithm, SchedulingResult};
pub use error::{Result, SchedulerError, StoreError};
pub use generation::{parse_any_generation, Generation, StoredRecord};
pub use keys::{NamespacedProfiles, ProfileKeyResolver, ReviewKey};
pub use migration_log::{MigrationEvent, MigrationLogEntry};
pub use phase::{PhaseCalculator, PhaseDetails, PhaseStatistics};
pub use scheduler::{ExportSnapshot, SchedulerConfig, UnifiedSpacedRepetition};
pub use store::{KeyValueStore, MemoryStore, ReviewStateStore};
pub use types::{
    Direction, GradeFeedback, ImportReport, MigrationReport, Phase, ReviewState, ReviewStats,
};
