//! Core planning logic for DayBlocks.
//! This crate owns every planner invariant; UI shells go through `service`.

pub mod config;
pub mod db;
pub mod format;
pub mod heatmap;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;
pub mod timeline;
pub mod timer;

pub use config::{ConfigError, PlannerConfig};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use heatmap::{build_heatmap, Heatmap, HeatmapDay, HeatmapView};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::clock::ClockTime;
pub use model::habit::{Habit, HabitDraft};
pub use model::module::{Module, ModuleKind};
pub use model::tag::{Tag, TagPatch};
pub use model::time_block::{NewTimeBlock, TimeBlock, TimeBlockPatch};
pub use model::todo::{Todo, TodoDraft};
pub use model::ValidationError;
pub use repo::kv_repo::{
    InMemoryKvRepository, KvRepository, RepoError, RepoResult, SqliteKvRepository,
};
pub use service::error::{PlannerError, PlannerResult};
pub use service::habit_service::HabitService;
pub use service::heatmap_service::HeatmapService;
pub use service::module_service::ModuleService;
pub use service::tag_service::TagService;
pub use service::time_block_service::{TimeBlockForm, TimeBlockService, TimelineDrop};
pub use service::todo_service::TodoService;
pub use store::{PlannerStore, StoreError, StoreResult};
pub use timeline::{DayView, HourRange, PlacedBlock, SNAP_MINUTES};
pub use timer::{TimerConfig, TimerController, TimerMode, TimerSnapshot, TimerStatus};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
