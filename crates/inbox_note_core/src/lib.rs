//! Scheduled inbox note plugin core.
//! Builds inbox notes from partial configs and decides, on each scheduler
//! trigger, whether the example note should be placed in the host inbox.

pub mod config;
pub mod db;
pub mod host;
pub mod logging;
pub mod model;
pub mod plugin;
pub mod repo;
pub mod schedule;
pub mod service;

pub use config::{ConfigError, DedupPolicy, PluginConfig};
pub use host::{
    meets_minimum_version, HostEnvironment, NoopTextDomainLoader, TextDomainLoader,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::config::{ActionConfig, NoteConfig};
pub use model::note::{
    ActionQuery, ActionStatus, Note, NoteAction, NoteId, NoteType, NoteValidationError,
};
pub use plugin::{LoadOutcome, NotePlugin, ProgrammingError, Registration};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use repo::settings_repo::{SettingsStore, SqliteSettingsStore};
pub use schedule::{InProcessScheduler, JobScheduler, ScheduleError, ScheduleInterval};
pub use service::gatekeeper::{
    active_for, example_note_config, GateOutcome, GatekeeperError, NoteGatekeeper,
};
pub use service::note_builder::{build_note, NoteBuilder, NoteDefaults};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Current time as Unix epoch seconds; `0` if the clock predates the epoch.
pub fn unix_now_secs() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_secs() as i64)
}
