//! Core domain logic for Routina, a personal productivity tracker.
//! This crate owns persistence, business invariants and derived statistics.

pub mod backend;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod service;
pub mod stats;
pub mod store;

pub use backend::{
    BackendError, BackendResult, Collection, CollectionBackend, DbSource, LocalBackend,
    SqliteBackend,
};
pub use config::{open_backend, AppConfig, BackendKind};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::clock::{Clock, FixedClock, SystemClock};
pub use model::goal::{Goal, GoalPatch, NewGoal};
pub use model::ids::{EntityId, IdGenerator, SequentialIds, UuidGenerator};
pub use model::reflection::{NewReflection, Reflection, ReflectionPatch};
pub use model::task::{NewTask, Priority, Task, TaskKind, TaskPatch};
pub use model::work_session::{NewWorkSession, WorkSession, WorkSessionPatch};
pub use service::data_service::{DataService, ServiceError, ServiceResult, ToggleOutcome};
pub use store::{AppStore, Snapshot, StoreEvent, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
