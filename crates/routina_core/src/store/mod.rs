//! Application data store.
//!
//! # Responsibility
//! - Hold the in-memory snapshot of every collection and the global streak.
//! - Route mutations through the data service and apply them on success.
//! - Surface the latest failure in a single error slot and to listeners.
//!
//! # Invariants
//! - In-memory state changes only after the backing write succeeded.
//! - A failed mutation keeps prior state; nothing is rolled back or retried.
//! - Sample data is substituted only at initialization, never after a later
//!   failure.

mod app_store;
pub mod sample;

pub use app_store::{AppStore, StoreEvent, StoreResult};

use crate::model::goal::Goal;
use crate::model::reflection::Reflection;
use crate::model::task::Task;
use crate::model::work_session::WorkSession;

/// Full set of collections held by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub tasks: Vec<Task>,
    pub goals: Vec<Goal>,
    pub work_sessions: Vec<WorkSession>,
    pub reflections: Vec<Reflection>,
    pub total_streak: u32,
}
