//! Record identifiers and identifier generation.
//!
//! # Invariants
//! - Identifiers are opaque text. Generated ids are UUID v4 strings, but
//!   legacy and sample records may carry arbitrary text such as `"1"`.
//! - A generator never yields the same id twice within one process.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every record in every collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EntityId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Source of fresh record identifiers.
pub trait IdGenerator {
    fn next_id(&self) -> EntityId;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> EntityId {
        EntityId(Uuid::new_v4().to_string())
    }
}

/// Deterministic `<prefix>-<n>` identifiers for tests and fixtures.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: Cell<u64>,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Cell::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> EntityId {
        let value = self.next.get();
        self.next.set(value + 1);
        EntityId(format!("{}-{value}", self.prefix))
    }
}
