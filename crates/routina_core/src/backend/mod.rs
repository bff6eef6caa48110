//! Whole-collection persistence backends.
//!
//! # Responsibility
//! - Define the `get`/`set` contract over named collections.
//! - Host the local blob backend and the SQLite backend.
//!
//! # Invariants
//! - Reads are idempotent: repeated `get` without `set` yields equal values.
//! - `set` then `get` on the same collection yields an equal value, modulo
//!   number/text coercion in the local backend.
//! - Backends operate on an entire collection at a time, never per record.

use crate::db::DbError;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod local;
pub mod sqlite;

pub use local::{BlobSlot, FileSlot, LocalBackend, MemorySlot, NAMESPACE_KEY};
pub use sqlite::{DbSource, SqliteBackend};

/// Named durable collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Tasks,
    Goals,
    WorkSessions,
    Reflections,
    /// Global cumulative completion counter.
    TotalStreak,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Self::Tasks,
        Self::Goals,
        Self::WorkSessions,
        Self::Reflections,
        Self::TotalStreak,
    ];

    /// Key used in the local blob layout.
    pub fn key(self) -> &'static str {
        match self {
            Self::Tasks => "tasks",
            Self::Goals => "goals",
            Self::WorkSessions => "workSessions",
            Self::Reflections => "reflections",
            Self::TotalStreak => "totalStreak",
        }
    }
}

impl Display for Collection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

#[derive(Debug)]
pub enum BackendError {
    /// Connection could not be opened or failed its liveness ping.
    Connection(DbError),
    /// Statement failed on an open connection.
    Db(DbError),
    /// Value handed to `set` does not fit the collection's shape.
    InvalidValue {
        collection: Collection,
        message: String,
    },
    /// Stored row cannot be mapped back into a record.
    InvalidRow {
        collection: Collection,
        message: String,
    },
    /// Backend was closed by its owner.
    Closed,
}

impl Display for BackendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "storage unavailable: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidValue {
                collection,
                message,
            } => write!(f, "invalid value for `{collection}`: {message}"),
            Self::InvalidRow {
                collection,
                message,
            } => write!(f, "invalid persisted `{collection}` data: {message}"),
            Self::Closed => write!(f, "storage backend is closed"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err) | Self::Db(err) => Some(err),
            Self::InvalidValue { .. } | Self::InvalidRow { .. } | Self::Closed => None,
        }
    }
}

impl From<DbError> for BackendError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for BackendError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable key-value store holding whole collections.
pub trait CollectionBackend {
    /// Loads a collection; `None` when it was never written.
    fn get(&mut self, collection: Collection) -> BackendResult<Option<Value>>;

    /// Replaces a collection.
    fn set(&mut self, collection: Collection, value: &Value) -> BackendResult<()>;

    /// Replaces several collections as one unit.
    ///
    /// Default writes them one after another.
    fn set_batch(&mut self, entries: &[(Collection, Value)]) -> BackendResult<()> {
        for (collection, value) in entries {
            self.set(*collection, value)?;
        }
        Ok(())
    }
}

impl<B: CollectionBackend + ?Sized> CollectionBackend for Box<B> {
    fn get(&mut self, collection: Collection) -> BackendResult<Option<Value>> {
        (**self).get(collection)
    }

    fn set(&mut self, collection: Collection, value: &Value) -> BackendResult<()> {
        (**self).set(collection, value)
    }

    fn set_batch(&mut self, entries: &[(Collection, Value)]) -> BackendResult<()> {
        (**self).set_batch(entries)
    }
}
