//! SQLite collection backend.
//!
//! # Responsibility
//! - Map whole-collection `get`/`set` onto one table per entity.
//! - Own the connection lifecycle: lazy open, liveness ping before reuse,
//!   reopen after a failed ping, explicit close.
//!
//! # Invariants
//! - Array fields (`tags`, `subtasks`) are stored as JSON text.
//! - `position` preserves collection order; reads are `ORDER BY position`.
//! - Replacing a collection (or a batch of them) happens in one transaction.
//! - The handle is owned by its caller; there is no process-wide connection.

use super::{BackendError, BackendResult, Collection, CollectionBackend};
use crate::db::{open_db, open_db_in_memory, ping, DbError, DbResult};
use crate::model::coerce::parse_date;
use crate::model::goal::Goal;
use crate::model::reflection::Reflection;
use crate::model::task::{Priority, Task, TaskKind};
use crate::model::work_session::WorkSession;
use chrono::{DateTime, Utc};
use log::{info, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;

const TOTAL_STREAK_KEY: &str = "total_streak";

/// Where the backend opens its connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbSource {
    File(PathBuf),
    /// Private in-memory database; contents are lost when the connection is
    /// reopened.
    Memory,
}

type PingFn = fn(&Connection) -> DbResult<()>;

/// Relational backend over a lazily opened SQLite connection.
pub struct SqliteBackend {
    source: DbSource,
    conn: Option<Connection>,
    ping: PingFn,
    closed: bool,
}

impl SqliteBackend {
    /// Creates a handle without touching the database.
    pub fn new(source: DbSource) -> Self {
        Self {
            source,
            conn: None,
            ping,
            closed: false,
        }
    }

    /// Creates a handle and opens the connection eagerly.
    pub fn open(source: DbSource) -> BackendResult<Self> {
        let mut backend = Self::new(source);
        backend.connection()?;
        Ok(backend)
    }

    pub fn source(&self) -> &DbSource {
        &self.source
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Closes the connection. Later calls fail with `BackendError::Closed`.
    pub fn close(&mut self) -> BackendResult<()> {
        self.closed = true;
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, err)| BackendError::Db(err.into()))?;
            info!("event=db_close module=backend status=ok");
        }
        Ok(())
    }

    #[cfg(test)]
    fn with_ping(source: DbSource, ping: PingFn) -> Self {
        let mut backend = Self::new(source);
        backend.ping = ping;
        backend
    }

    fn connection(&mut self) -> BackendResult<&mut Connection> {
        if self.closed {
            return Err(BackendError::Closed);
        }

        let ping_result = self.conn.as_ref().map(self.ping);
        if let Some(Err(err)) = ping_result {
            warn!("event=db_ping module=backend status=error action=reconnect error={err}");
            self.conn = None;
        }

        if self.conn.is_none() {
            let conn = match &self.source {
                DbSource::File(path) => open_db(path),
                DbSource::Memory => open_db_in_memory(),
            }
            .map_err(BackendError::Connection)?;
            self.conn = Some(conn);
        }

        self.conn.as_mut().ok_or(BackendError::Closed)
    }
}

impl Drop for SqliteBackend {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            warn!("event=db_close module=backend status=error error={err}");
        }
    }
}

impl CollectionBackend for SqliteBackend {
    fn get(&mut self, collection: Collection) -> BackendResult<Option<Value>> {
        let conn = self.connection()?;
        match collection {
            Collection::Tasks => rows_to_value(collection, load_tasks(conn, collection)?),
            Collection::Goals => rows_to_value(collection, load_goals(conn, collection)?),
            Collection::WorkSessions => {
                rows_to_value(collection, load_work_sessions(conn, collection)?)
            }
            Collection::Reflections => {
                rows_to_value(collection, load_reflections(conn, collection)?)
            }
            Collection::TotalStreak => Ok(conn
                .query_row(
                    "SELECT value FROM user_settings WHERE key = ?1;",
                    [TOTAL_STREAK_KEY],
                    |row| row.get::<_, String>(0),
                )
                .optional()?
                .map(Value::String)),
        }
    }

    fn set(&mut self, collection: Collection, value: &Value) -> BackendResult<()> {
        self.set_batch(&[(collection, value.clone())])
    }

    fn set_batch(&mut self, entries: &[(Collection, Value)]) -> BackendResult<()> {
        let conn = self.connection()?;
        let tx = conn.transaction()?;
        for (collection, value) in entries {
            write_collection(&tx, *collection, value)?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn write_collection(tx: &Transaction<'_>, collection: Collection, value: &Value) -> BackendResult<()> {
    match collection {
        Collection::Tasks => {
            let tasks: Vec<Task> = value_to_rows(collection, value)?;
            tx.execute("DELETE FROM tasks;", [])?;
            for (position, task) in tasks.iter().enumerate() {
                tx.execute(
                    "INSERT INTO tasks (
                        id, position, title, type, completed, streak, category,
                        emoji, due_date, priority, tags, created_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12);",
                    params![
                        task.id.as_str(),
                        position as i64,
                        task.title,
                        task.kind.as_str(),
                        task.completed,
                        task.streak,
                        task.category,
                        task.emoji,
                        task.due_date.map(|date| date.to_string()),
                        task.priority.as_str(),
                        encode_list("tasks.tags", &task.tags)?,
                        task.created_at.to_rfc3339(),
                    ],
                )?;
            }
        }
        Collection::Goals => {
            let goals: Vec<Goal> = value_to_rows(collection, value)?;
            tx.execute("DELETE FROM goals;", [])?;
            for (position, goal) in goals.iter().enumerate() {
                tx.execute(
                    "INSERT INTO goals (
                        id, position, title, description, deadline, progress,
                        subtasks, category, motivational_quote
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                    params![
                        goal.id.as_str(),
                        position as i64,
                        goal.title,
                        goal.description,
                        goal.deadline.to_string(),
                        goal.progress,
                        encode_list("goals.subtasks", &goal.subtasks)?,
                        goal.category,
                        goal.motivational_quote,
                    ],
                )?;
            }
        }
        Collection::WorkSessions => {
            let sessions: Vec<WorkSession> = value_to_rows(collection, value)?;
            tx.execute("DELETE FROM work_sessions;", [])?;
            for (position, session) in sessions.iter().enumerate() {
                tx.execute(
                    "INSERT INTO work_sessions (
                        id, position, project, duration, tags, date, notes, mood
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                    params![
                        session.id.as_str(),
                        position as i64,
                        session.project,
                        session.duration,
                        encode_list("work_sessions.tags", &session.tags)?,
                        session.date.to_string(),
                        session.notes,
                        session.mood,
                    ],
                )?;
            }
        }
        Collection::Reflections => {
            let reflections: Vec<Reflection> = value_to_rows(collection, value)?;
            tx.execute("DELETE FROM reflections;", [])?;
            for (position, reflection) in reflections.iter().enumerate() {
                tx.execute(
                    "INSERT INTO reflections (
                        id, position, date, prompt, response, mood
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                    params![
                        reflection.id.as_str(),
                        position as i64,
                        reflection.date.to_string(),
                        reflection.prompt,
                        reflection.response,
                        reflection.mood,
                    ],
                )?;
            }
        }
        Collection::TotalStreak => {
            let text = match value {
                Value::String(text) => text.clone(),
                Value::Number(number) => number.to_string(),
                other => {
                    return Err(BackendError::InvalidValue {
                        collection,
                        message: format!("expected number or numeric text, got `{other}`"),
                    })
                }
            };
            tx.execute(
                "INSERT INTO user_settings (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![TOTAL_STREAK_KEY, text],
            )?;
        }
    }
    Ok(())
}

fn load_tasks(conn: &Connection, collection: Collection) -> BackendResult<Vec<Task>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, type, completed, streak, category, emoji, due_date,
                priority, tags, created_at
         FROM tasks
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        let kind_text: String = row.get("type")?;
        let kind = TaskKind::parse(&kind_text)
            .ok_or_else(|| invalid_row(collection, format!("unknown task type `{kind_text}`")))?;
        let priority_text: String = row.get("priority")?;
        let priority = Priority::parse(&priority_text).ok_or_else(|| {
            invalid_row(collection, format!("unknown priority `{priority_text}`"))
        })?;
        let due_date = match row.get::<_, Option<String>>("due_date")? {
            Some(text) => Some(
                parse_date(&text)
                    .ok_or_else(|| invalid_row(collection, format!("invalid due_date `{text}`")))?,
            ),
            None => None,
        };
        let created_text: String = row.get("created_at")?;
        let created_at = DateTime::parse_from_rfc3339(&created_text)
            .map_err(|_| invalid_row(collection, format!("invalid created_at `{created_text}`")))?
            .with_timezone(&Utc);

        tasks.push(Task {
            id: row.get::<_, String>("id")?.into(),
            title: row.get("title")?,
            kind,
            completed: row.get("completed")?,
            streak: row.get("streak")?,
            category: row.get("category")?,
            emoji: row.get("emoji")?,
            due_date,
            priority,
            tags: decode_list(row, "tags")?,
            created_at,
        });
    }
    Ok(tasks)
}

fn load_goals(conn: &Connection, collection: Collection) -> BackendResult<Vec<Goal>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, description, deadline, progress, subtasks, category,
                motivational_quote
         FROM goals
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut goals = Vec::new();
    while let Some(row) = rows.next()? {
        let deadline_text: String = row.get("deadline")?;
        goals.push(Goal {
            id: row.get::<_, String>("id")?.into(),
            title: row.get("title")?,
            description: row.get("description")?,
            deadline: parse_date(&deadline_text).ok_or_else(|| {
                invalid_row(collection, format!("invalid deadline `{deadline_text}`"))
            })?,
            progress: row.get("progress")?,
            subtasks: decode_list(row, "subtasks")?,
            category: row.get("category")?,
            motivational_quote: row.get("motivational_quote")?,
        });
    }
    Ok(goals)
}

fn load_work_sessions(conn: &Connection, collection: Collection) -> BackendResult<Vec<WorkSession>> {
    let mut stmt = conn.prepare(
        "SELECT id, project, duration, tags, date, notes, mood
         FROM work_sessions
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut sessions = Vec::new();
    while let Some(row) = rows.next()? {
        let date_text: String = row.get("date")?;
        sessions.push(WorkSession {
            id: row.get::<_, String>("id")?.into(),
            project: row.get("project")?,
            duration: row.get("duration")?,
            tags: decode_list(row, "tags")?,
            date: parse_date(&date_text)
                .ok_or_else(|| invalid_row(collection, format!("invalid date `{date_text}`")))?,
            notes: row.get("notes")?,
            mood: row.get("mood")?,
        });
    }
    Ok(sessions)
}

fn load_reflections(conn: &Connection, collection: Collection) -> BackendResult<Vec<Reflection>> {
    let mut stmt = conn.prepare(
        "SELECT id, date, prompt, response, mood
         FROM reflections
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut reflections = Vec::new();
    while let Some(row) = rows.next()? {
        let date_text: String = row.get("date")?;
        reflections.push(Reflection {
            id: row.get::<_, String>("id")?.into(),
            date: parse_date(&date_text)
                .ok_or_else(|| invalid_row(collection, format!("invalid date `{date_text}`")))?,
            prompt: row.get("prompt")?,
            response: row.get("response")?,
            mood: row.get("mood")?,
        });
    }
    Ok(reflections)
}

fn value_to_rows<T: DeserializeOwned>(collection: Collection, value: &Value) -> BackendResult<Vec<T>> {
    serde_json::from_value(value.clone()).map_err(|err| BackendError::InvalidValue {
        collection,
        message: err.to_string(),
    })
}

fn rows_to_value<T: Serialize>(collection: Collection, rows: Vec<T>) -> BackendResult<Option<Value>> {
    serde_json::to_value(rows)
        .map(Some)
        .map_err(|err| invalid_row(collection, err.to_string()))
}

fn encode_list(column: &'static str, items: &[String]) -> BackendResult<String> {
    serde_json::to_string(items).map_err(|source| BackendError::Db(DbError::Json { column, source }))
}

fn decode_list(row: &Row<'_>, column: &'static str) -> BackendResult<Vec<String>> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text).map_err(|source| BackendError::Db(DbError::Json { column, source }))
}

fn invalid_row(collection: Collection, message: String) -> BackendError {
    BackendError::InvalidRow {
        collection,
        message,
    }
}
