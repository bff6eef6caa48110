//! Typed CRUD over whole-collection backends.
//!
//! # Responsibility
//! - Translate backend `get`/`set` into per-entity create/read/update/delete.
//! - Assign identifiers and creation defaults.
//! - Recover legacy or malformed stored records without failing the read.
//!
//! # Invariants
//! - Every write persists the entire collection.
//! - Writes never drop stored entries that fail to decode; only reads skip them.
//! - Updating or deleting an unknown id is a no-op, never an error.
//! - Backend failures propagate unchanged; nothing is retried.
//! - A task toggle and its global streak change are written in one batch.

use crate::backend::{BackendError, Collection, CollectionBackend};
use crate::model::clock::{Clock, SystemClock};
use crate::model::coerce::number_from_value;
use crate::model::goal::{clamp_progress, Goal, GoalPatch, NewGoal};
use crate::model::ids::{EntityId, IdGenerator, UuidGenerator};
use crate::model::reflection::{NewReflection, Reflection, ReflectionPatch};
use crate::model::task::{NewTask, Task, TaskPatch};
use crate::model::work_session::{NewWorkSession, WorkSession, WorkSessionPatch};
use crate::model::Entity;
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    /// Persistence-layer failure.
    Backend(BackendError),
    /// Collection could not be encoded for storage.
    Encode {
        collection: Collection,
        source: serde_json::Error,
    },
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(err) => write!(f, "{err}"),
            Self::Encode { collection, source } => {
                write!(f, "failed to encode `{collection}`: {source}")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(err) => Some(err),
            Self::Encode { source, .. } => Some(source),
        }
    }
}

impl From<BackendError> for ServiceError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}

/// Outcome of a persisted completion toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleOutcome {
    /// Task after the flip.
    pub task: Task,
    /// Global cumulative streak after the flip.
    pub total_streak: u32,
}

/// Data service over a backend, a clock and an id generator.
pub struct DataService<B, C = SystemClock, G = UuidGenerator> {
    backend: B,
    clock: C,
    ids: G,
}

impl<B: CollectionBackend> DataService<B> {
    /// Creates a service using the wall clock and UUID identifiers.
    pub fn new(backend: B) -> Self {
        Self::with_collaborators(backend, SystemClock, UuidGenerator)
    }
}

impl<B: CollectionBackend, C: Clock, G: IdGenerator> DataService<B, C, G> {
    pub fn with_collaborators(backend: B, clock: C, ids: G) -> Self {
        Self {
            backend,
            clock,
            ids,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Releases the backend to its owner.
    pub fn into_backend(self) -> B {
        self.backend
    }

    // Tasks

    /// Creates a task with `streak = 0` and `createdAt = now`.
    pub fn create_task(&mut self, new_task: NewTask) -> ServiceResult<EntityId> {
        self.create_task_record(new_task).map(|task| task.id)
    }

    /// Same as [`Self::create_task`], returning the stored record.
    pub fn create_task_record(&mut self, new_task: NewTask) -> ServiceResult<Task> {
        let task = new_task.into_task(self.ids.next_id(), self.clock.now_utc());
        self.insert(task)
    }

    /// All tasks, newest `createdAt` first.
    pub fn get_all_tasks(&mut self) -> ServiceResult<Vec<Task>> {
        self.get_all()
    }

    /// Merges `patch` into the task. Returns the updated task, or `None` when
    /// the id is unknown.
    pub fn update_task(&mut self, id: &EntityId, patch: TaskPatch) -> ServiceResult<Option<Task>> {
        self.update(id, patch)
    }

    /// Removes the task. Returns whether it existed.
    pub fn delete_task(&mut self, id: &EntityId) -> ServiceResult<bool> {
        self.delete::<Task>(id)
    }

    /// Flips completion and persists the task and global streak together.
    ///
    /// Completing adds 1 to both the task streak and the global streak.
    /// Un-completing subtracts 1 from the task streak, floored at 0, and leaves
    /// the global streak alone. Returns `None` when the id is unknown.
    pub fn toggle_task(&mut self, id: &EntityId) -> ServiceResult<Option<ToggleOutcome>> {
        let mut raw = self.load_raw(Collection::Tasks)?;
        let Some((index, mut task)) = find_record::<Task>(&raw, id) else {
            debug!("event=task_toggle module=service status=skipped reason=not_found id={id}");
            return Ok(None);
        };

        let toggle = task.toggled();
        task.apply_toggle(toggle);
        raw[index] = encode(Collection::Tasks, &task)?;

        let mut total_streak = self.get_total_streak()?;
        let mut entries = vec![(Collection::Tasks, Value::Array(raw))];
        if toggle.total_streak_delta > 0 {
            total_streak = total_streak.saturating_add(toggle.total_streak_delta);
            entries.push((Collection::TotalStreak, total_streak_value(total_streak)));
        }
        self.backend.set_batch(&entries)?;

        debug!(
            "event=task_toggle module=service status=ok id={id} completed={} streak={} total_streak={total_streak}",
            task.completed, task.streak
        );
        Ok(Some(ToggleOutcome { task, total_streak }))
    }

    // Goals

    pub fn create_goal(&mut self, new_goal: NewGoal) -> ServiceResult<EntityId> {
        self.create_goal_record(new_goal).map(|goal| goal.id)
    }

    pub fn create_goal_record(&mut self, new_goal: NewGoal) -> ServiceResult<Goal> {
        let goal = new_goal.into_goal(self.ids.next_id());
        self.insert(goal)
    }

    /// All goals in stored order.
    pub fn get_all_goals(&mut self) -> ServiceResult<Vec<Goal>> {
        self.get_all()
    }

    pub fn update_goal(&mut self, id: &EntityId, patch: GoalPatch) -> ServiceResult<Option<Goal>> {
        self.update(id, patch)
    }

    /// Sets goal progress, clamped to `[0, 100]`.
    pub fn update_goal_progress(
        &mut self,
        id: &EntityId,
        progress: i64,
    ) -> ServiceResult<Option<Goal>> {
        if i64::from(clamp_progress(progress)) != progress {
            warn!("event=goal_progress module=service status=clamped id={id} requested={progress}");
        }
        self.update(
            id,
            GoalPatch {
                progress: Some(progress),
                ..GoalPatch::default()
            },
        )
    }

    pub fn delete_goal(&mut self, id: &EntityId) -> ServiceResult<bool> {
        self.delete::<Goal>(id)
    }

    // Work sessions

    pub fn create_work_session(&mut self, new_session: NewWorkSession) -> ServiceResult<EntityId> {
        self.create_work_session_record(new_session)
            .map(|session| session.id)
    }

    pub fn create_work_session_record(
        &mut self,
        new_session: NewWorkSession,
    ) -> ServiceResult<WorkSession> {
        let session = new_session.into_session(self.ids.next_id());
        self.insert(session)
    }

    /// All sessions, most recent date first.
    pub fn get_all_work_sessions(&mut self) -> ServiceResult<Vec<WorkSession>> {
        self.get_all()
    }

    pub fn update_work_session(
        &mut self,
        id: &EntityId,
        patch: WorkSessionPatch,
    ) -> ServiceResult<Option<WorkSession>> {
        self.update(id, patch)
    }

    pub fn delete_work_session(&mut self, id: &EntityId) -> ServiceResult<bool> {
        self.delete::<WorkSession>(id)
    }

    // Reflections

    pub fn create_reflection(&mut self, new_reflection: NewReflection) -> ServiceResult<EntityId> {
        self.create_reflection_record(new_reflection)
            .map(|reflection| reflection.id)
    }

    pub fn create_reflection_record(
        &mut self,
        new_reflection: NewReflection,
    ) -> ServiceResult<Reflection> {
        let reflection = new_reflection.into_reflection(self.ids.next_id());
        self.insert(reflection)
    }

    /// All reflections, most recent date first.
    pub fn get_all_reflections(&mut self) -> ServiceResult<Vec<Reflection>> {
        self.get_all()
    }

    pub fn update_reflection(
        &mut self,
        id: &EntityId,
        patch: ReflectionPatch,
    ) -> ServiceResult<Option<Reflection>> {
        self.update(id, patch)
    }

    pub fn delete_reflection(&mut self, id: &EntityId) -> ServiceResult<bool> {
        self.delete::<Reflection>(id)
    }

    // Settings

    /// Global cumulative streak; 0 when unset or unreadable.
    pub fn get_total_streak(&mut self) -> ServiceResult<u32> {
        let Some(value) = self.backend.get(Collection::TotalStreak)? else {
            return Ok(0);
        };
        match number_from_value(&value) {
            Some(number) if number >= 0.0 => Ok(number.trunc().min(f64::from(u32::MAX)) as u32),
            _ => {
                warn!("event=collection_load module=service status=recovered collection=totalStreak reason=not_a_number");
                Ok(0)
            }
        }
    }

    /// Persists the global streak as numeric text.
    pub fn update_total_streak(&mut self, total_streak: u32) -> ServiceResult<()> {
        self.backend
            .set(Collection::TotalStreak, &total_streak_value(total_streak))?;
        Ok(())
    }

    fn get_all<E: Entity>(&mut self) -> ServiceResult<Vec<E>> {
        let mut items = self.load::<E>()?;
        E::sort_collection(&mut items);
        Ok(items)
    }

    fn insert<E: Entity>(&mut self, record: E) -> ServiceResult<E> {
        let mut raw = self.load_raw(E::COLLECTION)?;
        raw.insert(0, encode(E::COLLECTION, &record)?);
        self.backend.set(E::COLLECTION, &Value::Array(raw))?;
        debug!(
            "event=record_create module=service status=ok collection={} id={}",
            E::COLLECTION,
            record.id()
        );
        Ok(record)
    }

    fn update<E: Entity>(&mut self, id: &EntityId, patch: E::Patch) -> ServiceResult<Option<E>> {
        let mut raw = self.load_raw(E::COLLECTION)?;
        let Some((index, mut item)) = find_record::<E>(&raw, id) else {
            debug!(
                "event=record_update module=service status=skipped reason=not_found collection={} id={id}",
                E::COLLECTION
            );
            return Ok(None);
        };

        item.apply_patch(patch);
        raw[index] = encode(E::COLLECTION, &item)?;
        self.backend.set(E::COLLECTION, &Value::Array(raw))?;
        Ok(Some(item))
    }

    /// Removes every stored entry carrying `id`. Nothing is written when no
    /// entry matches.
    fn delete<E: Entity>(&mut self, id: &EntityId) -> ServiceResult<bool> {
        let mut raw = self.load_raw(E::COLLECTION)?;
        let before = raw.len();
        raw.retain(|value| !has_id(value, id));
        if raw.len() == before {
            debug!(
                "event=record_delete module=service status=skipped reason=not_found collection={} id={id}",
                E::COLLECTION
            );
            return Ok(false);
        }
        self.backend.set(E::COLLECTION, &Value::Array(raw))?;
        Ok(true)
    }

    /// Loads a collection in stored order, skipping records that fail to
    /// decode. Read path only; writes go through [`Self::load_raw`] so that
    /// undecodable entries are carried over untouched.
    fn load<E: Entity>(&mut self) -> ServiceResult<Vec<E>> {
        let collection = E::COLLECTION;
        let raw = self.load_raw(collection)?;
        let total = raw.len();
        let items: Vec<E> = raw
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<E>(value) {
                Ok(item) => Some(item),
                Err(err) => {
                    warn!("event=collection_load module=service status=recovered collection={collection} reason=bad_record error={err}");
                    None
                }
            })
            .collect();

        debug!(
            "event=collection_load module=service status=ok collection={collection} count={} skipped={}",
            items.len(),
            total - items.len()
        );
        Ok(items)
    }

    /// Stored entries as JSON values, in stored order.
    fn load_raw(&mut self, collection: Collection) -> ServiceResult<Vec<Value>> {
        let raw = match self.backend.get(collection)? {
            None => Vec::new(),
            Some(Value::Array(raw)) => raw,
            Some(Value::String(text)) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Array(raw)) => raw,
                _ => {
                    warn!("event=collection_load module=service status=recovered collection={collection} reason=not_an_array");
                    Vec::new()
                }
            },
            Some(_) => {
                warn!("event=collection_load module=service status=recovered collection={collection} reason=not_an_array");
                Vec::new()
            }
        };
        Ok(raw)
    }
}

/// First stored entry carrying `id` that decodes as `E`, with its index.
fn find_record<E: Entity>(raw: &[Value], id: &EntityId) -> Option<(usize, E)> {
    raw.iter()
        .enumerate()
        .filter(|(_, value)| has_id(value, id))
        .find_map(|(index, value)| match serde_json::from_value::<E>(value.clone()) {
            Ok(item) => Some((index, item)),
            Err(err) => {
                warn!(
                    "event=record_decode module=service status=skipped collection={} id={id} error={err}",
                    E::COLLECTION
                );
                None
            }
        })
}

fn has_id(value: &Value, id: &EntityId) -> bool {
    match value.get("id") {
        Some(Value::String(text)) => text == id.as_str(),
        Some(Value::Number(number)) => number.to_string() == id.as_str(),
        _ => false,
    }
}

fn encode<T: Serialize>(collection: Collection, item: &T) -> ServiceResult<Value> {
    serde_json::to_value(item).map_err(|source| ServiceError::Encode { collection, source })
}

fn total_streak_value(total_streak: u32) -> Value {
    Value::String(total_streak.to_string())
}

#[cfg(test)]
mod tests {
    use super::DataService;
    use crate::backend::{Collection, CollectionBackend, LocalBackend, MemorySlot};
    use crate::model::clock::FixedClock;
    use crate::model::ids::SequentialIds;
    use chrono::NaiveDate;
    use serde_json::json;

    fn service(slot: MemorySlot) -> DataService<LocalBackend<MemorySlot>, FixedClock, SequentialIds> {
        DataService::with_collaborators(
            LocalBackend::new(slot),
            FixedClock::at_date(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()),
            SequentialIds::new("id"),
        )
    }

    #[test]
    fn bad_records_are_skipped_and_good_ones_kept() {
        let blob = json!({
            "workSessions": [
                {"id": "1", "project": "DSA", "duration": "120", "date": "2025-01-14"},
                {"id": "2", "project": "Broken", "duration": 30, "date": "not a date"},
                {"id": "3", "project": "React", "duration": 90, "date": "2025-01-15", "tags": null}
            ]
        });
        let mut service = service(MemorySlot::with_blob(blob.to_string()));

        let sessions = service.get_all_work_sessions().unwrap();
        let ids: Vec<&str> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert_eq!(sessions[1].duration, 120);
        assert!(sessions[0].tags.is_empty());
    }

    #[test]
    fn collection_stored_as_encoded_text_is_decoded() {
        let encoded = json!([{"id": "r1", "date": "2025-01-10", "prompt": "p", "response": "r", "mood": "🙂"}]).to_string();
        let blob = json!({ "reflections": encoded });
        let mut service = service(MemorySlot::with_blob(blob.to_string()));

        let reflections = service.get_all_reflections().unwrap();
        assert_eq!(reflections.len(), 1);
        assert_eq!(reflections[0].mood, "🙂");
    }

    #[test]
    fn total_streak_parses_numeric_text_and_recovers_from_garbage() {
        let mut service = service(MemorySlot::new());
        assert_eq!(service.get_total_streak().unwrap(), 0);

        service.update_total_streak(7).unwrap();
        assert_eq!(
            service.backend_mut().get(Collection::TotalStreak).unwrap(),
            Some(json!("7"))
        );
        assert_eq!(service.get_total_streak().unwrap(), 7);

        service
            .backend_mut()
            .set(Collection::TotalStreak, &json!("lots"))
            .unwrap();
        assert_eq!(service.get_total_streak().unwrap(), 0);

        service
            .backend_mut()
            .set(Collection::TotalStreak, &json!(12))
            .unwrap();
        assert_eq!(service.get_total_streak().unwrap(), 12);
    }
}
