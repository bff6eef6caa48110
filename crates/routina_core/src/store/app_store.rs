use super::sample::sample_snapshot;
use super::Snapshot;
use crate::backend::{Collection, CollectionBackend};
use crate::model::clock::{Clock, SystemClock};
use crate::model::goal::{Goal, GoalPatch, NewGoal};
use crate::model::ids::{EntityId, IdGenerator, UuidGenerator};
use crate::model::reflection::{NewReflection, Reflection, ReflectionPatch};
use crate::model::task::{NewTask, Task, TaskPatch};
use crate::model::work_session::{NewWorkSession, WorkSession, WorkSessionPatch};
use crate::model::Entity;
use crate::service::data_service::{DataService, ServiceError, ServiceResult};
use log::{error, info, warn};

pub type StoreResult<T> = Result<T, ServiceError>;

/// Notification delivered to store listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// A collection changed in memory.
    Changed(Collection),
    /// A call failed; carries the message now in the error slot.
    Error(String),
}

type Listener = Box<dyn FnMut(&StoreEvent)>;

/// Authoritative in-memory state for the presentation layer.
pub struct AppStore<B, C = SystemClock, G = UuidGenerator> {
    service: DataService<B, C, G>,
    snapshot: Snapshot,
    error: Option<String>,
    using_sample_data: bool,
    listeners: Vec<Listener>,
}

impl<B: CollectionBackend, C: Clock, G: IdGenerator> AppStore<B, C, G> {
    /// Loads every collection and the global streak.
    ///
    /// Any load failure is recorded in the error slot and the store falls
    /// back to the built-in sample dataset. The first write that later
    /// reaches storage replaces the sample dataset with the stored state.
    pub fn load(mut service: DataService<B, C, G>) -> Self {
        let (snapshot, error, using_sample_data) = match load_snapshot(&mut service) {
            Ok(snapshot) => {
                info!(
                    "event=store_load module=store status=ok tasks={} goals={} work_sessions={} reflections={}",
                    snapshot.tasks.len(),
                    snapshot.goals.len(),
                    snapshot.work_sessions.len(),
                    snapshot.reflections.len()
                );
                (snapshot, None, false)
            }
            Err(err) => {
                warn!("event=store_load module=store status=fallback source=sample error={err}");
                (sample_snapshot(service.clock()), Some(err.to_string()), true)
            }
        };

        Self {
            service,
            snapshot,
            error,
            using_sample_data,
            listeners: Vec::new(),
        }
    }

    /// Re-reads all collections. On failure the current snapshot is kept.
    pub fn reload(&mut self) -> StoreResult<()> {
        match load_snapshot(&mut self.service) {
            Ok(snapshot) => {
                self.snapshot = snapshot;
                self.using_sample_data = false;
                self.error = None;
                for collection in Collection::ALL {
                    self.notify(&StoreEvent::Changed(collection));
                }
                Ok(())
            }
            Err(err) => Err(self.failed("reload", err)),
        }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.snapshot.tasks
    }

    pub fn goals(&self) -> &[Goal] {
        &self.snapshot.goals
    }

    pub fn work_sessions(&self) -> &[WorkSession] {
        &self.snapshot.work_sessions
    }

    pub fn reflections(&self) -> &[Reflection] {
        &self.snapshot.reflections
    }

    pub fn total_streak(&self) -> u32 {
        self.snapshot.total_streak
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Latest failure message, if the last call failed.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Whether the snapshot is the built-in sample dataset.
    pub fn is_sample_data(&self) -> bool {
        self.using_sample_data
    }

    pub fn service(&self) -> &DataService<B, C, G> {
        &self.service
    }

    /// Releases the data service, and with it the backend, to the owner.
    pub fn into_service(self) -> DataService<B, C, G> {
        self.service
    }

    /// Registers a listener for change and error events.
    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn add_task(&mut self, new_task: NewTask) -> StoreResult<EntityId> {
        let result = self.service.create_task_record(new_task);
        self.apply_created("add_task", result)
    }

    pub fn update_task(&mut self, id: &EntityId, patch: TaskPatch) -> StoreResult<bool> {
        let result = self.service.update_task(id, patch);
        self.apply_updated("update_task", result)
    }

    pub fn delete_task(&mut self, id: &EntityId) -> StoreResult<bool> {
        let result = self.service.delete_task(id);
        self.apply_deleted::<Task>("delete_task", id, result)
    }

    /// Flips a task's completion flag.
    ///
    /// Completing raises the task streak and the global streak by one;
    /// un-completing lowers only the task streak, floored at zero. Returns
    /// `false` when the id is unknown to storage, which includes sample rows.
    pub fn toggle_task(&mut self, id: &EntityId) -> StoreResult<bool> {
        match self.service.toggle_task(id) {
            Ok(Some(outcome)) => {
                if self.adopt_stored_snapshot() {
                    return Ok(true);
                }
                let streak_changed = outcome.total_streak != self.snapshot.total_streak;
                replace_by_id(&mut self.snapshot.tasks, outcome.task);
                self.snapshot.total_streak = outcome.total_streak;
                self.succeeded(Collection::Tasks);
                if streak_changed {
                    self.notify(&StoreEvent::Changed(Collection::TotalStreak));
                }
                Ok(true)
            }
            Ok(None) => {
                self.skipped("toggle_task");
                Ok(false)
            }
            Err(err) => Err(self.failed("toggle_task", err)),
        }
    }

    pub fn add_goal(&mut self, new_goal: NewGoal) -> StoreResult<EntityId> {
        let result = self.service.create_goal_record(new_goal);
        self.apply_created("add_goal", result)
    }

    pub fn update_goal(&mut self, id: &EntityId, patch: GoalPatch) -> StoreResult<bool> {
        let result = self.service.update_goal(id, patch);
        self.apply_updated("update_goal", result)
    }

    /// Stores goal progress, clamped to `[0, 100]`.
    pub fn update_goal_progress(&mut self, id: &EntityId, progress: i64) -> StoreResult<bool> {
        let result = self.service.update_goal_progress(id, progress);
        self.apply_updated("update_goal_progress", result)
    }

    pub fn delete_goal(&mut self, id: &EntityId) -> StoreResult<bool> {
        let result = self.service.delete_goal(id);
        self.apply_deleted::<Goal>("delete_goal", id, result)
    }

    pub fn add_work_session(&mut self, new_session: NewWorkSession) -> StoreResult<EntityId> {
        let result = self.service.create_work_session_record(new_session);
        self.apply_created("add_work_session", result)
    }

    pub fn update_work_session(
        &mut self,
        id: &EntityId,
        patch: WorkSessionPatch,
    ) -> StoreResult<bool> {
        let result = self.service.update_work_session(id, patch);
        self.apply_updated("update_work_session", result)
    }

    pub fn delete_work_session(&mut self, id: &EntityId) -> StoreResult<bool> {
        let result = self.service.delete_work_session(id);
        self.apply_deleted::<WorkSession>("delete_work_session", id, result)
    }

    pub fn add_reflection(&mut self, new_reflection: NewReflection) -> StoreResult<EntityId> {
        let result = self.service.create_reflection_record(new_reflection);
        self.apply_created("add_reflection", result)
    }

    pub fn update_reflection(
        &mut self,
        id: &EntityId,
        patch: ReflectionPatch,
    ) -> StoreResult<bool> {
        let result = self.service.update_reflection(id, patch);
        self.apply_updated("update_reflection", result)
    }

    pub fn delete_reflection(&mut self, id: &EntityId) -> StoreResult<bool> {
        let result = self.service.delete_reflection(id);
        self.apply_deleted::<Reflection>("delete_reflection", id, result)
    }

    fn apply_created<E: Held>(
        &mut self,
        op: &'static str,
        result: ServiceResult<E>,
    ) -> StoreResult<EntityId> {
        match result {
            Ok(record) => {
                let id = record.id().clone();
                if self.adopt_stored_snapshot() {
                    return Ok(id);
                }
                E::held(&mut self.snapshot).insert(0, record);
                self.succeeded(E::COLLECTION);
                Ok(id)
            }
            Err(err) => Err(self.failed(op, err)),
        }
    }

    fn apply_updated<E: Held>(
        &mut self,
        op: &'static str,
        result: ServiceResult<Option<E>>,
    ) -> StoreResult<bool> {
        match result {
            Ok(Some(record)) => {
                if self.adopt_stored_snapshot() {
                    return Ok(true);
                }
                replace_by_id(E::held(&mut self.snapshot), record);
                self.succeeded(E::COLLECTION);
                Ok(true)
            }
            Ok(None) => {
                self.skipped(op);
                Ok(false)
            }
            Err(err) => Err(self.failed(op, err)),
        }
    }

    fn apply_deleted<E: Held>(
        &mut self,
        op: &'static str,
        id: &EntityId,
        result: ServiceResult<bool>,
    ) -> StoreResult<bool> {
        match result {
            Ok(existed) => {
                if existed && self.adopt_stored_snapshot() {
                    return Ok(true);
                }
                if !existed && self.using_sample_data {
                    self.skipped(op);
                    return Ok(false);
                }
                E::held(&mut self.snapshot).retain(|item| item.id() != id);
                self.succeeded(E::COLLECTION);
                Ok(existed)
            }
            Err(err) => Err(self.failed(op, err)),
        }
    }

    /// Swaps the sample dataset for stored state after the first write that
    /// reached storage. Returns `true` when the snapshot was replaced.
    fn adopt_stored_snapshot(&mut self) -> bool {
        if !self.using_sample_data {
            return false;
        }
        match load_snapshot(&mut self.service) {
            Ok(snapshot) => {
                info!(
                    "event=store_load module=store status=ok source=storage reason=sample_replaced tasks={}",
                    snapshot.tasks.len()
                );
                self.snapshot = snapshot;
                self.using_sample_data = false;
                self.error = None;
                for collection in Collection::ALL {
                    self.notify(&StoreEvent::Changed(collection));
                }
                true
            }
            Err(err) => {
                warn!("event=store_load module=store status=fallback source=sample error={err}");
                false
            }
        }
    }

    fn skipped(&mut self, op: &'static str) {
        self.error = None;
        if self.using_sample_data {
            warn!("event=store_mutation module=store status=skipped op={op} reason=sample_data");
        }
    }

    fn succeeded(&mut self, collection: Collection) {
        self.error = None;
        self.notify(&StoreEvent::Changed(collection));
    }

    fn failed(&mut self, op: &'static str, err: ServiceError) -> ServiceError {
        let message = err.to_string();
        error!("event=store_mutation module=store status=error op={op} error={message}");
        self.error = Some(message.clone());
        self.notify(&StoreEvent::Error(message));
        err
    }

    fn notify(&mut self, event: &StoreEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

/// Entities with a slot in the snapshot.
trait Held: Entity {
    fn held(snapshot: &mut Snapshot) -> &mut Vec<Self>;
}

impl Held for Task {
    fn held(snapshot: &mut Snapshot) -> &mut Vec<Self> {
        &mut snapshot.tasks
    }
}

impl Held for Goal {
    fn held(snapshot: &mut Snapshot) -> &mut Vec<Self> {
        &mut snapshot.goals
    }
}

impl Held for WorkSession {
    fn held(snapshot: &mut Snapshot) -> &mut Vec<Self> {
        &mut snapshot.work_sessions
    }
}

impl Held for Reflection {
    fn held(snapshot: &mut Snapshot) -> &mut Vec<Self> {
        &mut snapshot.reflections
    }
}

fn replace_by_id<E: Entity>(items: &mut [E], record: E) {
    if let Some(slot) = items.iter_mut().find(|item| item.id() == record.id()) {
        *slot = record;
    }
}

fn load_snapshot<B, C, G>(service: &mut DataService<B, C, G>) -> ServiceResult<Snapshot>
where
    B: CollectionBackend,
    C: Clock,
    G: IdGenerator,
{
    Ok(Snapshot {
        tasks: service.get_all_tasks()?,
        goals: service.get_all_goals()?,
        work_sessions: service.get_all_work_sessions()?,
        reflections: service.get_all_reflections()?,
        total_streak: service.get_total_streak()?,
    })
}
