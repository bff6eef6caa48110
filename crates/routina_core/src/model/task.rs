//! Task model.
//!
//! # Responsibility
//! - Define the recurring/one-off task record and its create/patch inputs.
//! - Own streak bookkeeping for completion toggles.
//!
//! # Invariants
//! - `id` and `created_at` never change after creation.
//! - `streak` increments only on a false->true transition and decrements,
//!   floored at 0, on a true->false transition.

use super::coerce::{lenient_bool, lenient_opt_date, lenient_string_list, lenient_u32};
use super::ids::EntityId;
use super::Entity;
use crate::backend::Collection;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Recurrence bucket for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Daily,
    Weekly,
    Monthly,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

/// Persisted task record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    /// Serialized as `type` to match the stored layout.
    #[serde(rename = "type")]
    pub kind: TaskKind,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub completed: bool,
    /// Consecutive completions of this task.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub streak: u32,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub emoji: String,
    #[serde(
        default,
        deserialize_with = "lenient_opt_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new task.
///
/// `id`, `streak` and `created_at` are assigned on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub kind: TaskKind,
    pub completed: bool,
    pub category: String,
    pub emoji: String,
    pub due_date: Option<NaiveDate>,
    pub priority: Priority,
    pub tags: Vec<String>,
}

impl NewTask {
    /// Incomplete task with no due date and no tags.
    pub fn new(
        title: impl Into<String>,
        kind: TaskKind,
        priority: Priority,
        category: impl Into<String>,
        emoji: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            kind,
            completed: false,
            category: category.into(),
            emoji: emoji.into(),
            due_date: None,
            priority,
            tags: Vec::new(),
        }
    }

    pub(crate) fn into_task(self, id: EntityId, created_at: DateTime<Utc>) -> Task {
        Task {
            id,
            title: self.title,
            kind: self.kind,
            completed: self.completed,
            streak: 0,
            category: self.category,
            emoji: self.emoji,
            due_date: self.due_date,
            priority: self.priority,
            tags: self.tags,
            created_at,
        }
    }
}

/// Partial task update. `None` leaves a field untouched.
///
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub kind: Option<TaskKind>,
    pub completed: Option<bool>,
    pub streak: Option<u32>,
    pub category: Option<String>,
    pub emoji: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub tags: Option<Vec<String>>,
}

/// Result of flipping a task's completion flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskToggle {
    pub completed: bool,
    pub streak: u32,
    /// Amount added to the global cumulative streak (0 or 1).
    pub total_streak_delta: u32,
}

impl Task {
    /// Computes the completion flip without mutating the task.
    pub fn toggled(&self) -> TaskToggle {
        if self.completed {
            TaskToggle {
                completed: false,
                streak: self.streak.saturating_sub(1),
                total_streak_delta: 0,
            }
        } else {
            TaskToggle {
                completed: true,
                streak: self.streak.saturating_add(1),
                total_streak_delta: 1,
            }
        }
    }

    pub fn apply_toggle(&mut self, toggle: TaskToggle) {
        self.completed = toggle.completed;
        self.streak = toggle.streak;
    }

    pub fn is_daily(&self) -> bool {
        self.kind == TaskKind::Daily
    }
}

impl Entity for Task {
    type Patch = TaskPatch;

    const COLLECTION: Collection = Collection::Tasks;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn apply_patch(&mut self, patch: TaskPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(streak) = patch.streak {
            self.streak = streak;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(emoji) = patch.emoji {
            self.emoji = emoji;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
    }

    /// Newest first.
    fn sort_collection(items: &mut [Self]) {
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

#[cfg(test)]
mod tests {
    use super::{NewTask, Priority, Task, TaskKind};
    use crate::model::ids::EntityId;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn sample_task() -> Task {
        NewTask::new("Read", TaskKind::Daily, Priority::Medium, "Study", "📖").into_task(
            EntityId::new("t1"),
            Utc.with_ymd_and_hms(2025, 1, 15, 8, 0, 0).unwrap(),
        )
    }

    #[test]
    fn toggle_twice_restores_flag_and_streak() {
        let mut task = sample_task();
        task.streak = 4;

        let first = task.toggled();
        assert!(first.completed);
        assert_eq!(first.streak, 5);
        assert_eq!(first.total_streak_delta, 1);
        task.apply_toggle(first);

        let second = task.toggled();
        assert!(!second.completed);
        assert_eq!(second.streak, 4);
        assert_eq!(second.total_streak_delta, 0);
        task.apply_toggle(second);

        assert!(!task.completed);
        assert_eq!(task.streak, 4);
    }

    #[test]
    fn uncompleting_with_zero_streak_stays_at_zero() {
        let mut task = sample_task();
        task.completed = true;
        task.streak = 0;

        let toggle = task.toggled();
        assert!(!toggle.completed);
        assert_eq!(toggle.streak, 0);
    }

    #[test]
    fn serializes_with_stored_field_names() {
        let value = serde_json::to_value(sample_task()).unwrap();
        assert_eq!(value["type"], "daily");
        assert_eq!(value["priority"], "medium");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("dueDate").is_none());
    }

    #[test]
    fn legacy_record_gets_defaults_and_coercions() {
        let task: Task = serde_json::from_value(json!({
            "id": "2",
            "title": "Finish Lab Report",
            "type": "weekly",
            "completed": "true",
            "streak": "3",
            "category": "Physics",
            "emoji": "⚗️",
            "dueDate": "2025-01-15",
            "priority": "high",
            "createdAt": "2025-01-01T10:00:00.000Z"
        }))
        .unwrap();

        assert!(task.completed);
        assert_eq!(task.streak, 3);
        assert!(task.tags.is_empty());
        assert_eq!(task.due_date.map(|d| d.to_string()).as_deref(), Some("2025-01-15"));
    }
}
