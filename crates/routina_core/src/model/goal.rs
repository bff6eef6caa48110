//! Goal model.
//!
//! # Invariants
//! - `progress` is always within `[0, 100]`; every write path clamps.
//! - `subtasks` are display-only labels and carry no completion state.

use super::coerce::{lenient_date, lenient_progress, lenient_string_list};
use super::ids::EntityId;
use super::Entity;
use crate::backend::Collection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const PROGRESS_MAX: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(deserialize_with = "lenient_date")]
    pub deadline: NaiveDate,
    #[serde(default, deserialize_with = "lenient_progress")]
    pub progress: u8,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub subtasks: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivational_quote: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGoal {
    pub title: String,
    pub description: String,
    pub deadline: NaiveDate,
    /// Clamped to `[0, 100]` on creation.
    pub progress: i64,
    pub subtasks: Vec<String>,
    pub category: String,
    pub motivational_quote: Option<String>,
}

impl NewGoal {
    pub(crate) fn into_goal(self, id: EntityId) -> Goal {
        Goal {
            id,
            title: self.title,
            description: self.description,
            deadline: self.deadline,
            progress: clamp_progress(self.progress),
            subtasks: self.subtasks,
            category: self.category,
            motivational_quote: self.motivational_quote,
        }
    }
}

/// Partial goal update. `motivational_quote: Some(None)` clears the quote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub progress: Option<i64>,
    pub subtasks: Option<Vec<String>>,
    pub category: Option<String>,
    pub motivational_quote: Option<Option<String>>,
}

impl Goal {
    pub fn is_active(&self) -> bool {
        self.progress < PROGRESS_MAX
    }

    /// Share of subtasks represented by current progress, for display.
    pub fn subtasks_reached(&self) -> usize {
        self.subtasks.len() * usize::from(self.progress) / usize::from(PROGRESS_MAX)
    }
}

/// Clamps a raw progress value into `[0, 100]`.
pub fn clamp_progress(value: i64) -> u8 {
    value.clamp(0, i64::from(PROGRESS_MAX)) as u8
}

impl Entity for Goal {
    type Patch = GoalPatch;

    const COLLECTION: Collection = Collection::Goals;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn apply_patch(&mut self, patch: GoalPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(deadline) = patch.deadline {
            self.deadline = deadline;
        }
        if let Some(progress) = patch.progress {
            self.progress = clamp_progress(progress);
        }
        if let Some(subtasks) = patch.subtasks {
            self.subtasks = subtasks;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(quote) = patch.motivational_quote {
            self.motivational_quote = quote;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{clamp_progress, Goal, GoalPatch};
    use crate::model::Entity;
    use serde_json::json;

    fn goal() -> Goal {
        serde_json::from_value(json!({
            "id": "g1",
            "title": "Complete DSA Course",
            "description": "Finish the course",
            "deadline": "2025-05-15",
            "progress": 45,
            "subtasks": ["Arrays", "Trees", "Graphs", "DP"],
            "category": "Academic"
        }))
        .unwrap()
    }

    #[test]
    fn clamp_progress_bounds_both_ends() {
        assert_eq!(clamp_progress(-20), 0);
        assert_eq!(clamp_progress(55), 55);
        assert_eq!(clamp_progress(250), 100);
    }

    #[test]
    fn stored_progress_out_of_range_is_clamped_on_read() {
        let goal: Goal = serde_json::from_value(json!({
            "id": "g2",
            "title": "Overachiever",
            "deadline": "2025-03-01",
            "progress": "140"
        }))
        .unwrap();
        assert_eq!(goal.progress, 100);
        assert!(goal.subtasks.is_empty());
        assert!(!goal.is_active());
    }

    #[test]
    fn patch_progress_is_clamped() {
        let mut goal = goal();
        goal.apply_patch(GoalPatch {
            progress: Some(-5),
            ..GoalPatch::default()
        });
        assert_eq!(goal.progress, 0);
        assert_eq!(goal.title, "Complete DSA Course");
    }

    #[test]
    fn subtasks_reached_scales_with_progress() {
        let mut goal = goal();
        goal.progress = 50;
        assert_eq!(goal.subtasks_reached(), 2);
    }
}
