//! Work session model.

use super::coerce::{lenient_date, lenient_string_list, lenient_u32};
use super::ids::EntityId;
use super::Entity;
use crate::backend::Collection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A block of focused work logged against a project on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkSession {
    pub id: EntityId,
    pub project: String,
    /// Minutes.
    #[serde(default, deserialize_with = "lenient_u32")]
    pub duration: u32,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "lenient_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkSession {
    pub project: String,
    pub duration: u32,
    pub tags: Vec<String>,
    pub date: NaiveDate,
    pub notes: String,
    pub mood: Option<String>,
}

impl NewWorkSession {
    pub(crate) fn into_session(self, id: EntityId) -> WorkSession {
        WorkSession {
            id,
            project: self.project,
            duration: self.duration,
            tags: self.tags,
            date: self.date,
            notes: self.notes,
            mood: self.mood,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkSessionPatch {
    pub project: Option<String>,
    pub duration: Option<u32>,
    pub tags: Option<Vec<String>>,
    pub date: Option<NaiveDate>,
    pub notes: Option<String>,
    pub mood: Option<Option<String>>,
}

/// Splits comma-separated tag input, trimming blanks away.
pub fn parse_tag_input(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

impl Entity for WorkSession {
    type Patch = WorkSessionPatch;

    const COLLECTION: Collection = Collection::WorkSessions;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn apply_patch(&mut self, patch: WorkSessionPatch) {
        if let Some(project) = patch.project {
            self.project = project;
        }
        if let Some(duration) = patch.duration {
            self.duration = duration;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(notes) = patch.notes {
            self.notes = notes;
        }
        if let Some(mood) = patch.mood {
            self.mood = mood;
        }
    }

    /// Most recent day first; equal days keep stored order.
    fn sort_collection(items: &mut [Self]) {
        items.sort_by(|a, b| b.date.cmp(&a.date));
    }
}
