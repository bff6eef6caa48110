//! Daily reflection model.
//!
//! # Invariants
//! - `response` is non-empty when created. Callers enforce this before
//!   calling into the store; the data layer does not validate it.

use super::coerce::lenient_date;
use super::ids::EntityId;
use super::Entity;
use crate::backend::Collection;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reflection {
    pub id: EntityId,
    #[serde(deserialize_with = "lenient_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub response: String,
    #[serde(default)]
    pub mood: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReflection {
    pub date: NaiveDate,
    pub prompt: String,
    pub response: String,
    pub mood: String,
}

impl NewReflection {
    pub(crate) fn into_reflection(self, id: EntityId) -> Reflection {
        Reflection {
            id,
            date: self.date,
            prompt: self.prompt,
            response: self.response,
            mood: self.mood,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReflectionPatch {
    pub date: Option<NaiveDate>,
    pub prompt: Option<String>,
    pub response: Option<String>,
    pub mood: Option<String>,
}

impl Entity for Reflection {
    type Patch = ReflectionPatch;

    const COLLECTION: Collection = Collection::Reflections;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn apply_patch(&mut self, patch: ReflectionPatch) {
        if let Some(date) = patch.date {
            self.date = date;
        }
        if let Some(prompt) = patch.prompt {
            self.prompt = prompt;
        }
        if let Some(response) = patch.response {
            self.response = response;
        }
        if let Some(mood) = patch.mood {
            self.mood = mood;
        }
    }

    fn sort_collection(items: &mut [Self]) {
        items.sort_by(|a, b| b.date.cmp(&a.date));
    }
}
