//! Entity model for tasks, goals, work sessions and reflections.
//!
//! # Responsibility
//! - Define the four independent record types and their create/patch inputs.
//! - Provide the identifier type and the clock/id collaborators.
//!
//! # Invariants
//! - Every record is identified by a stable `EntityId` that is never reused.
//! - Records do not reference each other; collections correlate only by date.
//! - `Goal::progress` is always within `[0, 100]`.

pub mod clock;
pub(crate) mod coerce;
pub mod goal;
pub mod ids;
pub mod reflection;
pub mod task;
pub mod work_session;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::Collection;
use ids::EntityId;

/// Common contract shared by all persisted record types.
///
/// Implemented by the four entities so the data service can load, merge and
/// persist any collection through one code path.
pub trait Entity: Clone + Serialize + DeserializeOwned {
    /// Partial-update input for this entity.
    type Patch;

    /// Backend collection holding this entity.
    const COLLECTION: Collection;

    fn id(&self) -> &EntityId;

    /// Merges only the fields present in `patch`.
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Orders a loaded collection the way `get_all` returns it.
    ///
    /// Default keeps stored order.
    fn sort_collection(_items: &mut [Self]) {}
}
