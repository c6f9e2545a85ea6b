//! Event repository trait for grid cell reads and writes.
//!
//! Scheduled events are unique per `(version, day, period)`; every write
//! path here either respects that key atomically (`upsert_events`) or
//! surfaces the violation as `RepositoryError::Conflict` (`insert_events`).

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{EventId, RoomId, VersionId};
use crate::models::event::{CellKey, NewScheduledEvent, ScheduledEvent};

/// Repository trait for scheduled event operations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait EventRepository: Send + Sync {
    // ==================== Queries ====================

    /// All events of one version, in no particular order.
    ///
    /// Callers project the result into a grid map; ordering is theirs.
    async fn events_for_version(
        &self,
        version_id: VersionId,
    ) -> RepositoryResult<Vec<ScheduledEvent>>;

    // ==================== Writes ====================

    /// Write events, replacing whatever already occupies their cells.
    ///
    /// Keyed on `(version_id, day_of_week, period_id)`: an occupied cell is
    /// updated in place (keeping its event id), an empty cell gets a new
    /// row. This is the safe placement primitive; stores that cannot upsert
    /// atomically report `atomic_upsert = false` in their capabilities and
    /// callers fall back to delete-then-insert.
    ///
    /// # Returns
    /// * `Ok(Vec<ScheduledEvent>)` - The resulting rows, one per input
    async fn upsert_events(
        &self,
        events: &[NewScheduledEvent],
    ) -> RepositoryResult<Vec<ScheduledEvent>>;

    /// Insert events without conflict handling.
    ///
    /// # Returns
    /// * `Ok(Vec<ScheduledEvent>)` - The inserted rows
    /// * `Err(RepositoryError::Conflict)` - If any target cell is occupied
    async fn insert_events(
        &self,
        events: &[NewScheduledEvent],
    ) -> RepositoryResult<Vec<ScheduledEvent>>;

    /// Delete any events at the given cells of one version.
    ///
    /// Cells with no event are skipped silently.
    ///
    /// # Returns
    /// * `Ok(usize)` - Number of events actually deleted
    async fn delete_events_at(
        &self,
        version_id: VersionId,
        cells: &[CellKey],
    ) -> RepositoryResult<usize>;

    /// Change the room binding of one placed event.
    ///
    /// The event keeps its cell; only `room_id` changes (`None` clears it).
    ///
    /// # Returns
    /// * `Ok(ScheduledEvent)` - The updated event
    /// * `Err(RepositoryError::NotFound)` - If the event does not exist
    async fn set_event_room(
        &self,
        event_id: EventId,
        room_id: Option<RoomId>,
    ) -> RepositoryResult<ScheduledEvent>;
}
