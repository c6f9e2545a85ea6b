//! In-memory grid projection of one version's events.
//!
//! A [`GridSnapshot`] holds the `(day, period) -> event` map for exactly one
//! version. It is immutable once built; every reload and every version
//! switch constructs a fresh snapshot, so a cell read can never see events
//! from a previously viewed version.

use log::{debug, warn};
use std::collections::HashMap;

use super::error::EngineResult;
use crate::api::VersionId;
use crate::db::repository::TimetableRepository;
use crate::models::event::{CellKey, ScheduledEvent};

/// All scheduled events of one version, keyed by grid cell.
#[derive(Debug, Clone)]
pub struct GridSnapshot {
    version_id: VersionId,
    cells: HashMap<CellKey, ScheduledEvent>,
}

impl GridSnapshot {
    /// Fetch every event of `version_id` and project it into a cell map.
    ///
    /// Events keep their template period id as key when they have one and
    /// fall back to their start time otherwise, so rows written under an
    /// older template still land on a cell.
    pub async fn load<R>(repo: &R, version_id: VersionId) -> EngineResult<GridSnapshot>
    where
        R: TimetableRepository + ?Sized,
    {
        let events = repo.events_for_version(version_id).await?;
        debug!(
            "Grid load: {} events for version {}",
            events.len(),
            version_id
        );

        let mut cells = HashMap::with_capacity(events.len());
        for event in events {
            let key = event.cell_key();
            if let Some(previous) = cells.insert(key.clone(), event) {
                // Legacy data written by non-atomic writers can carry
                // duplicates; last write wins, matching the store's own
                // conflict resolution.
                warn!(
                    "Grid load: duplicate events at cell {} in version {} (kept {}, dropped {})",
                    key,
                    version_id,
                    cells[&key].id,
                    previous.id
                );
            }
        }

        Ok(GridSnapshot { version_id, cells })
    }

    /// An empty snapshot for `version_id`; used before the first load.
    pub fn empty(version_id: VersionId) -> GridSnapshot {
        GridSnapshot {
            version_id,
            cells: HashMap::new(),
        }
    }

    /// The version this snapshot was loaded from.
    pub fn version_id(&self) -> VersionId {
        self.version_id
    }

    /// The event occupying a cell, if any.
    pub fn event_at(&self, cell: &CellKey) -> Option<&ScheduledEvent> {
        self.cells.get(cell)
    }

    /// The full cell map.
    pub fn cells(&self) -> &HashMap<CellKey, ScheduledEvent> {
        &self.cells
    }

    /// Number of occupied cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
