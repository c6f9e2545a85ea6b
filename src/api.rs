//! Public API surface for the timetable engine.
//!
//! This file consolidates the identifier newtypes and re-exports the DTO
//! types consumed by embedding applications. All types derive
//! Serialize/Deserialize for JSON serialization.

pub use crate::models::event::{CellKey, DayOfWeek, NewScheduledEvent, PeriodKey, ScheduledEvent};
pub use crate::models::offering::CourseOffering;
pub use crate::models::period::{
    resolve_template, NewPeriodTemplate, PeriodSlot, PeriodTemplate, RawPeriodSlot,
};
pub use crate::models::version::{
    NewTimetableVersion, PublishOutcome, TimetableVersion, VersionStatus,
};
pub use crate::services::error::{EngineError, EngineResult};
pub use crate::services::grid::GridSnapshot;
pub use crate::services::placement::{BreakRule, PlacementPolicy};
pub use crate::services::selection::{CellRect, GridPos, SelectionState, SelectionTracker};
pub use crate::services::template_cache::{ResolvedTemplate, TemplateCache};
pub use crate::services::workspace::{EmptyReason, GridView, ViewMode, Workspace};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Batch identifier (the cohort owning one timetable).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub Uuid);

/// Timetable version identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub Uuid);

/// Scheduled event identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub Uuid);

/// Course offering identifier (external catalog entity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OfferingId(pub Uuid);

/// Room identifier (external catalog entity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub Uuid);

/// Period template identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateId(pub Uuid);

macro_rules! uuid_id_impls {
    ($($t:ident),+) => {
        $(
            impl $t {
                pub fn new(value: Uuid) -> Self {
                    $t(value)
                }

                /// Mint a fresh random identifier.
                pub fn random() -> Self {
                    $t(Uuid::new_v4())
                }

                pub fn value(&self) -> Uuid {
                    self.0
                }
            }

            impl From<Uuid> for $t {
                fn from(value: Uuid) -> Self {
                    $t(value)
                }
            }

            impl std::fmt::Display for $t {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.0)
                }
            }
        )+
    };
}

uuid_id_impls!(BatchId, VersionId, EventId, OfferingId, RoomId, TemplateId);

/// Period identifier as it appears in the template JSON.
///
/// Unlike the other ids this is a string: period ids originate in the stored
/// slot records, and templates written by older tooling carry arbitrary
/// strings rather than UUIDs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodId(pub String);

impl PeriodId {
    pub fn new(value: impl Into<String>) -> Self {
        PeriodId(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PeriodId {
    fn from(value: &str) -> Self {
        PeriodId(value.to_string())
    }
}

impl From<String> for PeriodId {
    fn from(value: String) -> Self {
        PeriodId(value)
    }
}

impl std::fmt::Display for PeriodId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
