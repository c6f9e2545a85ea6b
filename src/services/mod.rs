//! Service layer for scheduling logic and orchestration.
//!
//! This module contains the service layer that sits between the storage
//! backends and the caller. Services validate invariants before touching
//! storage and orchestrate multi-step operations like publishing.

pub mod error;

pub mod grid;

pub mod placement;

pub mod selection;

pub mod template_cache;

pub mod versioning;

pub mod workspace;

pub use error::{EngineError, EngineResult};
pub use grid::GridSnapshot;
pub use placement::{BreakRule, PlacementPolicy};
pub use selection::{CellRect, GridPos, SelectionState, SelectionTracker};
pub use template_cache::{ResolvedTemplate, TemplateCache};
pub use versioning::{get_or_create_draft, get_published, list_versions, publish};
pub use workspace::{EmptyReason, GridView, ViewMode, Workspace};
