//! Repository trait definitions for timetable storage.
//!
//! This module provides a collection of focused repository traits that
//! abstract the persistence facade. Splitting responsibilities across
//! multiple traits keeps implementations focused and testable.
//!
//! # Module Organization
//!
//! - [`error`]: Error types for repository operations
//! - [`version`]: Version lifecycle storage (draft/published/archived)
//! - [`event`]: Grid cell reads and conflict-safe writes
//! - [`template`]: Period template source
//! - [`catalog`]: Read-only course-offering lookups
//!
//! # Trait Composition
//!
//! A complete backend implements every trait plus the capability report:
//!
//! ```ignore
//! impl VersionRepository for MyStore { ... }
//! impl EventRepository for MyStore { ... }
//! impl TemplateRepository for MyStore { ... }
//! impl OfferingRepository for MyStore { ... }
//! impl CapabilityReport for MyStore { ... }
//! ```
//!
//! # Convenience Trait Bound
//!
//! Functions that need the whole facade take the [`TimetableRepository`]
//! bound:
//!
//! ```ignore
//! async fn my_service<R: TimetableRepository>(repo: &R) -> RepositoryResult<()> {
//!     let draft = repo.latest_draft(batch_id).await?;
//!     let events = repo.events_for_version(draft.id).await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod error;
pub mod event;
pub mod template;
pub mod version;

pub use catalog::OfferingRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use event::EventRepository;
pub use template::TemplateRepository;
pub use version::VersionRepository;

pub use crate::db::capabilities::{CapabilityReport, StoreCapabilities};

/// Combined repository trait for the full persistence facade.
///
/// Blanket-implemented for any type implementing all focused traits, so
/// backends never name it explicitly.
pub trait TimetableRepository:
    VersionRepository + EventRepository + TemplateRepository + OfferingRepository + CapabilityReport
{
}

impl<T> TimetableRepository for T where
    T: VersionRepository
        + EventRepository
        + TemplateRepository
        + OfferingRepository
        + CapabilityReport
{
}
