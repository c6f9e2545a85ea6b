//! Version repository trait for timetable lifecycle operations.
//!
//! This trait owns the persisted side of the draft/published/archived
//! lifecycle. Query methods never mutate; mutation methods enforce the
//! legal transitions (`draft -> published -> archived`).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::error::RepositoryResult;
use crate::api::{BatchId, VersionId};
use crate::models::version::{NewTimetableVersion, PublishOutcome, TimetableVersion, VersionStatus};

/// Repository trait for timetable version lifecycle operations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait VersionRepository: Send + Sync {
    // ==================== Health ====================

    /// Check if the backing store is reachable.
    ///
    /// # Returns
    /// * `Ok(true)` if the store is healthy
    /// * `Ok(false)` if unhealthy but no error occurred
    /// * `Err(RepositoryError)` if the check itself fails
    async fn health_check(&self) -> RepositoryResult<bool>;

    // ==================== Queries ====================

    /// Fetch one version by id.
    ///
    /// # Returns
    /// * `Ok(TimetableVersion)` on success
    /// * `Err(RepositoryError::NotFound)` if no such version exists
    async fn get_version(&self, version_id: VersionId) -> RepositoryResult<TimetableVersion>;

    /// The most recently created draft for a batch, if any.
    async fn latest_draft(&self, batch_id: BatchId) -> RepositoryResult<Option<TimetableVersion>>;

    /// The most recently published version for a batch, if any.
    ///
    /// Ordered by `published_at` descending, so after a publish this is
    /// always the version the publish promoted.
    async fn latest_published(
        &self,
        batch_id: BatchId,
    ) -> RepositoryResult<Option<TimetableVersion>>;

    /// All versions for a batch, most recently created first.
    ///
    /// Includes archived history; the result is read-only bookkeeping.
    async fn list_versions(&self, batch_id: BatchId) -> RepositoryResult<Vec<TimetableVersion>>;

    // ==================== Mutations ====================

    /// Insert a new version; the store mints id and `created_at`.
    async fn insert_version(
        &self,
        version: NewTimetableVersion,
    ) -> RepositoryResult<TimetableVersion>;

    /// Move one version to a new lifecycle status.
    ///
    /// # Arguments
    /// * `version_id` - The version to update
    /// * `status` - The target status; must be a legal transition from the
    ///   current one
    /// * `published_at` - Set when transitioning to published; `None`
    ///   leaves the stored timestamp untouched (archiving keeps the
    ///   timestamp from the published phase)
    ///
    /// # Returns
    /// * `Ok(TimetableVersion)` - The updated version
    /// * `Err(RepositoryError::ValidationError)` - If the transition is
    ///   illegal
    /// * `Err(RepositoryError::NotFound)` - If the version does not exist
    async fn update_version_status(
        &self,
        version_id: VersionId,
        status: VersionStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<TimetableVersion>;

    /// Publish a draft as one storage-level transaction.
    ///
    /// Archives the currently published version (if any), promotes
    /// `draft_id` with the given `published_at`, and inserts a fresh empty
    /// draft. Either every step commits or none does; stores that cannot
    /// guarantee this must report `transactional_publish = false` in their
    /// capabilities, and callers then use the serialized per-step path
    /// instead of this method.
    ///
    /// # Returns
    /// * `Ok(PublishOutcome)` - The promoted version and the fresh draft
    /// * `Err(RepositoryError::ValidationError)` - If `draft_id` is not a
    ///   draft of `batch_id`
    async fn publish_draft(
        &self,
        batch_id: BatchId,
        draft_id: VersionId,
        published_at: DateTime<Utc>,
    ) -> RepositoryResult<PublishOutcome>;
}
