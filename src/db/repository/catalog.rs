//! Catalog repository trait for read-only course-offering lookups.
//!
//! The offering catalog belongs to the surrounding administration system.
//! This crate reads it to default room bindings and to let callers render
//! offering palettes; it never writes it.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{BatchId, OfferingId};
use crate::models::offering::CourseOffering;

/// Repository trait for course-offering lookups.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait OfferingRepository: Send + Sync {
    /// All offerings teachable to one batch.
    ///
    /// An empty result is a normal state for a freshly configured batch.
    async fn offerings_for_batch(
        &self,
        batch_id: BatchId,
    ) -> RepositoryResult<Vec<CourseOffering>>;

    /// Fetch one offering by id.
    ///
    /// # Returns
    /// * `Ok(CourseOffering)` on success
    /// * `Err(RepositoryError::NotFound)` if no such offering exists
    async fn get_offering(&self, offering_id: OfferingId) -> RepositoryResult<CourseOffering>;
}
