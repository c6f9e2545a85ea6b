//! Template repository trait for the period template source.
//!
//! The grid's row geometry comes from an externally configured template. At
//! most one template is active at a time; no active template is a normal
//! empty state ("no schedulable grid"), not an error.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::models::period::{NewPeriodTemplate, PeriodTemplate};

/// Repository trait for period template access.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// The currently active template, if one exists.
    async fn active_template(&self) -> RepositoryResult<Option<PeriodTemplate>>;

    /// Store a template and make it the active one.
    ///
    /// Any previously active template is deactivated but kept; events keyed
    /// to its period ids survive via the start-time fallback key.
    async fn put_template(&self, template: NewPeriodTemplate) -> RepositoryResult<PeriodTemplate>;
}
