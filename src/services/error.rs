//! Engine-level error types.
//!
//! Errors split into three classes with different handling:
//!
//! - invariant violations (`NotDraft`, `UnresolvedPeriod`, `BreakSlotDenied`,
//!   `SpanUnavailable`) are rejected locally, before any I/O is attempted
//! - transient storage failures pass through as `Repository`; the operation
//!   is abandoned and prior in-memory state stays unchanged
//! - `PublishIncomplete` is its own class because it can leave the version
//!   lifecycle inconsistent and callers must react differently from a plain
//!   I/O error
//!
//! Missing configuration (no active template, no offerings) is not an error
//! at all; it surfaces as an explicit empty state in the grid view.

use crate::api::{BatchId, PeriodId, VersionId};
use crate::db::repository::RepositoryError;
use crate::models::version::VersionStatus;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Write attempted against a version that is not the active draft.
    #[error("version {version_id} is {status}; edits are only allowed on the active draft")]
    NotDraft {
        version_id: VersionId,
        status: VersionStatus,
    },

    /// A cell referenced a period id the active template does not resolve.
    #[error("period '{period_id}' does not resolve in the active template")]
    UnresolvedPeriod { period_id: PeriodId },

    /// The placement policy denies scheduling into break slots.
    #[error("period '{period_id}' is a break slot")]
    BreakSlotDenied { period_id: PeriodId },

    /// A span placement could not find enough schedulable rows.
    #[error(
        "cannot place a span of {requested} from row {anchor_row}: \
         only {available} schedulable rows available"
    )]
    SpanUnavailable {
        anchor_row: usize,
        requested: usize,
        available: usize,
    },

    /// No draft exists for the batch where one was required.
    #[error("batch {batch_id} has no draft version")]
    DraftMissing { batch_id: BatchId },

    /// The serialized publish path failed after completing some steps.
    ///
    /// The flags record which steps committed before the failure so callers
    /// can tell an untouched lifecycle from a half-moved one.
    #[error(
        "publish finished partially (archived={archived}, published={published}, \
         draft_created={draft_created}): {source}"
    )]
    PublishIncomplete {
        archived: bool,
        published: bool,
        draft_created: bool,
        #[source]
        source: RepositoryError,
    },

    /// Storage failure; the attempted operation had no effect on in-memory
    /// state.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl EngineError {
    /// True for errors raised locally before any storage call.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            EngineError::NotDraft { .. }
                | EngineError::UnresolvedPeriod { .. }
                | EngineError::BreakSlotDenied { .. }
                | EngineError::SpanUnavailable { .. }
        )
    }

    /// True when retrying the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Repository(e) if e.is_retryable())
    }
}
