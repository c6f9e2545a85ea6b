//! Version lifecycle orchestration.
//!
//! Service-layer functions over the repository traits: lazy draft creation,
//! published lookups, and the three-step publish transition. All functions
//! are repository-agnostic and carry no state of their own.

use chrono::Utc;
use log::{info, warn};

use super::error::{EngineError, EngineResult};
use crate::api::{BatchId, VersionId};
use crate::db::repository::TimetableRepository;
use crate::models::version::{NewTimetableVersion, PublishOutcome, TimetableVersion, VersionStatus};

/// Return the batch's active draft, creating one if none exists.
///
/// Query-then-create is best-effort idempotent: when the create loses a race
/// to another editor (the store reports a conflict), the winner's draft is
/// fetched and returned instead.
pub async fn get_or_create_draft<R>(repo: &R, batch_id: BatchId) -> EngineResult<TimetableVersion>
where
    R: TimetableRepository + ?Sized,
{
    if let Some(draft) = repo.latest_draft(batch_id).await? {
        return Ok(draft);
    }

    info!("Service layer: creating draft version for batch {}", batch_id);
    match repo.insert_version(NewTimetableVersion::draft(batch_id)).await {
        Ok(draft) => Ok(draft),
        Err(e) if e.is_conflict() => {
            warn!(
                "Service layer: lost draft-creation race for batch {}, re-querying",
                batch_id
            );
            repo.latest_draft(batch_id)
                .await?
                .ok_or(EngineError::DraftMissing { batch_id })
        }
        Err(e) => Err(e.into()),
    }
}

/// The most recently published version for a batch, or `None`.
pub async fn get_published<R>(
    repo: &R,
    batch_id: BatchId,
) -> EngineResult<Option<TimetableVersion>>
where
    R: TimetableRepository + ?Sized,
{
    Ok(repo.latest_published(batch_id).await?)
}

/// All versions of a batch, most recent first. Read-only history.
pub async fn list_versions<R>(repo: &R, batch_id: BatchId) -> EngineResult<Vec<TimetableVersion>>
where
    R: TimetableRepository + ?Sized,
{
    Ok(repo.list_versions(batch_id).await?)
}

/// Publish a draft: archive the current published version, promote the
/// draft, and spawn a fresh empty draft.
///
/// Uses the store's transactional publish when its capabilities allow;
/// otherwise the steps run serialized and a failure after the first
/// committed step surfaces as [`EngineError::PublishIncomplete`].
pub async fn publish<R>(
    repo: &R,
    batch_id: BatchId,
    draft_id: VersionId,
) -> EngineResult<PublishOutcome>
where
    R: TimetableRepository + ?Sized,
{
    let draft = repo.get_version(draft_id).await?;
    if draft.batch_id != batch_id || draft.status != VersionStatus::Draft {
        return Err(EngineError::NotDraft {
            version_id: draft_id,
            status: draft.status,
        });
    }

    let published_at = Utc::now();
    if repo.capabilities().transactional_publish {
        info!(
            "Service layer: publishing draft {} for batch {} (transactional)",
            draft_id, batch_id
        );
        return Ok(repo.publish_draft(batch_id, draft_id, published_at).await?);
    }

    info!(
        "Service layer: publishing draft {} for batch {} (serialized steps)",
        draft_id, batch_id
    );
    publish_serialized(repo, batch_id, draft_id, published_at).await
}

/// The step-by-step publish path for stores without transactions.
///
/// A failure before anything committed is an ordinary storage error; a
/// failure after the first committed step is reported as partial, with
/// flags recording how far the lifecycle moved.
async fn publish_serialized<R>(
    repo: &R,
    batch_id: BatchId,
    draft_id: VersionId,
    published_at: chrono::DateTime<Utc>,
) -> EngineResult<PublishOutcome>
where
    R: TimetableRepository + ?Sized,
{
    let mut archived = false;
    if let Some(previous) = repo.latest_published(batch_id).await? {
        repo.update_version_status(previous.id, VersionStatus::Archived, None)
            .await?;
        archived = true;
    }

    let published = match repo
        .update_version_status(draft_id, VersionStatus::Published, Some(published_at))
        .await
    {
        Ok(version) => version,
        Err(source) if archived => {
            warn!(
                "Service layer: publish of draft {} failed after archiving the previous version",
                draft_id
            );
            return Err(EngineError::PublishIncomplete {
                archived: true,
                published: false,
                draft_created: false,
                source,
            });
        }
        Err(source) => return Err(source.into()),
    };

    let new_draft = match repo
        .insert_version(NewTimetableVersion::draft(batch_id))
        .await
    {
        Ok(version) => version,
        Err(source) => {
            warn!(
                "Service layer: draft respawn failed after publishing {} for batch {}",
                draft_id, batch_id
            );
            return Err(EngineError::PublishIncomplete {
                archived,
                published: true,
                draft_created: false,
                source,
            });
        }
    };

    Ok(PublishOutcome {
        published,
        new_draft,
    })
}
