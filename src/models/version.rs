//! Timetable version lifecycle types.
//!
//! A batch owns a chain of versions: editors mutate the single active draft,
//! `publish` promotes it and demotes the previously published version to
//! archived, and archived versions stay around read-only as history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::{BatchId, VersionId};

/// Lifecycle state of a timetable version.
///
/// Legal transitions are `Draft -> Published -> Archived`; `Archived` is
/// terminal. A fresh draft is spawned as a side effect of publishing, never
/// by transitioning an existing version backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionStatus {
    Draft,
    Published,
    Archived,
}

impl VersionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Draft => "draft",
            VersionStatus::Published => "published",
            VersionStatus::Archived => "archived",
        }
    }

    /// Whether moving to `next` is a legal lifecycle transition.
    pub fn can_transition_to(&self, next: VersionStatus) -> bool {
        matches!(
            (self, next),
            (VersionStatus::Draft, VersionStatus::Published)
                | (VersionStatus::Published, VersionStatus::Archived)
        )
    }

    /// Archived versions never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VersionStatus::Archived)
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "draft" => Ok(VersionStatus::Draft),
            "published" => Ok(VersionStatus::Published),
            "archived" => Ok(VersionStatus::Archived),
            other => Err(format!("unknown version status: {}", other)),
        }
    }
}

/// One immutable snapshot in a batch's version chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimetableVersion {
    pub id: VersionId,
    pub batch_id: BatchId,
    pub status: VersionStatus,
    pub name: String,
    pub created_at: DateTime<Utc>,
    /// Set exactly once, when the version transitions to published.
    pub published_at: Option<DateTime<Utc>>,
}

impl TimetableVersion {
    pub fn is_draft(&self) -> bool {
        self.status == VersionStatus::Draft
    }

    pub fn is_published(&self) -> bool {
        self.status == VersionStatus::Published
    }
}

/// Insert payload for a new version; the repository mints id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTimetableVersion {
    pub batch_id: BatchId,
    pub status: VersionStatus,
    pub name: String,
}

impl NewTimetableVersion {
    /// The lazily created editing target: `status = draft`, `name = "Draft"`.
    pub fn draft(batch_id: BatchId) -> Self {
        NewTimetableVersion {
            batch_id,
            status: VersionStatus::Draft,
            name: "Draft".to_string(),
        }
    }
}

/// Result of publishing a draft: the promoted version plus the fresh draft
/// spawned for continued editing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishOutcome {
    pub published: TimetableVersion,
    pub new_draft: TimetableVersion,
}
