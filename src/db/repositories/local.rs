//! In-memory local repository implementation.
//!
//! This module provides a local implementation of all repository traits
//! suitable for unit testing and local development. All data is stored in
//! memory using HashMaps, providing fast, deterministic, and isolated
//! execution.
//!
//! The uniqueness rules a production store enforces with indexes are
//! enforced here in memory (one draft and one published version per batch,
//! one event per grid cell), so conflict and upsert paths behave the same
//! against both backends.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::api::{BatchId, EventId, OfferingId, RoomId, TemplateId, VersionId};
use crate::db::capabilities::{CapabilityReport, StoreCapabilities};
use crate::db::repository::{
    ErrorContext, EventRepository, OfferingRepository, RepositoryError, RepositoryResult,
    TemplateRepository, VersionRepository,
};
use crate::models::event::{CellKey, NewScheduledEvent, ScheduledEvent};
use crate::models::offering::CourseOffering;
use crate::models::period::{NewPeriodTemplate, PeriodTemplate};
use crate::models::version::{
    NewTimetableVersion, PublishOutcome, TimetableVersion, VersionStatus,
};

/// In-memory local repository.
///
/// Ideal for unit tests and local development that need isolation and
/// speed. Cloning is cheap and clones share the same underlying data.
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    versions: HashMap<VersionId, TimetableVersion>,
    events: HashMap<EventId, ScheduledEvent>,
    // Mirrors the production unique index on (version, day, period).
    occupancy: HashMap<(VersionId, CellKey), EventId>,

    templates: HashMap<TemplateId, PeriodTemplate>,
    active_template: Option<TemplateId>,

    offerings: HashMap<OfferingId, CourseOffering>,

    // Connection health and negotiated capabilities
    is_healthy: bool,
    capabilities: StoreCapabilities,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            versions: HashMap::new(),
            events: HashMap::new(),
            occupancy: HashMap::new(),
            templates: HashMap::new(),
            active_template: None,
            offerings: HashMap::new(),
            is_healthy: true,
            capabilities: StoreCapabilities::full(),
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Create a repository that reports the given capability set.
    ///
    /// Used to exercise the degraded placement and publish paths that real
    /// constrained stores would take.
    pub fn with_capabilities(capabilities: StoreCapabilities) -> Self {
        let repo = Self::new();
        repo.data.write().capabilities = capabilities;
        repo
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Add an offering to the catalog.
    ///
    /// Helper for setting up data; the surrounding administration system
    /// owns the catalog in production.
    pub fn seed_offering(&self, offering: CourseOffering) {
        self.data.write().offerings.insert(offering.id, offering);
    }

    /// Clear all data from the repository.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            capabilities: data.capabilities,
            ..LocalData::default()
        };
    }

    /// Number of stored versions (all batches, all statuses).
    pub fn version_count(&self) -> usize {
        self.data.read().versions.len()
    }

    /// Number of stored events (all versions).
    pub fn event_count(&self) -> usize {
        self.data.read().events.len()
    }

    /// Helper to check health and return an error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Repository is not healthy"));
        }
        Ok(())
    }

    fn get_version_impl(data: &LocalData, version_id: VersionId) -> RepositoryResult<TimetableVersion> {
        data.versions.get(&version_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Version not found",
                ErrorContext::new("get_version")
                    .with_entity("version")
                    .with_entity_id(version_id),
            )
        })
    }

    fn draft_for_batch(data: &LocalData, batch_id: BatchId) -> Option<TimetableVersion> {
        data.versions
            .values()
            .filter(|v| v.batch_id == batch_id && v.status == VersionStatus::Draft)
            .max_by_key(|v| (v.created_at, v.id))
            .cloned()
    }

    fn published_for_batch(data: &LocalData, batch_id: BatchId) -> Option<TimetableVersion> {
        data.versions
            .values()
            .filter(|v| v.batch_id == batch_id && v.status == VersionStatus::Published)
            .max_by_key(|v| (v.published_at, v.id))
            .cloned()
    }

    /// Enforce the partial-uniqueness rules a production schema carries as
    /// indexes: at most one draft and one published version per batch.
    fn check_version_uniqueness(
        data: &LocalData,
        version: &NewTimetableVersion,
    ) -> RepositoryResult<()> {
        let conflicting = match version.status {
            VersionStatus::Draft => Self::draft_for_batch(data, version.batch_id),
            VersionStatus::Published => Self::published_for_batch(data, version.batch_id),
            VersionStatus::Archived => None,
        };
        if let Some(existing) = conflicting {
            return Err(RepositoryError::conflict_with_context(
                format!(
                    "Batch already has a {} version",
                    version.status
                ),
                ErrorContext::new("insert_version")
                    .with_entity("version")
                    .with_entity_id(existing.id),
            ));
        }
        Ok(())
    }

    fn insert_version_impl(
        data: &mut LocalData,
        version: NewTimetableVersion,
        created_at: DateTime<Utc>,
    ) -> RepositoryResult<TimetableVersion> {
        Self::check_version_uniqueness(data, &version)?;
        let stored = TimetableVersion {
            id: VersionId::random(),
            batch_id: version.batch_id,
            status: version.status,
            name: version.name,
            created_at,
            published_at: None,
        };
        data.versions.insert(stored.id, stored.clone());
        Ok(stored)
    }

    fn transition_version_impl(
        data: &mut LocalData,
        version_id: VersionId,
        status: VersionStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<TimetableVersion> {
        let current = Self::get_version_impl(data, version_id)?;
        if !current.status.can_transition_to(status) {
            return Err(RepositoryError::validation_with_context(
                format!("Illegal transition {} -> {}", current.status, status),
                ErrorContext::new("update_version_status")
                    .with_entity("version")
                    .with_entity_id(version_id),
            ));
        }

        // The one-published index also fires on UPDATE in production.
        if status == VersionStatus::Published {
            if let Some(existing) = Self::published_for_batch(data, current.batch_id) {
                if existing.id != version_id {
                    return Err(RepositoryError::conflict_with_context(
                        "Batch already has a published version",
                        ErrorContext::new("update_version_status")
                            .with_entity("version")
                            .with_entity_id(existing.id),
                    ));
                }
            }
        }

        let mut updated = current;
        updated.status = status;
        if let Some(at) = published_at {
            updated.published_at = Some(at);
        }
        data.versions.insert(version_id, updated.clone());
        Ok(updated)
    }

    fn upsert_event_impl(data: &mut LocalData, event: &NewScheduledEvent) -> ScheduledEvent {
        let key = (event.version_id, event.cell_key());
        match data.occupancy.get(&key).copied() {
            Some(existing_id) => {
                // Occupied cell: update in place, keeping the row id, the
                // same way ON CONFLICT DO UPDATE behaves.
                let stored = ScheduledEvent {
                    id: existing_id,
                    version_id: event.version_id,
                    day_of_week: event.day_of_week,
                    period_id: event.period_id.clone(),
                    start_time: event.start_time,
                    end_time: event.end_time,
                    offering_id: event.offering_id,
                    room_id: event.room_id,
                };
                data.events.insert(existing_id, stored.clone());
                stored
            }
            None => {
                let stored = ScheduledEvent {
                    id: EventId::random(),
                    version_id: event.version_id,
                    day_of_week: event.day_of_week,
                    period_id: event.period_id.clone(),
                    start_time: event.start_time,
                    end_time: event.end_time,
                    offering_id: event.offering_id,
                    room_id: event.room_id,
                };
                data.occupancy.insert(key, stored.id);
                data.events.insert(stored.id, stored.clone());
                stored
            }
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityReport for LocalRepository {
    fn capabilities(&self) -> StoreCapabilities {
        self.data.read().capabilities
    }
}

#[async_trait]
impl VersionRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn get_version(&self, version_id: VersionId) -> RepositoryResult<TimetableVersion> {
        self.check_health()?;
        let data = self.data.read();
        Self::get_version_impl(&data, version_id)
    }

    async fn latest_draft(&self, batch_id: BatchId) -> RepositoryResult<Option<TimetableVersion>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(Self::draft_for_batch(&data, batch_id))
    }

    async fn latest_published(
        &self,
        batch_id: BatchId,
    ) -> RepositoryResult<Option<TimetableVersion>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(Self::published_for_batch(&data, batch_id))
    }

    async fn list_versions(&self, batch_id: BatchId) -> RepositoryResult<Vec<TimetableVersion>> {
        self.check_health()?;
        let data = self.data.read();
        let mut versions: Vec<TimetableVersion> = data
            .versions
            .values()
            .filter(|v| v.batch_id == batch_id)
            .cloned()
            .collect();
        versions.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(versions)
    }

    async fn insert_version(
        &self,
        version: NewTimetableVersion,
    ) -> RepositoryResult<TimetableVersion> {
        self.check_health()?;
        let mut data = self.data.write();
        Self::insert_version_impl(&mut data, version, Utc::now())
    }

    async fn update_version_status(
        &self,
        version_id: VersionId,
        status: VersionStatus,
        published_at: Option<DateTime<Utc>>,
    ) -> RepositoryResult<TimetableVersion> {
        self.check_health()?;
        let mut data = self.data.write();
        Self::transition_version_impl(&mut data, version_id, status, published_at)
    }

    async fn publish_draft(
        &self,
        batch_id: BatchId,
        draft_id: VersionId,
        published_at: DateTime<Utc>,
    ) -> RepositoryResult<PublishOutcome> {
        self.check_health()?;

        // One write lock for all three steps makes this atomic: no other
        // caller can observe the intermediate states.
        let mut data = self.data.write();

        let draft = Self::get_version_impl(&data, draft_id)?;
        if draft.batch_id != batch_id || draft.status != VersionStatus::Draft {
            return Err(RepositoryError::validation_with_context(
                "Version is not a draft of this batch",
                ErrorContext::new("publish_draft")
                    .with_entity("version")
                    .with_entity_id(draft_id),
            ));
        }

        if let Some(previous) = Self::published_for_batch(&data, batch_id) {
            Self::transition_version_impl(&mut data, previous.id, VersionStatus::Archived, None)?;
        }

        let published = Self::transition_version_impl(
            &mut data,
            draft_id,
            VersionStatus::Published,
            Some(published_at),
        )?;

        let new_draft =
            Self::insert_version_impl(&mut data, NewTimetableVersion::draft(batch_id), Utc::now())?;

        Ok(PublishOutcome {
            published,
            new_draft,
        })
    }
}

#[async_trait]
impl EventRepository for LocalRepository {
    async fn events_for_version(
        &self,
        version_id: VersionId,
    ) -> RepositoryResult<Vec<ScheduledEvent>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data
            .events
            .values()
            .filter(|e| e.version_id == version_id)
            .cloned()
            .collect())
    }

    async fn upsert_events(
        &self,
        events: &[NewScheduledEvent],
    ) -> RepositoryResult<Vec<ScheduledEvent>> {
        self.check_health()?;
        let mut data = self.data.write();
        Ok(events
            .iter()
            .map(|event| Self::upsert_event_impl(&mut data, event))
            .collect())
    }

    async fn insert_events(
        &self,
        events: &[NewScheduledEvent],
    ) -> RepositoryResult<Vec<ScheduledEvent>> {
        self.check_health()?;
        let mut data = self.data.write();

        // All-or-nothing, like a single multi-row INSERT: reject before
        // touching anything if any target cell is taken, including
        // duplicates within this batch of writes.
        let mut claimed: Vec<(VersionId, CellKey)> = Vec::with_capacity(events.len());
        for event in events {
            let key = (event.version_id, event.cell_key());
            if data.occupancy.contains_key(&key) || claimed.contains(&key) {
                return Err(RepositoryError::conflict_with_context(
                    format!("Cell {} is already occupied", key.1),
                    ErrorContext::new("insert_events").with_entity("event"),
                ));
            }
            claimed.push(key);
        }

        Ok(events
            .iter()
            .map(|event| Self::upsert_event_impl(&mut data, event))
            .collect())
    }

    async fn delete_events_at(
        &self,
        version_id: VersionId,
        cells: &[CellKey],
    ) -> RepositoryResult<usize> {
        self.check_health()?;
        let mut data = self.data.write();
        let mut deleted = 0;
        for cell in cells {
            let key = (version_id, cell.clone());
            if let Some(event_id) = data.occupancy.remove(&key) {
                data.events.remove(&event_id);
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    async fn set_event_room(
        &self,
        event_id: EventId,
        room_id: Option<RoomId>,
    ) -> RepositoryResult<ScheduledEvent> {
        self.check_health()?;
        let mut data = self.data.write();
        let event = data.events.get_mut(&event_id).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Event not found",
                ErrorContext::new("set_event_room")
                    .with_entity("event")
                    .with_entity_id(event_id),
            )
        })?;
        event.room_id = room_id;
        Ok(event.clone())
    }
}

#[async_trait]
impl TemplateRepository for LocalRepository {
    async fn active_template(&self) -> RepositoryResult<Option<PeriodTemplate>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data
            .active_template
            .and_then(|id| data.templates.get(&id))
            .cloned())
    }

    async fn put_template(&self, template: NewPeriodTemplate) -> RepositoryResult<PeriodTemplate> {
        self.check_health()?;
        let mut data = self.data.write();
        let stored = PeriodTemplate {
            id: TemplateId::random(),
            name: template.name,
            slots: template.slots,
            updated_at: Utc::now(),
        };
        data.templates.insert(stored.id, stored.clone());
        data.active_template = Some(stored.id);
        Ok(stored)
    }
}

#[async_trait]
impl OfferingRepository for LocalRepository {
    async fn offerings_for_batch(
        &self,
        batch_id: BatchId,
    ) -> RepositoryResult<Vec<CourseOffering>> {
        self.check_health()?;
        let data = self.data.read();
        let mut offerings: Vec<CourseOffering> = data
            .offerings
            .values()
            .filter(|o| o.batch_id == batch_id)
            .cloned()
            .collect();
        offerings.sort_by(|a, b| a.subject_name.cmp(&b.subject_name));
        Ok(offerings)
    }

    async fn get_offering(&self, offering_id: OfferingId) -> RepositoryResult<CourseOffering> {
        self.check_health()?;
        let data = self.data.read();
        data.offerings.get(&offering_id).cloned().ok_or_else(|| {
            RepositoryError::not_found_with_context(
                "Offering not found",
                ErrorContext::new("get_offering")
                    .with_entity("offering")
                    .with_entity_id(offering_id),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::PeriodId;
    use chrono::NaiveTime;

    fn new_event(version: VersionId, day: u8, period: &str) -> NewScheduledEvent {
        NewScheduledEvent {
            version_id: version,
            day_of_week: crate::models::event::DayOfWeek::new(day).unwrap(),
            period_id: Some(PeriodId::from(period)),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            offering_id: OfferingId::random(),
            room_id: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get_version() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();

        let inserted = repo
            .insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();
        let fetched = repo.get_version(inserted.id).await.unwrap();

        assert_eq!(fetched, inserted);
        assert_eq!(fetched.status, VersionStatus::Draft);
        assert_eq!(fetched.name, "Draft");
        assert!(fetched.published_at.is_none());
    }

    #[tokio::test]
    async fn test_get_version_not_found() {
        let repo = LocalRepository::new();
        let err = repo.get_version(VersionId::random()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_second_draft_for_batch_conflicts() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();

        repo.insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();
        let err = repo
            .insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        // A different batch is unaffected
        repo.insert_version(NewTimetableVersion::draft(BatchId::random()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_illegal_transition_rejected() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();
        let draft = repo
            .insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();

        let err = repo
            .update_version_status(draft.id, VersionStatus::Archived, None)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_promote_conflicts_while_another_version_is_published() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();
        let first = repo
            .insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();
        let outcome = repo.publish_draft(batch, first.id, Utc::now()).await.unwrap();

        // Promoting the spawned draft without archiving the live version
        // first hits the same uniqueness rule an index would enforce.
        let err = repo
            .update_version_status(outcome.new_draft.id, VersionStatus::Published, Some(Utc::now()))
            .await
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_publish_draft_archives_previous_and_spawns_new_draft() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();

        let first = repo
            .insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();
        let outcome1 = repo
            .publish_draft(batch, first.id, Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome1.published.id, first.id);
        assert!(outcome1.published.published_at.is_some());
        assert_eq!(outcome1.new_draft.status, VersionStatus::Draft);

        let outcome2 = repo
            .publish_draft(batch, outcome1.new_draft.id, Utc::now())
            .await
            .unwrap();

        let archived = repo.get_version(first.id).await.unwrap();
        assert_eq!(archived.status, VersionStatus::Archived);
        // Archived versions keep the timestamp from their published phase
        assert!(archived.published_at.is_some());

        let published = repo.latest_published(batch).await.unwrap().unwrap();
        assert_eq!(published.id, outcome2.published.id);

        let drafts: Vec<_> = repo
            .list_versions(batch)
            .await
            .unwrap()
            .into_iter()
            .filter(|v| v.status == VersionStatus::Draft)
            .collect();
        assert_eq!(drafts.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_draft_rejects_non_draft() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();
        let draft = repo
            .insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();
        let outcome = repo
            .publish_draft(batch, draft.id, Utc::now())
            .await
            .unwrap();

        // Publishing the already-published version again fails cleanly
        let err = repo
            .publish_draft(batch, outcome.published.id, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn test_upsert_replaces_in_place_keeping_id() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();
        let version = repo
            .insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();

        let first = new_event(version.id, 0, "p1");
        let stored = repo.upsert_events(&[first.clone()]).await.unwrap();
        assert_eq!(stored.len(), 1);

        let mut replacement = first;
        replacement.offering_id = OfferingId::random();
        let replaced = repo.upsert_events(&[replacement.clone()]).await.unwrap();

        assert_eq!(replaced[0].id, stored[0].id);
        assert_eq!(replaced[0].offering_id, replacement.offering_id);
        assert_eq!(repo.event_count(), 1);
    }

    #[tokio::test]
    async fn test_insert_events_conflicts_on_occupied_cell() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();
        let version = repo
            .insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();

        repo.insert_events(&[new_event(version.id, 2, "p3")])
            .await
            .unwrap();
        let err = repo
            .insert_events(&[new_event(version.id, 2, "p3")])
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(repo.event_count(), 1);
    }

    #[tokio::test]
    async fn test_insert_events_rejects_duplicate_cells_in_batch() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();
        let version = repo
            .insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();

        let err = repo
            .insert_events(&[new_event(version.id, 1, "p1"), new_event(version.id, 1, "p1")])
            .await
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(repo.event_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_events_at_is_noop_for_empty_cells() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();
        let version = repo
            .insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();

        let event = new_event(version.id, 4, "p2");
        let cell = event.cell_key();
        repo.upsert_events(&[event]).await.unwrap();

        let missing = CellKey::new(
            crate::models::event::DayOfWeek::MONDAY,
            crate::models::event::PeriodKey::Slot(PeriodId::from("p9")),
        );
        let deleted = repo
            .delete_events_at(version.id, &[cell, missing])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(repo.event_count(), 0);
    }

    #[tokio::test]
    async fn test_set_event_room() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();
        let version = repo
            .insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();
        let stored = repo
            .upsert_events(&[new_event(version.id, 0, "p1")])
            .await
            .unwrap();

        let room = RoomId::random();
        let updated = repo.set_event_room(stored[0].id, Some(room)).await.unwrap();
        assert_eq!(updated.room_id, Some(room));

        let cleared = repo.set_event_room(stored[0].id, None).await.unwrap();
        assert_eq!(cleared.room_id, None);

        let err = repo
            .set_event_room(EventId::random(), Some(room))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_put_template_activates_latest() {
        let repo = LocalRepository::new();
        assert!(repo.active_template().await.unwrap().is_none());

        repo.put_template(NewPeriodTemplate {
            name: "old".into(),
            slots: vec![],
        })
        .await
        .unwrap();
        let newer = repo
            .put_template(NewPeriodTemplate {
                name: "new".into(),
                slots: vec![],
            })
            .await
            .unwrap();

        let active = repo.active_template().await.unwrap().unwrap();
        assert_eq!(active.id, newer.id);
        assert_eq!(active.name, "new");
    }

    #[tokio::test]
    async fn test_offering_lookup() {
        let repo = LocalRepository::new();
        let batch = BatchId::random();
        let offering = CourseOffering {
            id: OfferingId::random(),
            batch_id: batch,
            subject_name: "Algorithms".into(),
            subject_code: Some("CS301".into()),
            faculty_name: Some("T. Iyer".into()),
            default_room_id: Some(RoomId::random()),
        };
        repo.seed_offering(offering.clone());

        assert_eq!(repo.get_offering(offering.id).await.unwrap(), offering);
        assert_eq!(repo.offerings_for_batch(batch).await.unwrap().len(), 1);
        assert!(repo
            .offerings_for_batch(BatchId::random())
            .await
            .unwrap()
            .is_empty());

        let err = repo.get_offering(OfferingId::random()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_unhealthy_repository_fails_operations() {
        let repo = LocalRepository::new();
        repo.set_healthy(false);

        assert!(!repo.health_check().await.unwrap());
        let err = repo.latest_draft(BatchId::random()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConnectionError { .. }));
        assert!(err.is_retryable());

        repo.set_healthy(true);
        assert!(repo.latest_draft(BatchId::random()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_clear_keeps_health_and_capabilities() {
        let repo = LocalRepository::with_capabilities(StoreCapabilities::minimal());
        let batch = BatchId::random();
        repo.insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();
        assert_eq!(repo.version_count(), 1);

        repo.clear();
        assert_eq!(repo.version_count(), 0);
        assert_eq!(repo.capabilities(), StoreCapabilities::minimal());
    }

    #[tokio::test]
    async fn test_clones_share_data() {
        let repo = LocalRepository::new();
        let clone = repo.clone();
        let batch = BatchId::random();

        repo.insert_version(NewTimetableVersion::draft(batch))
            .await
            .unwrap();
        assert_eq!(clone.version_count(), 1);
    }
}
