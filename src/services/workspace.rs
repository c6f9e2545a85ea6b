//! Workspace facade: one batch's timetable view and edit surface.
//!
//! A [`Workspace`] composes the version manager, the template cache, the
//! grid snapshot and the placement engine behind one object. It tracks
//! which mode (draft or published) is being viewed and guards every load
//! with a monotonically increasing token, so a load that resolves after a
//! newer view switch is discarded instead of clobbering the newer state.
//!
//! Known limitation: nothing guards the draft against concurrent editors.
//! Versions carry no revision counter or lock, so two workspaces editing
//! the same draft interleave freely; writes to the same cell resolve
//! last-writer-wins through the grid's upsert key. Callers that need
//! multi-editor safety must serialize writes themselves.

use log::{debug, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::error::{EngineError, EngineResult};
use super::grid::GridSnapshot;
use super::placement::{self, PlacementPolicy};
use super::selection::CellRect;
use super::template_cache::{ResolvedTemplate, TemplateCache};
use super::versioning;
use crate::api::{BatchId, EventId, OfferingId, PeriodId, RoomId, VersionId};
use crate::db::repository::TimetableRepository;
use crate::models::event::{CellKey, DayOfWeek, ScheduledEvent};
use crate::models::offering::CourseOffering;
use crate::models::period::{NewPeriodTemplate, PeriodSlot, PeriodTemplate};
use crate::models::version::{PublishOutcome, TimetableVersion};

/// Which side of the lifecycle the workspace is looking at.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewMode {
    /// The active draft; created lazily when none exists.
    Draft,
    /// The most recently published version, read-only.
    Published,
}

/// Why the grid renders nothing. An explicit state, not an error.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EmptyReason {
    /// No active period template, or the template has no rows.
    NoTemplate,
    /// Published mode, but the batch has never been published.
    NoPublishedVersion,
}

/// Everything the caller needs to render the grid once.
#[derive(Debug, Clone)]
pub struct GridView {
    pub mode: ViewMode,
    pub periods: Vec<PeriodSlot>,
    pub cells: HashMap<CellKey, ScheduledEvent>,
    pub version: Option<TimetableVersion>,
    /// Writes are accepted only when this is set.
    pub editable: bool,
    pub empty: Option<EmptyReason>,
}

#[derive(Debug)]
struct ViewState {
    mode: ViewMode,
    template: Option<Arc<ResolvedTemplate>>,
    version: Option<TimetableVersion>,
    grid: Option<GridSnapshot>,
    policy: PlacementPolicy,
}

/// Facade over one batch's timetable. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct Workspace {
    repo: Arc<dyn TimetableRepository>,
    batch_id: BatchId,
    templates: TemplateCache,
    state: Arc<RwLock<ViewState>>,
    load_token: Arc<AtomicU64>,
}

impl Workspace {
    /// Open a batch's workspace in draft mode, creating the draft if the
    /// batch has none, and load the initial grid.
    ///
    /// The template cache is owned by the caller and may be shared between
    /// workspaces; invalidating it affects all of them on their next load.
    pub async fn open(
        repo: Arc<dyn TimetableRepository>,
        batch_id: BatchId,
        templates: TemplateCache,
    ) -> EngineResult<Workspace> {
        let workspace = Workspace {
            repo,
            batch_id,
            templates,
            state: Arc::new(RwLock::new(ViewState {
                mode: ViewMode::Draft,
                template: None,
                version: None,
                grid: None,
                policy: PlacementPolicy::default(),
            })),
            load_token: Arc::new(AtomicU64::new(0)),
        };
        workspace.load(ViewMode::Draft).await?;
        Ok(workspace)
    }

    pub fn batch_id(&self) -> BatchId {
        self.batch_id
    }

    pub fn mode(&self) -> ViewMode {
        self.state.read().mode
    }

    /// Replace the placement policy for subsequent writes.
    pub fn set_placement_policy(&self, policy: PlacementPolicy) {
        self.state.write().policy = policy;
    }

    /// Point the workspace at the other lifecycle side and reload.
    pub async fn switch_mode(&self, mode: ViewMode) -> EngineResult<()> {
        debug!(
            "Workspace: switching batch {} to {:?} view",
            self.batch_id, mode
        );
        self.load(mode).await
    }

    /// Reload template, version and grid for the current mode.
    pub async fn refresh(&self) -> EngineResult<()> {
        let mode = self.mode();
        self.load(mode).await
    }

    /// A renderable copy of the current state. Synchronous; never does I/O.
    pub fn view(&self) -> GridView {
        let state = self.state.read();
        let periods = state
            .template
            .as_ref()
            .map(|t| t.periods.clone())
            .unwrap_or_default();
        let empty = if periods.is_empty() {
            Some(EmptyReason::NoTemplate)
        } else if state.version.is_none() {
            Some(EmptyReason::NoPublishedVersion)
        } else {
            None
        };
        let editable = state.mode == ViewMode::Draft
            && state.version.as_ref().is_some_and(|v| v.is_draft());
        GridView {
            mode: state.mode,
            periods,
            cells: state
                .grid
                .as_ref()
                .map(|g| g.cells().clone())
                .unwrap_or_default(),
            version: state.version.clone(),
            editable,
            empty,
        }
    }

    /// Place an offering into the given cells and reload the grid.
    ///
    /// The offering's default room is used unless `room` overrides it.
    ///
    /// The draft carries no revision token, so writes from another editor
    /// are not detected; same-cell writes resolve last-writer-wins (see
    /// the module doc).
    pub async fn assign(
        &self,
        cells: &[(DayOfWeek, PeriodId)],
        offering_id: OfferingId,
        room: Option<RoomId>,
    ) -> EngineResult<Vec<ScheduledEvent>> {
        let (version, periods, policy) = self.edit_context()?;
        let offering = self.repo.get_offering(offering_id).await?;
        let events = placement::assign(
            self.repo.as_ref(),
            &version,
            &periods,
            cells,
            &offering,
            room,
            policy,
        )
        .await?;
        self.reload_grid(version.id).await?;
        Ok(events)
    }

    /// Place an offering into every cell of a committed selection rectangle.
    pub async fn assign_rect(
        &self,
        rect: CellRect,
        offering_id: OfferingId,
        room: Option<RoomId>,
    ) -> EngineResult<Vec<ScheduledEvent>> {
        let periods = self
            .state
            .read()
            .template
            .as_ref()
            .map(|t| t.periods.clone())
            .unwrap_or_default();
        let cells = rect.cells(&periods);
        self.assign(&cells, offering_id, room).await
    }

    /// Place an offering across consecutive schedulable rows under an
    /// anchor cell.
    pub async fn assign_span(
        &self,
        day: DayOfWeek,
        anchor: &PeriodId,
        span: usize,
        offering_id: OfferingId,
        room: Option<RoomId>,
    ) -> EngineResult<Vec<ScheduledEvent>> {
        let (version, periods, policy) = self.edit_context()?;
        let offering = self.repo.get_offering(offering_id).await?;
        let events = placement::assign_span(
            self.repo.as_ref(),
            &version,
            &periods,
            day,
            anchor,
            span,
            &offering,
            room,
            policy,
        )
        .await?;
        self.reload_grid(version.id).await?;
        Ok(events)
    }

    /// Remove whatever occupies the given cells; absent cells are skipped.
    pub async fn clear(&self, cells: &[CellKey]) -> EngineResult<usize> {
        let (version, _, _) = self.edit_context()?;
        let deleted = placement::clear(self.repo.as_ref(), &version, cells).await?;
        self.reload_grid(version.id).await?;
        Ok(deleted)
    }

    /// Rebind one placed event's room without moving it.
    pub async fn set_event_room(
        &self,
        event_id: EventId,
        room: Option<RoomId>,
    ) -> EngineResult<ScheduledEvent> {
        let (version, _, _) = self.edit_context()?;
        let event =
            placement::set_event_room(self.repo.as_ref(), &version, event_id, room).await?;
        self.reload_grid(version.id).await?;
        Ok(event)
    }

    /// Publish the draft under view, then reload so the workspace shows the
    /// fresh draft it spawned.
    pub async fn publish(&self) -> EngineResult<PublishOutcome> {
        let version = self
            .state
            .read()
            .version
            .clone()
            .ok_or(EngineError::DraftMissing {
                batch_id: self.batch_id,
            })?;
        let outcome = versioning::publish(self.repo.as_ref(), self.batch_id, version.id).await?;
        info!(
            "Workspace: batch {} published version {}, new draft {}",
            self.batch_id, outcome.published.id, outcome.new_draft.id
        );
        self.refresh().await?;
        Ok(outcome)
    }

    /// Store a new period template, make it active, and reload against it.
    pub async fn put_template(
        &self,
        template: NewPeriodTemplate,
    ) -> EngineResult<PeriodTemplate> {
        let stored = self.repo.put_template(template).await?;
        self.templates.invalidate();
        self.refresh().await?;
        Ok(stored)
    }

    /// The batch's offering catalog, for caller-side palettes. Read-only.
    pub async fn offerings(&self) -> EngineResult<Vec<CourseOffering>> {
        Ok(self.repo.offerings_for_batch(self.batch_id).await?)
    }

    // ==================== load pipeline ====================

    /// Mint the token for a load about to start. Any older in-flight load
    /// becomes stale from this point on.
    fn begin_load(&self) -> u64 {
        self.load_token.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a finished load unless a newer one was started meanwhile.
    /// Returns whether the result was applied.
    fn commit_load(
        &self,
        token: u64,
        mode: ViewMode,
        template: Option<Arc<ResolvedTemplate>>,
        version: Option<TimetableVersion>,
        grid: Option<GridSnapshot>,
    ) -> bool {
        let mut state = self.state.write();
        if self.load_token.load(Ordering::SeqCst) != token {
            return false;
        }
        state.mode = mode;
        state.template = template;
        state.version = version;
        state.grid = grid;
        true
    }

    async fn load(&self, mode: ViewMode) -> EngineResult<()> {
        let token = self.begin_load();
        let template = self.templates.get_or_fetch(self.repo.as_ref()).await?;
        let version = match mode {
            ViewMode::Draft => {
                Some(versioning::get_or_create_draft(self.repo.as_ref(), self.batch_id).await?)
            }
            ViewMode::Published => {
                versioning::get_published(self.repo.as_ref(), self.batch_id).await?
            }
        };
        let grid = match &version {
            Some(v) => Some(GridSnapshot::load(self.repo.as_ref(), v.id).await?),
            None => None,
        };
        if !self.commit_load(token, mode, template, version, grid) {
            debug!(
                "Workspace: discarded stale load for batch {} (token {})",
                self.batch_id, token
            );
        }
        Ok(())
    }

    /// Reload only the grid after a write, keeping template and version.
    /// Applies only if the workspace still views the written version.
    async fn reload_grid(&self, version_id: VersionId) -> EngineResult<()> {
        let token = self.begin_load();
        let grid = GridSnapshot::load(self.repo.as_ref(), version_id).await?;
        let mut state = self.state.write();
        if self.load_token.load(Ordering::SeqCst) != token {
            debug!(
                "Workspace: discarded stale grid reload for version {}",
                version_id
            );
            return Ok(());
        }
        if state.version.as_ref().map(|v| v.id) == Some(version_id) {
            state.grid = Some(grid);
        }
        Ok(())
    }

    /// The version and geometry writes go against. Clones out of the state
    /// lock; callers must not hold it across awaits.
    fn edit_context(&self) -> EngineResult<(TimetableVersion, Vec<PeriodSlot>, PlacementPolicy)> {
        let state = self.state.read();
        let version = state.version.clone().ok_or(EngineError::DraftMissing {
            batch_id: self.batch_id,
        })?;
        let periods = state
            .template
            .as_ref()
            .map(|t| t.periods.clone())
            .unwrap_or_default();
        Ok((version, periods, state.policy))
    }
}
