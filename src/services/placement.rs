//! Placement engine: conflict-safe cell writes into a draft version.
//!
//! All invariant checks run before any I/O. Writes go through the backend's
//! atomic upsert when it reports one; otherwise a delete-then-insert
//! fallback is used, which is race-prone under concurrent writers and only
//! kept for backends without conflict-target upserts.

use log::{info, warn};
use std::collections::{HashMap, HashSet};

use super::error::{EngineError, EngineResult};
use crate::api::{EventId, PeriodId, RoomId};
use crate::db::repository::TimetableRepository;
use crate::models::event::{CellKey, DayOfWeek, NewScheduledEvent, ScheduledEvent};
use crate::models::offering::CourseOffering;
use crate::models::period::PeriodSlot;
use crate::models::version::TimetableVersion;

/// What to do when a placement targets a break row.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum BreakRule {
    /// Break rows accept assignments like any other row.
    #[default]
    Allow,
    /// Placements into break rows are rejected before any I/O.
    Deny,
}

/// Caller-chosen placement rules.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct PlacementPolicy {
    pub break_slots: BreakRule,
}

impl PlacementPolicy {
    pub fn denying_breaks() -> PlacementPolicy {
        PlacementPolicy {
            break_slots: BreakRule::Deny,
        }
    }
}

/// Place `offering` into every cell of `cells`, one event per cell.
///
/// Re-assigning an occupied cell replaces its event; the final write wins.
/// `room` overrides the offering's default room when given. Rejected without
/// I/O when `version` is not a draft, a period id does not resolve in
/// `slots`, or the policy denies a break row.
pub async fn assign<R>(
    repo: &R,
    version: &TimetableVersion,
    slots: &[PeriodSlot],
    cells: &[(DayOfWeek, PeriodId)],
    offering: &CourseOffering,
    room: Option<RoomId>,
    policy: PlacementPolicy,
) -> EngineResult<Vec<ScheduledEvent>>
where
    R: TimetableRepository + ?Sized,
{
    ensure_draft(version)?;

    if cells.is_empty() {
        return Ok(Vec::new());
    }

    let by_id: HashMap<&PeriodId, &PeriodSlot> = slots.iter().map(|s| (&s.id, s)).collect();
    let room_id = room.or(offering.default_room_id);

    let mut seen: HashSet<CellKey> = HashSet::with_capacity(cells.len());
    let mut writes = Vec::with_capacity(cells.len());
    for (day, period_id) in cells {
        let slot = by_id
            .get(period_id)
            .copied()
            .ok_or_else(|| EngineError::UnresolvedPeriod {
                period_id: period_id.clone(),
            })?;
        if slot.is_break && policy.break_slots == BreakRule::Deny {
            return Err(EngineError::BreakSlotDenied {
                period_id: period_id.clone(),
            });
        }

        let write = NewScheduledEvent::for_cell(version.id, *day, slot, offering.id, room_id);
        // A rectangle never repeats a cell, but callers composing cell sets
        // by hand might; one write per cell keeps the batch upsert valid.
        if seen.insert(write.cell_key()) {
            writes.push(write);
        }
    }

    info!(
        "Service layer: assigning offering {} to {} cell(s) in version {}",
        offering.id,
        writes.len(),
        version.id
    );

    let events = if repo.capabilities().atomic_upsert {
        repo.upsert_events(&writes).await?
    } else {
        upsert_by_replace(repo, version, &writes).await?
    };

    Ok(events)
}

/// Delete-then-insert stand-in for backends without an atomic upsert.
///
/// Not atomic: a concurrent writer can land between the delete and the
/// insert and turn the insert into a conflict.
async fn upsert_by_replace<R>(
    repo: &R,
    version: &TimetableVersion,
    writes: &[NewScheduledEvent],
) -> EngineResult<Vec<ScheduledEvent>>
where
    R: TimetableRepository + ?Sized,
{
    warn!(
        "Service layer: backend lacks atomic upsert; using delete-then-insert for version {}",
        version.id
    );
    let keys: Vec<CellKey> = writes.iter().map(|w| w.cell_key()).collect();
    repo.delete_events_at(version.id, &keys).await?;
    let events = repo.insert_events(writes).await?;
    Ok(events)
}

/// Remove whatever occupies the given cells. Absent events are a no-op.
///
/// Returns the number of events actually deleted.
pub async fn clear<R>(
    repo: &R,
    version: &TimetableVersion,
    cells: &[CellKey],
) -> EngineResult<usize>
where
    R: TimetableRepository + ?Sized,
{
    ensure_draft(version)?;

    if cells.is_empty() {
        return Ok(0);
    }

    let deleted = repo.delete_events_at(version.id, cells).await?;
    info!(
        "Service layer: cleared {} of {} cell(s) in version {}",
        deleted,
        cells.len(),
        version.id
    );
    Ok(deleted)
}

/// Place `offering` across `span` consecutive schedulable rows, starting at
/// the `anchor` period and expanding downward on `day`.
///
/// Break rows are passed over and stay unoccupied, so a two-period block
/// anchored above a break lands on the rows around it. A span of 1 is
/// exactly [`assign`] on the anchor cell. Rejected without I/O when the
/// template cannot supply `span` schedulable rows at or below the anchor.
pub async fn assign_span<R>(
    repo: &R,
    version: &TimetableVersion,
    slots: &[PeriodSlot],
    day: DayOfWeek,
    anchor: &PeriodId,
    span: usize,
    offering: &CourseOffering,
    room: Option<RoomId>,
    policy: PlacementPolicy,
) -> EngineResult<Vec<ScheduledEvent>>
where
    R: TimetableRepository + ?Sized,
{
    ensure_draft(version)?;

    if span == 0 {
        return Ok(Vec::new());
    }
    if span == 1 {
        return assign(
            repo,
            version,
            slots,
            &[(day, anchor.clone())],
            offering,
            room,
            policy,
        )
        .await;
    }

    let anchor_row = slots
        .iter()
        .position(|s| &s.id == anchor)
        .ok_or_else(|| EngineError::UnresolvedPeriod {
            period_id: anchor.clone(),
        })?;

    let rows: Vec<(DayOfWeek, PeriodId)> = slots[anchor_row..]
        .iter()
        .filter(|s| !s.is_break)
        .take(span)
        .map(|s| (day, s.id.clone()))
        .collect();

    if rows.len() < span {
        return Err(EngineError::SpanUnavailable {
            anchor_row,
            requested: span,
            available: rows.len(),
        });
    }

    assign(repo, version, slots, &rows, offering, room, policy).await
}

/// Update the room binding of one placed event without moving it.
pub async fn set_event_room<R>(
    repo: &R,
    version: &TimetableVersion,
    event_id: EventId,
    room: Option<RoomId>,
) -> EngineResult<ScheduledEvent>
where
    R: TimetableRepository + ?Sized,
{
    ensure_draft(version)?;
    let event = repo.set_event_room(event_id, room).await?;
    info!(
        "Service layer: set room of event {} in version {} to {:?}",
        event_id,
        version.id,
        event.room_id.map(|r| r.to_string())
    );
    Ok(event)
}

fn ensure_draft(version: &TimetableVersion) -> EngineResult<()> {
    if version.is_draft() {
        Ok(())
    } else {
        Err(EngineError::NotDraft {
            version_id: version.id,
            status: version.status,
        })
    }
}
