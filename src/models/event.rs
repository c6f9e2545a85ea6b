//! Scheduled events and grid cell keying.
//!
//! The grid addresses events by `(day, period)`. Events persisted before a
//! template change may reference a period id that no longer resolves, so the
//! cell key falls back to the event's stored start time rather than
//! orphaning the row.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::{EventId, OfferingId, PeriodId, RoomId, VersionId};
use crate::models::period::PeriodSlot;

/// Day of the week as a bounded grid column index, 0 = Monday .. 6 = Sunday.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct DayOfWeek(u8);

impl DayOfWeek {
    pub const MONDAY: DayOfWeek = DayOfWeek(0);
    pub const TUESDAY: DayOfWeek = DayOfWeek(1);
    pub const WEDNESDAY: DayOfWeek = DayOfWeek(2);
    pub const THURSDAY: DayOfWeek = DayOfWeek(3);
    pub const FRIDAY: DayOfWeek = DayOfWeek(4);
    pub const SATURDAY: DayOfWeek = DayOfWeek(5);
    pub const SUNDAY: DayOfWeek = DayOfWeek(6);

    /// Returns `None` for indices outside 0..=6.
    pub fn new(index: u8) -> Option<DayOfWeek> {
        (index <= 6).then_some(DayOfWeek(index))
    }

    pub fn index(&self) -> u8 {
        self.0
    }

    pub fn label(&self) -> &'static str {
        const LABELS: [&str; 7] = [
            "Monday",
            "Tuesday",
            "Wednesday",
            "Thursday",
            "Friday",
            "Saturday",
            "Sunday",
        ];
        LABELS[self.0 as usize]
    }
}

impl TryFrom<u8> for DayOfWeek {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        DayOfWeek::new(index).ok_or_else(|| format!("day of week out of range: {}", index))
    }
}

impl From<DayOfWeek> for u8 {
    fn from(day: DayOfWeek) -> u8 {
        day.0
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Row half of a cell key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PeriodKey {
    /// The period id resolved from the active template.
    Slot(PeriodId),
    /// Fallback for events whose period id no longer resolves.
    Time(NaiveTime),
}

impl PeriodKey {
    /// Key an event row: prefer the period id, fall back to start time.
    pub fn for_event(period_id: Option<&PeriodId>, start_time: NaiveTime) -> PeriodKey {
        match period_id {
            Some(id) => PeriodKey::Slot(id.clone()),
            None => PeriodKey::Time(start_time),
        }
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKey::Slot(id) => write!(f, "{}", id),
            PeriodKey::Time(t) => write!(f, "time:{}", t.format("%H:%M:%S")),
        }
    }
}

/// One `(day, period)` coordinate of the weekly grid.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellKey {
    pub day: DayOfWeek,
    pub period: PeriodKey,
}

impl CellKey {
    pub fn new(day: DayOfWeek, period: PeriodKey) -> Self {
        CellKey { day, period }
    }

    /// Cell addressed by a resolved template slot.
    pub fn for_slot(day: DayOfWeek, slot: &PeriodSlot) -> Self {
        CellKey::new(day, PeriodKey::Slot(slot.id.clone()))
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.day.index(), self.period)
    }
}

/// One offering placed into one grid cell of one version.
///
/// Invariant: no two events of a version share `(day_of_week, period_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    pub id: EventId,
    pub version_id: VersionId,
    pub day_of_week: DayOfWeek,
    pub period_id: Option<PeriodId>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub offering_id: OfferingId,
    pub room_id: Option<RoomId>,
}

impl ScheduledEvent {
    /// The grid cell this event occupies.
    pub fn cell_key(&self) -> CellKey {
        CellKey::new(
            self.day_of_week,
            PeriodKey::for_event(self.period_id.as_ref(), self.start_time),
        )
    }
}

/// Insert/upsert payload for one cell write; the repository mints the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewScheduledEvent {
    pub version_id: VersionId,
    pub day_of_week: DayOfWeek,
    pub period_id: Option<PeriodId>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub offering_id: OfferingId,
    pub room_id: Option<RoomId>,
}

impl NewScheduledEvent {
    /// Build the write for placing `offering_id` into `(day, slot)`.
    pub fn for_cell(
        version_id: VersionId,
        day: DayOfWeek,
        slot: &PeriodSlot,
        offering_id: OfferingId,
        room_id: Option<RoomId>,
    ) -> Self {
        NewScheduledEvent {
            version_id,
            day_of_week: day,
            period_id: Some(slot.id.clone()),
            start_time: slot.start_time,
            end_time: slot.end_time,
            offering_id,
            room_id,
        }
    }

    pub fn cell_key(&self) -> CellKey {
        CellKey::new(
            self.day_of_week,
            PeriodKey::for_event(self.period_id.as_ref(), self.start_time),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(id: &str, hour: u32) -> PeriodSlot {
        PeriodSlot {
            id: PeriodId::from(id),
            order_number: 1,
            label: "Period 1".into(),
            start_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            is_break: false,
        }
    }

    #[test]
    fn test_day_of_week_bounds() {
        assert_eq!(DayOfWeek::new(0), Some(DayOfWeek::MONDAY));
        assert_eq!(DayOfWeek::new(6), Some(DayOfWeek::SUNDAY));
        assert_eq!(DayOfWeek::new(7), None);
    }

    #[test]
    fn test_day_of_week_rejects_out_of_range_json() {
        let parsed: Result<DayOfWeek, _> = serde_json::from_str("9");
        assert!(parsed.is_err());

        let ok: DayOfWeek = serde_json::from_str("2").unwrap();
        assert_eq!(ok, DayOfWeek::WEDNESDAY);
    }

    #[test]
    fn test_day_labels() {
        assert_eq!(DayOfWeek::MONDAY.to_string(), "Monday");
        assert_eq!(DayOfWeek::SUNDAY.to_string(), "Sunday");
    }

    #[test]
    fn test_period_key_prefers_slot_id() {
        let id = PeriodId::from("p2");
        let t = NaiveTime::from_hms_opt(11, 0, 0).unwrap();
        assert_eq!(PeriodKey::for_event(Some(&id), t), PeriodKey::Slot(id));
    }

    #[test]
    fn test_period_key_falls_back_to_time() {
        let t = NaiveTime::from_hms_opt(11, 0, 0).unwrap();
        let key = PeriodKey::for_event(None, t);
        assert_eq!(key, PeriodKey::Time(t));
        assert_eq!(key.to_string(), "time:11:00:00");
    }

    #[test]
    fn test_cell_key_display() {
        let key = CellKey::for_slot(DayOfWeek::TUESDAY, &slot("p1", 9));
        assert_eq!(key.to_string(), "1|p1");
    }

    #[test]
    fn test_event_cell_key_uses_fallback_without_period_id() {
        let event = ScheduledEvent {
            id: EventId::random(),
            version_id: VersionId::random(),
            day_of_week: DayOfWeek::MONDAY,
            period_id: None,
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            offering_id: OfferingId::random(),
            room_id: None,
        };
        assert_eq!(
            event.cell_key(),
            CellKey::new(
                DayOfWeek::MONDAY,
                PeriodKey::Time(NaiveTime::from_hms_opt(8, 0, 0).unwrap())
            )
        );
    }

    #[test]
    fn test_new_event_for_cell_copies_slot_fields() {
        let version = VersionId::random();
        let offering = OfferingId::random();
        let s = slot("p4", 13);

        let write = NewScheduledEvent::for_cell(version, DayOfWeek::FRIDAY, &s, offering, None);
        assert_eq!(write.period_id, Some(PeriodId::from("p4")));
        assert_eq!(write.start_time, s.start_time);
        assert_eq!(write.end_time, s.end_time);
        assert_eq!(write.cell_key(), CellKey::for_slot(DayOfWeek::FRIDAY, &s));
    }
}
