//! Period template resolution.
//!
//! Templates arrive as JSON-like slot records written by external tooling
//! over several schema generations, so any field may be absent. The resolver
//! turns that into a fully populated, ascending-ordered sequence of
//! [`PeriodSlot`]s the grid can render. Resolution is pure and idempotent:
//! resolving an already-resolved sequence returns it unchanged.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{PeriodId, TemplateId};

/// One slot record as stored, with every field optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPeriodSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, alias = "period_number", skip_serializing_if = "Option::is_none")]
    pub order_number: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_break: Option<bool>,
}

/// A fully resolved row of the weekly grid.
///
/// Derived from the template on every load; never persisted independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodSlot {
    pub id: PeriodId,
    pub order_number: i32,
    pub label: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub is_break: bool,
}

impl PeriodSlot {
    /// True for rows that can receive a scheduled event under a policy that
    /// excludes breaks.
    pub fn is_schedulable(&self) -> bool {
        !self.is_break
    }
}

/// A stored period template: the raw slot records plus bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTemplate {
    pub id: TemplateId,
    pub name: String,
    pub slots: Vec<RawPeriodSlot>,
    pub updated_at: DateTime<Utc>,
}

impl PeriodTemplate {
    /// Resolve this template's slots into grid rows.
    pub fn resolve(&self) -> Vec<PeriodSlot> {
        resolve_template(&self.slots)
    }
}

/// Insert payload for storing a template; the repository mints id and
/// timestamp and makes the stored template the active one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPeriodTemplate {
    pub name: String,
    pub slots: Vec<RawPeriodSlot>,
}

fn placeholder_start() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default()
}

fn placeholder_end() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap_or_default()
}

/// Parse a stored time string, accepting both `HH:MM:SS` and `HH:MM`.
///
/// Returns `None` for anything unparseable so the caller can substitute the
/// placeholder instead of failing the whole template.
pub fn parse_slot_time(value: &str) -> Option<NaiveTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
}

/// Normalize a raw slot list into an ordered sequence of [`PeriodSlot`]s.
///
/// Rules:
/// - missing `order_number` defaults to array position + 1
/// - missing `label` defaults to `"Period {order_number}"`
/// - missing or unparseable times default to the 09:00-10:00 placeholder
/// - missing `is_break` defaults to false
/// - missing `id` defaults to `"p{position+1}"`, derived from position so
///   repeated resolution of the same stored list yields the same ids
///
/// The result is sorted by `order_number` ascending (stable, so equal order
/// numbers keep their stored relative order). An empty input yields an empty
/// sequence, which callers must treat as "no schedulable grid" rather than
/// an error.
pub fn resolve_template(slots: &[RawPeriodSlot]) -> Vec<PeriodSlot> {
    let mut resolved: Vec<PeriodSlot> = slots
        .iter()
        .enumerate()
        .map(|(position, raw)| {
            let order_number = raw.order_number.unwrap_or(position as i32 + 1);
            let id = match raw.id.as_deref().map(str::trim) {
                Some(id) if !id.is_empty() => PeriodId::new(id),
                _ => PeriodId::new(format!("p{}", position + 1)),
            };
            let label = match raw.label.as_deref().map(str::trim) {
                Some(label) if !label.is_empty() => label.to_string(),
                _ => format!("Period {}", order_number),
            };
            let start_time = raw
                .start_time
                .as_deref()
                .and_then(parse_slot_time)
                .unwrap_or_else(placeholder_start);
            let end_time = raw
                .end_time
                .as_deref()
                .and_then(parse_slot_time)
                .unwrap_or_else(placeholder_end);
            PeriodSlot {
                id,
                order_number,
                label,
                start_time,
                end_time,
                is_break: raw.is_break.unwrap_or(false),
            }
        })
        .collect();

    resolved.sort_by_key(|slot| slot.order_number);
    resolved
}

/// Re-encode resolved slots as raw records, for feeding back into
/// [`resolve_template`] or storing a cleaned-up template.
pub fn to_raw_slots(slots: &[PeriodSlot]) -> Vec<RawPeriodSlot> {
    slots
        .iter()
        .map(|slot| RawPeriodSlot {
            id: Some(slot.id.as_str().to_string()),
            order_number: Some(slot.order_number),
            label: Some(slot.label.clone()),
            start_time: Some(slot.start_time.format("%H:%M:%S").to_string()),
            end_time: Some(slot.end_time.format("%H:%M:%S").to_string()),
            is_break: Some(slot.is_break),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(order: Option<i32>, start: Option<&str>) -> RawPeriodSlot {
        RawPeriodSlot {
            order_number: order,
            start_time: start.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_for_empty_record() {
        let resolved = resolve_template(&[RawPeriodSlot::default()]);
        assert_eq!(resolved.len(), 1);

        let slot = &resolved[0];
        assert_eq!(slot.id.as_str(), "p1");
        assert_eq!(slot.order_number, 1);
        assert_eq!(slot.label, "Period 1");
        assert_eq!(slot.start_time, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(slot.end_time, NaiveTime::from_hms_opt(10, 0, 0).unwrap());
        assert!(!slot.is_break);
    }

    #[test]
    fn test_label_uses_resolved_order_number() {
        let resolved = resolve_template(&[raw(Some(7), None)]);
        assert_eq!(resolved[0].label, "Period 7");
    }

    #[test]
    fn test_sorts_by_order_number() {
        let resolved = resolve_template(&[raw(Some(3), None), raw(Some(1), None), raw(Some(2), None)]);
        let orders: Vec<i32> = resolved.iter().map(|s| s.order_number).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[test]
    fn test_stable_order_for_duplicate_order_numbers() {
        let first = RawPeriodSlot {
            id: Some("a".into()),
            order_number: Some(1),
            ..Default::default()
        };
        let second = RawPeriodSlot {
            id: Some("b".into()),
            order_number: Some(1),
            ..Default::default()
        };

        let resolved = resolve_template(&[first, second]);
        assert_eq!(resolved[0].id.as_str(), "a");
        assert_eq!(resolved[1].id.as_str(), "b");
    }

    #[test]
    fn test_accepts_short_time_format() {
        let resolved = resolve_template(&[raw(None, Some("08:15"))]);
        assert_eq!(
            resolved[0].start_time,
            NaiveTime::from_hms_opt(8, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_unparseable_time_falls_back_to_placeholder() {
        let resolved = resolve_template(&[raw(None, Some("quarter past nine"))]);
        assert_eq!(
            resolved[0].start_time,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_empty_template_yields_empty_sequence() {
        assert!(resolve_template(&[]).is_empty());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let input = vec![
            raw(None, Some("09:30")),
            raw(Some(1), Some("08:00:00")),
            RawPeriodSlot {
                is_break: Some(true),
                label: Some("Lunch".into()),
                ..Default::default()
            },
        ];

        let once = resolve_template(&input);
        let twice = resolve_template(&to_raw_slots(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_unknown_json_fields_are_ignored() {
        let json = r##"[{"id": "x", "period_number": 2, "color": "#ff0000"}]"##;
        let slots: Vec<RawPeriodSlot> = serde_json::from_str(json).unwrap();
        let resolved = resolve_template(&slots);
        assert_eq!(resolved[0].order_number, 2);
    }

    #[test]
    fn test_period_number_alias() {
        let json = r#"[{"period_number": 4}]"#;
        let slots: Vec<RawPeriodSlot> = serde_json::from_str(json).unwrap();
        assert_eq!(slots[0].order_number, Some(4));
    }

    // ==================== Property-based tests ====================

    use proptest::prelude::*;

    fn arb_raw_slot() -> impl Strategy<Value = RawPeriodSlot> {
        let time = prop_oneof![
            (0u32..24, 0u32..60).prop_map(|(h, m)| format!("{h:02}:{m:02}")),
            (0u32..24, 0u32..60).prop_map(|(h, m)| format!("{h:02}:{m:02}:30")),
            Just("not a time".to_string()),
        ];
        (
            proptest::option::of("[a-z][a-z0-9]{0,5}"),
            proptest::option::of(0i32..50),
            proptest::option::of("[A-Za-z ]{0,10}"),
            proptest::option::of(time.clone()),
            proptest::option::of(time),
            proptest::option::of(any::<bool>()),
        )
            .prop_map(
                |(id, order_number, label, start_time, end_time, is_break)| RawPeriodSlot {
                    id,
                    order_number,
                    label,
                    start_time,
                    end_time,
                    is_break,
                },
            )
    }

    proptest! {
        #[test]
        fn prop_resolution_is_idempotent(
            slots in proptest::collection::vec(arb_raw_slot(), 0..10)
        ) {
            let once = resolve_template(&slots);
            let twice = resolve_template(&to_raw_slots(&once));
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_resolution_sorts_and_preserves_length(
            slots in proptest::collection::vec(arb_raw_slot(), 0..10)
        ) {
            let resolved = resolve_template(&slots);
            prop_assert_eq!(resolved.len(), slots.len());
            prop_assert!(resolved
                .windows(2)
                .all(|pair| pair[0].order_number <= pair[1].order_number));
        }

        #[test]
        fn prop_parse_accepts_both_stored_formats(
            h in 0u32..24, m in 0u32..60, s in 0u32..60
        ) {
            let long = parse_slot_time(&format!("{h:02}:{m:02}:{s:02}"));
            prop_assert_eq!(long, NaiveTime::from_hms_opt(h, m, s));

            let short = parse_slot_time(&format!("{h:02}:{m:02}"));
            prop_assert_eq!(short, NaiveTime::from_hms_opt(h, m, 0));
        }
    }
}
