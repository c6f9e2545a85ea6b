//! Drag-selection state machine and rectangle normalization.
//!
//! Pointer gestures advance an explicit [`SelectionTracker`] through
//! `Idle -> Selecting -> Idle`; the committed gesture is normalized into a
//! [`CellRect`] whose corners are order-independent, so dragging up-left
//! selects the same cells as dragging down-right between the same corners.

use serde::{Deserialize, Serialize};

use crate::api::PeriodId;
use crate::models::event::DayOfWeek;
use crate::models::period::PeriodSlot;

/// One grid coordinate: `row` indexes periods top to bottom, `col` indexes
/// days 0 = Monday .. 6 = Sunday.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    pub fn new(row: usize, col: usize) -> GridPos {
        GridPos { row, col }
    }
}

/// Normalized rectangle of grid cells, inclusive on all sides.
///
/// Invariant: `top <= bottom` and `left <= right`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRect {
    top: usize,
    bottom: usize,
    left: usize,
    right: usize,
}

impl CellRect {
    /// Build the rectangle spanned by two corners, in either order.
    pub fn from_corners(a: GridPos, b: GridPos) -> CellRect {
        CellRect {
            top: a.row.min(b.row),
            bottom: a.row.max(b.row),
            left: a.col.min(b.col),
            right: a.col.max(b.col),
        }
    }

    /// Rectangle covering a single cell.
    pub fn single(pos: GridPos) -> CellRect {
        CellRect::from_corners(pos, pos)
    }

    pub fn top(&self) -> usize {
        self.top
    }

    pub fn bottom(&self) -> usize {
        self.bottom
    }

    pub fn left(&self) -> usize {
        self.left
    }

    pub fn right(&self) -> usize {
        self.right
    }

    pub fn contains(&self, pos: GridPos) -> bool {
        pos.row >= self.top && pos.row <= self.bottom && pos.col >= self.left && pos.col <= self.right
    }

    /// Number of cells in the rectangle, before clamping to the grid.
    pub fn cell_count(&self) -> usize {
        (self.bottom - self.top + 1) * (self.right - self.left + 1)
    }

    /// Translate the rectangle into concrete `(day, period)` coordinates
    /// against the resolved period rows.
    ///
    /// Rows index into `slots`; rows past the end of the template and
    /// columns past Sunday are dropped rather than reported as errors, since
    /// they cannot correspond to a rendered cell.
    pub fn cells(&self, slots: &[PeriodSlot]) -> Vec<(DayOfWeek, PeriodId)> {
        let mut out = Vec::with_capacity(self.cell_count());
        for row in self.top..=self.bottom {
            let Some(slot) = slots.get(row) else {
                break;
            };
            for col in self.left..=self.right {
                let Some(day) = u8::try_from(col).ok().and_then(DayOfWeek::new) else {
                    break;
                };
                out.push((day, slot.id.clone()));
            }
        }
        out
    }
}

/// Where the gesture currently stands.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum SelectionState {
    /// No gesture in progress; pointer moves are ignored.
    #[default]
    Idle,
    /// Pointer is down; `current` trails the pointer.
    Selecting { start: GridPos, current: GridPos },
}

/// Advances the selection state machine from discrete pointer messages.
///
/// Only `pointer_up` produces a committed rectangle; everything else mutates
/// local state synchronously and never touches storage.
#[derive(Debug, Default)]
pub struct SelectionTracker {
    state: SelectionState,
}

impl SelectionTracker {
    pub fn new() -> SelectionTracker {
        SelectionTracker {
            state: SelectionState::Idle,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self.state, SelectionState::Selecting { .. })
    }

    /// Anchor a new gesture at `pos`. A second pointer-down while already
    /// selecting restarts the gesture at the new anchor.
    pub fn pointer_down(&mut self, pos: GridPos) {
        self.state = SelectionState::Selecting {
            start: pos,
            current: pos,
        };
    }

    /// Extend the gesture to `pos`. Returns whether the selection changed;
    /// moves while idle are ignored, which is what fixes hover-tracking
    /// selecting cells with no button held.
    pub fn pointer_move(&mut self, pos: GridPos) -> bool {
        match &mut self.state {
            SelectionState::Idle => false,
            SelectionState::Selecting { current, .. } => {
                if *current == pos {
                    false
                } else {
                    *current = pos;
                    true
                }
            }
        }
    }

    /// Commit the gesture, returning the normalized rectangle, or `None` if
    /// no gesture was in progress.
    pub fn pointer_up(&mut self) -> Option<CellRect> {
        match self.state {
            SelectionState::Idle => None,
            SelectionState::Selecting { start, current } => {
                self.state = SelectionState::Idle;
                Some(CellRect::from_corners(start, current))
            }
        }
    }

    /// Discard the gesture without committing anything.
    pub fn cancel(&mut self) {
        self.state = SelectionState::Idle;
    }

    /// The rectangle the gesture would commit right now, for live highlight.
    pub fn preview(&self) -> Option<CellRect> {
        match self.state {
            SelectionState::Idle => None,
            SelectionState::Selecting { start, current } => {
                Some(CellRect::from_corners(start, current))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn slots(n: usize) -> Vec<PeriodSlot> {
        (0..n)
            .map(|i| PeriodSlot {
                id: PeriodId::from(format!("p{}", i + 1)),
                order_number: (i + 1) as i32,
                label: format!("Period {}", i + 1),
                start_time: NaiveTime::from_hms_opt(8 + i as u32, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(9 + i as u32, 0, 0).unwrap(),
                is_break: false,
            })
            .collect()
    }

    #[test]
    fn test_rect_normalizes_corners() {
        let down_right = CellRect::from_corners(GridPos::new(1, 2), GridPos::new(3, 4));
        let up_left = CellRect::from_corners(GridPos::new(3, 4), GridPos::new(1, 2));
        assert_eq!(down_right, up_left);
        assert_eq!(down_right.top(), 1);
        assert_eq!(down_right.bottom(), 3);
        assert_eq!(down_right.left(), 2);
        assert_eq!(down_right.right(), 4);
    }

    #[test]
    fn test_single_click_selects_one_cell() {
        let mut tracker = SelectionTracker::new();
        tracker.pointer_down(GridPos::new(2, 5));
        let rect = tracker.pointer_up().unwrap();
        assert_eq!(rect, CellRect::single(GridPos::new(2, 5)));
        assert_eq!(rect.cell_count(), 1);
    }

    #[test]
    fn test_moves_while_idle_are_ignored() {
        let mut tracker = SelectionTracker::new();
        assert!(!tracker.pointer_move(GridPos::new(1, 1)));
        assert_eq!(tracker.state(), SelectionState::Idle);
        assert!(tracker.pointer_up().is_none());
    }

    #[test]
    fn test_drag_tracks_current_cell() {
        let mut tracker = SelectionTracker::new();
        tracker.pointer_down(GridPos::new(0, 0));
        assert!(tracker.pointer_move(GridPos::new(2, 1)));
        assert!(!tracker.pointer_move(GridPos::new(2, 1)));
        assert!(tracker.pointer_move(GridPos::new(4, 3)));

        let rect = tracker.pointer_up().unwrap();
        assert_eq!(rect, CellRect::from_corners(GridPos::new(0, 0), GridPos::new(4, 3)));
        assert!(!tracker.is_selecting());
    }

    #[test]
    fn test_cancel_discards_gesture() {
        let mut tracker = SelectionTracker::new();
        tracker.pointer_down(GridPos::new(1, 1));
        tracker.pointer_move(GridPos::new(3, 3));
        tracker.cancel();
        assert!(tracker.pointer_up().is_none());
    }

    #[test]
    fn test_second_pointer_down_restarts() {
        let mut tracker = SelectionTracker::new();
        tracker.pointer_down(GridPos::new(0, 0));
        tracker.pointer_move(GridPos::new(5, 5));
        tracker.pointer_down(GridPos::new(2, 2));
        let rect = tracker.pointer_up().unwrap();
        assert_eq!(rect, CellRect::single(GridPos::new(2, 2)));
    }

    #[test]
    fn test_preview_matches_commit() {
        let mut tracker = SelectionTracker::new();
        assert!(tracker.preview().is_none());
        tracker.pointer_down(GridPos::new(3, 1));
        tracker.pointer_move(GridPos::new(1, 4));
        let preview = tracker.preview().unwrap();
        assert_eq!(tracker.pointer_up(), Some(preview));
    }

    #[test]
    fn test_cells_expand_row_major() {
        let slots = slots(9);
        let rect = CellRect::from_corners(GridPos::new(2, 1), GridPos::new(4, 3));
        let cells = rect.cells(&slots);
        assert_eq!(cells.len(), 9);
        assert_eq!(cells[0], (DayOfWeek::TUESDAY, PeriodId::from("p3")));
        assert_eq!(cells[8], (DayOfWeek::THURSDAY, PeriodId::from("p5")));
    }

    #[test]
    fn test_cells_drop_rows_past_template() {
        let slots = slots(3);
        let rect = CellRect::from_corners(GridPos::new(1, 0), GridPos::new(10, 0));
        let cells = rect.cells(&slots);
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].1, PeriodId::from("p2"));
        assert_eq!(cells[1].1, PeriodId::from("p3"));
    }

    #[test]
    fn test_cells_clamp_columns_to_week() {
        let slots = slots(2);
        let rect = CellRect::from_corners(GridPos::new(0, 5), GridPos::new(0, 9));
        let cells = rect.cells(&slots);
        let days: Vec<u8> = cells.iter().map(|(d, _)| d.index()).collect();
        assert_eq!(days, vec![5, 6]);
    }

    #[test]
    fn test_contains() {
        let rect = CellRect::from_corners(GridPos::new(1, 1), GridPos::new(3, 3));
        assert!(rect.contains(GridPos::new(2, 2)));
        assert!(rect.contains(GridPos::new(1, 3)));
        assert!(!rect.contains(GridPos::new(0, 2)));
        assert!(!rect.contains(GridPos::new(2, 4)));
    }

    // ==================== Property-based tests ====================

    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_from_corners_is_order_independent(
            r1 in 0usize..16, c1 in 0usize..10,
            r2 in 0usize..16, c2 in 0usize..10,
        ) {
            let a = GridPos::new(r1, c1);
            let b = GridPos::new(r2, c2);
            let rect = CellRect::from_corners(a, b);
            prop_assert_eq!(rect, CellRect::from_corners(b, a));
            // Swapping coordinates across the corners spans the same cells.
            prop_assert_eq!(
                rect,
                CellRect::from_corners(GridPos::new(r1, c2), GridPos::new(r2, c1))
            );
            prop_assert!(rect.contains(a));
            prop_assert!(rect.contains(b));
        }

        #[test]
        fn prop_cells_are_unique_and_clamped(
            r1 in 0usize..16, c1 in 0usize..10,
            r2 in 0usize..16, c2 in 0usize..10,
            rows in 0usize..12,
        ) {
            let rect = CellRect::from_corners(GridPos::new(r1, c1), GridPos::new(r2, c2));
            let cells = rect.cells(&slots(rows));
            prop_assert!(cells.len() <= rect.cell_count());

            let mut seen = std::collections::HashSet::new();
            for (day, period) in &cells {
                prop_assert!(seen.insert((day.index(), period.clone())));
                prop_assert!((day.index() as usize) >= rect.left());
                prop_assert!((day.index() as usize) <= rect.right());
            }
        }

        #[test]
        fn prop_cell_count_matches_when_in_bounds(
            r1 in 0usize..6, c1 in 0usize..7,
            r2 in 0usize..6, c2 in 0usize..7,
        ) {
            let rect = CellRect::from_corners(GridPos::new(r1, c1), GridPos::new(r2, c2));
            prop_assert_eq!(rect.cells(&slots(6)).len(), rect.cell_count());
        }
    }
}
