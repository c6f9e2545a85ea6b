//! Read-only view of the course-offering catalog.
//!
//! Offerings are owned by the surrounding administration system; this crate
//! only looks them up for room defaulting and caller-side display. Nothing
//! here mutates the catalog.

use serde::{Deserialize, Serialize};

use crate::api::{BatchId, OfferingId, RoomId};

/// A teachable unit: subject taught by a faculty member to one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOffering {
    pub id: OfferingId,
    pub batch_id: BatchId,
    pub subject_name: String,
    pub subject_code: Option<String>,
    pub faculty_name: Option<String>,
    /// Copied onto placed events when the caller does not pick a room.
    pub default_room_id: Option<RoomId>,
}

impl CourseOffering {
    /// Short display form, `"CODE subject"` when a code exists.
    pub fn display_name(&self) -> String {
        match &self.subject_code {
            Some(code) => format!("{} {}", code, self.subject_name),
            None => self.subject_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_with_code() {
        let offering = CourseOffering {
            id: OfferingId::random(),
            batch_id: BatchId::random(),
            subject_name: "Data Structures".into(),
            subject_code: Some("CS201".into()),
            faculty_name: None,
            default_room_id: None,
        };
        assert_eq!(offering.display_name(), "CS201 Data Structures");
    }

    #[test]
    fn test_display_name_without_code() {
        let offering = CourseOffering {
            id: OfferingId::random(),
            batch_id: BatchId::random(),
            subject_name: "Workshop".into(),
            subject_code: None,
            faculty_name: Some("A. Rao".into()),
            default_room_id: None,
        };
        assert_eq!(offering.display_name(), "Workshop");
    }
}
