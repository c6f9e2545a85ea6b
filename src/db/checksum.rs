//! Checksum calculation for period template fingerprinting.
//!
//! The template cache keys its "did anything change" decision on a SHA-256
//! fingerprint of the raw slot records, so re-activating a byte-identical
//! template does not force a re-resolve.

use sha2::{Digest, Sha256};

use crate::models::period::RawPeriodSlot;

/// SHA-256 of arbitrary string content, as lowercase hex.
pub fn calculate_checksum(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    hex::encode(result)
}

/// Fingerprint a raw slot list by hashing its canonical JSON encoding.
///
/// Serialization of these records is infallible, so failures collapse to a
/// sentinel that never matches a real fingerprint.
pub fn slots_checksum(slots: &[RawPeriodSlot]) -> String {
    match serde_json::to_string(slots) {
        Ok(json) => calculate_checksum(&json),
        Err(_) => String::from("unserializable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(label: &str) -> RawPeriodSlot {
        RawPeriodSlot {
            id: Some("p1".into()),
            order_number: Some(1),
            label: Some(label.into()),
            start_time: Some("09:00".into()),
            end_time: Some("10:00".into()),
            is_break: None,
        }
    }

    #[test]
    fn test_checksum_consistency() {
        let content = r#"{"slots": []}"#;
        assert_eq!(calculate_checksum(content), calculate_checksum(content));
    }

    #[test]
    fn test_different_content_different_checksum() {
        assert_ne!(
            calculate_checksum(r#"{"label": "Period 1"}"#),
            calculate_checksum(r#"{"label": "Period 2"}"#)
        );
    }

    #[test]
    fn test_slot_fingerprint_tracks_content() {
        let a = vec![raw("Period 1")];
        let b = vec![raw("Period 1")];
        let c = vec![raw("Lunch")];
        assert_eq!(slots_checksum(&a), slots_checksum(&b));
        assert_ne!(slots_checksum(&a), slots_checksum(&c));
    }

    #[test]
    fn test_empty_slot_list_has_stable_fingerprint() {
        assert_eq!(slots_checksum(&[]), slots_checksum(&[]));
    }
}
