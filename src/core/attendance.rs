//! Event attendance via QR
//!
//! The app shows the user id as a QR code; the organizer's kiosk scans it,
//! pairs it with the event id typed in, and confirms attendance.

use crate::api::errors::{ApiError, ApiResult};
use crate::api::session::SessionContext;

/// Text encoded in the attendee's QR code
pub fn qr_payload(session: &SessionContext) -> String {
    session.user_id().to_string()
}

/// A scanned attendee paired with the event being checked in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceScan {
    pub user_id: u64,
    pub event_id: i64,
}

impl AttendanceScan {
    /// Both values must be integers; the user id must also be positive
    pub fn parse(qr_payload: &str, event_id: &str) -> ApiResult<Self> {
        let user_id = qr_payload
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| ApiError::InvalidIdFormat(qr_payload.to_string()))?;
        let event_id = event_id
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::InvalidIdFormat(event_id.to_string()))?;
        Ok(Self { user_id, event_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qr_payload_is_user_id() {
        let session = SessionContext::new("abc-123", 42).unwrap();
        assert_eq!(qr_payload(&session), "42");
    }

    #[test]
    fn test_parse_scan() {
        let scan = AttendanceScan::parse(" 42\n", "7").unwrap();
        assert_eq!(scan, AttendanceScan { user_id: 42, event_id: 7 });
    }

    #[test]
    fn test_parse_scan_round_trips_payload() {
        let session = SessionContext::new("abc-123", 42).unwrap();
        let scan = AttendanceScan::parse(&qr_payload(&session), "3").unwrap();
        assert_eq!(scan.user_id, session.user_id());
    }

    #[test]
    fn test_parse_scan_invalid_values() {
        match AttendanceScan::parse("https://example.org", "7") {
            Err(ApiError::InvalidIdFormat(value)) => assert_eq!(value, "https://example.org"),
            other => panic!("Expected InvalidIdFormat, got {:?}", other),
        }
        assert!(matches!(
            AttendanceScan::parse("0", "7"),
            Err(ApiError::InvalidIdFormat(_))
        ));
        assert!(matches!(
            AttendanceScan::parse("42", "evento"),
            Err(ApiError::InvalidIdFormat(_))
        ));
    }
}
