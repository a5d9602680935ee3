//! Attendance payloads
//!
//! Clock-in is recorded after the backend has matched the captured face; the
//! match score travels with the request as `fcss`.

use serde::{Deserialize, Serialize};

/// Body of `POST attendance/inlog`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockInRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Face-match score reported by the matching service
    pub fcss: f64,
    /// `1` when the face matched, `0` otherwise
    pub is_face_matched: u8,
}

impl ClockInRequest {
    #[must_use]
    pub fn matched(latitude: f64, longitude: f64, score: f64) -> Self {
        Self { latitude, longitude, fcss: score, is_face_matched: 1 }
    }
}

/// Body of `POST attendance/outlog`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClockOutRequest {
    pub latitude: f64,
    pub longitude: f64,
}

/// Acknowledgement returned by the clock-in/clock-out endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceAck {
    pub status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InTimeStatus {
    pub has_in_time: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutTimeStatus {
    pub has_out_time: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_in_uses_backend_field_names() {
        let json = serde_json::to_value(ClockInRequest::matched(12.5, 77.25, 0.93)).unwrap();

        assert_eq!(json["isFaceMatched"], 1);
        assert_eq!(json["fcss"], 0.93);
        assert_eq!(json["latitude"], 12.5);
    }

    #[test]
    fn ack_message_is_optional() {
        let ack: AttendanceAck = serde_json::from_str(r#"{"status": true}"#).unwrap();
        assert!(ack.status);
        assert!(ack.message.is_none());
    }

    #[test]
    fn status_flags_parse_camel_case() {
        let status: InTimeStatus = serde_json::from_str(r#"{"hasInTime": true}"#).unwrap();
        assert!(status.has_in_time);

        let status: OutTimeStatus = serde_json::from_str(r#"{"hasOutTime": false}"#).unwrap();
        assert!(!status.has_out_time);
    }
}
