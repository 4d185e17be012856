use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// A single detected dress-code infraction, as reported by the detection backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationEvent {
    /// Upstream-assigned unique identifier, the deduplication key
    pub violation_id: String,
    #[serde(default)]
    pub camera_number: String,
    /// Local date, YYYY-MM-DD
    pub date: String,
    /// Local time, HH:MM:SS
    pub time: String,
    /// Violation category code (e.g. "cap", "shorts", "no_sleeves")
    pub violation: String,
    /// Link to the captured image, when available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Review status, "Pending" until a reviewer acts on it
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "Pending".to_string()
}

impl ViolationEvent {
    /// Parse the `date` + `time` fields into a local timestamp.
    /// Returns None on any parse failure so malformed stamps are excluded
    /// from time-based calculations instead of crashing them.
    pub fn timestamp(&self) -> Option<DateTime<Local>> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(&self.time, "%H:%M:%S").ok()?;
        NaiveDateTime::new(date, time)
            .and_local_timezone(Local)
            .single()
    }

    /// Every stored event must carry a non-empty id, date, time and category
    pub fn is_complete(&self) -> bool {
        !self.violation_id.is_empty()
            && !self.date.is_empty()
            && !self.time.is_empty()
            && !self.violation.is_empty()
    }
}

/// Envelope returned by the detection status endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DetectionMessage {
    /// "violation", "feed_init", or something we ignore
    #[serde(rename = "type")]
    pub message_type: String,
    #[serde(default)]
    pub data: Option<ViolationEvent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_pending_on_deserialize() {
        let event: ViolationEvent = serde_json::from_str(
            r#"{
                "violation_id": "V1",
                "camera_number": "2",
                "date": "2024-01-01",
                "time": "10:00:00",
                "violation": "cap"
            }"#,
        )
        .unwrap();
        assert_eq!(event.status, "Pending");
        assert!(event.is_complete());
        assert!(event.timestamp().is_some());
    }

    #[test]
    fn malformed_stamp_yields_none() {
        let mut event: ViolationEvent = serde_json::from_str(
            r#"{"violation_id":"V1","date":"2024-01-01","time":"10:00:00","violation":"cap"}"#,
        )
        .unwrap();
        event.date = "not-a-date".to_string();
        assert!(event.timestamp().is_none());

        event.date = "2024-01-01".to_string();
        event.time = "25:99:00".to_string();
        assert!(event.timestamp().is_none());
    }

    #[test]
    fn envelope_parses_with_and_without_data() {
        let msg: DetectionMessage =
            serde_json::from_str(r#"{"type":"feed_init"}"#).unwrap();
        assert_eq!(msg.message_type, "feed_init");
        assert!(msg.data.is_none());

        let msg: DetectionMessage = serde_json::from_str(
            r#"{"type":"violation","data":{"violation_id":"V7","date":"2024-01-01","time":"10:00:00","violation":"shorts","confidence":0.91}}"#,
        )
        .unwrap();
        assert_eq!(msg.message_type, "violation");
        assert_eq!(msg.data.unwrap().violation_id, "V7");
    }
}
