//! Input messages and output records.
//!
//! Input records are decoded with every field optional so that a missing
//! field can be reported with the index of the offending record instead of
//! a bare serde error.

use crate::mood::Mood;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in the content of an input log. Any of these aborts the run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("message {index} is missing required field `{field}`")]
    MissingField { index: usize, field: &'static str },

    #[error("message {index} has an unparseable timestamp: {value:?}")]
    InvalidTimestamp { index: usize, value: String },
}

/// A message as it appears in the input file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMessage {
    pub player_id: Option<String>,
    pub text: Option<String>,
    pub timestamp: Option<String>,
}

impl RawMessage {
    /// Check that all required fields are present.
    pub fn validate(self, index: usize) -> Result<ChatMessage, MessageError> {
        let missing = |field| MessageError::MissingField { index, field };
        Ok(ChatMessage {
            player_id: self.player_id.ok_or_else(|| missing("player_id"))?,
            text: self.text.ok_or_else(|| missing("text"))?,
            timestamp: self.timestamp.ok_or_else(|| missing("timestamp"))?,
        })
    }
}

/// A player chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub player_id: String,
    pub text: String,
    /// ISO-8601 timestamp, kept verbatim for the output.
    pub timestamp: String,
}

impl ChatMessage {
    pub fn new(
        player_id: impl Into<String>,
        text: impl Into<String>,
        timestamp: impl Into<String>,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            text: text.into(),
            timestamp: timestamp.into(),
        }
    }
}

/// One annotated message in the output log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub player_id: String,
    pub message: String,
    pub npc_reply: String,
    /// The player's history after this message was appended, oldest first.
    pub last_3_messages: Vec<String>,
    pub npc_mood: Mood,
    pub timestamp: String,
}

/// Parse an ISO-8601 timestamp into a UTC instant.
///
/// Accepts RFC 3339, offsets written without a colon (`+0530`), naive
/// date-times with either `T` or a space as separator down to hour
/// precision (fractional seconds optional), the basic `20240101T100000`
/// form, and bare dates. Naive values are taken to be UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    const NAIVE_FORMATS: [&str; 5] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y%m%dT%H%M%S%.f",
    ];
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    // chrono needs minutes, so `2024-01-01T10` is widened to `2024-01-01T10:00`
    if raw.len() == 13 && matches!(raw.as_bytes()[10], b'T' | b' ') {
        let widened = format!("{raw}:00");
        for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&widened, format) {
                return Some(naive.and_utc());
            }
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_naive_timestamp() {
        let ts = parse_timestamp("2024-01-01T10:00:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_space_separated_and_fractional() {
        let a = parse_timestamp("2024-01-01 10:00:00.250").unwrap();
        let b = parse_timestamp("2024-01-01T10:00:00").unwrap();
        assert!(a > b);
    }

    #[test]
    fn test_parse_offset_timestamp_normalizes_to_utc() {
        let ts = parse_timestamp("2024-01-01T12:00:00+02:00").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());

        let z = parse_timestamp("2024-01-01T10:00:00Z").unwrap();
        assert_eq!(ts, z);
    }

    #[test]
    fn test_parse_offset_without_colon() {
        let ts = parse_timestamp("2024-01-01T10:00:00+0530").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 4, 30, 0).unwrap());

        let spaced = parse_timestamp("2024-01-01 10:00:00.5-0100").unwrap();
        assert_eq!(
            spaced,
            Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap() + chrono::Duration::milliseconds(500)
        );
    }

    #[test]
    fn test_parse_hour_only() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-01T10"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01 10"), Some(expected));
        assert!(parse_timestamp("2024-01-01T25").is_none());
    }

    #[test]
    fn test_parse_basic_format() {
        let ts = parse_timestamp("20240101T100000").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_bare_date_is_midnight() {
        let ts = parse_timestamp("2024-03-05").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("2024-13-01T10:00:00").is_none());
    }

    #[test]
    fn test_validate_reports_missing_field() {
        let raw = RawMessage {
            player_id: Some("p1".into()),
            text: None,
            timestamp: Some("2024-01-01T10:00:00".into()),
        };
        assert_eq!(
            raw.validate(4),
            Err(MessageError::MissingField {
                index: 4,
                field: "text"
            })
        );
    }

    #[test]
    fn test_validate_complete_message() {
        let raw: RawMessage = serde_json::from_str(
            r#"{"player_id":"p1","text":"hi","timestamp":"2024-01-01T10:00:00","extra":1}"#,
        )
        .unwrap();
        let msg = raw.validate(0).unwrap();
        assert_eq!(msg, ChatMessage::new("p1", "hi", "2024-01-01T10:00:00"));
    }

    #[test]
    fn test_output_record_field_names() {
        let record = OutputRecord {
            player_id: "p1".into(),
            message: "hi".into(),
            npc_reply: "hello".into(),
            last_3_messages: vec!["hi".into()],
            npc_mood: Mood::Neutral,
            timestamp: "2024-01-01T10:00:00".into(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["npc_mood"], "neutral");
        assert_eq!(json["last_3_messages"][0], "hi");
        assert_eq!(json["npc_reply"], "hello");
    }
}
