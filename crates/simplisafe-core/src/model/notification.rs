// System notifications (the "messages" block in subscription data).

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::warn;

/// A notification raised by the cloud for a system.
///
/// Immutable; the whole list is replaced on every system refresh
/// rather than merged.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub text: String,
    pub category: String,
    pub code: String,
    /// Raw epoch timestamp as reported by the cloud.
    pub timestamp: f64,
    /// `timestamp` converted to UTC.
    pub received_at: DateTime<Utc>,
    pub link: Option<String>,
    pub link_label: Option<String>,
}

impl Notification {
    /// Build from a raw message record. Returns `None` (with a logged
    /// warning) when required fields are missing or malformed.
    pub(crate) fn from_raw(raw: &Value) -> Option<Self> {
        let field = |name: &str| raw.get(name).and_then(Value::as_str).map(str::to_owned);

        let id = field("id");
        let text = field("text");
        let category = field("category");
        let code = field("code");
        let timestamp = raw.get("timestamp").and_then(Value::as_f64);

        let (Some(id), Some(text), Some(category), Some(code), Some(timestamp)) =
            (id, text, category, code, timestamp)
        else {
            warn!(?raw, "skipping malformed notification");
            return None;
        };

        Some(Self {
            id,
            text,
            category,
            code,
            timestamp,
            received_at: utc_from_timestamp(timestamp),
            link: field("link"),
            link_label: field("linkLabel"),
        })
    }
}

/// Convert a fractional epoch timestamp to a UTC datetime.
///
/// Out-of-range values clamp to the epoch rather than panicking.
fn utc_from_timestamp(timestamp: f64) -> DateTime<Utc> {
    let secs = timestamp.trunc() as i64;
    let nanos = (timestamp.fract().abs() * 1_000_000_000.0) as u32;
    DateTime::from_timestamp(secs, nanos).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_from_complete_record() {
        let raw = json!({
            "id": "msg001",
            "text": "Power outage detected",
            "category": "error",
            "code": "2000",
            "timestamp": 1_585_000_000.0,
            "link": "http://help.simplisafe.com/power",
            "linkLabel": "More info",
        });

        let notification = Notification::from_raw(&raw).expect("valid record");
        assert_eq!(notification.id, "msg001");
        assert_eq!(notification.code, "2000");
        assert_eq!(notification.received_at.timestamp(), 1_585_000_000);
        assert_eq!(notification.link_label.as_deref(), Some("More info"));
    }

    #[test]
    fn missing_fields_yield_none() {
        let raw = json!({"id": "msg001", "text": "incomplete"});
        assert!(Notification::from_raw(&raw).is_none());
    }

    #[test]
    fn optional_link_fields_default_to_none() {
        let raw = json!({
            "id": "msg002",
            "text": "Camera offline",
            "category": "warning",
            "code": "3001",
            "timestamp": 1_585_000_123.5,
        });

        let notification = Notification::from_raw(&raw).expect("valid record");
        assert!(notification.link.is_none());
        assert!(notification.link_label.is_none());
    }
}
