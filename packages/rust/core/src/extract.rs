//! Message extraction from exported transcript JSON.
//!
//! Exports arrive in three observed shapes:
//! - `{ "responses": [ ... ] }`
//! - a bare array `[ ... ]`
//! - `{ "messages": [ ... ] }`
//!
//! Each record carries `sender`|`role`, `message`|`content`,
//! `createTime`|`created`, and optionally `responseId`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::{debug, instrument};

use convarchive_shared::{Message, Role};

/// Epoch values below this are seconds, at or above it milliseconds.
const SECONDS_CUTOFF: f64 = 1e11;

const ROLE_FIELDS: &[&str] = &["sender", "role"];
const CONTENT_FIELDS: &[&str] = &["message", "content"];
const TIME_FIELDS: &[&str] = &["createTime", "created"];
const IDENTITY_FIELD: &str = "responseId";

/// Which recognized layout a transcript document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranscriptShape {
    Responses,
    BareArray,
    Messages,
    Unrecognized,
}

impl TranscriptShape {
    /// Detect the document's shape and return its message records.
    ///
    /// Shapes are tried in order: `responses` field, bare array, `messages`
    /// field. Anything else yields no records.
    pub fn detect(doc: &Value) -> (Self, &[Value]) {
        if let Some(Value::Array(items)) = doc.get("responses") {
            return (Self::Responses, items.as_slice());
        }
        if let Value::Array(items) = doc {
            return (Self::BareArray, items.as_slice());
        }
        if let Some(Value::Array(items)) = doc.get("messages") {
            return (Self::Messages, items.as_slice());
        }
        let none: &[Value] = &[];
        (Self::Unrecognized, none)
    }
}

/// Flatten every document's records into one collection, in document order.
#[instrument(skip_all, fields(documents = docs.len()))]
pub fn extract_messages(docs: &[Value]) -> Vec<Message> {
    let mut messages = Vec::new();

    for (position, doc) in docs.iter().enumerate() {
        let (shape, records) = TranscriptShape::detect(doc);
        debug!(position, ?shape, records = records.len(), "extracting records");
        messages.extend(records.iter().map(message_from_record));
    }

    messages
}

/// Normalize one raw record. Missing fields fall back to defaults; a record
/// is never rejected here.
pub fn message_from_record(record: &Value) -> Message {
    let role = field(record, ROLE_FIELDS)
        .and_then(Value::as_str)
        .map(Role::from_label)
        .unwrap_or(Role::Unknown);

    let content = match field(record, CONTENT_FIELDS) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    let identity = match field(record, &[IDENTITY_FIELD]) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Message {
        identity,
        timestamp: parse_timestamp(field(record, TIME_FIELDS)),
        role,
        content,
    }
}

/// First of `names` holding something other than `null` or `""`.
fn field<'a>(record: &'a Value, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|name| match record.get(*name) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(value) => Some(value),
    })
}

/// Parse a source timestamp; the Unix epoch when absent or unparsable.
pub fn parse_timestamp(value: Option<&Value>) -> DateTime<Utc> {
    let parsed = match value {
        Some(Value::String(s)) => parse_timestamp_str(s.trim()),
        Some(Value::Number(n)) => n.as_f64().and_then(from_epoch_number),
        _ => None,
    };
    parsed.unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }

    s.parse::<f64>().ok().and_then(from_epoch_number)
}

fn from_epoch_number(value: f64) -> Option<DateTime<Utc>> {
    if !value.is_finite() {
        return None;
    }
    let millis = if value.abs() < SECONDS_CUTOFF {
        value * 1000.0
    } else {
        value
    };
    DateTime::from_timestamp_millis(millis.round() as i64)
}
