//! Converts persisted record shapes into canonical [`StudyRecord`]s.
//!
//! Stored documents wrap identifiers and timestamps (`{"$oid": ..}`,
//! `{"$date": ..}`) while hand-edited files use plain values. Both are
//! accepted. Records without an id or a positive day are dropped; nothing
//! else is validated here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use tracing::debug;

use crate::models::{RawDate, RawDateValue, RawId, RawNumber, RawRecord, StudyRecord};

pub fn normalize(raw_records: &[RawRecord]) -> Vec<StudyRecord> {
    let records: Vec<StudyRecord> = raw_records.iter().filter_map(normalize_one).collect();
    let dropped = raw_records.len() - records.len();
    if dropped > 0 {
        debug!(dropped, kept = records.len(), "skipped incomplete records");
    }
    records
}

pub fn normalize_one(raw: &RawRecord) -> Option<StudyRecord> {
    let id = raw.id.as_ref().and_then(unwrap_id)?;
    let day = raw
        .day
        .as_ref()
        .and_then(number_value)
        .filter(|day| *day > 0)?;

    Some(StudyRecord {
        id,
        day,
        duration_minutes: raw.duration.as_ref().and_then(number_value).unwrap_or(0),
        date: raw.date.as_ref().and_then(unwrap_date),
        topics: raw.topic.clone().unwrap_or_default(),
        description: raw.description.clone(),
        link: raw.link.clone(),
    })
}

fn unwrap_id(id: &RawId) -> Option<String> {
    let text = match id {
        RawId::Wrapped { oid } => oid.clone(),
        RawId::Text(text) => text.clone(),
        RawId::Number(number) => number.to_string(),
        RawId::Other(value) => match value {
            serde_json::Value::Null => return None,
            serde_json::Value::Object(map) if map.is_empty() => return None,
            other => other.to_string(),
        },
    };
    (!text.is_empty()).then_some(text)
}

fn number_value(number: &RawNumber) -> Option<u32> {
    match number {
        RawNumber::Int(value) => u32::try_from(*value).ok(),
        RawNumber::Float(value) if value.is_finite() && *value >= 0.0 => {
            u32::try_from(value.trunc() as i64).ok()
        }
        RawNumber::Float(_) => None,
        RawNumber::Text(text) => text.trim().parse::<u32>().ok(),
    }
}

fn unwrap_date(date: &RawDate) -> Option<DateTime<Utc>> {
    match date {
        RawDate::Wrapped { date } | RawDate::Plain(date) => date_value(date),
        RawDate::Other(_) => None,
    }
}

fn date_value(value: &RawDateValue) -> Option<DateTime<Utc>> {
    match value {
        RawDateValue::Text(text) => parse_timestamp(text),
        RawDateValue::Millis(millis) => Utc.timestamp_millis_opt(*millis).single(),
        RawDateValue::NumberLong { millis } => millis
            .parse::<i64>()
            .ok()
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()),
    }
}

/// Parses an RFC 3339 instant, a naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC)
/// or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(text) {
        return Some(instant.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
