//! Static JSON file data source.
//!
//! The file is an array of documents in the persisted shape
//! (`{"_id": {"$oid": ..}, "date": {"$date": ..}, "duration", "topic", ..}`).
//! Appending preserves existing entries, including placeholder objects that
//! normalization later drops.

use std::fs;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::models::{NewRecord, RawRecord, StudyRecord};
use crate::normalize::normalize;

/// Reads the file as an array of documents. Entries whose shape cannot be
/// read as a record are dropped; only a file that is not a JSON array fails.
pub fn load_raw(path: &Path) -> CoreResult<Vec<RawRecord>> {
    let contents = fs::read_to_string(path)?;
    let documents: Vec<Value> = serde_json::from_str(&contents)?;
    let total = documents.len();

    let raw: Vec<RawRecord> = documents
        .into_iter()
        .filter_map(|document| serde_json::from_value(document).ok())
        .collect();
    debug!(
        path = %path.display(),
        entries = raw.len(),
        dropped = total - raw.len(),
        "loaded record file"
    );
    Ok(raw)
}

pub fn load_records(path: &Path) -> CoreResult<Vec<StudyRecord>> {
    Ok(normalize(&load_raw(path)?))
}

/// Next day number in the streak: one past the highest logged day.
pub fn next_day_number(records: &[StudyRecord]) -> u32 {
    records
        .iter()
        .map(|record| record.day)
        .max()
        .map_or(1, |day| day.saturating_add(1))
}

/// 24 hex characters: seconds since the epoch followed by random bits,
/// matching the shape of stored document ids.
pub fn generate_object_id(now: DateTime<Utc>) -> String {
    let seconds = u32::try_from(now.timestamp().max(0)).unwrap_or(u32::MAX);
    let random = Uuid::new_v4().simple().to_string();
    format!("{seconds:08x}{}", &random[..16])
}

pub fn append_record(path: &Path, record: NewRecord, now: DateTime<Utc>) -> CoreResult<StudyRecord> {
    let record = record.validated()?;

    let mut documents: Vec<Value> = if path.exists() {
        serde_json::from_str(&fs::read_to_string(path)?)?
    } else {
        Vec::new()
    };

    let id = generate_object_id(now);
    let updated_at = now.to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut document = json!({
        "_id": { "$oid": id },
        "day": record.day,
        "duration": record.duration_minutes,
        "date": { "$date": record.date.to_rfc3339_opts(SecondsFormat::Millis, true) },
        "topic": record.topics,
        "updatedAt": { "$date": updated_at },
    });
    if let Some(description) = &record.description {
        document["description"] = json!(description);
    }
    if let Some(link) = &record.link {
        document["link"] = json!(link);
    }
    documents.push(document);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, serde_json::to_string_pretty(&documents)?)?;
    info!(path = %path.display(), id = %id, day = record.day, "record appended");

    Ok(StudyRecord {
        id,
        day: record.day,
        duration_minutes: record.duration_minutes,
        date: Some(record.date),
        topics: record.topics,
        description: record.description,
        link: record.link,
    })
}

/// Looks a record up by id in an already loaded collection.
pub fn find_record<'a>(records: &'a [StudyRecord], id: &str) -> CoreResult<&'a StudyRecord> {
    records
        .iter()
        .find(|record| record.id == id)
        .ok_or_else(|| CoreError::NotFound { id: id.to_string() })
}
