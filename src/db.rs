use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CoreError;
use crate::models::{parse_duration_input, parse_topic_list, NewRecord, RecordPatch, StudyRecord};
use crate::normalize::parse_timestamp;
use crate::store;

const RECORD_COLUMNS: &str =
    "id, day, duration_minutes, studied_at, topics, description, link";

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<usize> {
    let records = vec![
        (
            "seed-001",
            1,
            "1:30",
            Utc.with_ymd_and_hms(2025, 1, 5, 11, 0, 0).single(),
            "react, js",
            "Components, props and state",
        ),
        (
            "seed-002",
            2,
            "45",
            Utc.with_ymd_and_hms(2025, 1, 6, 12, 30, 0).single(),
            "react",
            "useEffect and data fetching",
        ),
        (
            "seed-003",
            3,
            "3:10",
            Utc.with_ymd_and_hms(2025, 1, 7, 9, 15, 0).single(),
            "node, express, mongodb",
            "REST API with authentication",
        ),
    ];

    let mut inserted = 0usize;
    for (source_key, day, duration, date, topics, description) in records {
        let record = NewRecord {
            day,
            duration_minutes: parse_duration_input(duration)?,
            date: date.context("invalid seed date")?,
            topics: parse_topic_list(topics),
            description: Some(description.to_string()),
            link: None,
        };
        if insert_keyed(pool, record, source_key).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

pub async fn fetch_records(pool: &PgPool) -> anyhow::Result<Vec<StudyRecord>> {
    let rows = sqlx::query(&format!(
        "SELECT {RECORD_COLUMNS} FROM study_log.records ORDER BY studied_at DESC"
    ))
    .fetch_all(pool)
    .await?;

    let records: Vec<StudyRecord> = rows.iter().map(record_from_row).collect();
    debug!(count = records.len(), "fetched records");
    Ok(records)
}

pub async fn fetch_record(pool: &PgPool, id: &str) -> anyhow::Result<StudyRecord> {
    let uuid = parse_record_id(id)?;
    let row = sqlx::query(&format!(
        "SELECT {RECORD_COLUMNS} FROM study_log.records WHERE id = $1"
    ))
    .bind(uuid)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| CoreError::NotFound { id: id.to_string() })?;

    Ok(record_from_row(&row))
}

pub async fn create_record(pool: &PgPool, record: NewRecord) -> anyhow::Result<StudyRecord> {
    let record = record.validated()?;
    let row = sqlx::query(&format!(
        r#"
        INSERT INTO study_log.records
        (id, day, duration_minutes, studied_at, topics, description, link)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {RECORD_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(to_db_int(record.day)?)
    .bind(to_db_int(record.duration_minutes)?)
    .bind(record.date)
    .bind(&record.topics)
    .bind(&record.description)
    .bind(&record.link)
    .fetch_one(pool)
    .await?;

    let created = record_from_row(&row);
    info!(id = %created.id, day = created.day, "record created");
    Ok(created)
}

pub async fn update_record(
    pool: &PgPool,
    id: &str,
    patch: &RecordPatch,
) -> anyhow::Result<StudyRecord> {
    let current = fetch_record(pool, id).await?;
    let updated = patch.apply(&current)?;
    let studied_at = updated.date.context("stored record has no date")?;

    let row = sqlx::query(&format!(
        r#"
        UPDATE study_log.records
        SET day = $2, duration_minutes = $3, studied_at = $4, topics = $5,
            description = $6, link = $7, updated_at = now()
        WHERE id = $1
        RETURNING {RECORD_COLUMNS}
        "#
    ))
    .bind(parse_record_id(id)?)
    .bind(to_db_int(updated.day)?)
    .bind(to_db_int(updated.duration_minutes)?)
    .bind(studied_at)
    .bind(&updated.topics)
    .bind(&updated.description)
    .bind(&updated.link)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| CoreError::NotFound { id: id.to_string() })?;

    info!(id, "record updated");
    Ok(record_from_row(&row))
}

pub async fn delete_record(pool: &PgPool, id: &str) -> anyhow::Result<()> {
    let result = sqlx::query("DELETE FROM study_log.records WHERE id = $1")
        .bind(parse_record_id(id)?)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::NotFound { id: id.to_string() }.into());
    }
    info!(id, "record deleted");
    Ok(())
}

/// Imports a JSON file in the persisted document shape. The stored
/// document id becomes the source key, so re-importing is a no-op.
/// Records that are undated or fail write validation are skipped.
pub async fn import_json(pool: &PgPool, json_path: &Path) -> anyhow::Result<usize> {
    let records = store::load_records(json_path)
        .with_context(|| format!("failed to read {}", json_path.display()))?;
    let (candidates, skipped) = import_candidates(records);
    let mut inserted = 0usize;

    for (source_key, candidate) in candidates {
        if insert_keyed(pool, candidate, &source_key).await? {
            inserted += 1;
        }
    }

    info!(inserted, skipped, "json import finished");
    Ok(inserted)
}

/// Splits normalized records into insertable `(source_key, record)` pairs
/// and a count of the ones that cannot be stored.
pub fn import_candidates(records: Vec<StudyRecord>) -> (Vec<(String, NewRecord)>, usize) {
    let mut candidates = Vec::with_capacity(records.len());
    let mut skipped = 0usize;

    for record in records {
        let Some(date) = record.date else {
            warn!(id = %record.id, "skipping record without a readable date");
            skipped += 1;
            continue;
        };
        let candidate = NewRecord {
            day: record.day,
            duration_minutes: record.duration_minutes,
            date,
            topics: record.topics,
            description: record.description,
            link: record.link,
        };
        match candidate.validated() {
            Ok(candidate) => candidates.push((record.id, candidate)),
            Err(error) => {
                warn!(id = %record.id, %error, "skipping invalid record");
                skipped += 1;
            }
        }
    }

    (candidates, skipped)
}

pub async fn import_csv(pool: &PgPool, csv_path: &Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        day: u32,
        duration: String,
        date: String,
        /// Semicolon separated.
        topics: String,
        description: Option<String>,
        link: Option<String>,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let date = parse_timestamp(&row.date)
            .with_context(|| format!("invalid date `{}` for day {}", row.date, row.day))?;
        let record = NewRecord {
            day: row.day,
            duration_minutes: parse_duration_input(&row.duration)?,
            date,
            topics: parse_topic_list(&row.topics.replace(';', ",")),
            description: row.description,
            link: row.link,
        };
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        if insert_keyed(pool, record, &source_key).await? {
            inserted += 1;
        }
    }

    Ok(inserted)
}

/// Inserts unless a record with the same source key already exists.
async fn insert_keyed(pool: &PgPool, record: NewRecord, source_key: &str) -> anyhow::Result<bool> {
    let record = record.validated()?;
    let result = sqlx::query(
        r#"
        INSERT INTO study_log.records
        (id, day, duration_minutes, studied_at, topics, description, link, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(to_db_int(record.day)?)
    .bind(to_db_int(record.duration_minutes)?)
    .bind(record.date)
    .bind(&record.topics)
    .bind(&record.description)
    .bind(&record.link)
    .bind(source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

fn record_from_row(row: &PgRow) -> StudyRecord {
    let id: Uuid = row.get("id");
    let day: i32 = row.get("day");
    let duration: i32 = row.get("duration_minutes");
    let studied_at: DateTime<Utc> = row.get("studied_at");

    StudyRecord {
        id: id.to_string(),
        day: u32::try_from(day).unwrap_or_default(),
        duration_minutes: u32::try_from(duration).unwrap_or_default(),
        date: Some(studied_at),
        topics: row.get("topics"),
        description: row.get("description"),
        link: row.get("link"),
    }
}

fn parse_record_id(id: &str) -> Result<Uuid, CoreError> {
    Uuid::parse_str(id).map_err(|_| CoreError::NotFound { id: id.to_string() })
}

fn to_db_int(value: u32) -> Result<i32, CoreError> {
    i32::try_from(value)
        .map_err(|_| CoreError::Validation(format!("{value} is too large to store")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn stored(id: &str, day: u32, minutes: u32, date: Option<&str>, topics: &[&str]) -> StudyRecord {
        StudyRecord {
            id: id.to_string(),
            day,
            duration_minutes: minutes,
            date: date.and_then(parse_timestamp),
            topics: topics.iter().map(|topic| topic.to_string()).collect(),
            description: None,
            link: None,
        }
    }

    #[test]
    fn import_skips_incomplete_records_and_keeps_the_rest() {
        let records = vec![
            stored("a", 1, 30, Some("2025-01-01"), &["x"]),
            stored("b", 2, 0, Some("2025-01-02"), &[]),
            stored("c", 3, 45, Some("2025-01-03"), &["Y"]),
            stored("d", 4, 45, None, &["z"]),
            stored("e", 5, 20, Some("2025-01-05"), &[]),
        ];

        let (candidates, skipped) = import_candidates(records);
        let keys: Vec<&str> = candidates.iter().map(|(key, _)| key.as_str()).collect();
        assert_eq!(keys, vec!["a", "c"]);
        assert_eq!(skipped, 3);
        assert_eq!(candidates[1].1.topics, vec!["y"]);
    }

    #[test]
    fn unknown_ids_map_to_not_found() {
        assert!(matches!(
            parse_record_id("not-a-uuid"),
            Err(CoreError::NotFound { .. })
        ));
    }
}
