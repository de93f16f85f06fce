use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Longest description accepted at write time.
pub const MAX_DESCRIPTION_CHARS: usize = 2000;

/// One logged study session after normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRecord {
    pub id: String,
    pub day: u32,
    pub duration_minutes: u32,
    /// Canonical instant; `None` when the stored date could not be read.
    pub date: Option<DateTime<Utc>>,
    pub topics: Vec<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

impl StudyRecord {
    /// The calendar date used as the projection key.
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        self.date.map(|instant| instant.date_naive())
    }
}

/// A record exactly as persisted, before normalization.
///
/// Field names follow the stored document shape (`_id`, `duration`, `topic`);
/// the canonical names are accepted as aliases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "_id", alias = "id", default)]
    pub id: Option<RawId>,
    #[serde(default)]
    pub day: Option<RawNumber>,
    #[serde(alias = "durationMinutes", alias = "duration_minutes", default)]
    pub duration: Option<RawNumber>,
    #[serde(default)]
    pub date: Option<RawDate>,
    #[serde(alias = "topics", default)]
    pub topic: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Wrapped {
        #[serde(rename = "$oid")]
        oid: String,
    },
    Text(String),
    Number(i64),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Wrapped {
        #[serde(rename = "$date")]
        date: RawDateValue,
    },
    Plain(RawDateValue),
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawDateValue {
    Text(String),
    Millis(i64),
    NumberLong {
        #[serde(rename = "$numberLong")]
        millis: String,
    },
}

/// Numbers in hand-edited files sometimes arrive as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

/// Input for creating a record through a data source.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRecord {
    pub day: u32,
    pub duration_minutes: u32,
    pub date: DateTime<Utc>,
    pub topics: Vec<String>,
    pub description: Option<String>,
    pub link: Option<String>,
}

impl NewRecord {
    /// Trims and lowercases topics, trims text fields, then checks the
    /// write-time constraints.
    pub fn validated(mut self) -> CoreResult<Self> {
        self.topics = clean_topics(&self.topics);
        self.description = clean_text(self.description);
        self.link = clean_text(self.link);
        validate_fields(
            self.day,
            self.duration_minutes,
            &self.topics,
            self.description.as_deref(),
        )?;
        Ok(self)
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub day: Option<u32>,
    pub duration_minutes: Option<u32>,
    pub date: Option<DateTime<Utc>>,
    pub topics: Option<Vec<String>>,
    pub description: Option<String>,
    pub link: Option<String>,
}

impl RecordPatch {
    /// Applies the patch to `record` and re-validates the result.
    pub fn apply(&self, record: &StudyRecord) -> CoreResult<StudyRecord> {
        let mut updated = record.clone();
        if let Some(day) = self.day {
            updated.day = day;
        }
        if let Some(duration) = self.duration_minutes {
            updated.duration_minutes = duration;
        }
        if let Some(date) = self.date {
            updated.date = Some(date);
        }
        if let Some(topics) = &self.topics {
            updated.topics = clean_topics(topics);
        }
        if self.description.is_some() {
            updated.description = clean_text(self.description.clone());
        }
        if self.link.is_some() {
            updated.link = clean_text(self.link.clone());
        }
        validate_fields(
            updated.day,
            updated.duration_minutes,
            &updated.topics,
            updated.description.as_deref(),
        )?;
        Ok(updated)
    }
}

fn validate_fields(
    day: u32,
    duration_minutes: u32,
    topics: &[String],
    description: Option<&str>,
) -> CoreResult<()> {
    if day == 0 {
        return Err(CoreError::Validation("day must be a positive number".into()));
    }
    if duration_minutes == 0 {
        return Err(CoreError::Validation(
            "duration must be at least 1 minute".into(),
        ));
    }
    if topics.is_empty() {
        return Err(CoreError::Validation(
            "at least one topic is required".into(),
        ));
    }
    if let Some(text) = description {
        if text.chars().count() > MAX_DESCRIPTION_CHARS {
            return Err(CoreError::Validation(format!(
                "description cannot be more than {MAX_DESCRIPTION_CHARS} characters"
            )));
        }
    }
    Ok(())
}

/// Accepts plain minutes (`"95"`) or `HH:MM` (`"1:35"`).
pub fn parse_duration_input(input: &str) -> CoreResult<u32> {
    let input = input.trim();
    let invalid = || CoreError::Validation(format!("invalid duration `{input}`"));
    match input.split_once(':') {
        Some((hours, minutes)) => {
            let hours: u32 = hours.trim().parse().map_err(|_| invalid())?;
            let minutes: u32 = minutes.trim().parse().map_err(|_| invalid())?;
            if minutes >= 60 {
                return Err(invalid());
            }
            hours
                .checked_mul(60)
                .and_then(|total| total.checked_add(minutes))
                .ok_or_else(invalid)
        }
        None => input.parse().map_err(|_| invalid()),
    }
}

/// Splits a comma separated topic list, trimming and lowercasing each entry.
pub fn parse_topic_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|topic| topic.trim().to_lowercase())
        .filter(|topic| !topic.is_empty())
        .collect()
}

pub fn clean_topics(topics: &[String]) -> Vec<String> {
    topics
        .iter()
        .map(|topic| topic.trim().to_lowercase())
        .filter(|topic| !topic.is_empty())
        .collect()
}

fn clean_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicCount {
    pub topic: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudyStatistics {
    pub total_days: usize,
    pub total_hours: f64,
    pub average_hours: f64,
    pub top_topics: Vec<TopicCount>,
}

/// One day of a monthly calendar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayCell {
    pub day: u32,
    pub date: NaiveDate,
    pub record: Option<StudyRecord>,
}

impl DayCell {
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Heatmap colour bucket for a day's study time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Intensity {
    None = 0,
    Light = 1,
    Moderate = 2,
    Heavy = 3,
    Intense = 4,
}

impl Intensity {
    pub fn level(self) -> u8 {
        self as u8
    }
}

/// One day of a heatmap month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatCell {
    pub date: NaiveDate,
    pub duration_minutes: u32,
    pub intensity: Intensity,
    pub day: Option<u32>,
    pub topics: Vec<String>,
}

/// A month laid out as full 7-day week rows; `None` cells are padding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub name: String,
    pub cells: Vec<Option<HeatCell>>,
}

impl MonthGrid {
    pub fn weeks(&self) -> impl Iterator<Item = &[Option<HeatCell>]> {
        self.cells.chunks(7)
    }
}
