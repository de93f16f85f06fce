//! Formatting at the presentation boundary.
//!
//! Everything upstream works in UTC. Conversion to the viewer's offset only
//! happens here.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::error::{CoreError, CoreResult};

const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// `90` → `"1h 30m"`, `60` → `"1h"`, `45` → `"45m"`.
pub fn format_duration(minutes: u32) -> String {
    let hours = minutes / 60;
    let rest = minutes % 60;
    match (hours, rest) {
        (0, rest) => format!("{rest}m"),
        (hours, 0) => format!("{hours}h"),
        (hours, rest) => format!("{hours}h {rest}m"),
    }
}

pub fn display_offset(offset_minutes: i32) -> CoreResult<FixedOffset> {
    if offset_minutes.abs() > MAX_OFFSET_MINUTES {
        return Err(CoreError::InvalidArgument(format!(
            "UTC offset of {offset_minutes} minutes is out of range"
        )));
    }
    FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
        CoreError::InvalidArgument(format!("invalid UTC offset {offset_minutes}"))
    })
}

/// e.g. `Jan 5, 2025` in the viewer's offset.
pub fn format_display_date(instant: DateTime<Utc>, offset: FixedOffset) -> String {
    instant.with_timezone(&offset).format("%b %-d, %Y").to_string()
}

pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// e.g. `January 2025`.
pub fn month_label(first_of_month: NaiveDate) -> String {
    first_of_month.format("%B %Y").to_string()
}

/// The viewer's local calendar date, used for "today" resets and highlights.
pub fn local_today(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}
