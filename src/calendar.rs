//! Monthly calendar projection and month-by-month navigation.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};

use crate::error::{CoreError, CoreResult};
use crate::models::{DayCell, StudyRecord};

/// Indexes records by calendar date. Later records replace earlier ones on
/// the same date.
pub fn records_by_date(records: &[StudyRecord]) -> HashMap<NaiveDate, &StudyRecord> {
    let mut map = HashMap::new();
    for record in records {
        if let Some(date) = record.calendar_date() {
            map.insert(date, record);
        }
    }
    map
}

pub fn first_of_month(year: i32, month: u32) -> CoreResult<NaiveDate> {
    if !(1..=12).contains(&month) {
        return Err(CoreError::InvalidArgument(format!(
            "month must be between 1 and 12, got {month}"
        )));
    }
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| {
        CoreError::InvalidArgument(format!("year {year} is outside the supported range"))
    })
}

pub fn days_in_month(year: i32, month: u32) -> CoreResult<u32> {
    let first = first_of_month(year, month)?;
    let cursor = MonthCursor { year, month }.next();
    let next_first = first_of_month(cursor.year, cursor.month)?;
    Ok((next_first - first).num_days() as u32)
}

/// Leading empty slots before day 1 (0 = Sunday).
pub fn leading_padding(year: i32, month: u32) -> CoreResult<usize> {
    let first = first_of_month(year, month)?;
    Ok(first.weekday().num_days_from_sunday() as usize)
}

/// Lays out one month for a Sunday-first 7-column grid.
///
/// Leading slots are `None`; the final week is not padded.
pub fn project_month(
    records: &[StudyRecord],
    year: i32,
    month: u32,
) -> CoreResult<Vec<Option<DayCell>>> {
    let padding = leading_padding(year, month)?;
    let length = days_in_month(year, month)?;
    let by_date = records_by_date(records);

    let mut cells: Vec<Option<DayCell>> = Vec::with_capacity(padding + length as usize);
    cells.extend(std::iter::repeat_with(|| None).take(padding));

    for day in 1..=length {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            CoreError::InvalidArgument(format!("{year}-{month:02}-{day:02} is not a date"))
        })?;
        cells.push(Some(DayCell {
            day,
            date,
            record: by_date.get(&date).map(|record| (*record).clone()),
        }));
    }

    Ok(cells)
}

/// The month currently shown by a calendar view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthCursor {
    pub year: i32,
    pub month: u32,
}

impl MonthCursor {
    pub fn new(year: i32, month: u32) -> CoreResult<Self> {
        first_of_month(year, month)?;
        Ok(Self { year, month })
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn previous(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn reset(self, today: NaiveDate) -> Self {
        Self::containing(today)
    }

    /// Moves `months` forward (negative: back) in one step.
    pub fn shift(self, months: i32) -> CoreResult<Self> {
        let out_of_range = || {
            CoreError::InvalidArgument(format!(
                "cannot shift {}-{:02} by {months} months",
                self.year, self.month
            ))
        };
        let index = i64::from(self.year)
            .checked_mul(12)
            .and_then(|index| index.checked_add(i64::from(self.month) - 1))
            .and_then(|index| index.checked_add(i64::from(months)))
            .ok_or_else(out_of_range)?;
        let year = i32::try_from(index.div_euclid(12)).map_err(|_| out_of_range())?;
        let month = u32::try_from(index.rem_euclid(12) + 1).map_err(|_| out_of_range())?;
        Self::new(year, month).map_err(|_| out_of_range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn record(id: &str, y: i32, m: u32, d: u32, hour: u32, minutes: u32) -> StudyRecord {
        StudyRecord {
            id: id.to_string(),
            day: 1,
            duration_minutes: minutes,
            date: Some(Utc.with_ymd_and_hms(y, m, d, hour, 0, 0).unwrap()),
            topics: vec!["rust".to_string()],
            description: None,
            link: None,
        }
    }

    #[test]
    fn cell_count_is_padding_plus_month_length() {
        for (year, month) in [(2025, 1), (2025, 2), (2024, 2), (2025, 6), (2026, 11)] {
            let cells = project_month(&[], year, month).unwrap();
            let expected = leading_padding(year, month).unwrap()
                + days_in_month(year, month).unwrap() as usize;
            assert_eq!(cells.len(), expected, "{year}-{month}");
        }
    }

    #[test]
    fn february_lengths_follow_leap_years() {
        assert_eq!(days_in_month(2024, 2).unwrap(), 29);
        assert_eq!(days_in_month(2025, 2).unwrap(), 28);
        assert_eq!(days_in_month(2100, 2).unwrap(), 28);
        assert_eq!(days_in_month(2025, 12).unwrap(), 31);
    }

    #[test]
    fn june_2025_starts_on_sunday_and_march_on_saturday() {
        assert_eq!(leading_padding(2025, 6).unwrap(), 0);
        assert_eq!(leading_padding(2025, 3).unwrap(), 6);

        let cells = project_month(&[], 2025, 3).unwrap();
        assert!(cells[..6].iter().all(Option::is_none));
        let first = cells[6].as_ref().unwrap();
        assert_eq!(first.day, 1);
        assert_eq!(first.iso_date(), "2025-03-01");
    }

    #[test]
    fn attaches_record_by_date_ignoring_time() {
        let records = vec![record("late", 2025, 1, 5, 23, 90)];
        let cells = project_month(&records, 2025, 1).unwrap();
        // Jan 1 2025 is a Wednesday
        let cell = cells[3 + 4].as_ref().unwrap();
        assert_eq!(cell.day, 5);
        assert_eq!(cell.record.as_ref().map(|r| r.id.as_str()), Some("late"));
        assert_eq!(
            cells.iter().flatten().filter(|cell| cell.record.is_some()).count(),
            1
        );
    }

    #[test]
    fn last_record_on_a_date_wins() {
        let records = vec![
            record("first", 2025, 1, 5, 8, 30),
            record("second", 2025, 1, 5, 20, 60),
        ];
        let cells = project_month(&records, 2025, 1).unwrap();
        let with_records: Vec<&DayCell> = cells
            .iter()
            .flatten()
            .filter(|cell| cell.record.is_some())
            .collect();
        assert_eq!(with_records.len(), 1);
        assert_eq!(with_records[0].record.as_ref().unwrap().id, "second");
    }

    #[test]
    fn midnight_on_the_first_lands_in_one_month_only() {
        let records = vec![record("boundary", 2025, 2, 1, 0, 45)];
        let january = project_month(&records, 2025, 1).unwrap();
        let february = project_month(&records, 2025, 2).unwrap();
        let hits = |cells: &[Option<DayCell>]| {
            cells.iter().flatten().filter(|cell| cell.record.is_some()).count()
        };
        assert_eq!(hits(january.as_slice()), 0);
        assert_eq!(hits(february.as_slice()), 1);
    }

    #[test]
    fn records_without_dates_are_skipped() {
        let mut undated = record("undated", 2025, 1, 5, 8, 30);
        undated.date = None;
        let cells = project_month(&[undated], 2025, 1).unwrap();
        assert!(cells.iter().flatten().all(|cell| cell.record.is_none()));
    }

    #[test]
    fn rejects_month_out_of_range() {
        assert!(matches!(project_month(&[], 2025, 0), Err(CoreError::InvalidArgument(_))));
        assert!(matches!(project_month(&[], 2025, 13), Err(CoreError::InvalidArgument(_))));
    }

    #[test]
    fn cursor_rolls_over_year_boundaries() {
        let january = MonthCursor::new(2025, 1).unwrap();
        assert_eq!(january.previous(), MonthCursor { year: 2024, month: 12 });
        assert_eq!(january.previous().next(), january);

        let december = MonthCursor::new(2025, 12).unwrap();
        assert_eq!(december.next(), MonthCursor { year: 2026, month: 1 });
    }

    #[test]
    fn shift_matches_repeated_steps() {
        let cursor = MonthCursor::new(2025, 2).unwrap();
        assert_eq!(cursor.shift(0).unwrap(), cursor);
        assert_eq!(cursor.shift(-2).unwrap(), cursor.previous().previous());
        assert_eq!(cursor.shift(11).unwrap(), MonthCursor::new(2026, 1).unwrap());
        assert_eq!(cursor.shift(-26).unwrap(), MonthCursor::new(2022, 12).unwrap());
    }

    #[test]
    fn huge_shifts_are_rejected_instead_of_looping() {
        let cursor = MonthCursor::new(2025, 1).unwrap();
        assert!(matches!(cursor.shift(i32::MAX), Err(CoreError::InvalidArgument(_))));
        assert!(matches!(cursor.shift(i32::MIN), Err(CoreError::InvalidArgument(_))));
    }

    #[test]
    fn cursor_resets_to_today() {
        let cursor = MonthCursor::new(2021, 4).unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(cursor.reset(today), MonthCursor { year: 2026, month: 10 });
    }
}
