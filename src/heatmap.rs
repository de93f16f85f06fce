//! Year-at-a-glance heatmap: twelve month grids with per-day intensity.

use std::collections::BTreeSet;

use chrono::Datelike;

use crate::calendar::{days_in_month, first_of_month, leading_padding, records_by_date};
use crate::error::{CoreError, CoreResult};
use crate::models::{HeatCell, Intensity, MonthGrid, StudyRecord};

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn intensity_for(duration_minutes: u32) -> Intensity {
    match duration_minutes {
        0 => Intensity::None,
        1..=59 => Intensity::Light,
        60..=119 => Intensity::Moderate,
        120..=179 => Intensity::Heavy,
        _ => Intensity::Intense,
    }
}

pub fn month_name(month: u32) -> Option<&'static str> {
    let index = usize::try_from(month).ok()?.checked_sub(1)?;
    MONTH_NAMES.get(index).copied()
}

/// Builds January through December of `year`, each padded to whole weeks.
pub fn project_year(records: &[StudyRecord], year: i32) -> CoreResult<Vec<MonthGrid>> {
    let by_date = records_by_date(records);
    let mut months = Vec::with_capacity(12);

    for month in 1..=12u32 {
        let first = first_of_month(year, month)?;
        let padding = leading_padding(year, month)?;
        let length = days_in_month(year, month)?;

        let mut cells: Vec<Option<HeatCell>> = Vec::with_capacity(42);
        cells.extend(std::iter::repeat_with(|| None).take(padding));

        for date in first.iter_days().take(length as usize) {
            let record = by_date.get(&date);
            let duration_minutes = record.map_or(0, |record| record.duration_minutes);
            cells.push(Some(HeatCell {
                date,
                duration_minutes,
                intensity: intensity_for(duration_minutes),
                day: record.map(|record| record.day),
                topics: record.map(|record| record.topics.clone()).unwrap_or_default(),
            }));
        }

        let trailing = (7 - cells.len() % 7) % 7;
        cells.extend(std::iter::repeat_with(|| None).take(trailing));

        months.push(MonthGrid {
            year,
            month,
            name: month_name(month).unwrap_or_default().to_string(),
            cells,
        });
    }

    Ok(months)
}

/// Years that have at least one dated record, newest first.
pub fn available_years(records: &[StudyRecord]) -> Vec<i32> {
    records
        .iter()
        .filter_map(|record| record.date.map(|instant| instant.year()))
        .collect::<BTreeSet<i32>>()
        .into_iter()
        .rev()
        .collect()
}

/// Which year the heatmap is showing, bounded by the data and the clock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearCursor {
    pub year: i32,
    pub current_year: i32,
    /// Descending, as returned by [`available_years`].
    pub available: Vec<i32>,
}

impl YearCursor {
    pub fn new(year: i32, current_year: i32, available: Vec<i32>) -> CoreResult<Self> {
        if year > current_year {
            return Err(CoreError::InvalidArgument(format!(
                "year {year} is after the current year {current_year}"
            )));
        }
        Ok(Self {
            year,
            current_year,
            available,
        })
    }

    pub fn for_records(records: &[StudyRecord], current_year: i32) -> Self {
        Self {
            year: current_year,
            current_year,
            available: available_years(records),
        }
    }

    /// With no data there is no lower bound.
    pub fn can_go_previous(&self) -> bool {
        match self.available.iter().min() {
            Some(earliest) => self.year > *earliest,
            None => true,
        }
    }

    pub fn can_go_next(&self) -> bool {
        self.year < self.current_year
    }

    pub fn previous(&self) -> Self {
        let mut moved = self.clone();
        if self.can_go_previous() {
            moved.year -= 1;
        }
        moved
    }

    pub fn next(&self) -> Self {
        let mut moved = self.clone();
        if self.can_go_next() {
            moved.year += 1;
        }
        moved
    }

    pub fn reset(&self) -> Self {
        Self {
            year: self.current_year,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn record(id: &str, date: (i32, u32, u32), minutes: u32) -> StudyRecord {
        StudyRecord {
            id: id.to_string(),
            day: 7,
            duration_minutes: minutes,
            date: Some(Utc.with_ymd_and_hms(date.0, date.1, date.2, 10, 0, 0).unwrap()),
            topics: vec!["python".to_string()],
            description: None,
            link: None,
        }
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(59, 1)]
    #[case(60, 2)]
    #[case(119, 2)]
    #[case(120, 3)]
    #[case(179, 3)]
    #[case(180, 4)]
    #[case(600, 4)]
    fn intensity_thresholds(#[case] minutes: u32, #[case] level: u8) {
        assert_eq!(intensity_for(minutes).level(), level);
    }

    #[test]
    fn always_twelve_full_week_months() {
        for year in [2023, 2024, 2025] {
            let months = project_year(&[], year).unwrap();
            assert_eq!(months.len(), 12);
            for grid in &months {
                assert_eq!(grid.cells.len() % 7, 0, "{} {}", grid.name, year);
                assert!(grid.weeks().all(|week| week.len() == 7));
                assert_eq!(
                    grid.cells.iter().flatten().count() as u32,
                    days_in_month(year, grid.month).unwrap()
                );
            }
            assert_eq!(months[0].name, "Jan");
            assert_eq!(months[11].name, "Dec");
        }
    }

    #[test]
    fn ninety_minutes_is_level_two() {
        let records = vec![record("a", (2025, 1, 5), 90)];
        let months = project_year(&records, 2025).unwrap();
        let target = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        let cell = months[0]
            .cells
            .iter()
            .flatten()
            .find(|cell| cell.date == target)
            .unwrap();
        assert_eq!(cell.duration_minutes, 90);
        assert_eq!(cell.intensity, Intensity::Moderate);
        assert_eq!(cell.day, Some(7));
        assert_eq!(cell.topics, vec!["python"]);
    }

    #[test]
    fn empty_days_are_level_zero() {
        let months = project_year(&[], 2025).unwrap();
        assert!(months
            .iter()
            .flat_map(|grid| grid.cells.iter().flatten())
            .all(|cell| cell.intensity == Intensity::None && cell.day.is_none()));
    }

    #[test]
    fn same_date_keeps_the_last_record() {
        let records = vec![record("a", (2025, 3, 9), 200), record("b", (2025, 3, 9), 30)];
        let months = project_year(&records, 2025).unwrap();
        let active: Vec<&HeatCell> = months[2]
            .cells
            .iter()
            .flatten()
            .filter(|cell| cell.duration_minutes > 0)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].duration_minutes, 30);
        assert_eq!(active[0].intensity, Intensity::Light);
    }

    #[test]
    fn other_years_are_ignored() {
        let records = vec![record("a", (2024, 12, 31), 90), record("b", (2026, 1, 1), 90)];
        let months = project_year(&records, 2025).unwrap();
        assert!(months
            .iter()
            .flat_map(|grid| grid.cells.iter().flatten())
            .all(|cell| cell.duration_minutes == 0));
    }

    #[test]
    fn available_years_are_descending_and_unique() {
        let records = vec![
            record("a", (2024, 3, 1), 30),
            record("b", (2025, 1, 5), 30),
            record("c", (2024, 7, 1), 30),
        ];
        assert_eq!(available_years(&records), vec![2025, 2024]);
    }

    #[test]
    fn previous_year_is_bounded_by_earliest_data() {
        let cursor = YearCursor::new(2025, 2026, vec![2025, 2024]).unwrap();
        assert!(cursor.can_go_previous());
        let earliest = cursor.previous();
        assert_eq!(earliest.year, 2024);
        assert!(!earliest.can_go_previous());
        assert_eq!(earliest.previous().year, 2024);
    }

    #[test]
    fn next_year_stops_at_current_year() {
        let cursor = YearCursor::new(2025, 2026, vec![2025]).unwrap();
        let current = cursor.next();
        assert_eq!(current.year, 2026);
        assert!(!current.can_go_next());
        assert_eq!(current.next().year, 2026);
        assert_eq!(current.previous().reset().year, 2026);
    }

    #[test]
    fn previous_is_unrestricted_without_data() {
        let cursor = YearCursor::for_records(&[], 2026);
        assert!(cursor.can_go_previous());
        assert_eq!(cursor.previous().previous().year, 2024);
    }

    #[test]
    fn rejects_future_years() {
        assert!(matches!(
            YearCursor::new(2030, 2026, Vec::new()),
            Err(CoreError::InvalidArgument(_))
        ));
    }
}
