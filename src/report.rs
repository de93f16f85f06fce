use std::fmt::Write;

use chrono::{FixedOffset, NaiveDate};

use crate::calendar::{first_of_month, project_month};
use crate::display::{format_display_date, format_duration, month_label};
use crate::error::CoreResult;
use crate::heatmap::project_year;
use crate::icons::icon_for;
use crate::models::{DayCell, Intensity, MonthGrid, StudyRecord};
use crate::stats::compute_statistics;

const WEEKDAY_HEADER: &str = "| Sun | Mon | Tue | Wed | Thu | Fri | Sat |";

/// Glyph per heatmap intensity, lightest to heaviest.
pub fn intensity_glyph(intensity: Intensity) -> char {
    match intensity {
        Intensity::None => '.',
        Intensity::Light => '░',
        Intensity::Moderate => '▒',
        Intensity::Heavy => '▓',
        Intensity::Intense => '█',
    }
}

pub fn render_statistics(records: &[StudyRecord]) -> String {
    let stats = compute_statistics(records);
    let mut output = String::new();

    let _ = writeln!(output, "## Study Statistics");
    let _ = writeln!(output, "- Streak: {} days", stats.total_days);
    let _ = writeln!(output, "- Total duration: {:.1} hours", stats.total_hours);
    let _ = writeln!(output, "- Average per day: {:.1} hours", stats.average_hours);
    let _ = writeln!(output);
    let _ = writeln!(output, "### Top Topics");

    if stats.top_topics.is_empty() {
        let _ = writeln!(output, "No topics recorded yet.");
    } else {
        for entry in &stats.top_topics {
            match icon_for(&entry.topic).asset() {
                Some(asset) => {
                    let _ = writeln!(output, "- {} ({}) [{}]", entry.topic, entry.count, asset);
                }
                None => {
                    let _ = writeln!(output, "- {} ({})", entry.topic, entry.count);
                }
            }
        }
    }

    output
}

/// Markdown table for one month; days with a record show the streak day
/// and duration.
pub fn render_month(
    records: &[StudyRecord],
    year: i32,
    month: u32,
    today: NaiveDate,
) -> CoreResult<String> {
    let cells = project_month(records, year, month)?;
    let mut output = String::new();

    let _ = writeln!(output, "## {}", month_label(first_of_month(year, month)?));
    let _ = writeln!(output);
    let _ = writeln!(output, "{WEEKDAY_HEADER}");
    let _ = writeln!(output, "|-----|-----|-----|-----|-----|-----|-----|");

    for week in cells.chunks(7) {
        let mut line = String::from("|");
        for slot in week {
            let _ = write!(line, " {} |", month_cell_text(slot.as_ref(), today));
        }
        for _ in week.len()..7 {
            line.push_str("  |");
        }
        let _ = writeln!(output, "{line}");
    }

    Ok(output)
}

fn month_cell_text(cell: Option<&DayCell>, today: NaiveDate) -> String {
    let Some(cell) = cell else {
        return String::new();
    };
    let marker = if cell.date == today { "*" } else { "" };
    match &cell.record {
        Some(record) => format!(
            "{}{marker} D{} {}",
            cell.day,
            record.day,
            format_duration(record.duration_minutes)
        ),
        None => format!("{}{marker}", cell.day),
    }
}

pub fn render_heatmap(records: &[StudyRecord], year: i32) -> CoreResult<String> {
    let months = project_year(records, year)?;
    let mut output = String::new();

    let _ = writeln!(output, "## Study Activity {year}");
    let _ = writeln!(output);
    let _ = writeln!(output, "```");
    for grid in &months {
        render_heat_month(&mut output, grid);
    }
    let _ = writeln!(
        output,
        "Less {} More",
        [
            Intensity::None,
            Intensity::Light,
            Intensity::Moderate,
            Intensity::Heavy,
            Intensity::Intense,
        ]
        .iter()
        .map(|level| intensity_glyph(*level).to_string())
        .collect::<Vec<_>>()
        .join(" ")
    );
    let _ = writeln!(output, "```");

    Ok(output)
}

fn render_heat_month(output: &mut String, grid: &MonthGrid) {
    let minutes: u32 = grid
        .cells
        .iter()
        .flatten()
        .map(|cell| cell.duration_minutes)
        .sum();
    let _ = writeln!(output, "{} ({})", grid.name, format_duration(minutes));
    for week in grid.weeks() {
        let row: String = week
            .iter()
            .map(|slot| match slot {
                Some(cell) => intensity_glyph(cell.intensity),
                None => ' ',
            })
            .collect();
        let _ = writeln!(output, "  {row}");
    }
}

pub fn render_records(records: &[&StudyRecord], offset: FixedOffset) -> String {
    let mut output = String::new();
    for record in records {
        let date = record
            .date
            .map(|instant| format_display_date(instant, offset))
            .unwrap_or_else(|| "undated".to_string());
        let _ = writeln!(
            output,
            "- Day {} ({}, {}) {} [{}]",
            record.day,
            date,
            format_duration(record.duration_minutes),
            record.topics.join(", "),
            record.id
        );
        if let Some(description) = &record.description {
            let _ = writeln!(output, "  {description}");
        }
        if let Some(link) = &record.link {
            let _ = writeln!(output, "  {link}");
        }
    }
    output
}

pub fn build_report(
    records: &[StudyRecord],
    year: i32,
    month: u32,
    today: NaiveDate,
    offset: FixedOffset,
) -> CoreResult<String> {
    let mut output = String::new();

    let _ = writeln!(output, "# Study Log Report");
    let _ = writeln!(
        output,
        "Generated {} for {} records",
        crate::display::format_calendar_date(today),
        records.len()
    );
    let _ = writeln!(output);
    output.push_str(&render_statistics(records));
    let _ = writeln!(output);
    output.push_str(&render_heatmap(records, year)?);
    let _ = writeln!(output);
    output.push_str(&render_month(records, year, month, today)?);

    let mut recent: Vec<&StudyRecord> = records.iter().collect();
    recent.sort_by(|a, b| b.date.cmp(&a.date));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Sessions");

    if recent.is_empty() {
        let _ = writeln!(output, "No sessions recorded yet.");
    } else {
        recent.truncate(5);
        output.push_str(&render_records(&recent, offset));
    }

    Ok(output)
}
