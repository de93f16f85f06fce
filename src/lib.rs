//! Study log tracker: turns logged study sessions into statistics, a monthly
//! calendar and a yearly heatmap.

pub mod calendar;
pub mod config;
pub mod db;
pub mod display;
pub mod error;
pub mod heatmap;
pub mod icons;
pub mod models;
pub mod normalize;
pub mod report;
pub mod session;
pub mod stats;
pub mod store;

pub use calendar::{project_month, MonthCursor};
pub use error::{CoreError, CoreResult};
pub use heatmap::{available_years, intensity_for, project_year, YearCursor};
pub use models::{DayCell, HeatCell, Intensity, MonthGrid, RawRecord, StudyRecord, StudyStatistics, TopicCount};
pub use normalize::normalize;
pub use stats::compute_statistics;
