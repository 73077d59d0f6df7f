//! Average-density time series behind the dashboard chart.

use chrono::{Duration, NaiveDate};
use lakewatch_schemas::api::{TimeseriesMode, TimeseriesPoint};
use tracing::debug;

pub const DETAILED_DATA_PATH: &str = "/detailed_data";

/// Owns the chart's current series. Replacing the series drops the old one.
#[derive(Debug, Clone, Default)]
pub struct TimeseriesChart {
    mode: TimeseriesMode,
    points: Vec<TimeseriesPoint>,
}

impl TimeseriesChart {
    pub fn new(mode: TimeseriesMode) -> Self {
        Self {
            mode,
            points: Vec::new(),
        }
    }

    pub fn mode(&self) -> TimeseriesMode {
        self.mode
    }

    /// Switches the active mode. Returns `false` when `mode` is already active,
    /// meaning no refetch is needed.
    pub fn select_mode(&mut self, mode: TimeseriesMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.points.clear();
        true
    }

    pub fn replace(&mut self, points: Vec<TimeseriesPoint>) {
        debug!(mode = %self.mode, points = points.len(), "timeseries replaced");
        self.points = points;
    }

    pub fn points(&self) -> &[TimeseriesPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// X-axis labels in point order.
    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| tick_label(&p.date, self.mode)).collect()
    }

    /// Lowest and highest average density, or `None` for an empty series.
    pub fn value_bounds(&self) -> Option<(f64, f64)> {
        let mut values = self.points.iter().map(|p| p.average_density);
        let first = values.next()?;
        Some(values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }

    /// Index of the point nearest to a fractional x position, clamped to the series.
    pub fn nearest_index(&self, x: f64) -> Option<usize> {
        if self.points.is_empty() || x.is_nan() {
            return None;
        }
        let last = (self.points.len() - 1) as f64;
        Some(x.round().clamp(0.0, last) as usize)
    }

    /// Navigation target for a click on the point at `index`.
    pub fn drill_down(&self, index: usize) -> Option<DrillDown> {
        let point = self.points.get(index)?;
        Some(DrillDown {
            date: point.date.clone(),
            mode: self.mode,
        })
    }
}

/// The detailed page for one chart point, served at `DETAILED_DATA_PATH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrillDown {
    pub date: String,
    pub mode: TimeseriesMode,
}

/// Tooltip text for a value, e.g. `0.12 pcs/cm³`.
pub fn value_label(value: f64) -> String {
    format!("{:.2} pcs/cm³", value)
}

/// `Mar 1, 2023` for daily points, `Mar 1 - Mar 7` for the week starting at a weekly point.
/// Unparseable dates are shown as sent.
pub fn tick_label(date: &str, mode: TimeseriesMode) -> String {
    let Some(day) = parse_point_date(date) else {
        return date.to_string();
    };
    match mode {
        TimeseriesMode::Daily => day.format("%b %-d, %Y").to_string(),
        TimeseriesMode::Weekly => {
            let week_end = day + Duration::days(6);
            format!("{} - {}", day.format("%b %-d"), week_end.format("%b %-d"))
        }
    }
}

fn parse_point_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(date: &str, average_density: f64) -> TimeseriesPoint {
        TimeseriesPoint {
            date: date.to_string(),
            average_density,
        }
    }

    #[test]
    fn daily_and_weekly_labels() {
        assert_eq!(tick_label("2023-03-01", TimeseriesMode::Daily), "Mar 1, 2023");
        assert_eq!(tick_label("2023-03-01", TimeseriesMode::Weekly), "Mar 1 - Mar 7");
        assert_eq!(tick_label("2025-04-28 00:00:00", TimeseriesMode::Weekly), "Apr 28 - May 4");
        assert_eq!(tick_label("week 12", TimeseriesMode::Daily), "week 12");
    }

    #[test]
    fn value_label_uses_two_decimals() {
        assert_eq!(value_label(0.126), "0.13 pcs/cm³");
        assert_eq!(value_label(3.0), "3.00 pcs/cm³");
    }

    #[test]
    fn drill_down_targets_detailed_page() {
        let mut chart = TimeseriesChart::new(TimeseriesMode::Weekly);
        chart.replace(vec![point("2025-04-07", 0.05), point("2025-04-14", 0.07)]);
        let target = chart.drill_down(1).unwrap();
        assert_eq!(target.date, "2025-04-14");
        assert_eq!(target.mode, TimeseriesMode::Weekly);
        assert_eq!(chart.drill_down(2), None);
    }

    #[test]
    fn nearest_index_snaps_and_clamps() {
        let mut chart = TimeseriesChart::default();
        assert_eq!(chart.nearest_index(0.0), None);
        chart.replace(vec![point("2025-04-01", 0.01), point("2025-04-02", 0.02), point("2025-04-03", 0.03)]);
        assert_eq!(chart.nearest_index(1.4), Some(1));
        assert_eq!(chart.nearest_index(1.6), Some(2));
        assert_eq!(chart.nearest_index(-5.0), Some(0));
        assert_eq!(chart.nearest_index(99.0), Some(2));
    }

    #[test]
    fn selecting_active_mode_is_a_no_op() {
        let mut chart = TimeseriesChart::default();
        chart.replace(vec![point("2025-04-01", 0.01)]);
        assert!(!chart.select_mode(TimeseriesMode::Daily));
        assert_eq!(chart.points().len(), 1);
        assert!(chart.select_mode(TimeseriesMode::Weekly));
        assert!(chart.is_empty());
        assert_eq!(chart.mode(), TimeseriesMode::Weekly);
    }

    #[test]
    fn value_bounds_cover_series() {
        let mut chart = TimeseriesChart::default();
        assert_eq!(chart.value_bounds(), None);
        chart.replace(vec![point("2025-04-01", 0.04), point("2025-04-02", 0.01), point("2025-04-03", 0.09)]);
        assert_eq!(chart.value_bounds(), Some((0.01, 0.09)));
    }
}
