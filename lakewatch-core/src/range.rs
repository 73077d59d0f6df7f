//! Date-range selection in the UTC+8 calendar-day convention.

use crate::decode::WIRE_DATETIME_FORMAT;
use crate::error::DashboardError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use lakewatch_schemas::api::{DateRangeResponse, RangeBody};

const UTC8_OFFSET_SECS: i32 = 8 * 3600;

/// First day of the monitoring campaign; lower bound when the server range is unknown.
pub const CAMPAIGN_START: (i32, u32, u32) = (2025, 4, 1);

pub fn utc8() -> FixedOffset {
    FixedOffset::east_opt(UTC8_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// The local calendar day a UNIX timestamp falls on in UTC+8.
pub fn date_from_timestamp(secs: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(secs, 0).map(|t| t.with_timezone(&utc8()).date_naive())
}

pub fn today_utc8(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&utc8()).date_naive()
}

/// Reads the date part of a server timestamp such as `2025-06-30 14:02:11`.
pub fn parse_server_date(raw: &str) -> Option<NaiveDate> {
    let date_part = raw.trim().split([' ', 'T']).next()?;
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

/// An inclusive interval from 00:00:00 of the first day to 23:59:59 of the last day, UTC+8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl QueryRange {
    pub fn for_days(first: NaiveDate, last: NaiveDate) -> Option<Self> {
        let tz = utc8();
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
        let start = tz.from_local_datetime(&first.and_time(NaiveTime::MIN)).single()?;
        let end = tz.from_local_datetime(&last.and_time(end_of_day)).single()?;
        Some(Self { start, end })
    }

    pub fn first_day(&self) -> NaiveDate {
        self.start.date_naive()
    }

    pub fn last_day(&self) -> NaiveDate {
        self.end.date_naive()
    }

    /// The `{min_date, max_date}` body the data endpoints expect.
    pub fn to_wire(&self) -> RangeBody {
        RangeBody {
            min_date: self.start.format(WIRE_DATETIME_FORMAT).to_string(),
            max_date: self.end.format(WIRE_DATETIME_FORMAT).to_string(),
        }
    }

    /// Slider caption, `YYYY-MM-DD - YYYY-MM-DD`.
    pub fn display_label(&self) -> String {
        format!("{} - {}", self.first_day().format("%Y-%m-%d"), self.last_day().format("%Y-%m-%d"))
    }
}

/// The single source of truth for the selected date range. Holds no I/O.
#[derive(Debug, Clone)]
pub struct RangeQueryState {
    lower_bound: Option<NaiveDate>,
    upper_bound: NaiveDate,
    current: QueryRange,
}

impl RangeQueryState {
    /// Starts with the full `[lower_bound, upper_bound]` range selected.
    pub fn new(lower_bound: Option<NaiveDate>, upper_bound: NaiveDate) -> Result<Self, DashboardError> {
        let first = lower_bound.unwrap_or(upper_bound);
        if first > upper_bound {
            return Err(DashboardError::InvalidRange(format!(
                "lower bound {} is after upper bound {}",
                first, upper_bound
            )));
        }
        let current = day_range(first, upper_bound)?;
        Ok(Self {
            lower_bound,
            upper_bound,
            current,
        })
    }

    /// Uses the bounds reported by `/date_range`.
    pub fn from_server_range(response: &DateRangeResponse) -> Result<Self, DashboardError> {
        let parse = |field: &Option<String>, name: &str| {
            field
                .as_deref()
                .and_then(parse_server_date)
                .ok_or_else(|| DashboardError::malformed("/date_range", format!("missing or unreadable {}", name)))
        };
        let min = parse(&response.min_date, "min_date")?;
        let max = parse(&response.max_date, "max_date")?;
        Self::new(Some(min), max)
    }

    /// Campaign start through today, for when the server range is unavailable.
    pub fn fallback(earliest: Option<NaiveDate>, now: DateTime<Utc>) -> Result<Self, DashboardError> {
        let (y, m, d) = CAMPAIGN_START;
        let campaign_start = NaiveDate::from_ymd_opt(y, m, d);
        let today = today_utc8(now);
        let lower = earliest.or(campaign_start).map(|day| day.min(today));
        Self::new(lower, today)
    }

    /// Selects a new range. `end` past the upper bound and `start` before the
    /// lower bound are clamped rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::InvalidRange` when `start > end` after clamping.
    pub fn set_range(&mut self, start: NaiveDate, end: NaiveDate) -> Result<QueryRange, DashboardError> {
        let end = end.min(self.upper_bound);
        let start = match self.lower_bound {
            Some(lower) => start.max(lower),
            None => start,
        };
        if start > end {
            return Err(DashboardError::InvalidRange(format!("{} is after {}", start, end)));
        }
        self.current = day_range(start, end)?;
        Ok(self.current)
    }

    pub fn current(&self) -> QueryRange {
        self.current
    }

    pub fn upper_bound(&self) -> NaiveDate {
        self.upper_bound
    }

    pub fn lower_bound(&self) -> Option<NaiveDate> {
        self.lower_bound
    }
}

fn day_range(first: NaiveDate, last: NaiveDate) -> Result<QueryRange, DashboardError> {
    QueryRange::for_days(first, last)
        .ok_or_else(|| DashboardError::InvalidRange(format!("{} - {} is not representable", first, last)))
}
