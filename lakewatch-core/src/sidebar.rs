//! Text shown in the dashboard sidebar.

use crate::error::DashboardError;
use crate::range::{parse_server_date, RangeQueryState};
use lakewatch_schemas::api::{AverageDensityResponse, LatestDateResponse, TotalSamplesResponse};
use serde::Serialize;
use tracing::warn;

/// Sample count for the selected range. The server may send it as a float.
pub fn total_samples_label(outcome: &Result<TotalSamplesResponse, DashboardError>) -> String {
    match outcome {
        Ok(TotalSamplesResponse { total_samples: Some(n) }) if n.is_finite() && *n != 0.0 => n.to_string(),
        Ok(_) => "0".to_string(),
        Err(err) => {
            warn!(error = %err, "total samples unavailable");
            "Error fetching data".to_string()
        }
    }
}

/// Average density for the selected range, two decimals.
pub fn average_density_label(outcome: &Result<AverageDensityResponse, DashboardError>) -> String {
    match outcome {
        Ok(AverageDensityResponse {
            average_density: Some(value),
        }) if value.is_finite() => format!("{:.2}", value),
        Ok(_) => "0".to_string(),
        Err(err) => {
            warn!(error = %err, "average density unavailable");
            "Error".to_string()
        }
    }
}

/// `Last Updated: YYYY-MM-DD`, the last day the range slider reaches: the server's
/// `max_date`, or today when the server range was unavailable.
pub fn last_updated_label(range: &RangeQueryState) -> String {
    format!("Last Updated: {}", range.upper_bound().format("%Y-%m-%d"))
}

/// Date part of the newest sample timestamp from `/latest_date`.
pub fn newest_sample_label(outcome: &Result<LatestDateResponse, DashboardError>) -> String {
    match outcome {
        Ok(LatestDateResponse { latest_date: Some(raw) }) => match parse_server_date(raw) {
            Some(day) => day.format("%Y-%m-%d").to_string(),
            None => "Data unavailable".to_string(),
        },
        Ok(_) => "Data unavailable".to_string(),
        Err(err) => {
            warn!(error = %err, "latest date unavailable");
            "Error fetching data".to_string()
        }
    }
}

/// All sidebar values for one range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarStats {
    pub total_samples: String,
    pub average_density: String,
    pub last_updated: String,
    pub newest_sample: String,
}

impl SidebarStats {
    pub fn from_outcomes(
        range: &RangeQueryState,
        total: &Result<TotalSamplesResponse, DashboardError>,
        average: &Result<AverageDensityResponse, DashboardError>,
        latest: &Result<LatestDateResponse, DashboardError>,
    ) -> Self {
        Self {
            total_samples: total_samples_label(total),
            average_density: average_density_label(average),
            last_updated: last_updated_label(range),
            newest_sample: newest_sample_label(latest),
        }
    }
}
