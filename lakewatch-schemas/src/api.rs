use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Request body shared by `/filter_markers`, `/total_samples` and `/average_density`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeBody {
    pub min_date: String,
    pub max_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRangeResponse {
    pub min_date: Option<String>,
    pub max_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestDateResponse {
    pub latest_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalSamplesResponse {
    /// A count, though the server may encode it as a float.
    pub total_samples: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageDensityResponse {
    pub average_density: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesPoint {
    pub date: String,
    pub average_density: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeseriesMode {
    #[default]
    Daily,
    Weekly,
}

impl TimeseriesMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeseriesMode::Daily => "daily",
            TimeseriesMode::Weekly => "weekly",
        }
    }
}

impl fmt::Display for TimeseriesMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeseriesMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(TimeseriesMode::Daily),
            "weekly" => Ok(TimeseriesMode::Weekly),
            other => Err(format!("unknown timeseries mode '{}'", other)),
        }
    }
}
