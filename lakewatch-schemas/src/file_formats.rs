use crate::color::ColorStop;
use serde::Deserialize;

/// Top-level layout of a dashboard YAML file.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardFile {
    pub schema_version: String,
    #[serde(default)]
    pub server: Option<ServerSection>,
    #[serde(default)]
    pub gradient: Option<Vec<ColorStop>>,
    #[serde(default)]
    pub markers: Option<MarkerSection>,
    #[serde(default)]
    pub range: Option<RangeSection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarkerSection {
    pub base_radius: f64,
    pub max_radius: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RangeSection {
    /// `YYYY-MM-DD`; used when the server cannot report its own range.
    pub earliest_date: Option<String>,
}
