//! Validated dashboard settings, built from defaults or a YAML file.

use crate::error::DashboardError;
use crate::gradient::ColorGradient;
use crate::markers::RadiusScale;
use chrono::NaiveDate;
use lakewatch_schemas::file_formats::DashboardFile;
use std::fs;
use std::path::Path;
use tracing::info;

pub const SUPPORTED_SCHEMA_VERSION: &str = "1";
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

#[derive(Debug, Clone)]
pub struct DashboardSettings {
    pub base_url: String,
    pub gradient: ColorGradient,
    pub radius: RadiusScale,
    pub earliest_date: Option<NaiveDate>,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            gradient: ColorGradient::default(),
            radius: RadiusScale::default(),
            earliest_date: None,
        }
    }
}

impl DashboardSettings {
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        let label = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| DashboardError::FileIO(label.clone(), e))?;
        let file: DashboardFile =
            serde_yaml::from_str(&content).map_err(|e| DashboardError::YamlParsing(label.clone(), e))?;
        let settings = Self::from_file(file)?;
        info!(path = %label, base_url = %settings.base_url, "loaded dashboard settings");
        Ok(settings)
    }

    /// Applies the sections present in `file` over the defaults.
    pub fn from_file(file: DashboardFile) -> Result<Self, DashboardError> {
        if file.schema_version != SUPPORTED_SCHEMA_VERSION {
            return Err(DashboardError::ConfigError(format!(
                "unsupported schema_version '{}', expected '{}'",
                file.schema_version, SUPPORTED_SCHEMA_VERSION
            )));
        }

        let mut settings = Self::default();
        if let Some(server) = file.server {
            settings.base_url = server.base_url;
        }
        if let Some(stops) = file.gradient {
            settings.gradient = ColorGradient::new(stops)?;
        }
        if let Some(markers) = file.markers {
            settings.radius = RadiusScale::new(markers.base_radius, markers.max_radius)?;
        }
        if let Some(raw) = file.range.and_then(|r| r.earliest_date) {
            let day = NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
                .map_err(|e| DashboardError::ConfigError(format!("range.earliest_date '{}': {}", raw, e)))?;
            settings.earliest_date = Some(day);
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakewatch_schemas::color::Rgb;

    fn parse(yaml: &str) -> Result<DashboardSettings, DashboardError> {
        DashboardSettings::from_file(serde_yaml::from_str(yaml).unwrap())
    }

    #[test]
    fn full_file_overrides_defaults() {
        let settings = parse(
            r##"
schema_version: "1"
server:
  base_url: https://lakewatch.example
gradient:
  - { threshold: 0.0, color: "#000000" }
  - { threshold: 1.0, color: "#ffffff" }
markers:
  base_radius: 4
  max_radius: 10
range:
  earliest_date: 2025-05-01
"##,
        )
        .unwrap();
        assert_eq!(settings.base_url, "https://lakewatch.example");
        assert_eq!(settings.gradient.color_for(0.5), Rgb::new(128, 128, 128));
        assert_eq!(settings.radius.cap(), 10.0);
        assert_eq!(settings.earliest_date, NaiveDate::from_ymd_opt(2025, 5, 1));
    }

    #[test]
    fn missing_sections_keep_defaults() {
        let settings = parse("schema_version: \"1\"\n").unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.gradient, ColorGradient::default());
        assert_eq!(settings.radius, RadiusScale::default());
    }

    #[test]
    fn invalid_sections_are_rejected() {
        assert!(matches!(parse("schema_version: \"2\"\n"), Err(DashboardError::ConfigError(_))));
        let one_stop = "schema_version: \"1\"\ngradient:\n  - { threshold: 0.0, color: \"#000000\" }\n";
        assert!(matches!(parse(one_stop), Err(DashboardError::InvalidGradient(_))));
        let inverted = "schema_version: \"1\"\nmarkers: { base_radius: 9, max_radius: 3 }\n";
        assert!(matches!(parse(inverted), Err(DashboardError::InvalidRadiusScale { .. })));
    }
}
