use anyhow::{Context, Result};
use lakewatch_core::settings::DashboardSettings;
use std::path::Path;
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "config/dashboard.yaml";

/// Loads the dashboard file, falling back to built-in defaults, then applies CLI overrides.
pub fn resolve_settings(config: Option<&Path>, server: Option<&str>) -> Result<DashboardSettings> {
    let mut settings = match config {
        Some(path) => {
            println!("Loading dashboard config from '{}'...", path.display());
            DashboardSettings::load(path).with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
            println!("Loading dashboard config from '{}'...", DEFAULT_CONFIG_PATH);
            DashboardSettings::load(Path::new(DEFAULT_CONFIG_PATH))
                .with_context(|| format!("Failed to load config {}", DEFAULT_CONFIG_PATH))?
        }
        None => {
            info!("no config file, using built-in defaults");
            DashboardSettings::default()
        }
    };

    if let Some(url) = server {
        settings.base_url = url.to_string();
    }
    info!(base_url = %settings.base_url, "dashboard settings resolved");
    Ok(settings)
}
