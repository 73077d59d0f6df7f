use crate::plotting;
use crate::surface::{ConsolePage, PlotSurface};
use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use lakewatch_core::basemap::{BaseLayer, MapView};
use lakewatch_core::fetch::{FetchCoordinator, Settlement};
use lakewatch_core::http::HttpDataSource;
use lakewatch_core::logger::MarkerLog;
use lakewatch_core::markers::MarkerSetRenderer;
use lakewatch_core::popup::{popup_html, popup_text, OverlayTarget, PopupId, PopupInteractionController};
use lakewatch_core::range::{QueryRange, RangeQueryState};
use lakewatch_core::settings::DashboardSettings;
use lakewatch_core::sidebar::SidebarStats;
use lakewatch_core::timeseries::{value_label, TimeseriesChart};
use lakewatch_schemas::api::TimeseriesMode;
use std::path::Path;
use tracing::{info, warn};

fn connect(settings: &DashboardSettings) -> Result<HttpDataSource> {
    HttpDataSource::new(&settings.base_url).with_context(|| format!("Failed to set up client for {}", settings.base_url))
}

/// Bounds from `/date_range`, or campaign start through today when the server cannot say.
fn range_state(source: &HttpDataSource, settings: &DashboardSettings) -> Result<RangeQueryState> {
    match source.date_range().and_then(|r| RangeQueryState::from_server_range(&r)) {
        Ok(state) => Ok(state),
        Err(err) => {
            warn!(error = %err, "server date range unavailable, using fallback bounds");
            Ok(RangeQueryState::fallback(settings.earliest_date, Utc::now())?)
        }
    }
}

/// Applies the requested days over the full default selection.
fn select_range(
    source: &HttpDataSource,
    settings: &DashboardSettings,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<RangeQueryState> {
    let mut state = range_state(source, settings)?;
    let current = state.current();
    let range = state
        .set_range(from.unwrap_or(current.first_day()), to.unwrap_or(current.last_day()))
        .context("Invalid date range")?;
    println!("Date range: {}", range.display_label());
    Ok(state)
}

fn load_markers(
    source: &HttpDataSource,
    settings: &DashboardSettings,
    range: QueryRange,
) -> Result<FetchCoordinator<PlotSurface>> {
    let renderer = MarkerSetRenderer::new(PlotSurface::new(), settings.gradient.clone(), settings.radius);
    let mut coordinator = FetchCoordinator::new(renderer);
    match coordinator.query(range, source).context("Failed to fetch samples")? {
        Settlement::Applied { generation, markers } => {
            info!(generation, markers, "markers applied");
            println!("Fetched {} samples.", markers);
        }
        Settlement::Discarded { generation } => warn!(generation, "sample request was superseded"),
    }
    Ok(coordinator)
}

pub fn run_map(
    settings: &DashboardSettings,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    out: &Path,
    log: Option<&Path>,
    terrain: bool,
) -> Result<()> {
    println!("\n--- [Workflow] Marker Map ---");
    let source = connect(settings)?;
    let range = select_range(&source, settings, from, to)?.current();
    let coordinator = load_markers(&source, settings, range)?;
    let renderer = coordinator.renderer();

    if let Some(log_path) = log {
        let label = log_path.display().to_string();
        let mut marker_log = MarkerLog::create(&label)?;
        let generation = coordinator.applied_generation().unwrap_or_default();
        let rows = marker_log.log_markers(generation, &range.display_label(), renderer.markers())?;
        println!("Wrote {} marker rows to '{}'.", rows, label);
    }

    let layer = if terrain { BaseLayer::Terrain } else { BaseLayer::default() };
    let caption = format!("Microplastic samples, {}", range.display_label());
    plotting::draw_marker_map(out, renderer.surface(), &MapView::LAGUNA_DE_BAY, layer, &caption)?;
    println!("Switch layer: {}", layer.toggle_label());
    Ok(())
}

pub fn run_chart(settings: &DashboardSettings, mode: TimeseriesMode, out: &Path, drill: Option<usize>) -> Result<()> {
    println!("\n--- [Workflow] Density Chart ---");
    let source = connect(settings)?;
    let mut chart = TimeseriesChart::new(mode);
    chart.replace(source.timeseries(mode).context("Failed to fetch time series")?);
    if chart.is_empty() {
        println!("No {} data available.", mode);
        return Ok(());
    }

    plotting::draw_density_chart(out, &chart)?;

    if let Some(index) = drill {
        let Some(target) = chart.drill_down(index) else {
            bail!("point {} is out of range (series has {} points)", index, chart.points().len());
        };
        let point = &chart.points()[index];
        println!("{}: {}", chart.labels()[index], value_label(point.average_density));
        println!("Details: {}", source.detailed_data_url(&target)?);
    }
    Ok(())
}

pub fn run_stats(settings: &DashboardSettings, from: Option<NaiveDate>, to: Option<NaiveDate>, json: bool) -> Result<()> {
    let source = connect(settings)?;
    let state = select_range(&source, settings, from, to)?;
    let range = state.current();
    let stats = SidebarStats::from_outcomes(
        &state,
        &source.total_samples(&range),
        &source.average_density(&range),
        &source.latest_date(),
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Total Samples: {}", stats.total_samples);
        println!("Average Density: {}", stats.average_density);
        println!("{}", stats.last_updated);
        println!("Newest Sample: {}", stats.newest_sample);
    }
    Ok(())
}

pub fn run_inspect(
    settings: &DashboardSettings,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    (lat, lon): (f64, f64),
    preview: bool,
    html: bool,
) -> Result<()> {
    println!("\n--- [Workflow] Inspect Sample ---");
    let source = connect(settings)?;
    let range = select_range(&source, settings, from, to)?.current();
    let coordinator = load_markers(&source, settings, range)?;

    let Some((index, marker)) = coordinator.renderer().nearest(lat, lon) else {
        println!("No samples in {}.", range.display_label());
        return Ok(());
    };
    let popup = PopupId(index as u64);
    let mut popups = PopupInteractionController::new(ConsolePage::default());
    popups.popup_opened(popup, marker.record.image_url.as_deref());
    if html {
        println!("{}", popup_html(&marker.record));
    } else {
        println!("{}", popup_text(&marker.record));
    }

    if preview {
        if marker.record.image_url.is_none() {
            println!("This sample has no image to preview.");
        } else {
            popups.image_clicked(popup);
            // A click on the image itself keeps the preview open.
            popups.overlay_clicked(OverlayTarget::Image);
            popups.key_pressed("Escape");
        }
    }

    popups.popup_closed(popup);
    info!(listeners = popups.page().bound().len(), "popup closed");
    Ok(())
}
