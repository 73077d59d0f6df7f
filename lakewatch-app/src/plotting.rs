//! This module draws the marker map and the density chart to image files.

use crate::surface::PlotSurface;
use anyhow::{bail, Result};
use lakewatch_core::basemap::{BaseLayer, MapView};
use lakewatch_core::markers::{BORDER_WIDTH, FILL_OPACITY};
use lakewatch_core::timeseries::{value_label, TimeseriesChart};
use lakewatch_schemas::color::Rgb;
use plotters::prelude::*;
use std::path::Path;

fn rgb(color: Rgb) -> RGBColor {
    let [r, g, b] = color.channels();
    RGBColor(r, g, b)
}

fn background(layer: BaseLayer) -> RGBColor {
    match layer {
        BaseLayer::Light => RGBColor(245, 246, 248),
        BaseLayer::Terrain => RGBColor(222, 230, 205),
    }
}

/// Draws every attached marker inside the map view bounds as an SVG.
pub fn draw_marker_map(
    out: &Path,
    surface: &PlotSurface,
    view: &MapView,
    layer: BaseLayer,
    caption: &str,
) -> Result<()> {
    println!("[Plotting] Drawing {} markers on the {} layer...", surface.attached_count(), layer);

    let root = SVGBackend::new(out, (1024, 1024)).into_drawing_area();
    root.fill(&background(layer))?;

    let mut chart = ChartBuilder::on(&root)
        .caption(caption, ("sans-serif", 30).into_font())
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(
            view.south_west.1..view.north_east.1,
            view.south_west.0..view.north_east.0,
        )?;

    chart
        .configure_mesh()
        .x_desc("Longitude")
        .y_desc("Latitude")
        .light_line_style(&WHITE.mix(0.4))
        .draw()?;

    let visible: Vec<_> = surface.attached().filter(|m| view.contains(m.position)).collect();
    let skipped = surface.attached_count() - visible.len();
    if skipped > 0 {
        println!("[Plotting] Warning: {} markers fall outside the map bounds.", skipped);
    }

    chart.draw_series(visible.iter().map(|m| {
        let (lat, lon) = m.position;
        Circle::new((lon, lat), m.radius, rgb(m.fill).mix(FILL_OPACITY).filled())
    }))?;
    chart.draw_series(visible.iter().map(|m| {
        let (lat, lon) = m.position;
        Circle::new((lon, lat), m.radius, WHITE.stroke_width(BORDER_WIDTH as u32))
    }))?;

    root.present()?;
    println!("[Plotting] Map saved to '{}'.", out.display());
    Ok(())
}

/// Draws the average density series as a line chart PNG with one labelled tick per point.
pub fn draw_density_chart(out: &Path, chart_data: &TimeseriesChart) -> Result<()> {
    let Some((lo, hi)) = chart_data.value_bounds() else {
        bail!("no {} points to plot", chart_data.mode());
    };
    println!("[Plotting] Drawing {} {} points...", chart_data.points().len(), chart_data.mode());

    let labels = chart_data.labels();
    let last = (labels.len() - 1) as f64;
    let top = if hi > lo { hi * 1.1 } else { hi + 1.0 };
    let bottom = lo.min(0.0);

    let root = BitMapBackend::new(out, (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!("Average Microplastic Density ({})", chart_data.mode()),
            ("sans-serif", 40).into_font(),
        )
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..last + 0.5, bottom..top)?;

    let x_formatter = |x: &f64| {
        let index = x.round();
        if (x - index).abs() > 1e-6 || index < 0.0 {
            return String::new();
        }
        labels.get(index as usize).cloned().unwrap_or_default()
    };
    chart
        .configure_mesh()
        .x_labels(labels.len().min(12))
        .x_label_formatter(&x_formatter)
        .y_label_formatter(&|y| value_label(*y))
        .x_desc("Date")
        .y_desc("Average density")
        .draw()?;

    let line = RGBColor(75, 192, 192);
    chart
        .draw_series(LineSeries::new(
            chart_data.points().iter().enumerate().map(|(i, p)| (i as f64, p.average_density)),
            line.stroke_width(2),
        ))?
        .label("Average density (pcs/cm³)")
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line.filled()));
    chart.draw_series(
        chart_data
            .points()
            .iter()
            .enumerate()
            .map(|(i, p)| Circle::new((i as f64, p.average_density), 4, line.filled())),
    )?;

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    root.present()?;
    println!("[Plotting] Chart saved to '{}'.", out.display());
    Ok(())
}
