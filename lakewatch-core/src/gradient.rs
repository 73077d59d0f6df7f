//! Piecewise-linear density-to-color mapping.

use crate::error::DashboardError;
use lakewatch_schemas::color::{ColorStop, Rgb};

/// Stops used by the dashboard map, violet (clean) through red (dense).
pub const DEFAULT_STOPS: [ColorStop; 7] = [
    ColorStop::new(0.0, Rgb::new(0x8a, 0x2b, 0xe2)),
    ColorStop::new(0.025, Rgb::new(0x4b, 0x00, 0x82)),
    ColorStop::new(0.05, Rgb::new(0x00, 0x00, 0xff)),
    ColorStop::new(0.075, Rgb::new(0x00, 0xff, 0x00)),
    ColorStop::new(0.1, Rgb::new(0xff, 0xff, 0x00)),
    ColorStop::new(0.125, Rgb::new(0xff, 0x80, 0x00)),
    ColorStop::new(0.15, Rgb::new(0xff, 0x00, 0x00)),
];

/// An ordered, immutable set of color stops.
///
/// Densities at or above the last threshold saturate to the last color.
/// Densities below the first threshold, including negative values and NaN,
/// take the first color.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorGradient {
    stops: Vec<ColorStop>,
}

impl ColorGradient {
    /// Sorts the stops by threshold and validates them.
    ///
    /// # Errors
    ///
    /// Returns `DashboardError::InvalidGradient` for fewer than two stops,
    /// non-finite thresholds, or duplicate thresholds.
    pub fn new(mut stops: Vec<ColorStop>) -> Result<Self, DashboardError> {
        if stops.len() < 2 {
            return Err(DashboardError::InvalidGradient(format!(
                "need at least 2 stops, got {}",
                stops.len()
            )));
        }
        if let Some(bad) = stops.iter().find(|s| !s.threshold.is_finite()) {
            return Err(DashboardError::InvalidGradient(format!(
                "threshold {} is not finite",
                bad.threshold
            )));
        }
        stops.sort_by(|a, b| a.threshold.total_cmp(&b.threshold));
        if let Some(pair) = stops.windows(2).find(|w| w[0].threshold >= w[1].threshold) {
            return Err(DashboardError::InvalidGradient(format!(
                "thresholds must be strictly increasing, {} repeats",
                pair[1].threshold
            )));
        }
        Ok(Self { stops })
    }

    pub fn stops(&self) -> &[ColorStop] {
        &self.stops
    }

    pub fn color_for(&self, density: f64) -> Rgb {
        let first = self.stops[0];
        let last = self.stops[self.stops.len() - 1];

        if density >= last.threshold {
            return last.color;
        }
        // NaN fails every comparison and lands here too.
        if !(density >= first.threshold) {
            return first.color;
        }

        self.stops
            .windows(2)
            .find(|w| w[0].threshold <= density && density < w[1].threshold)
            .map(|w| interpolate(&w[0], &w[1], density))
            .unwrap_or(first.color)
    }
}

impl Default for ColorGradient {
    fn default() -> Self {
        Self {
            stops: DEFAULT_STOPS.to_vec(),
        }
    }
}

fn interpolate(lo: &ColorStop, hi: &ColorStop, density: f64) -> Rgb {
    let factor = ((density - lo.threshold) / (hi.threshold - lo.threshold)).clamp(0.0, 1.0);
    let (lo_c, hi_c) = (lo.color.channels(), hi.color.channels());
    let mut out = [0u8; 3];
    for i in 0..3 {
        let (a, b) = (f64::from(lo_c[i]), f64::from(hi_c[i]));
        out[i] = (a + factor * (b - a)).round().clamp(0.0, 255.0) as u8;
    }
    Rgb::from_channels(out)
}
