//! Marker sizing, coloring, and full-swap rendering onto a map surface.

use crate::error::DashboardError;
use crate::gradient::ColorGradient;
use lakewatch_schemas::color::Rgb;
use lakewatch_schemas::sample::SampleRecord;
use tracing::debug;

pub const BORDER_COLOR: Rgb = Rgb::WHITE;
pub const BORDER_WIDTH: f64 = 1.0;
pub const FILL_OPACITY: f64 = 0.8;

/// The map widget markers are drawn on.
///
/// Handles are opaque to the renderer; every handle returned by `add_marker`
/// is passed back to `remove_marker` exactly once.
pub trait MapSurface {
    type Handle;

    fn add_marker(&mut self, marker: &Marker) -> Self::Handle;
    fn remove_marker(&mut self, handle: Self::Handle);
}

/// Maps a density to a circle radius relative to the densest sample in view.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusScale {
    base: f64,
    cap: f64,
}

impl RadiusScale {
    pub fn new(base: f64, cap: f64) -> Result<Self, DashboardError> {
        if !(base.is_finite() && cap.is_finite() && base > 0.0 && base <= cap) {
            return Err(DashboardError::InvalidRadiusScale { base, cap });
        }
        Ok(Self { base, cap })
    }

    pub fn base(&self) -> f64 {
        self.base
    }

    pub fn cap(&self) -> f64 {
        self.cap
    }

    /// `base * (1 + 2 * density / max_density)`, clamped to `[base, cap]`.
    /// A zero `max_density` divides by 1 instead. Never returns NaN.
    pub fn radius_for(&self, density: f64, max_density: f64) -> f64 {
        if !(density > 0.0) {
            return self.base;
        }
        let divisor = if max_density > 0.0 { max_density } else { 1.0 };
        let ratio = density / divisor;
        // inf / inf: the densest sample in the batch.
        let ratio = if ratio.is_nan() { 1.0 } else { ratio };
        (self.base * (1.0 + 2.0 * ratio)).clamp(self.base, self.cap)
    }
}

impl Default for RadiusScale {
    fn default() -> Self {
        Self { base: 6.0, cap: 15.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerVisual {
    /// (latitude, longitude)
    pub position: (f64, f64),
    pub radius: f64,
    pub fill: Rgb,
}

/// A rendered marker together with the sample it was drawn from.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub visual: MarkerVisual,
    pub record: SampleRecord,
}

/// Largest density in the batch, never below zero.
pub fn max_density(records: &[SampleRecord]) -> f64 {
    records.iter().map(|r| r.density).fold(0.0, f64::max)
}

/// Computes every marker for a batch. Pure; the renderer applies the result.
pub fn build_markers(records: Vec<SampleRecord>, gradient: &ColorGradient, scale: &RadiusScale) -> Vec<Marker> {
    let max = max_density(&records);
    records
        .into_iter()
        .map(|record| Marker {
            visual: MarkerVisual {
                position: (record.latitude, record.longitude),
                radius: scale.radius_for(record.density, max),
                fill: gradient.color_for(record.density),
            },
            record,
        })
        .collect()
}

/// Owns the marker set currently on a `MapSurface`.
pub struct MarkerSetRenderer<S: MapSurface> {
    surface: S,
    gradient: ColorGradient,
    scale: RadiusScale,
    markers: Vec<(S::Handle, Marker)>,
}

impl<S: MapSurface> MarkerSetRenderer<S> {
    pub fn new(surface: S, gradient: ColorGradient, scale: RadiusScale) -> Self {
        Self {
            surface,
            gradient,
            scale,
            markers: Vec::new(),
        }
    }

    /// Replaces the whole marker set. Every previous marker is detached
    /// before the first new one is added.
    pub fn render(&mut self, records: Vec<SampleRecord>) {
        let next = build_markers(records, &self.gradient, &self.scale);
        self.clear();
        for marker in next {
            let handle = self.surface.add_marker(&marker);
            self.markers.push((handle, marker));
        }
        debug!(markers = self.markers.len(), "marker set replaced");
    }

    pub fn clear(&mut self) {
        for (handle, _) in self.markers.drain(..) {
            self.surface.remove_marker(handle);
        }
    }

    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.markers.iter().map(|(_, marker)| marker)
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// The marker closest to a point, using an equirectangular approximation.
    pub fn nearest(&self, latitude: f64, longitude: f64) -> Option<(usize, &Marker)> {
        let lon_scale = latitude.to_radians().cos();
        self.markers()
            .enumerate()
            .map(|(i, m)| {
                let (lat, lon) = m.visual.position;
                let dy = lat - latitude;
                let dx = (lon - longitude) * lon_scale;
                (i, m, dx * dx + dy * dy)
            })
            .min_by(|a, b| a.2.total_cmp(&b.2))
            .map(|(i, m, _)| (i, m))
    }

    pub fn gradient(&self) -> &ColorGradient {
        &self.gradient
    }

    pub fn scale(&self) -> &RadiusScale {
        &self.scale
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }
}
