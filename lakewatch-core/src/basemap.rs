//! Map viewport and base tile layers for the Laguna de Bay area.

use std::fmt;

/// (latitude, longitude)
pub type LatLon = (f64, f64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub south_west: LatLon,
    pub north_east: LatLon,
    pub center: LatLon,
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
}

impl MapView {
    pub const LAGUNA_DE_BAY: MapView = MapView {
        south_west: (13.9, 120.8),
        north_east: (14.9, 121.7),
        center: (14.37, 121.25),
        zoom: 11,
        min_zoom: 10,
        max_zoom: 22,
    };

    pub fn contains(&self, (lat, lon): LatLon) -> bool {
        (self.south_west.0..=self.north_east.0).contains(&lat) && (self.south_west.1..=self.north_east.1).contains(&lon)
    }

    pub fn clamp_zoom(&self, zoom: u8) -> u8 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }
}

impl Default for MapView {
    fn default() -> Self {
        Self::LAGUNA_DE_BAY
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BaseLayer {
    #[default]
    Light,
    Terrain,
}

impl BaseLayer {
    pub fn toggled(self) -> Self {
        match self {
            BaseLayer::Light => BaseLayer::Terrain,
            BaseLayer::Terrain => BaseLayer::Light,
        }
    }

    /// Caption of the toggle button: the layer a click would switch to.
    pub fn toggle_label(self) -> &'static str {
        match self.toggled() {
            BaseLayer::Light => "Light",
            BaseLayer::Terrain => "Terrain",
        }
    }

    /// Slippy-map URL template; `{z}`, `{x}`, `{y}` and `{r}` are filled by the map widget.
    pub fn tile_template(self) -> &'static str {
        match self {
            BaseLayer::Light => "https://tile.jawg.io/jawg-light/{z}/{x}/{y}{r}.png",
            BaseLayer::Terrain => "https://tile.jawg.io/jawg-terrain/{z}/{x}/{y}{r}.png",
        }
    }

    pub fn tile_url(self, access_token: &str) -> String {
        format!("{}?access-token={}", self.tile_template(), access_token)
    }
}

impl fmt::Display for BaseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BaseLayer::Light => f.write_str("light"),
            BaseLayer::Terrain => f.write_str("terrain"),
        }
    }
}
