//! In-memory stand-ins for the map widget and the popup page, used to drive
//! the core components from the command line.

use lakewatch_core::markers::{MapSurface, Marker, MarkerVisual};
use lakewatch_core::popup::{Listener, PreviewSurface};
use tracing::debug;

/// Collects the markers currently attached so they can be plotted afterwards.
#[derive(Debug, Default)]
pub struct PlotSurface {
    slots: Vec<Option<MarkerVisual>>,
}

impl PlotSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attached(&self) -> impl Iterator<Item = &MarkerVisual> {
        self.slots.iter().flatten()
    }

    pub fn attached_count(&self) -> usize {
        self.attached().count()
    }
}

impl MapSurface for PlotSurface {
    type Handle = usize;

    fn add_marker(&mut self, marker: &Marker) -> usize {
        self.slots.push(Some(marker.visual));
        self.slots.len() - 1
    }

    fn remove_marker(&mut self, handle: usize) {
        if let Some(slot) = self.slots.get_mut(handle) {
            *slot = None;
        }
    }
}

/// Echoes page-level listener and overlay changes to the terminal.
#[derive(Debug, Default)]
pub struct ConsolePage {
    bound: Vec<Listener>,
}

impl ConsolePage {
    pub fn bound(&self) -> &[Listener] {
        &self.bound
    }
}

impl PreviewSurface for ConsolePage {
    fn bind(&mut self, listener: Listener) {
        debug!(?listener, "bind");
        self.bound.push(listener);
    }

    fn unbind(&mut self, listener: Listener) {
        debug!(?listener, "unbind");
        self.bound.retain(|l| *l != listener);
    }

    fn show_overlay(&mut self, image_url: &str) {
        println!("  [Preview] showing {}", image_url);
    }

    fn hide_overlay(&mut self) {
        println!("  [Preview] hidden");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lakewatch_core::gradient::ColorGradient;
    use lakewatch_core::markers::{MarkerSetRenderer, RadiusScale};
    use lakewatch_core::popup::{PopupId, PopupInteractionController};
    use lakewatch_schemas::sample::SampleRecord;
    use std::collections::BTreeMap;

    fn record(density: f64) -> SampleRecord {
        SampleRecord {
            latitude: 14.3,
            longitude: 121.2,
            density,
            collected_at: NaiveDate::from_ymd_opt(2025, 4, 3).unwrap().and_hms_opt(8, 0, 0).unwrap(),
            composition: BTreeMap::new(),
            image_url: Some("a.jpg".into()),
            annotated_image_url: None,
        }
    }

    #[test]
    fn rerender_leaves_only_the_new_markers_attached() {
        let mut renderer = MarkerSetRenderer::new(PlotSurface::new(), ColorGradient::default(), RadiusScale::default());
        renderer.render(vec![record(0.01), record(0.02), record(0.03)]);
        renderer.render(vec![record(0.05)]);
        assert_eq!(renderer.surface().attached_count(), 1);
        renderer.clear();
        assert_eq!(renderer.surface().attached_count(), 0);
    }

    #[test]
    fn console_page_tracks_bound_listeners() {
        let mut popups = PopupInteractionController::new(ConsolePage::default());
        popups.popup_opened(PopupId(0), Some("a.jpg"));
        popups.image_clicked(PopupId(0));
        assert!(popups.page().bound().contains(&Listener::EscapeKey));
        popups.popup_closed(PopupId(0));
        assert!(popups.page().bound().is_empty());
    }
}
