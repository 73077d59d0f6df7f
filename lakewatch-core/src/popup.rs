//! Marker popups and the full-screen sample image preview.
//!
//! Each transition is a named method on `PopupInteractionController`, and every
//! listener it binds is unbound on the way out, so a closed popup never leaves
//! a key or click handler behind.

use lakewatch_schemas::sample::SampleRecord;
use std::fmt::Write;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PopupId(pub u64);

/// A transient handler bound on the page by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Listener {
    /// Click on the sample image embedded in one popup.
    ImageClick(PopupId),
    /// Click anywhere on the preview overlay.
    OverlayClick,
    /// Key press on the document, watching for Escape.
    EscapeKey,
}

/// Where a click on the preview overlay landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayTarget {
    Backdrop,
    CloseButton,
    Image,
}

/// The page the controller binds listeners on and shows the overlay in.
pub trait PreviewSurface {
    fn bind(&mut self, listener: Listener);
    /// Must be a no-op for a listener that is not bound.
    fn unbind(&mut self, listener: Listener);
    fn show_overlay(&mut self, image_url: &str);
    fn hide_overlay(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupState {
    Closed,
    Open(PopupId),
    PreviewOpen(PopupId),
}

pub struct PopupInteractionController<P: PreviewSurface> {
    page: P,
    state: PopupState,
    image_url: Option<String>,
}

impl<P: PreviewSurface> PopupInteractionController<P> {
    pub fn new(page: P) -> Self {
        Self {
            page,
            state: PopupState::Closed,
            image_url: None,
        }
    }

    pub fn state(&self) -> PopupState {
        self.state
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    /// The map opened `popup`. Any other open popup is closed first.
    pub fn popup_opened(&mut self, popup: PopupId, image_url: Option<&str>) {
        if let Some(current) = self.current_popup() {
            self.popup_closed(current);
        }
        self.image_url = image_url.map(str::to_string);
        if self.image_url.is_some() {
            self.page.unbind(Listener::ImageClick(popup));
            self.page.bind(Listener::ImageClick(popup));
        }
        self.state = PopupState::Open(popup);
        debug!(popup = popup.0, "popup opened");
    }

    /// The sample image inside `popup` was clicked.
    pub fn image_clicked(&mut self, popup: PopupId) {
        if self.state != PopupState::Open(popup) {
            trace!(popup = popup.0, state = ?self.state, "ignoring image click");
            return;
        }
        let Some(url) = self.image_url.clone() else { return };
        self.unbind_preview_listeners();
        self.page.show_overlay(&url);
        self.page.bind(Listener::OverlayClick);
        self.page.bind(Listener::EscapeKey);
        self.state = PopupState::PreviewOpen(popup);
    }

    /// A click on the overlay closes it unless it landed on the image itself.
    pub fn overlay_clicked(&mut self, target: OverlayTarget) {
        if target != OverlayTarget::Image {
            self.close_preview();
        }
    }

    pub fn key_pressed(&mut self, key: &str) {
        if key == "Escape" {
            self.close_preview();
        }
    }

    /// Hides the overlay and drops both teardown listeners; the popup stays open.
    pub fn close_preview(&mut self) {
        if let PopupState::PreviewOpen(popup) = self.state {
            self.page.hide_overlay();
            self.unbind_preview_listeners();
            self.state = PopupState::Open(popup);
        }
    }

    /// The map closed `popup`. Close events for other popups are ignored.
    pub fn popup_closed(&mut self, popup: PopupId) {
        if self.current_popup() != Some(popup) {
            return;
        }
        if matches!(self.state, PopupState::PreviewOpen(_)) {
            self.page.hide_overlay();
        }
        self.unbind_preview_listeners();
        self.page.unbind(Listener::ImageClick(popup));
        self.image_url = None;
        self.state = PopupState::Closed;
        debug!(popup = popup.0, "popup closed");
    }

    fn current_popup(&self) -> Option<PopupId> {
        match self.state {
            PopupState::Closed => None,
            PopupState::Open(p) | PopupState::PreviewOpen(p) => Some(p),
        }
    }

    fn unbind_preview_listeners(&mut self) {
        self.page.unbind(Listener::OverlayClick);
        self.page.unbind(Listener::EscapeKey);
    }
}

/// HTML body of a marker popup.
pub fn popup_html(record: &SampleRecord) -> String {
    let mut html = String::from("<div class=\"popup-content-large\">\n");
    let _ = writeln!(html, "<b>Date:</b> {}<br>", record.collected_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(html, "<b>Density:</b> {} pcs/cm³<br>", record.density);
    if !record.composition.is_empty() {
        html.push_str("<b>Polymer Composition:</b><br>\n");
        for (polymer, percent) in &record.composition {
            let _ = writeln!(html, "&nbsp;&nbsp;• {}: <b>{}%</b><br>", escape(&polymer.to_string()), percent);
        }
    }
    if let Some(url) = &record.image_url {
        let _ = writeln!(html, "<img src=\"{}\" alt=\"Sample\" class=\"sample-image\"><br>", escape(url));
    }
    if let Some(url) = &record.annotated_image_url {
        let _ = writeln!(html, "<a href=\"{}\" target=\"_blank\">Annotated</a>", escape(url));
    }
    html.push_str("</div>");
    html
}

/// Plain-text rendering of the same content, for terminals.
pub fn popup_text(record: &SampleRecord) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Date: {}", record.collected_at.format("%Y-%m-%d %H:%M:%S"));
    let _ = writeln!(text, "Density: {} pcs/cm³", record.density);
    if !record.composition.is_empty() {
        text.push_str("Polymer Composition:\n");
        for (polymer, percent) in &record.composition {
            let _ = writeln!(text, "  • {}: {}%", polymer, percent);
        }
    }
    if let Some(url) = &record.image_url {
        let _ = writeln!(text, "Image: {}", url);
    }
    if let Some(url) = &record.annotated_image_url {
        let _ = writeln!(text, "Annotated: {}", url);
    }
    text
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
