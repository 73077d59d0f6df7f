use chrono::NaiveDate;
use lakewatch_core::error::DashboardError;
use lakewatch_core::fetch::{CancellationToken, FetchCoordinator, Settlement};
use lakewatch_core::gradient::ColorGradient;
use lakewatch_core::markers::{MapSurface, Marker, MarkerSetRenderer, RadiusScale};
use lakewatch_core::popup::{Listener, OverlayTarget, PopupId, PopupInteractionController, PopupState, PreviewSurface};
use lakewatch_core::range::RangeQueryState;
use lakewatch_schemas::sample::SampleRecord;
use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

#[derive(Default)]
struct RecordingMap {
    next: u64,
    live: HashMap<u64, f64>,
}

impl MapSurface for RecordingMap {
    type Handle = u64;

    fn add_marker(&mut self, marker: &Marker) -> u64 {
        self.next += 1;
        self.live.insert(self.next, marker.record.density);
        self.next
    }

    fn remove_marker(&mut self, handle: u64) {
        self.live.remove(&handle);
    }
}

impl RecordingMap {
    fn densities(&self) -> Vec<f64> {
        let mut d: Vec<f64> = self.live.values().copied().collect();
        d.sort_by(f64::total_cmp);
        d
    }
}

#[derive(Default)]
struct RecordingPage {
    bound: Vec<Listener>,
    overlay_visible: bool,
}

impl PreviewSurface for RecordingPage {
    fn bind(&mut self, listener: Listener) {
        self.bound.push(listener);
    }

    fn unbind(&mut self, listener: Listener) {
        self.bound.retain(|l| *l != listener);
    }

    fn show_overlay(&mut self, _image_url: &str) {
        assert!(!self.overlay_visible);
        self.overlay_visible = true;
    }

    fn hide_overlay(&mut self) {
        self.overlay_visible = false;
    }
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 4, d).unwrap()
}

fn sample(lat: f64, lon: f64, density: f64) -> SampleRecord {
    SampleRecord {
        latitude: lat,
        longitude: lon,
        density,
        collected_at: day(2).and_hms_opt(10, 0, 0).unwrap(),
        composition: BTreeMap::new(),
        image_url: Some(format!("https://img.example/{}.jpg", density)),
        annotated_image_url: None,
    }
}

fn coordinator() -> FetchCoordinator<RecordingMap> {
    FetchCoordinator::new(MarkerSetRenderer::new(
        RecordingMap::default(),
        ColorGradient::default(),
        RadiusScale::default(),
    ))
}

#[test]
fn slider_moves_apply_only_the_latest_result() {
    let mut range = RangeQueryState::new(Some(day(1)), day(30)).unwrap();
    let mut coordinator = coordinator();

    let first = coordinator.issue(range.set_range(day(1), day(10)).unwrap());
    let second = coordinator.issue(range.set_range(day(1), day(20)).unwrap());
    let third = coordinator.issue(range.set_range(day(5), day(25)).unwrap());

    // Responses arrive in the order 3, 1, 2.
    let applied = coordinator.settle(&third, Ok(vec![sample(14.3, 121.2, 0.07)])).unwrap();
    assert_eq!(applied, Settlement::Applied { generation: 3, markers: 1 });
    assert!(matches!(
        coordinator.settle(&first, Ok(vec![sample(14.3, 121.2, 0.01)])),
        Ok(Settlement::Discarded { .. })
    ));
    assert!(matches!(
        coordinator.settle(&second, Err(DashboardError::network("/filter_markers", "timeout"))),
        Ok(Settlement::Discarded { .. })
    ));

    assert_eq!(coordinator.renderer().surface().densities(), vec![0.07]);
    assert_eq!(third.range().to_wire().min_date, "2025-04-05 00:00:00");
}

#[test]
fn transport_on_another_thread_sees_cancellation() {
    let mut coordinator = coordinator();
    let state = RangeQueryState::new(Some(day(1)), day(30)).unwrap();

    let slow = coordinator.issue(state.current());
    let token: CancellationToken = slow.token().clone();
    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        // Polls until the request is superseded, then reports having given up.
        while !token.is_cancelled() {
            thread::sleep(Duration::from_millis(1));
        }
        tx.send(Err(DashboardError::Cancelled)).unwrap();
    });

    let fast = coordinator.issue(state.current());
    coordinator.settle(&fast, Ok(vec![sample(14.3, 121.2, 0.02)])).unwrap();

    let late = rx.recv().unwrap();
    worker.join().unwrap();
    assert_eq!(
        coordinator.settle(&slow, late).unwrap(),
        Settlement::Discarded { generation: 1 }
    );
    assert_eq!(coordinator.renderer().surface().densities(), vec![0.02]);
}

#[test]
fn failed_refresh_leaves_popup_target_markers_in_place() {
    let mut coordinator = coordinator();
    let mut range = RangeQueryState::new(Some(day(1)), day(30)).unwrap();

    let ok = coordinator.issue(range.current());
    coordinator
        .settle(&ok, Ok(vec![sample(14.30, 121.20, 0.01), sample(14.45, 121.35, 0.12)]))
        .unwrap();

    let failing = coordinator.issue(range.set_range(day(2), day(3)).unwrap());
    let err = coordinator
        .settle(&failing, Err(DashboardError::malformed("/filter_markers", "expected array")))
        .unwrap_err();
    assert!(!err.is_cancelled());
    assert_eq!(coordinator.renderer().len(), 2);

    // Click near the second marker and walk its popup through a preview.
    let (index, marker) = coordinator.renderer().nearest(14.44, 121.36).unwrap();
    assert_eq!(marker.record.density, 0.12);
    let popup = PopupId(index as u64);
    let mut popups = PopupInteractionController::new(RecordingPage::default());
    popups.popup_opened(popup, marker.record.image_url.as_deref());
    popups.image_clicked(popup);
    assert_eq!(popups.state(), PopupState::PreviewOpen(popup));
    popups.overlay_clicked(OverlayTarget::CloseButton);
    assert!(!popups.page().overlay_visible);
    popups.popup_closed(popup);
    assert!(popups.page().bound.is_empty());
}

#[test]
fn repeated_popup_cycles_leave_no_listeners() {
    let mut popups = PopupInteractionController::new(RecordingPage::default());
    for cycle in 0..10u64 {
        let popup = PopupId(cycle % 3);
        popups.popup_opened(popup, Some("img.jpg"));
        popups.image_clicked(popup);
        if cycle % 2 == 0 {
            popups.key_pressed("Escape");
        }
        let escape_handlers = popups.page().bound.iter().filter(|l| **l == Listener::EscapeKey).count();
        assert!(escape_handlers <= 1);
    }
    popups.popup_closed(PopupId(9 % 3));
    assert_eq!(popups.state(), PopupState::Closed);
    assert!(popups.page().bound.is_empty());
    assert!(!popups.page().overlay_visible);
}
