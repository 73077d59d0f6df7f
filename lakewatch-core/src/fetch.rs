//! Latest-wins request coordination between range changes and the marker renderer.
//!
//! Every range change issues a new request and synchronously cancels the
//! previous one. A transport is free to ignore the cancellation token: late
//! results are matched against the current generation on arrival and
//! discarded when stale, so the rendered markers always come from the most
//! recently issued request.

use crate::error::DashboardError;
use crate::markers::{MapSurface, MarkerSetRenderer};
use crate::range::QueryRange;
use lakewatch_schemas::sample::SampleRecord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// A shared flag a transport may poll to abandon superseded work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// `Err(Cancelled)` once cancelled; lets transports bail out with `?`.
    pub fn check(&self) -> Result<(), DashboardError> {
        if self.is_cancelled() {
            Err(DashboardError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Anything that can answer a range query with sample records.
pub trait SampleSource {
    fn fetch_samples(&self, range: &QueryRange, token: &CancellationToken) -> Result<Vec<SampleRecord>, DashboardError>;
}

/// Handle for one issued request.
#[derive(Debug, Clone)]
pub struct RequestTicket {
    generation: u64,
    range: QueryRange,
    token: CancellationToken,
}

impl RequestTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn range(&self) -> &QueryRange {
        &self.range
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Applied { generation: u64, markers: usize },
    Discarded { generation: u64 },
}

/// Owns the marker renderer; the only caller of `MarkerSetRenderer::render`.
pub struct FetchCoordinator<S: MapSurface> {
    renderer: MarkerSetRenderer<S>,
    generation: u64,
    active: Option<RequestTicket>,
    applied_generation: Option<u64>,
}

impl<S: MapSurface> FetchCoordinator<S> {
    pub fn new(renderer: MarkerSetRenderer<S>) -> Self {
        Self {
            renderer,
            generation: 0,
            active: None,
            applied_generation: None,
        }
    }

    /// Starts a request for `range`, cancelling whichever request was outstanding.
    pub fn issue(&mut self, range: QueryRange) -> RequestTicket {
        if let Some(previous) = self.active.take() {
            previous.token.cancel();
            debug!(generation = previous.generation, "superseded outstanding request");
        }
        self.generation += 1;
        let ticket = RequestTicket {
            generation: self.generation,
            range,
            token: CancellationToken::new(),
        };
        self.active = Some(ticket.clone());
        debug!(generation = ticket.generation, range = %range.display_label(), "issued request");
        ticket
    }

    /// Applies the outcome of `ticket`'s request.
    ///
    /// Only the outstanding request is applied, and only once. Stale, cancelled
    /// or already settled outcomes are discarded without touching the markers.
    /// A failure of the current request ends it and is returned; the markers
    /// from the last successful request stay on the map.
    pub fn settle(
        &mut self,
        ticket: &RequestTicket,
        outcome: Result<Vec<SampleRecord>, DashboardError>,
    ) -> Result<Settlement, DashboardError> {
        let discarded = Settlement::Discarded {
            generation: ticket.generation,
        };
        let outstanding = self.active.as_ref().map(RequestTicket::generation);
        if outstanding != Some(ticket.generation) || ticket.token.is_cancelled() {
            debug!(generation = ticket.generation, latest = self.generation, "discarded stale or settled result");
            return Ok(discarded);
        }

        match outcome {
            Ok(records) => {
                self.active = None;
                self.renderer.render(records);
                self.applied_generation = Some(ticket.generation);
                Ok(Settlement::Applied {
                    generation: ticket.generation,
                    markers: self.renderer.len(),
                })
            }
            Err(DashboardError::Cancelled) => {
                self.active = None;
                Ok(discarded)
            }
            Err(err) => {
                self.active = None;
                warn!(generation = ticket.generation, error = %err, "marker refresh failed; keeping previous markers");
                Err(err)
            }
        }
    }

    /// Issues, fetches, and settles in one step for synchronous sources.
    pub fn query(&mut self, range: QueryRange, source: &impl SampleSource) -> Result<Settlement, DashboardError> {
        let ticket = self.issue(range);
        let outcome = source.fetch_samples(ticket.range(), ticket.token());
        self.settle(&ticket, outcome)
    }

    /// Cancels the outstanding request, if any.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            active.token.cancel();
        }
    }

    pub fn has_outstanding(&self) -> bool {
        self.active.is_some()
    }

    pub fn latest_generation(&self) -> u64 {
        self.generation
    }

    pub fn applied_generation(&self) -> Option<u64> {
        self.applied_generation
    }

    pub fn renderer(&self) -> &MarkerSetRenderer<S> {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut MarkerSetRenderer<S> {
        &mut self.renderer
    }

    /// Detaches all markers and forgets any outstanding request.
    pub fn reset(&mut self) {
        self.cancel();
        self.renderer.clear();
        self.applied_generation = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gradient::ColorGradient;
    use crate::markers::{Marker, RadiusScale};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct CountingSurface {
        live: usize,
        densities: Vec<f64>,
    }

    impl MapSurface for CountingSurface {
        type Handle = ();

        fn add_marker(&mut self, marker: &Marker) -> Self::Handle {
            self.live += 1;
            self.densities.push(marker.record.density);
        }

        fn remove_marker(&mut self, _handle: Self::Handle) {
            self.live -= 1;
            self.densities.remove(0);
        }
    }

    fn coordinator() -> FetchCoordinator<CountingSurface> {
        FetchCoordinator::new(MarkerSetRenderer::new(
            CountingSurface::default(),
            ColorGradient::default(),
            RadiusScale::default(),
        ))
    }

    fn range(first: u32, last: u32) -> QueryRange {
        QueryRange::for_days(
            NaiveDate::from_ymd_opt(2025, 4, first).unwrap(),
            NaiveDate::from_ymd_opt(2025, 4, last).unwrap(),
        )
        .unwrap()
    }

    fn batch(densities: &[f64]) -> Vec<SampleRecord> {
        densities
            .iter()
            .map(|&density| SampleRecord {
                latitude: 14.3,
                longitude: 121.2,
                density,
                collected_at: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap().and_hms_opt(0, 0, 0).unwrap(),
                composition: BTreeMap::new(),
                image_url: None,
                annotated_image_url: None,
            })
            .collect()
    }

    #[test]
    fn issuing_cancels_the_previous_token_immediately() {
        let mut c = coordinator();
        let a = c.issue(range(1, 10));
        assert!(!a.token().is_cancelled());
        let b = c.issue(range(1, 20));
        assert!(a.token().is_cancelled());
        assert!(!b.token().is_cancelled());
        assert_eq!(b.generation(), 2);
    }

    #[test]
    fn late_result_of_superseded_request_is_discarded() {
        let mut c = coordinator();
        let a = c.issue(range(1, 10));
        let b = c.issue(range(1, 20));

        let applied = c.settle(&b, Ok(batch(&[0.02, 0.03]))).unwrap();
        assert_eq!(applied, Settlement::Applied { generation: 2, markers: 2 });

        // A resolves after B and must not overwrite it.
        let late = c.settle(&a, Ok(batch(&[0.09]))).unwrap();
        assert_eq!(late, Settlement::Discarded { generation: 1 });
        assert_eq!(c.renderer().surface().densities, vec![0.02, 0.03]);
        assert_eq!(c.applied_generation(), Some(2));
    }

    #[test]
    fn cancelled_outcome_never_renders() {
        let mut c = coordinator();
        let a = c.issue(range(1, 10));
        assert_eq!(
            c.settle(&a, Err(DashboardError::Cancelled)).unwrap(),
            Settlement::Discarded { generation: 1 }
        );
        assert_eq!(c.renderer().surface().live, 0);
        assert_eq!(c.applied_generation(), None);
    }

    #[test]
    fn failure_keeps_previous_markers_and_surfaces_error() {
        let mut c = coordinator();
        let a = c.issue(range(1, 10));
        c.settle(&a, Ok(batch(&[0.01]))).unwrap();

        let b = c.issue(range(1, 20));
        let err = c
            .settle(&b, Err(DashboardError::network("/filter_markers", "connection reset")))
            .unwrap_err();
        assert!(matches!(err, DashboardError::NetworkFailure { .. }));
        assert!(!err.is_cancelled());
        assert_eq!(c.renderer().surface().densities, vec![0.01]);
        assert!(!c.has_outstanding());
    }

    #[test]
    fn explicit_cancel_discards_the_outstanding_request() {
        let mut c = coordinator();
        let a = c.issue(range(1, 10));
        c.cancel();
        assert_eq!(c.settle(&a, Ok(batch(&[0.5]))).unwrap(), Settlement::Discarded { generation: 1 });
        assert!(c.renderer().is_empty());
    }

    #[test]
    fn each_request_settles_at_most_once() {
        let mut c = coordinator();
        let a = c.issue(range(1, 10));
        c.settle(&a, Ok(batch(&[0.01]))).unwrap();
        assert_eq!(c.settle(&a, Ok(batch(&[0.07, 0.08]))).unwrap(), Settlement::Discarded { generation: 1 });
        assert_eq!(c.renderer().surface().densities, vec![0.01]);

        let b = c.issue(range(1, 20));
        c.settle(&b, Err(DashboardError::network("/filter_markers", "HTTP 500"))).unwrap_err();
        assert_eq!(c.settle(&b, Ok(batch(&[0.09]))).unwrap(), Settlement::Discarded { generation: 2 });
        assert_eq!(c.renderer().surface().densities, vec![0.01]);
        assert_eq!(c.applied_generation(), Some(1));
    }

    struct FixedSource(Vec<f64>);

    impl SampleSource for FixedSource {
        fn fetch_samples(&self, _range: &QueryRange, token: &CancellationToken) -> Result<Vec<SampleRecord>, DashboardError> {
            token.check()?;
            Ok(batch(&self.0))
        }
    }

    #[test]
    fn query_runs_the_whole_cycle() {
        let mut c = coordinator();
        let settlement = c.query(range(1, 30), &FixedSource(vec![0.0, 0.1, 0.2])).unwrap();
        assert_eq!(settlement, Settlement::Applied { generation: 1, markers: 3 });
        assert!(!c.has_outstanding());

        c.reset();
        assert!(c.renderer().is_empty());
        assert_eq!(c.applied_generation(), None);
    }
}
