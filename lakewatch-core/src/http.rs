//! Blocking JSON-over-HTTP client for the dashboard data server.

use crate::decode::decode_samples;
use crate::error::DashboardError;
use crate::fetch::{CancellationToken, SampleSource};
use crate::range::QueryRange;
use crate::timeseries::{DrillDown, DETAILED_DATA_PATH};
use lakewatch_schemas::api::{
    AverageDensityResponse, DateRangeResponse, LatestDateResponse, TimeseriesMode, TimeseriesPoint,
    TotalSamplesResponse,
};
use lakewatch_schemas::sample::SampleRecord;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

pub struct HttpDataSource {
    base_url: String,
    client: Client,
}

impl HttpDataSource {
    pub fn new(base_url: &str) -> Result<Self, DashboardError> {
        let client = Client::builder()
            .build()
            .map_err(|e| DashboardError::ConfigError(format!("cannot build HTTP client: {}", e)))?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: &str, client: Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub fn date_range(&self) -> Result<DateRangeResponse, DashboardError> {
        self.fetch_json("/date_range", self.client.get(self.url("/date_range")))
    }

    pub fn latest_date(&self) -> Result<LatestDateResponse, DashboardError> {
        self.fetch_json("/latest_date", self.client.get(self.url("/latest_date")))
    }

    pub fn timeseries(&self, mode: TimeseriesMode) -> Result<Vec<TimeseriesPoint>, DashboardError> {
        let request = self
            .client
            .get(self.url("/timeseries_data"))
            .query(&[("mode", mode.as_str())]);
        self.fetch_json("/timeseries_data", request)
    }

    pub fn total_samples(&self, range: &QueryRange) -> Result<TotalSamplesResponse, DashboardError> {
        self.post_range("/total_samples", range)
    }

    pub fn average_density(&self, range: &QueryRange) -> Result<AverageDensityResponse, DashboardError> {
        self.post_range("/average_density", range)
    }

    /// Absolute URL of the detailed page for a chart point. Not fetched; it is a navigation target.
    pub fn detailed_data_url(&self, target: &DrillDown) -> Result<String, DashboardError> {
        let mut url = Url::parse(&self.url(DETAILED_DATA_PATH))
            .map_err(|e| DashboardError::ConfigError(format!("invalid server URL '{}': {}", self.base_url, e)))?;
        url.query_pairs_mut()
            .append_pair("date", &target.date)
            .append_pair("mode", target.mode.as_str());
        Ok(url.into())
    }

    fn post_range<T: DeserializeOwned>(&self, endpoint: &str, range: &QueryRange) -> Result<T, DashboardError> {
        let request = self.client.post(self.url(endpoint)).json(&range.to_wire());
        self.fetch_json(endpoint, request)
    }

    fn fetch_json<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T, DashboardError> {
        let body = send(endpoint, request)?;
        serde_json::from_str(&body).map_err(|e| DashboardError::malformed(endpoint, e))
    }
}

impl SampleSource for HttpDataSource {
    #[instrument(skip_all, fields(range = %range.display_label()))]
    fn fetch_samples(&self, range: &QueryRange, token: &CancellationToken) -> Result<Vec<SampleRecord>, DashboardError> {
        token.check()?;
        let request = self.client.post(self.url("/filter_markers")).json(&range.to_wire());
        let body = send("/filter_markers", request)?;
        // The blocking transport cannot abort mid-flight; drop the body if superseded meanwhile.
        token.check()?;
        let records = decode_samples(&body)?;
        debug!(samples = records.len(), "fetched samples");
        Ok(records)
    }
}

fn send(endpoint: &str, request: RequestBuilder) -> Result<String, DashboardError> {
    let response = request.send().map_err(|e| DashboardError::network(endpoint, e))?;
    let status = response.status();
    if !status.is_success() {
        return Err(DashboardError::network(endpoint, format!("server responded with {}", status)));
    }
    response
        .text()
        .map_err(|e| DashboardError::network(endpoint, format!("failed to read body: {}", e)))
}
