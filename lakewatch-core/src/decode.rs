//! Validation of loosely-typed server payloads into `SampleRecord`s.

use crate::error::DashboardError;
use chrono::{NaiveDate, NaiveDateTime};
use lakewatch_schemas::sample::{NumberOrText, SampleRecord, WireSample};
use std::collections::BTreeMap;

pub const WIRE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const FILTER_ENDPOINT: &str = "/filter_markers";
const PERCENT_SUM_TOLERANCE: f64 = 1e-6;

/// Decodes a full `/filter_markers` body. One bad element rejects the whole response.
pub fn decode_samples(body: &str) -> Result<Vec<SampleRecord>, DashboardError> {
    let wire: Vec<WireSample> = serde_json::from_str(body)
        .map_err(|e| DashboardError::malformed(FILTER_ENDPOINT, e))?;
    wire.into_iter()
        .enumerate()
        .map(|(i, sample)| {
            decode_sample(sample).map_err(|reason| {
                DashboardError::malformed(FILTER_ENDPOINT, format!("sample {}: {}", i, reason))
            })
        })
        .collect()
}

pub fn decode_sample(wire: WireSample) -> Result<SampleRecord, String> {
    if !wire.lat.is_finite() || !wire.lon.is_finite() {
        return Err(format!("non-finite position ({}, {})", wire.lat, wire.lon));
    }

    let collected_at = parse_wire_datetime(&wire.date)
        .ok_or_else(|| format!("unreadable date '{}'", wire.date))?;

    let mut composition = BTreeMap::new();
    for (polymer, raw) in wire.percentages() {
        let Some(raw) = raw else { continue };
        let percent = leading_number(raw).ok_or_else(|| format!("unreadable {} percentage", polymer.abbreviation()))?;
        if !(0.0..=100.0).contains(&percent) {
            return Err(format!("{} percentage {} outside 0..=100", polymer.abbreviation(), percent));
        }
        composition.insert(polymer, percent);
    }
    let total: f64 = composition.values().sum();
    if total > 100.0 + PERCENT_SUM_TOLERANCE {
        return Err(format!("polymer percentages sum to {}", total));
    }

    Ok(SampleRecord {
        latitude: wire.lat,
        longitude: wire.lon,
        density: wire.density.as_ref().and_then(leading_number).unwrap_or(0.0),
        collected_at,
        composition,
        image_url: wire.image.filter(|s| !s.is_empty()),
        annotated_image_url: wire.annotated_image_url.filter(|s| !s.is_empty()),
    })
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, or a bare `YYYY-MM-DD` as midnight.
pub fn parse_wire_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, WIRE_DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Reads the leading decimal number of a value, so `"0.5 pcs/cm³"` gives 0.5.
fn leading_number(value: &NumberOrText) -> Option<f64> {
    match value {
        NumberOrText::Number(n) => n.is_finite().then_some(*n),
        NumberOrText::Text(text) => {
            let text = text.trim_start();
            let end = text
                .char_indices()
                .take_while(|&(i, c)| c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+')))
                .map(|(i, c)| i + c.len_utf8())
                .last()?;
            // Longest prefix that parses, so "1.2.3" reads as 1.2.
            (1..=end)
                .rev()
                .find_map(|n| text[..n].parse::<f64>().ok())
                .filter(|v| v.is_finite())
        }
    }
}
