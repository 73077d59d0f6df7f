use crate::error::DashboardError;
use crate::markers::Marker;
use csv::Writer;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// One row per marker per applied render cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerLogEntry {
    pub generation: u64,
    pub range: String,
    pub collected_at: String,
    pub latitude: f64,
    pub longitude: f64,
    pub density: f64,
    pub radius: f64,
    pub fill: String,
    pub composition_json: String,
    pub image_url: String,
    pub annotated_image_url: String,
}

impl MarkerLogEntry {
    pub fn from_marker(generation: u64, range: &str, marker: &Marker) -> Result<Self, DashboardError> {
        let record = &marker.record;
        Ok(Self {
            generation,
            range: range.to_string(),
            collected_at: record.collected_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            latitude: record.latitude,
            longitude: record.longitude,
            density: record.density,
            radius: marker.visual.radius,
            fill: marker.visual.fill.to_hex(),
            composition_json: serde_json::to_string(&record.composition)?,
            image_url: record.image_url.clone().unwrap_or_default(),
            annotated_image_url: record.annotated_image_url.clone().unwrap_or_default(),
        })
    }
}

pub struct MarkerLog<W: io::Write> {
    writer: Writer<W>,
    label: String,
}

impl MarkerLog<fs::File> {
    pub fn create(path: &str) -> Result<Self, DashboardError> {
        let writer = Writer::from_path(path).map_err(|e| DashboardError::CsvError(path.to_string(), e))?;
        Ok(Self {
            writer,
            label: path.to_string(),
        })
    }
}

impl<W: io::Write> MarkerLog<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: Writer::from_writer(writer),
            label: "<writer>".to_string(),
        }
    }

    pub fn log_markers<'a>(
        &mut self,
        generation: u64,
        range: &str,
        markers: impl IntoIterator<Item = &'a Marker>,
    ) -> Result<usize, DashboardError> {
        let mut rows = 0;
        for marker in markers {
            let entry = MarkerLogEntry::from_marker(generation, range, marker)?;
            self.writer
                .serialize(entry)
                .map_err(|e| DashboardError::CsvError(self.label.clone(), e))?;
            rows += 1;
        }
        self.writer
            .flush()
            .map_err(|e| DashboardError::FileIO(self.label.clone(), e))?;
        Ok(rows)
    }

    pub fn into_inner(self) -> Result<W, DashboardError> {
        let label = self.label;
        self.writer
            .into_inner()
            .map_err(|e| DashboardError::FileIO(label, e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::MarkerVisual;
    use chrono::NaiveDate;
    use lakewatch_schemas::color::Rgb;
    use lakewatch_schemas::sample::{Polymer, SampleRecord};
    use std::collections::BTreeMap;

    #[test]
    fn writes_header_and_one_row_per_marker() {
        let mut composition = BTreeMap::new();
        composition.insert(Polymer::Polypropylene, 35.5);
        let marker = Marker {
            visual: MarkerVisual {
                position: (14.37, 121.25),
                radius: 9.0,
                fill: Rgb::new(0, 0, 255),
            },
            record: SampleRecord {
                latitude: 14.37,
                longitude: 121.25,
                density: 0.05,
                collected_at: NaiveDate::from_ymd_opt(2025, 4, 2).unwrap().and_hms_opt(9, 15, 0).unwrap(),
                composition,
                image_url: Some("s1.jpg".into()),
                annotated_image_url: None,
            },
        };

        let mut log = MarkerLog::from_writer(Vec::new());
        assert_eq!(log.log_markers(3, "2025-04-01 - 2025-04-30", [&marker, &marker]).unwrap(), 2);
        let csv = String::from_utf8(log.into_inner().unwrap()).unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("generation,range,collected_at,latitude,longitude,density,radius,fill"));
        assert!(lines[1].starts_with("3,2025-04-01 - 2025-04-30,2025-04-02 09:15:00,14.37,121.25,0.05,9.0,#0000ff"));
        assert!(lines[1].contains("polypropylene"));
    }
}
