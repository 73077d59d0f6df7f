use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Polymer families reported by the sample classifier, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polymer {
    Polystyrene,
    Polypropylene,
    Polyethylene,
}

impl Polymer {
    pub const ALL: [Polymer; 3] = [Polymer::Polystyrene, Polymer::Polypropylene, Polymer::Polyethylene];

    pub fn name(&self) -> &'static str {
        match self {
            Polymer::Polystyrene => "Polystyrene",
            Polymer::Polypropylene => "Polypropylene",
            Polymer::Polyethylene => "Polyethylene",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Polymer::Polystyrene => "PS",
            Polymer::Polypropylene => "PP",
            Polymer::Polyethylene => "PE",
        }
    }
}

impl fmt::Display for Polymer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.abbreviation())
    }
}

/// A validated water sample, as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
    pub latitude: f64,
    pub longitude: f64,
    /// Particles per cm³.
    pub density: f64,
    /// Local (UTC+8) wall-clock collection time.
    pub collected_at: NaiveDateTime,
    /// Percentage per polymer. Need not total 100.
    pub composition: BTreeMap<Polymer, f64>,
    pub image_url: Option<String>,
    pub annotated_image_url: Option<String>,
}

/// A JSON value the server sends either as a number or as numeric text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(f64),
    Text(String),
}

/// One element of the `/filter_markers` response, exactly as sent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireSample {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub density: Option<NumberOrText>,
    pub date: String,
    #[serde(rename = "percentPS", default)]
    pub percent_ps: Option<NumberOrText>,
    #[serde(rename = "percentPP", default)]
    pub percent_pp: Option<NumberOrText>,
    #[serde(rename = "percentPE", default)]
    pub percent_pe: Option<NumberOrText>,
    #[serde(alias = "imageURL", default)]
    pub image: Option<String>,
    #[serde(rename = "annotatedimageurl", default)]
    pub annotated_image_url: Option<String>,
}

impl WireSample {
    pub fn percentages(&self) -> [(Polymer, Option<&NumberOrText>); 3] {
        [
            (Polymer::Polystyrene, self.percent_ps.as_ref()),
            (Polymer::Polypropylene, self.percent_pp.as_ref()),
            (Polymer::Polyethylene, self.percent_pe.as_ref()),
        ]
    }
}
