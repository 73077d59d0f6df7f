//! Client-side core of the Lakewatch microplastic dashboard.
//!
//! The map, preview overlay, and data server are collaborators behind the
//! `MapSurface`, `PreviewSurface` and `SampleSource` traits; everything here
//! is plain owned state driven by one event at a time.

pub mod basemap;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod gradient;
pub mod http;
pub mod logger;
pub mod markers;
pub mod popup;
pub mod range;
pub mod settings;
pub mod sidebar;
pub mod timeseries;
