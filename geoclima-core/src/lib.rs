//! Core library for the `geoclima` CLI.
//!
//! This crate defines:
//! - Loading school locations from a workbook sheet or CSV export
//! - Coordinate normalization and the read-only location catalog
//! - The OpenWeather client and per-record weather enrichment
//! - Configuration & credentials handling
//!
//! It is used by `geoclima-cli`, but can also be reused by other front ends.

pub mod catalog;
pub mod config;
pub mod enrich;
pub mod error;
pub mod ingest;
pub mod model;
pub mod normalize;
pub mod provider;
pub mod source;

pub use catalog::{Catalog, Field, Selection, Stats};
pub use config::{Config, DataSettings, SunClock, WeatherSettings};
pub use enrich::{EnrichSummary, Enriched, Enricher};
pub use error::{IngestError, WeatherError};
pub use ingest::{IngestReport, ingest};
pub use model::{
    Coordinates, IconSize, LevelCategory, LocationRecord, Unavailable, WeatherOutcome,
    WeatherSnapshot,
};
pub use provider::{WeatherProvider, provider_from_config};
pub use source::{RowSource, open_source};
