//! Track analysis core: moving/stopped time, speed and elevation
//! extremes, per-segment and per-workout summaries, best-ever records and
//! optional weather enrichment.
//!
//! Pure computation; the only I/O is the weather provider call and the
//! JSON-backed stores.

pub mod analyzer;
pub mod chart;
pub mod config;
pub mod error;
pub mod extremes;
pub mod geo;
pub mod gpx;
pub mod metrics;
pub mod models;
pub mod motion;
pub mod records;
pub mod report;
pub mod storage;
pub mod track;
pub mod types;
pub mod weather;
pub mod weather_api;

#[cfg(feature = "python")]
mod py;

pub use analyzer::{analyze_gpx, analyze_track, manual_summary, Analyzer};
pub use config::{load_config, save_config, ActivityConfig, AnalysisConfig, WeatherConfig};
pub use error::{AnalysisError, ConfigError, StoreError, WeatherError};
pub use geo::{Bounds, RoundTo};
pub use metrics::Metrics;
pub use models::{RawPoint, Segment, Track, TrackPoint, WeatherObservation};
pub use records::RecordAggregator;
pub use storage::{InMemoryRecordStore, JsonFileRecordStore, RecordStore};
pub use types::{MotionStats, Record, RecordType, RecordUpdate, SegmentSummary, WorkoutEntry, WorkoutSummary};
pub use weather::{StaticWeatherProvider, WeatherEnrichment, WeatherProvider};
