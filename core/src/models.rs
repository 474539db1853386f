use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point as delivered by an upstream parser, before validation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon")]
    pub longitude: f64,
    #[serde(default, alias = "ele")]
    pub elevation: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackPoint {
    pub time: Option<DateTime<Utc>>,
    pub latitude: f64,   // degrees
    pub longitude: f64,  // degrees
    pub elevation: Option<f64>, // meter
}

/// Contiguous run of points (one `<trkseg>`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Segment {
    points: Vec<TrackPoint>,
}

impl Segment {
    pub(crate) fn new(points: Vec<TrackPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[TrackPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TrackPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrackPoint> {
        self.points.last()
    }
}

/// Normalized track. Always holds at least one non-empty segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    segments: Vec<Segment>,
}

impl Track {
    pub(crate) fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn points(&self) -> impl Iterator<Item = &TrackPoint> {
        self.segments.iter().flat_map(|s| s.points().iter())
    }

    pub fn point_count(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }

    pub fn first_point(&self) -> Option<&TrackPoint> {
        self.segments.first().and_then(Segment::first)
    }

    pub fn last_point(&self) -> Option<&TrackPoint> {
        self.segments.last().and_then(Segment::last)
    }
}

/// Current conditions at one point, normalized to fixed units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub icon: String,
    pub temperature: f64, // °C
    pub humidity: f64,    // 0..1
    pub wind: f64,        // m/s
    #[serde(rename = "windBearing")]
    pub wind_bearing: Option<f64>, // degrees
}
