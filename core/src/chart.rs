use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::RoundTo;
use crate::models::Track;
use crate::motion::StepWalker;

/// One row of the distance/elevation/speed chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub distance: f64,         // km from start
    pub duration: Option<f64>, // sek since first timestamp
    pub elevation: Option<f64>,
    pub speed: Option<f64>, // km/h over the step ending here
    pub latitude: f64,
    pub longitude: f64,
    pub time: Option<DateTime<Utc>>,
}

/// Per-point series for the workout charts. Segments are chained without
/// a connecting leg.
pub fn chart_data(track: &Track) -> Vec<ChartPoint> {
    let mut out = Vec::with_capacity(track.point_count());
    let start = track.points().find_map(|p| p.time);
    let mut offset_m = 0.0;

    for segment in track.segments() {
        let mut walker = StepWalker::default();
        for p in segment.points() {
            let step = walker.push(p);
            out.push(ChartPoint {
                distance: ((offset_m + walker.total_distance_m) / 1000.0).round_to(3),
                duration: p
                    .time
                    .zip(start)
                    .map(|(t, s)| (t - s).num_milliseconds() as f64 / 1000.0),
                elevation: p.elevation.map(|e| e.round_to(1)),
                speed: step.and_then(|s| s.speed_kmh()).map(|v| v.round_to(2)),
                latitude: p.latitude,
                longitude: p.longitude,
                time: p.time,
            });
        }
        offset_m += walker.total_distance_m;
    }
    out
}
