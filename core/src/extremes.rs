use crate::models::{Segment, TrackPoint};
use crate::motion::{StepWalker, TimedStep};

/// Running extrema/totals. Raw cumulative climb, no smoothing or threshold.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Extremes {
    pub max_speed: Option<f64>, // km/h
    pub max_alt: Option<f64>,   // meter
    pub min_alt: Option<f64>,   // meter
    pub ascent: Option<f64>,    // meter
    pub descent: Option<f64>,   // meter
    prev_ele: Option<f64>,
}

impl Extremes {
    pub fn observe_point(&mut self, p: &TrackPoint) {
        let Some(ele) = p.elevation else {
            return;
        };
        self.max_alt = Some(self.max_alt.map_or(ele, |m| m.max(ele)));
        self.min_alt = Some(self.min_alt.map_or(ele, |m| m.min(ele)));

        let ascent = self.ascent.get_or_insert(0.0);
        let descent = self.descent.get_or_insert(0.0);
        if let Some(prev) = self.prev_ele {
            let dz = ele - prev;
            if dz > 0.0 {
                *ascent += dz;
            } else {
                *descent -= dz;
            }
        }
        self.prev_ele = Some(ele);
    }

    pub fn observe_step(&mut self, step: &TimedStep) {
        if let Some(v) = step.speed_kmh() {
            self.max_speed = Some(self.max_speed.map_or(v, |m| m.max(v)));
        }
    }

    /// Combine per-segment extremes; climb is not bridged across segments.
    pub fn merge(&mut self, other: &Extremes) {
        self.max_speed = max_opt(self.max_speed, other.max_speed);
        self.max_alt = max_opt(self.max_alt, other.max_alt);
        self.min_alt = match (self.min_alt, other.min_alt) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.ascent = sum_opt(self.ascent, other.ascent);
        self.descent = sum_opt(self.descent, other.descent);
    }
}

fn max_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.max(y)),
        (x, y) => x.or(y),
    }
}

fn sum_opt(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x + y),
        (x, y) => x.or(y),
    }
}

/// Standalone pass over one segment.
pub fn segment_extremes(segment: &Segment) -> Extremes {
    let mut walker = StepWalker::default();
    let mut ex = Extremes::default();
    for p in segment.points() {
        ex.observe_point(p);
        if let Some(step) = walker.push(p) {
            ex.observe_step(&step);
        }
    }
    ex
}

/// Average speed over total elapsed time (pauses included).
pub fn average_speed_kmh(distance_km: f64, duration_secs: Option<f64>) -> Option<f64> {
    let secs = duration_secs?;
    if secs > 0.0 {
        Some(distance_km / (secs / 3600.0))
    } else {
        Some(0.0)
    }
}
