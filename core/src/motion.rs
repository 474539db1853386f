// core/src/motion.rs
use chrono::{DateTime, Utc};

use crate::geo::{leg_distance_m, speed_kmh};
use crate::models::{Segment, TrackPoint};
use crate::types::MotionStats;

/// Displacement between two consecutive *timed* points.
///
/// `distance` is the path length walked since the previous timed point,
/// so untimed points in between still contribute their legs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedStep {
    pub dt: f64,       // sek
    pub distance: f64, // meter
}

impl TimedStep {
    /// Instantaneous speed in km/h; `None` for zero/negative `dt`.
    pub fn speed_kmh(&self) -> Option<f64> {
        if self.dt > 0.0 {
            Some(speed_kmh(self.distance, self.dt))
        } else {
            None
        }
    }
}

/// Incremental walker shared by the motion and extremes passes.
#[derive(Debug, Clone, Default)]
pub struct StepWalker {
    prev: Option<TrackPoint>,
    last_time: Option<DateTime<Utc>>,
    pending_m: f64,
    pub total_distance_m: f64,
    pub timed_points: usize,
}

impl StepWalker {
    /// Feed the next point; returns a step when `p` is timed and a previous
    /// timed point exists.
    pub fn push(&mut self, p: &TrackPoint) -> Option<TimedStep> {
        if let Some(prev) = &self.prev {
            let d = leg_distance_m(prev, p);
            self.total_distance_m += d;
            self.pending_m += d;
        }
        self.prev = Some(*p);

        let t = p.time?;
        self.timed_points += 1;
        let step = self.last_time.map(|t0| TimedStep {
            dt: (t - t0).num_milliseconds() as f64 / 1000.0,
            distance: self.pending_m,
        });
        self.last_time = Some(t);
        self.pending_m = 0.0;
        step
    }
}

/// Classify a step against the stopped-speed threshold (km/h).
pub fn classify(step: &TimedStep, stopped_speed_threshold: f64, acc: &mut MotionStats) {
    let Some(speed) = step.speed_kmh() else {
        // duplicate or backwards timestamp
        return;
    };
    if speed < stopped_speed_threshold {
        acc.stopped_time += step.dt;
        acc.stopped_distance += step.distance;
    } else {
        acc.moving_time += step.dt;
        acc.moving_distance += step.distance;
    }
}

/// Moving/stopped split of one segment, `None` with fewer than two timed points.
pub fn analyze_segment(segment: &Segment, stopped_speed_threshold: f64) -> Option<MotionStats> {
    let mut walker = StepWalker::default();
    let mut acc = MotionStats::default();
    for p in segment.points() {
        if let Some(step) = walker.push(p) {
            classify(&step, stopped_speed_threshold, &mut acc);
        }
    }
    (walker.timed_points >= 2).then_some(acc)
}
