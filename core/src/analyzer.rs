use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::extremes::{average_speed_kmh, Extremes};
use crate::geo::{Bounds, RoundTo};
use crate::gpx::parse_gpx;
use crate::metrics::{workouts_analyzed_total, Metrics};
use crate::models::{RawPoint, Segment, Track};
use crate::motion::{classify, StepWalker};
use crate::track::normalize;
use crate::types::{MotionStats, SegmentSummary, WorkoutSummary};
use crate::weather::WeatherEnrichment;

const DISTANCE_DP: u32 = 3;
const SPEED_DP: u32 = 2;
const ELEVATION_DP: u32 = 2;
const DURATION_DP: u32 = 3;

/// Unrounded result of the single pass over one segment.
#[derive(Debug, Clone, Copy, Default)]
struct SegmentPass {
    distance_m: f64,
    first_time: Option<DateTime<Utc>>,
    last_time: Option<DateTime<Utc>>,
    motion: Option<MotionStats>,
    extremes: Extremes,
}

fn span_secs(first: Option<DateTime<Utc>>, last: Option<DateTime<Utc>>) -> Option<f64> {
    match (first, last) {
        (Some(a), Some(b)) => Some((b - a).num_milliseconds() as f64 / 1000.0),
        _ => None,
    }
}

// Motion and extremes share the walker so each leg is measured once.
fn run_segment(segment: &Segment, stopped_speed_threshold: f64) -> SegmentPass {
    let mut walker = StepWalker::default();
    let mut motion = MotionStats::default();
    let mut extremes = Extremes::default();
    let mut first_time: Option<DateTime<Utc>> = None;
    let mut last_time: Option<DateTime<Utc>> = None;

    for p in segment.points() {
        extremes.observe_point(p);
        if let Some(t) = p.time {
            first_time = Some(first_time.map_or(t, |f| f.min(t)));
            last_time = Some(last_time.map_or(t, |l| l.max(t)));
        }
        if let Some(step) = walker.push(p) {
            classify(&step, stopped_speed_threshold, &mut motion);
            extremes.observe_step(&step);
        }
    }

    SegmentPass {
        distance_m: walker.total_distance_m,
        first_time,
        last_time,
        motion: (walker.timed_points >= 2).then_some(motion),
        extremes,
    }
}

fn duration_of(pass: &SegmentPass) -> Option<f64> {
    pass.motion?;
    span_secs(pass.first_time, pass.last_time)
}

fn round_opt(v: Option<f64>, dp: u32) -> Option<f64> {
    v.map(|x| x.round_to(dp))
}

fn segment_summary(index: usize, pass: &SegmentPass) -> SegmentSummary {
    let duration = duration_of(pass);
    let moving = pass.motion.map(|m| m.moving_time);
    let distance_km = pass.distance_m / 1000.0;
    SegmentSummary {
        segment_index: index,
        start_time: pass.first_time,
        end_time: pass.last_time,
        duration: round_opt(duration, DURATION_DP),
        moving: round_opt(moving, DURATION_DP),
        pauses: round_opt(duration.zip(moving).map(|(d, m)| d - m), DURATION_DP),
        distance: distance_km.round_to(DISTANCE_DP),
        max_speed: round_opt(pass.extremes.max_speed, SPEED_DP),
        ave_speed: round_opt(average_speed_kmh(distance_km, duration), SPEED_DP),
        max_alt: round_opt(pass.extremes.max_alt, ELEVATION_DP),
        min_alt: round_opt(pass.extremes.min_alt, ELEVATION_DP),
        ascent: round_opt(pass.extremes.ascent, ELEVATION_DP),
        descent: round_opt(pass.extremes.descent, ELEVATION_DP),
    }
}

/// Summarize a normalized track.
///
/// Workout duration spans first to last timestamp of the whole track, so
/// gaps between segments count as pauses.
pub fn analyze_track(track: &Track, stopped_speed_threshold: f64) -> WorkoutSummary {
    let passes: Vec<SegmentPass> = track
        .segments()
        .iter()
        .map(|s| run_segment(s, stopped_speed_threshold))
        .collect();

    let mut distance_m = 0.0;
    let mut extremes = Extremes::default();
    let mut motion: Option<MotionStats> = None;
    let mut first_time: Option<DateTime<Utc>> = None;
    let mut last_time: Option<DateTime<Utc>> = None;

    for pass in &passes {
        distance_m += pass.distance_m;
        extremes.merge(&pass.extremes);
        if let Some(m) = &pass.motion {
            motion.get_or_insert_with(MotionStats::default).add(m);
        }
        if let Some(t) = pass.first_time {
            first_time = Some(first_time.map_or(t, |f| f.min(t)));
        }
        if let Some(t) = pass.last_time {
            last_time = Some(last_time.map_or(t, |l| l.max(t)));
        }
    }

    let duration = motion.and(span_secs(first_time, last_time));
    let moving = motion.map(|m| m.moving_time);
    let distance_km = distance_m / 1000.0;

    WorkoutSummary {
        start_time: first_time,
        end_time: last_time,
        duration: round_opt(duration, DURATION_DP),
        moving: round_opt(moving, DURATION_DP),
        pauses: round_opt(duration.zip(moving).map(|(d, m)| d - m), DURATION_DP),
        distance: distance_km.round_to(DISTANCE_DP),
        max_speed: round_opt(extremes.max_speed, SPEED_DP),
        ave_speed: round_opt(average_speed_kmh(distance_km, duration), SPEED_DP),
        max_alt: round_opt(extremes.max_alt, ELEVATION_DP),
        min_alt: round_opt(extremes.min_alt, ELEVATION_DP),
        ascent: round_opt(extremes.ascent, ELEVATION_DP),
        descent: round_opt(extremes.descent, ELEVATION_DP),
        bounds: Bounds::of(track.points()),
        weather_start: None,
        weather_end: None,
        segments: passes
            .iter()
            .enumerate()
            .map(|(i, p)| segment_summary(i, p))
            .collect(),
    }
}

/// Parse and summarize GPX text in one go.
pub fn analyze_gpx(xml: &str, stopped_speed_threshold: f64) -> Result<WorkoutSummary, AnalysisError> {
    let track = Track::from_raw_segments(parse_gpx(xml)?)?;
    Ok(analyze_track(&track, stopped_speed_threshold))
}

fn non_negative(name: &str, v: f64) -> Result<f64, AnalysisError> {
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(AnalysisError::InvalidManualWorkout(format!("{name}={v}")))
    }
}

/// Summary of a workout entered by hand (no track).
///
/// Distance, duration and the optional climb values must be finite and
/// non-negative.
pub fn manual_summary(
    distance_km: f64,
    duration_secs: f64,
    ascent: Option<f64>,
    descent: Option<f64>,
) -> Result<WorkoutSummary, AnalysisError> {
    let distance_km = non_negative("distance", distance_km)?;
    let duration_secs = non_negative("duration", duration_secs)?;
    let ascent = ascent.map(|v| non_negative("ascent", v)).transpose()?;
    let descent = descent.map(|v| non_negative("descent", v)).transpose()?;

    let ave = average_speed_kmh(distance_km, Some(duration_secs)).map(|v| v.round_to(SPEED_DP));
    Ok(WorkoutSummary {
        duration: Some(duration_secs.round_to(DURATION_DP)),
        distance: distance_km.round_to(DISTANCE_DP),
        ave_speed: ave,
        max_speed: ave,
        ascent: round_opt(ascent, ELEVATION_DP),
        descent: round_opt(descent, ELEVATION_DP),
        ..WorkoutSummary::default()
    })
}

/// Full pipeline: normalize, summarize, then attach start/end weather.
pub struct Analyzer {
    config: AnalysisConfig,
    weather: Option<WeatherEnrichment>,
    metrics: Arc<Metrics>,
}

impl Analyzer {
    pub fn new(config: AnalysisConfig, weather: Option<WeatherEnrichment>, metrics: Arc<Metrics>) -> Self {
        Self { config, weather, metrics }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn analyze(&self, raw: Vec<Vec<RawPoint>>, activity_type: &str) -> Result<WorkoutSummary, AnalysisError> {
        let normalized = normalize(raw)?;
        normalized.record(&self.metrics);

        let threshold = self.config.stopped_speed_threshold(activity_type);
        let mut summary = analyze_track(&normalized.track, threshold);

        if let Some(weather) = &self.weather {
            let (start, end) = weather.start_and_end(&normalized.track);
            summary.weather_start = start;
            summary.weather_end = end;
        }

        workouts_analyzed_total(&self.metrics).inc();
        log::info!(
            "[analyzer] {activity_type}: {} points, {} skipped, distance={} km",
            normalized.track.point_count(),
            normalized.skipped_points,
            summary.distance
        );
        Ok(summary)
    }

    pub fn analyze_gpx(&self, xml: &str, activity_type: &str) -> Result<WorkoutSummary, AnalysisError> {
        self.analyze(parse_gpx(xml)?, activity_type)
    }
}
