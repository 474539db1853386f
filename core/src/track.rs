// core/src/track.rs
use chrono::{DateTime, Utc};

use crate::error::AnalysisError;
use crate::metrics::{points_skipped_total, Metrics};
use crate::models::{RawPoint, Segment, Track, TrackPoint};

/// Result of normalizing raw parser output.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub track: Track,
    /// Points dropped for bad lat/lon or a timestamp earlier than the one before.
    pub skipped_points: usize,
}

impl Normalized {
    pub fn record(&self, metrics: &Metrics) {
        points_skipped_total(metrics).inc_by(self.skipped_points as u64);
    }
}

impl Track {
    /// Normalize raw segments, skipping malformed points.
    pub fn from_raw_segments(raw: Vec<Vec<RawPoint>>) -> Result<Track, AnalysisError> {
        normalize(raw).map(|n| n.track)
    }

    /// Same as `from_raw_segments` but rejects the whole track on the first bad point.
    pub fn from_raw_segments_strict(raw: Vec<Vec<RawPoint>>) -> Result<Track, AnalysisError> {
        let mut segments = Vec::with_capacity(raw.len());
        for (seg_idx, seg) in raw.into_iter().enumerate() {
            let mut points = Vec::with_capacity(seg.len());
            for (idx, p) in seg.into_iter().enumerate() {
                let tp = Track::validate_point(seg_idx, idx, &p)?;
                check_order(seg_idx, idx, &tp, latest_time(&points))?;
                points.push(tp);
            }
            if !points.is_empty() {
                segments.push(Segment::new(points));
            }
        }
        if segments.is_empty() {
            return Err(AnalysisError::EmptyTrack);
        }
        Ok(Track::new(segments))
    }

    /// Range check of a single point.
    pub fn validate_point(segment: usize, index: usize, p: &RawPoint) -> Result<TrackPoint, AnalysisError> {
        let lat_ok = p.latitude.is_finite() && (-90.0..=90.0).contains(&p.latitude);
        let lon_ok = p.longitude.is_finite() && (-180.0..=180.0).contains(&p.longitude);
        if !(lat_ok && lon_ok) {
            return Err(AnalysisError::MalformedPoint {
                segment,
                index,
                latitude: p.latitude,
                longitude: p.longitude,
            });
        }
        Ok(TrackPoint {
            time: p.time,
            latitude: p.latitude,
            longitude: p.longitude,
            elevation: p.elevation.filter(|e| e.is_finite()),
        })
    }
}

// Timestamps within a segment never decrease; untimed points are exempt.
fn latest_time(points: &[TrackPoint]) -> Option<DateTime<Utc>> {
    points.iter().rev().find_map(|p| p.time)
}

fn check_order(
    segment: usize,
    index: usize,
    p: &TrackPoint,
    latest: Option<DateTime<Utc>>,
) -> Result<(), AnalysisError> {
    match (latest, p.time) {
        (Some(prev), Some(t)) if t < prev => Err(AnalysisError::OutOfOrder { segment, index }),
        _ => Ok(()),
    }
}

pub fn normalize(raw: Vec<Vec<RawPoint>>) -> Result<Normalized, AnalysisError> {
    let mut segments = Vec::with_capacity(raw.len());
    let mut skipped_points = 0usize;

    for (seg_idx, seg) in raw.into_iter().enumerate() {
        let mut points: Vec<TrackPoint> = Vec::with_capacity(seg.len());
        for (idx, p) in seg.into_iter().enumerate() {
            match Track::validate_point(seg_idx, idx, &p) {
                Ok(tp) => {
                    if let Err(e) = check_order(seg_idx, idx, &tp, latest_time(&points)) {
                        log::warn!("[track] skipping point: {e}");
                        skipped_points += 1;
                        continue;
                    }
                    points.push(tp);
                }
                Err(e) => {
                    log::warn!("[track] skipping point: {e}");
                    skipped_points += 1;
                }
            }
        }
        if points.is_empty() {
            log::debug!("[track] dropping empty segment {seg_idx}");
            continue;
        }
        segments.push(Segment::new(points));
    }

    if segments.is_empty() {
        return Err(AnalysisError::EmptyTrack);
    }

    Ok(Normalized {
        track: Track::new(segments),
        skipped_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(lat: f64, lon: f64) -> RawPoint {
        RawPoint { time: None, latitude: lat, longitude: lon, elevation: Some(10.0) }
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(normalize(vec![]), Err(AnalysisError::EmptyTrack)));
        assert!(matches!(normalize(vec![vec![], vec![]]), Err(AnalysisError::EmptyTrack)));
    }

    #[test]
    fn out_of_range_points_are_skipped() {
        let n = normalize(vec![vec![raw(45.0, 6.0), raw(91.0, 6.0), raw(45.0, 181.0), raw(45.1, 6.1)]]).unwrap();
        assert_eq!(n.skipped_points, 2);
        assert_eq!(n.track.point_count(), 2);
    }

    #[test]
    fn all_malformed_means_empty_track() {
        let err = normalize(vec![vec![raw(f64::NAN, 6.0)]]).unwrap_err();
        assert_eq!(err.code(), "empty_track");
    }

    #[test]
    fn empty_segments_are_dropped() {
        let n = normalize(vec![vec![], vec![raw(1.0, 1.0)], vec![raw(100.0, 1.0)]]).unwrap();
        assert_eq!(n.track.segments().len(), 1);
    }

    #[test]
    fn strict_mode_rejects_track() {
        let err = Track::from_raw_segments_strict(vec![vec![raw(45.0, 6.0), raw(-95.0, 6.0)]]).unwrap_err();
        match err {
            AnalysisError::MalformedPoint { segment, index, .. } => {
                assert_eq!((segment, index), (0, 1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn backwards_timestamp_is_skipped() {
        use chrono::TimeZone;
        let timed = |secs: i64, lat: f64| RawPoint {
            time: Some(Utc.timestamp_opt(1_600_000_000 + secs, 0).unwrap()),
            ..raw(lat, 6.0)
        };
        let mut untimed = raw(45.15, 6.0);
        untimed.time = None;
        let n = normalize(vec![vec![timed(0, 45.0), timed(100, 45.1), untimed, timed(50, 45.2), timed(150, 45.3)]]).unwrap();
        assert_eq!(n.skipped_points, 1);
        assert_eq!(n.track.point_count(), 4);

        let err = Track::from_raw_segments_strict(vec![vec![timed(10, 45.0), timed(5, 45.1)]]).unwrap_err();
        assert!(matches!(err, AnalysisError::OutOfOrder { segment: 0, index: 1 }));
        assert_eq!(err.code(), "malformed_point");
    }

    #[test]
    fn non_finite_elevation_becomes_none() {
        let mut p = raw(1.0, 1.0);
        p.elevation = Some(f64::INFINITY);
        let tp = Track::validate_point(0, 0, &p).unwrap();
        assert_eq!(tp.elevation, None);
    }
}
