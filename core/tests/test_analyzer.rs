// core/tests/test_analyzer.rs
use chrono::{TimeZone, Utc};

use trackstat_core::geo::EARTH_RADIUS_M;
use trackstat_core::{analyze_track, manual_summary, RawPoint, Track};

fn at(secs: i64, lat: f64, ele: Option<f64>) -> RawPoint {
    RawPoint {
        time: Some(Utc.with_ymd_and_hms(2018, 3, 13, 12, 44, 45).unwrap() + chrono::Duration::seconds(secs)),
        latitude: lat,
        longitude: 6.07367,
        elevation: ele,
    }
}

/// Latitude offset (degrees) for `meters` along a meridian.
fn north(meters: f64) -> f64 {
    (meters / EARTH_RADIUS_M).to_degrees()
}

#[test]
fn two_points_320m_in_4min10() {
    let track = Track::from_raw_segments(vec![vec![at(0, 44.0, None), at(250, 44.0 + north(320.0), None)]]).unwrap();
    let s = analyze_track(&track, 0.1);

    assert_eq!(s.duration, Some(250.0));
    assert_eq!(s.distance, 0.32);
    assert_eq!(s.ave_speed, Some(4.61));
    assert_eq!(s.max_speed, Some(4.61));
    assert_eq!(s.moving, Some(250.0));
    assert_eq!(s.pauses, Some(0.0));
}

#[test]
fn moving_plus_stopped_is_elapsed() {
    let track = Track::from_raw_segments(vec![vec![
        at(0, 44.0, Some(100.0)),
        at(30, 44.0 + north(150.0), Some(101.0)),
        at(90, 44.0 + north(151.0), Some(101.0)), // ~1 m in 60 s: stopped
        at(95, 44.0 + north(151.0), Some(101.0)),
        at(130, 44.0 + north(400.0), Some(99.0)),
    ]])
    .unwrap();
    let s = analyze_track(&track, 1.0);
    let seg = &s.segments[0];

    let stopped = seg.pauses.unwrap();
    assert!((seg.moving.unwrap() + stopped - seg.duration.unwrap()).abs() < 1e-6);
    assert_eq!(seg.duration, Some(130.0));
    assert_eq!(stopped, 65.0);
}

#[test]
fn average_speed_is_distance_over_elapsed_time() {
    let track = Track::from_raw_segments(vec![vec![
        at(0, 44.0, None),
        at(600, 44.0 + north(2000.0), None),
        at(1200, 44.0 + north(2000.0), None), // ten minutes standing still
    ]])
    .unwrap();
    let s = analyze_track(&track, 1.0);

    let expected = s.distance / (s.duration.unwrap() / 3600.0);
    assert!((s.ave_speed.unwrap() - expected).abs() < 0.01);
    assert_eq!(s.ave_speed, Some(6.0));
    assert_eq!(s.max_speed, Some(12.0));
}

#[test]
fn without_elevation_climb_fields_are_null() {
    let track = Track::from_raw_segments(vec![vec![at(0, 44.0, None), at(60, 44.01, None)]]).unwrap();
    let s = analyze_track(&track, 1.0);
    assert_eq!((s.ascent, s.descent, s.max_alt, s.min_alt), (None, None, None, None));
    assert_eq!(s.segments[0].ascent, None);
}

#[test]
fn without_timestamps_speed_and_duration_are_null() {
    let mut a = at(0, 44.0, Some(10.0));
    let mut b = at(0, 44.01, Some(20.0));
    a.time = None;
    b.time = None;
    let s = analyze_track(&Track::from_raw_segments(vec![vec![a, b]]).unwrap(), 1.0);

    assert!(s.distance > 1.0);
    assert_eq!(s.duration, None);
    assert_eq!(s.moving, None);
    assert_eq!(s.pauses, None);
    assert_eq!(s.ave_speed, None);
    assert_eq!(s.max_speed, None);
    assert_eq!(s.ascent, Some(10.0));
}

#[test]
fn gap_between_segments_counts_as_pause() {
    let track = Track::from_raw_segments(vec![
        vec![at(0, 44.0, None), at(100, 44.0 + north(500.0), None)],
        vec![at(400, 44.0 + north(500.0), None), at(500, 44.0 + north(1000.0), None)],
    ])
    .unwrap();
    let s = analyze_track(&track, 1.0);

    assert_eq!(s.segments.len(), 2);
    assert_eq!(s.duration, Some(500.0));
    assert_eq!(s.moving, Some(200.0));
    assert_eq!(s.pauses, Some(300.0));
    assert_eq!(s.distance, 1.0);
    assert_eq!(s.segments[1].pauses, Some(0.0));
}

#[test]
fn single_point_segment_has_no_speed() {
    let s = analyze_track(&Track::from_raw_segments(vec![vec![at(0, 44.0, Some(5.0))]]).unwrap(), 1.0);
    assert_eq!(s.duration, None);
    assert_eq!(s.max_speed, None);
    assert_eq!(s.distance, 0.0);
    assert_eq!(s.max_alt, Some(5.0));
    assert_eq!(s.ascent, Some(0.0));
}

#[test]
fn analysis_is_idempotent() {
    let track = Track::from_raw_segments(vec![vec![
        at(0, 44.0, Some(1.11)),
        at(7, 44.0003, Some(2.27)),
        at(19, 44.0011, Some(0.93)),
    ]])
    .unwrap();
    let a = analyze_track(&track, 0.1);
    let b = analyze_track(&track, 0.1);
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn manual_workout_has_no_motion_split() {
    let s = manual_summary(10.0, 3600.0, Some(120.0), None).unwrap();
    assert_eq!(s.ave_speed, Some(10.0));
    assert_eq!(s.max_speed, Some(10.0));
    assert_eq!(s.moving, None);
    assert_eq!(s.pauses, None);
    assert_eq!(s.ascent, Some(120.0));
    assert!(s.segments.is_empty());
}

#[test]
fn manual_workout_rejects_negative_or_nan_input() {
    for (distance, duration) in [(5.0, -60.0), (-1.0, 600.0), (f64::NAN, 600.0), (5.0, f64::INFINITY)] {
        let err = manual_summary(distance, duration, None, None).unwrap_err();
        assert_eq!(err.code(), "invalid_manual_workout", "{distance} km / {duration} s");
    }
    assert!(manual_summary(5.0, 600.0, Some(-3.0), None).is_err());

    // a zero-length entry is still a valid workout
    assert_eq!(manual_summary(0.0, 0.0, None, None).unwrap().ave_speed, Some(0.0));
}

fn load_csv_fixture() -> Vec<RawPoint> {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/morning_run.csv");
    let mut rdr = csv::Reader::from_path(path).expect("open fixture");
    rdr.records()
        .map(|row| {
            let row = row.expect("csv row");
            RawPoint {
                time: Some(row[0].parse().expect("time")),
                latitude: row[1].parse().expect("lat"),
                longitude: row[2].parse().expect("lon"),
                elevation: Some(row[3].parse().expect("ele")),
            }
        })
        .collect()
}

#[test]
fn morning_run_fixture() {
    let points = load_csv_fixture();
    assert_eq!(points.len(), 16);

    let s = analyze_track(&Track::from_raw_segments(vec![points]).unwrap(), 1.0);
    assert_eq!(s.duration, Some(320.0));
    assert_eq!(s.moving, Some(260.0));
    assert_eq!(s.pauses, Some(60.0));
    assert_eq!(s.ascent, Some(6.0));
    assert_eq!(s.descent, Some(5.8));
    assert_eq!(s.max_alt, Some(39.5));
    assert_eq!(s.min_alt, Some(35.0));

    assert!(s.distance > 0.85 && s.distance < 0.93, "distance={}", s.distance);
    let max = s.max_speed.unwrap();
    assert!(max > 12.0 && max < 13.0, "max_speed={max}");
    assert!(s.ave_speed.unwrap() < max);
    assert_eq!(s.start_time.map(|t| t.to_rfc3339()), Some("2024-04-14T07:30:00+00:00".to_string()));
}

#[test]
fn gpx_and_point_input_agree() {
    let points = load_csv_fixture();
    let mut xml = String::from(r#"<?xml version="1.0"?><gpx version="1.1" creator="test"><trk><trkseg>"#);
    for p in &points {
        xml.push_str(&format!(
            r#"<trkpt lat="{}" lon="{}"><ele>{}</ele><time>{}</time></trkpt>"#,
            p.latitude,
            p.longitude,
            p.elevation.unwrap(),
            p.time.unwrap().to_rfc3339()
        ));
    }
    xml.push_str("</trkseg></trk></gpx>");

    let from_gpx = trackstat_core::analyze_gpx(&xml, 1.0).unwrap();
    let from_points = analyze_track(&Track::from_raw_segments(vec![points]).unwrap(), 1.0);
    assert_eq!(from_gpx, from_points);
}

#[test]
fn gpx_without_track_points_is_empty_track() {
    let err = trackstat_core::analyze_gpx("<gpx><trk><trkseg></trkseg></trk></gpx>", 1.0).unwrap_err();
    assert_eq!(err.code(), "empty_track");
}

#[test]
fn backwards_timestamp_does_not_break_time_split() {
    let track = Track::from_raw_segments(vec![vec![
        at(0, 44.0, None),
        at(100, 44.0 + north(500.0), None),
        at(50, 44.0 + north(600.0), None),
        at(150, 44.0 + north(1000.0), None),
    ]])
    .unwrap();
    assert_eq!(track.point_count(), 3);

    let s = analyze_track(&track, 1.0);
    let (duration, moving, pauses) = (s.duration.unwrap(), s.moving.unwrap(), s.pauses.unwrap());
    assert_eq!(duration, 150.0);
    assert!(pauses >= 0.0, "pauses={pauses}");
    assert!((moving + pauses - duration).abs() < 1e-6);
}
