// core/src/gpx.rs
use std::path::Path;

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::reader::Reader;

use crate::error::AnalysisError;
use crate::models::RawPoint;

/// Parse GPX text into raw segments, one per `<trkseg>`.
///
/// Points with unreadable `lat`/`lon` are kept as NaN so that the
/// normalizer counts them as malformed instead of losing them silently.
pub fn parse_gpx(xml: &str) -> Result<Vec<Vec<RawPoint>>, AnalysisError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut st = GpxState::default();
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(Event::Start(e)) => handle_start(&mut st, &e),
            Ok(Event::Empty(e)) => {
                // <trkpt lat=".." lon=".."/>
                handle_start(&mut st, &e);
                if e.local_name().as_ref() == b"trkpt" {
                    finish_point(&mut st);
                }
            }
            Ok(Event::End(e)) => handle_end(&mut st, &e),
            Ok(Event::Text(e)) => handle_text(&mut st, &e),
            Err(e) => {
                return Err(AnalysisError::Gpx(format!(
                    "xml error at byte {}: {e}",
                    reader.buffer_position()
                )))
            }
            _ => {}
        }
    }

    if !st.seen_gpx_root {
        return Err(AnalysisError::Gpx("missing <gpx> root element".into()));
    }
    if let Some(seg) = st.cur_segment.take() {
        st.segments.push(seg);
    }
    Ok(st.segments)
}

pub fn parse_gpx_file(path: &Path) -> Result<Vec<Vec<RawPoint>>, AnalysisError> {
    let xml = std::fs::read_to_string(path)?;
    parse_gpx(&xml)
}

#[derive(Default)]
struct GpxState {
    seen_gpx_root: bool,
    in_trkpt: bool,
    in_time: bool,
    in_ele: bool,

    cur_lat: f64,
    cur_lon: f64,
    cur_time: Option<DateTime<Utc>>,
    cur_ele: Option<f64>,

    cur_segment: Option<Vec<RawPoint>>,
    segments: Vec<Vec<RawPoint>>,
}

fn handle_start(st: &mut GpxState, e: &BytesStart<'_>) {
    match e.local_name().as_ref() {
        b"gpx" => st.seen_gpx_root = true,
        b"trkseg" => {
            if let Some(seg) = st.cur_segment.take() {
                st.segments.push(seg);
            }
            st.cur_segment = Some(Vec::new());
        }
        b"trkpt" => {
            st.in_trkpt = true;
            st.in_time = false;
            st.in_ele = false;
            st.cur_time = None;
            st.cur_ele = None;

            let (lat, lon) = parse_lat_lon(e);
            st.cur_lat = lat;
            st.cur_lon = lon;
        }
        b"time" if st.in_trkpt => st.in_time = true,
        b"ele" if st.in_trkpt => st.in_ele = true,
        _ => {}
    }
}

fn handle_end(st: &mut GpxState, e: &BytesEnd<'_>) {
    match e.local_name().as_ref() {
        b"time" => st.in_time = false,
        b"ele" => st.in_ele = false,
        b"trkpt" => finish_point(st),
        b"trkseg" => {
            if let Some(seg) = st.cur_segment.take() {
                st.segments.push(seg);
            }
        }
        _ => {}
    }
}

fn finish_point(st: &mut GpxState) {
    st.in_trkpt = false;
    let p = RawPoint {
        time: st.cur_time.take(),
        latitude: st.cur_lat,
        longitude: st.cur_lon,
        elevation: st.cur_ele.take(),
    };
    st.cur_segment.get_or_insert_with(Vec::new).push(p);
}

fn handle_text(st: &mut GpxState, e: &BytesText<'_>) {
    if !(st.in_time || st.in_ele) {
        return;
    }
    let Ok(s) = e.decode() else {
        return;
    };
    if st.in_time {
        match DateTime::parse_from_rfc3339(s.as_ref()) {
            Ok(dt) => st.cur_time = Some(dt.with_timezone(&Utc)),
            Err(err) => log::debug!("[gpx] ignoring time {s:?}: {err}"),
        }
    } else if st.in_ele {
        st.cur_ele = s.trim().parse::<f64>().ok();
    }
}

fn parse_lat_lon(e: &BytesStart<'_>) -> (f64, f64) {
    let mut lat = f64::NAN;
    let mut lon = f64::NAN;

    for a in e.attributes().with_checks(false).flatten() {
        let Ok(v) = a.unescape_value() else {
            continue;
        };
        match a.key.as_ref() {
            b"lat" => lat = v.trim().parse::<f64>().unwrap_or(f64::NAN),
            b"lon" => lon = v.trim().parse::<f64>().unwrap_or(f64::NAN),
            _ => {}
        }
    }

    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_SEGMENTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="test" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
    <name>morning</name>
    <trkseg>
      <trkpt lat="44.68095" lon="6.07367"><ele>998</ele><time>2018-03-13T12:44:45Z</time></trkpt>
      <trkpt lat="44.68091" lon="6.07367"><ele>998</ele><time>2018-03-13T12:44:50Z</time></trkpt>
    </trkseg>
    <trkseg>
      <trkpt lat="44.68080" lon="6.07364"><ele>994</ele></trkpt>
      <trkpt lat="44.68075" lon="6.07364"/>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn reads_segments_and_optional_fields() {
        let segs = parse_gpx(TWO_SEGMENTS).unwrap();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].len(), 2);
        assert_eq!(segs[1].len(), 2);

        let p = segs[0][0];
        assert_eq!(p.latitude, 44.68095);
        assert_eq!(p.elevation, Some(998.0));
        assert_eq!(p.time.unwrap().to_rfc3339(), "2018-03-13T12:44:45+00:00");

        assert_eq!(segs[1][0].time, None);
        assert_eq!(segs[1][1].elevation, None);
    }

    #[test]
    fn bad_coordinates_become_nan() {
        let xml = r#"<gpx><trk><trkseg><trkpt lat="abc" lon="6.0"/></trkseg></trk></gpx>"#;
        let segs = parse_gpx(xml).unwrap();
        assert!(segs[0][0].latitude.is_nan());
    }

    #[test]
    fn not_a_gpx_document() {
        let err = parse_gpx("<kml></kml>").unwrap_err();
        assert_eq!(err.code(), "invalid_gpx");
        assert!(parse_gpx("<gpx><trk></gpx>").is_err());
    }
}
