// core/src/geo.rs
use serde::{Deserialize, Serialize};

use crate::models::TrackPoint;

pub const EARTH_RADIUS_M: f64 = 6_378_137.0; // WGS84 equatorial radius (m)
pub const MS_TO_KMH: f64 = 3.6;

// --- RoundTo trait ---
pub trait RoundTo {
    fn round_to(self, dp: u32) -> f64;
}

impl RoundTo for f64 {
    #[inline]
    fn round_to(self, dp: u32) -> f64 {
        if dp == 0 {
            return self.round();
        }
        let factor = 10_f64.powi(dp as i32);
        (self * factor).round() / factor
    }
}

/// Great-circle distance in meters.
pub fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Leg length in meters; 3D when both ends carry elevation.
pub fn leg_distance_m(a: &TrackPoint, b: &TrackPoint) -> f64 {
    let horizontal = haversine_m(a.latitude, a.longitude, b.latitude, b.longitude);
    match (a.elevation, b.elevation) {
        (Some(ea), Some(eb)) => {
            let dz = eb - ea;
            (horizontal * horizontal + dz * dz).sqrt()
        }
        _ => horizontal,
    }
}

/// Speed in km/h for `meters` covered in `secs`.
#[inline]
pub fn speed_kmh(meters: f64, secs: f64) -> f64 {
    meters / secs * MS_TO_KMH
}

/// `[min_lat, min_lon, max_lat, max_lon]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds(pub [f64; 4]);

impl Bounds {
    pub fn of<'a>(points: impl IntoIterator<Item = &'a TrackPoint>) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let mut b = [first.latitude, first.longitude, first.latitude, first.longitude];
        for p in it {
            b[0] = b[0].min(p.latitude);
            b[1] = b[1].min(p.longitude);
            b[2] = b[2].max(p.latitude);
            b[3] = b[3].max(p.longitude);
        }
        Some(Bounds(b))
    }
}
