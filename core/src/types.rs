use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Bounds;
use crate::models::WeatherObservation;

/// Moving/stopped split of one segment (or a whole workout), unrounded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionStats {
    pub moving_time: f64,      // sek
    pub stopped_time: f64,     // sek
    pub moving_distance: f64,  // meter
    pub stopped_distance: f64, // meter
}

impl MotionStats {
    pub fn total_time(&self) -> f64 {
        self.moving_time + self.stopped_time
    }

    pub fn add(&mut self, other: &MotionStats) {
        self.moving_time += other.moving_time;
        self.stopped_time += other.stopped_time;
        self.moving_distance += other.moving_distance;
        self.stopped_distance += other.stopped_distance;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub segment_index: usize,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<f64>,  // sek
    pub moving: Option<f64>,    // sek
    pub pauses: Option<f64>,    // sek
    pub distance: f64,          // km
    pub max_speed: Option<f64>, // km/h
    pub ave_speed: Option<f64>, // km/h
    pub max_alt: Option<f64>,   // meter
    pub min_alt: Option<f64>,   // meter
    pub ascent: Option<f64>,    // meter
    pub descent: Option<f64>,   // meter
}

/// Aggregated statistics of a whole workout.
///
/// Speed and duration fields stay `None` when the workout carries no
/// timestamps; `Some(0.0)` means a measured zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkoutSummary {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<f64>,
    pub moving: Option<f64>,
    pub pauses: Option<f64>,
    pub distance: f64,
    pub max_speed: Option<f64>,
    pub ave_speed: Option<f64>,
    pub max_alt: Option<f64>,
    pub min_alt: Option<f64>,
    pub ascent: Option<f64>,
    pub descent: Option<f64>,
    pub bounds: Option<Bounds>,
    pub weather_start: Option<WeatherObservation>,
    pub weather_end: Option<WeatherObservation>,
    #[serde(default)]
    pub segments: Vec<SegmentSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    AverageSpeed,
    LongestDistance,
    LongestDuration,
    MaxAscent,
    MaxSpeed,
}

impl RecordType {
    pub const ALL: [RecordType; 5] = [
        RecordType::AverageSpeed,
        RecordType::LongestDistance,
        RecordType::LongestDuration,
        RecordType::MaxAscent,
        RecordType::MaxSpeed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::AverageSpeed => "average_speed",
            RecordType::LongestDistance => "longest_distance",
            RecordType::LongestDuration => "longest_duration",
            RecordType::MaxAscent => "max_ascent",
            RecordType::MaxSpeed => "max_speed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub user_id: i64,
    pub activity_type: String,
    pub record_type: RecordType,
    pub value: f64,
    pub workout_id: String,
    pub workout_date: DateTime<Utc>,
}

impl Record {
    pub fn key(&self) -> (i64, &str, RecordType) {
        (self.user_id, self.activity_type.as_str(), self.record_type)
    }
}

/// What the persistence layer must do with one record row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RecordUpdate {
    /// Insert `record`, deleting `replaces` if present.
    Set {
        record: Record,
        replaces: Option<Record>,
    },
    Remove {
        record: Record,
    },
}

impl RecordUpdate {
    pub fn record_type(&self) -> RecordType {
        match self {
            RecordUpdate::Set { record, .. } | RecordUpdate::Remove { record } => record.record_type,
        }
    }
}

/// The per-workout values the record aggregator compares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutEntry {
    pub workout_id: String,
    pub user_id: i64,
    pub activity_type: String,
    pub workout_date: DateTime<Utc>,
    pub distance: Option<f64>,  // km
    pub duration: Option<f64>,  // sek
    pub max_speed: Option<f64>, // km/h
    pub ave_speed: Option<f64>, // km/h
    pub ascent: Option<f64>,    // meter
}

impl WorkoutEntry {
    pub fn from_summary(
        workout_id: impl Into<String>,
        user_id: i64,
        activity_type: impl Into<String>,
        workout_date: DateTime<Utc>,
        summary: &WorkoutSummary,
    ) -> Self {
        Self {
            workout_id: workout_id.into(),
            user_id,
            activity_type: activity_type.into(),
            workout_date,
            distance: Some(summary.distance),
            duration: summary.duration,
            max_speed: summary.max_speed,
            ave_speed: summary.ave_speed,
            ascent: summary.ascent,
        }
    }

    pub fn metric(&self, record_type: RecordType) -> Option<f64> {
        match record_type {
            RecordType::AverageSpeed => self.ave_speed,
            RecordType::LongestDistance => self.distance,
            RecordType::LongestDuration => self.duration,
            RecordType::MaxAscent => self.ascent,
            RecordType::MaxSpeed => self.max_speed,
        }
    }
}
