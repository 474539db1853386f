// core/src/error.rs
use thiserror::Error;

/// Errors that abort analysis of a single upload.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("track contains no usable points")]
    EmptyTrack,

    #[error("malformed point #{index} in segment #{segment}: lat={latitude}, lon={longitude}")]
    MalformedPoint {
        segment: usize,
        index: usize,
        latitude: f64,
        longitude: f64,
    },

    #[error("point #{index} in segment #{segment} goes back in time")]
    OutOfOrder { segment: usize, index: usize },

    #[error("invalid manual workout: {0}")]
    InvalidManualWorkout(String),

    #[error("invalid gpx: {0}")]
    Gpx(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AnalysisError {
    /// Stable code surfaced by the API layer.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::EmptyTrack => "empty_track",
            AnalysisError::MalformedPoint { .. } | AnalysisError::OutOfOrder { .. } => "malformed_point",
            AnalysisError::InvalidManualWorkout(_) => "invalid_manual_workout",
            AnalysisError::Gpx(_) => "invalid_gpx",
            AnalysisError::Io(_) => "io_error",
        }
    }
}

/// Weather lookup failures. Never leave `WeatherEnrichment`.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("weather request failed: {0}")]
    Http(String),

    #[error("weather response could not be decoded: {0}")]
    Decode(String),

    #[error("weather response has no current conditions")]
    MissingData,

    #[error("point has no timestamp")]
    NoTimestamp,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serde(#[from] serde_json::Error),

    #[error("record update conflict: {0}")]
    Conflict(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config parse at {path}: {message}")]
    Parse { path: String, message: String },
}
