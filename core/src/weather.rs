use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, DurationRound, TimeDelta, Timelike, Utc};
use ordered_float::OrderedFloat;

use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::metrics::{weather_cache_hit_total, weather_cache_miss_total, weather_failures_total, Metrics};
use crate::models::{Track, TrackPoint, WeatherObservation};
use crate::weather_api::VisualCrossingClient;

/// One weather backend. `at` is already rounded to the hour.
pub trait WeatherProvider: Send + Sync {
    fn name(&self) -> &str;

    fn fetch(&self, latitude: f64, longitude: f64, at: DateTime<Utc>) -> Result<WeatherObservation, WeatherError>;
}

/// Round half up to the hour: minute >= 30 goes to the next hour.
pub fn round_to_hour(t: DateTime<Utc>) -> DateTime<Utc> {
    let floor = t.duration_trunc(TimeDelta::hours(1)).unwrap_or(t);
    if t.minute() >= 30 {
        floor + TimeDelta::hours(1)
    } else {
        floor
    }
}

type CacheKey = (OrderedFloat<f64>, OrderedFloat<f64>, i64);

/// Fail-soft weather lookup with an hourly cache.
pub struct WeatherEnrichment {
    provider: Option<Box<dyn WeatherProvider>>,
    cache: Mutex<HashMap<CacheKey, WeatherObservation>>,
    metrics: Arc<Metrics>,
}

impl WeatherEnrichment {
    pub fn new(provider: Option<Box<dyn WeatherProvider>>, metrics: Arc<Metrics>) -> Self {
        Self {
            provider,
            cache: Mutex::new(HashMap::new()),
            metrics,
        }
    }

    pub fn from_config(config: &WeatherConfig, metrics: Arc<Metrics>) -> Self {
        Self::new(build_provider(config), metrics)
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    /// Weather at `point`, or `None` on any failure.
    pub fn get_weather(&self, point: &TrackPoint) -> Option<WeatherObservation> {
        let provider = self.provider.as_ref()?;
        let Some(time) = point.time else {
            log::debug!("[weather] {}", WeatherError::NoTimestamp);
            return None;
        };
        let at = round_to_hour(time);
        let key = (OrderedFloat(point.latitude), OrderedFloat(point.longitude), at.timestamp());

        if let Some(hit) = self.lock_cache().get(&key) {
            weather_cache_hit_total(&self.metrics).inc();
            return Some(hit.clone());
        }
        weather_cache_miss_total(&self.metrics).inc();

        match provider.fetch(point.latitude, point.longitude, at) {
            Ok(obs) => {
                log::debug!(
                    "[weather:{}] lat={:.3}, lon={:.3} @ {} => {:.1}°C, {:.1} m/s",
                    provider.name(),
                    point.latitude,
                    point.longitude,
                    at,
                    obs.temperature,
                    obs.wind
                );
                self.lock_cache().insert(key, obs.clone());
                Some(obs)
            }
            Err(e) => {
                weather_failures_total(&self.metrics).inc();
                log::warn!("[weather:{}] lookup failed: {e}", provider.name());
                None
            }
        }
    }

    /// Weather at the first and last point of the track.
    pub fn start_and_end(&self, track: &Track) -> (Option<WeatherObservation>, Option<WeatherObservation>) {
        if !self.is_enabled() {
            return (None, None);
        }
        let start = track.first_point().and_then(|p| self.get_weather(p));
        let end = track.last_point().and_then(|p| self.get_weather(p));
        (start, end)
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, WeatherObservation>> {
        // a panic while holding the lock leaves the map itself intact
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Fixed answer, for tests and offline runs.
#[derive(Debug, Clone, Default)]
pub struct StaticWeatherProvider {
    pub summary: Option<WeatherObservation>,
}

impl WeatherProvider for StaticWeatherProvider {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self, _latitude: f64, _longitude: f64, _at: DateTime<Utc>) -> Result<WeatherObservation, WeatherError> {
        self.summary.clone().ok_or(WeatherError::MissingData)
    }
}

/// Provider selected by configuration; `None` when weather is disabled.
pub fn build_provider(config: &WeatherConfig) -> Option<Box<dyn WeatherProvider>> {
    let Some(api_key) = config.api_key.clone() else {
        log::info!("[weather] no api key configured, weather disabled");
        return None;
    };
    let timeout = Duration::from_secs(config.timeout_secs);
    match config.provider.as_deref().unwrap_or("visualcrossing") {
        "visualcrossing" => Some(Box::new(VisualCrossingClient::new(api_key, timeout))),
        other => {
            log::warn!("[weather] unknown provider {other:?}, weather disabled");
            None
        }
    }
}
