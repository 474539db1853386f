use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

/// Process counters for the analysis core.
///
/// Built once by the owning service and shared (`Arc<Metrics>`) with the
/// weather orchestrator and the track normalizer.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    weather_cache_hit: IntCounter,
    weather_cache_miss: IntCounter,
    weather_failures: IntCounter,
    workouts_analyzed: IntCounter,
    points_skipped: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let weather_cache_hit =
            IntCounter::new("weather_cache_hit_total", "Weather lookups served from cache")?;
        let weather_cache_miss =
            IntCounter::new("weather_cache_miss_total", "Weather lookups sent to the provider")?;
        let weather_failures =
            IntCounter::new("weather_failures_total", "Weather lookups that failed")?;
        let workouts_analyzed =
            IntCounter::new("workouts_analyzed_total", "Tracks summarized")?;
        let points_skipped =
            IntCounter::new("points_skipped_total", "Malformed track points dropped")?;

        registry.register(Box::new(weather_cache_hit.clone()))?;
        registry.register(Box::new(weather_cache_miss.clone()))?;
        registry.register(Box::new(weather_failures.clone()))?;
        registry.register(Box::new(workouts_analyzed.clone()))?;
        registry.register(Box::new(points_skipped.clone()))?;

        Ok(Self {
            registry,
            weather_cache_hit,
            weather_cache_miss,
            weather_failures,
            workouts_analyzed,
            points_skipped,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of every counter.
    pub fn gather_text(&self) -> String {
        let mut buf = Vec::new();
        if let Err(e) = TextEncoder::new().encode(&self.registry.gather(), &mut buf) {
            log::warn!("[metrics] encode failed: {e}");
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

pub fn weather_cache_hit_total(m: &Metrics) -> &IntCounter {
    &m.weather_cache_hit
}

pub fn weather_cache_miss_total(m: &Metrics) -> &IntCounter {
    &m.weather_cache_miss
}

pub fn weather_failures_total(m: &Metrics) -> &IntCounter {
    &m.weather_failures
}

pub fn workouts_analyzed_total(m: &Metrics) -> &IntCounter {
    &m.workouts_analyzed
}

pub fn points_skipped_total(m: &Metrics) -> &IntCounter {
    &m.points_skipped
}
