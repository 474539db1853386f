// core/src/config.rs
use std::collections::BTreeMap;
use std::path::Path;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_path_to_error as spte;

use crate::error::ConfigError;

/// Fallback when an activity type has no entry (km/h).
pub const DEFAULT_STOPPED_SPEED_THRESHOLD: f64 = 1.0;
pub const DEFAULT_WEATHER_TIMEOUT_SECS: u64 = 5;

/// Built-in stopped-speed thresholds (km/h) per activity type.
static DEFAULT_ACTIVITIES: Lazy<BTreeMap<String, ActivityConfig>> = Lazy::new(|| {
    [
        ("cycling (sport)", 1.0),
        ("cycling (transport)", 1.0),
        ("cycling (virtual)", 1.0),
        ("mountain biking", 1.0),
        ("mountain biking (electric)", 1.0),
        ("skiing (alpine)", 1.0),
        ("skiing (cross country)", 1.0),
        ("rowing", 0.1),
        ("running", 0.1),
        ("trail", 0.1),
        ("hiking", 0.1),
        ("walking", 0.1),
        ("snowshoes", 0.1),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), ActivityConfig { stopped_speed_threshold: v }))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActivityConfig {
    pub stopped_speed_threshold: f64, // km/h
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    DEFAULT_WEATHER_TIMEOUT_SECS
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            provider: None,
            api_key: None,
            timeout_secs: DEFAULT_WEATHER_TIMEOUT_SECS,
        }
    }
}

impl WeatherConfig {
    /// Read `WEATHER_API_KEY`, `WEATHER_API_PROVIDER` and `WEATHER_API_TIMEOUT_SECS`.
    ///
    /// Called once by the owning service at start-up.
    pub fn from_env() -> Self {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let timeout_secs = match non_empty("WEATHER_API_TIMEOUT_SECS") {
            Some(v) => v.parse().unwrap_or_else(|_| {
                log::warn!("[config] WEATHER_API_TIMEOUT_SECS={v:?} is not a number, using default");
                DEFAULT_WEATHER_TIMEOUT_SECS
            }),
            None => DEFAULT_WEATHER_TIMEOUT_SECS,
        };
        Self {
            provider: non_empty("WEATHER_API_PROVIDER").map(|p| p.to_lowercase()),
            api_key: non_empty("WEATHER_API_KEY"),
            timeout_secs,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_threshold")]
    pub default_stopped_speed_threshold: f64,
    /// Keyed by lowercase activity label.
    #[serde(default = "default_activities")]
    pub activities: BTreeMap<String, ActivityConfig>,
    #[serde(default)]
    pub weather: WeatherConfig,
}

fn default_threshold() -> f64 {
    DEFAULT_STOPPED_SPEED_THRESHOLD
}

fn default_activities() -> BTreeMap<String, ActivityConfig> {
    DEFAULT_ACTIVITIES.clone()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_stopped_speed_threshold: DEFAULT_STOPPED_SPEED_THRESHOLD,
            activities: default_activities(),
            weather: WeatherConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn stopped_speed_threshold(&self, activity_type: &str) -> f64 {
        self.activities
            .get(&activity_type.trim().to_lowercase())
            .map(|a| a.stopped_speed_threshold)
            .unwrap_or(self.default_stopped_speed_threshold)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let mut de = serde_json::Deserializer::from_str(text);
        let mut cfg: AnalysisConfig = spte::deserialize(&mut de).map_err(|e| ConfigError::Parse {
            path: e.path().to_string(),
            message: e.inner().to_string(),
        })?;
        cfg.activities = std::mem::take(&mut cfg.activities)
            .into_iter()
            .map(|(k, v)| (k.trim().to_lowercase(), v))
            .collect();
        Ok(cfg)
    }
}

/// Load config from disk (JSON). A missing file yields the defaults.
pub fn load_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    if !path.exists() {
        log::warn!("[config] {} not found, using defaults", path.display());
        return Ok(AnalysisConfig::default());
    }
    let text = std::fs::read_to_string(path)?;
    let cfg = AnalysisConfig::from_json(&text)?;
    log::info!(
        "[config] loaded {} ({} activity types)",
        path.display(),
        cfg.activities.len()
    );
    Ok(cfg)
}

pub fn save_config(cfg: &AnalysisConfig, path: &Path) -> Result<(), ConfigError> {
    let json = serde_json::to_string_pretty(cfg).map_err(|e| ConfigError::Parse {
        path: ".".into(),
        message: e.to_string(),
    })?;
    std::fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_by_activity() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.stopped_speed_threshold("Walking"), 0.1);
        assert_eq!(cfg.stopped_speed_threshold("cycling (sport)"), 1.0);
        assert_eq!(cfg.stopped_speed_threshold("underwater basket weaving"), 1.0);
    }

    #[test]
    fn parse_error_reports_path() {
        let err = AnalysisConfig::from_json(r#"{"activities": {"running": {"stopped_speed_threshold": "fast"}}}"#)
            .unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => {
                assert_eq!(path, "activities.running.stopped_speed_threshold")
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg = AnalysisConfig::from_json(r#"{"weather": {"api_key": "k"}}"#).unwrap();
        assert_eq!(cfg.weather.timeout_secs, DEFAULT_WEATHER_TIMEOUT_SECS);
        assert_eq!(cfg.stopped_speed_threshold("hiking"), 0.1);
    }

    #[test]
    fn custom_activity_keys_are_case_insensitive() {
        let cfg = AnalysisConfig::from_json(r#"{"activities": {"Kayak": {"stopped_speed_threshold": 0.5}}}"#).unwrap();
        assert_eq!(cfg.stopped_speed_threshold("KAYAK"), 0.5);
        // explicit table replaces the built-in one
        assert_eq!(cfg.stopped_speed_threshold("walking"), 1.0);
    }

    #[test]
    fn weather_from_lookup() {
        let env = |k: &str| match k {
            "WEATHER_API_KEY" => Some("secret".to_string()),
            "WEATHER_API_PROVIDER" => Some("VisualCrossing".to_string()),
            "WEATHER_API_TIMEOUT_SECS" => Some("nope".to_string()),
            _ => None,
        };
        let w = WeatherConfig::from_lookup(env);
        assert_eq!(w.api_key.as_deref(), Some("secret"));
        assert_eq!(w.provider.as_deref(), Some("visualcrossing"));
        assert_eq!(w.timeout_secs, DEFAULT_WEATHER_TIMEOUT_SECS);

        let empty = WeatherConfig::from_lookup(|_| Some("  ".to_string()));
        assert_eq!(empty.api_key, None);
    }
}
