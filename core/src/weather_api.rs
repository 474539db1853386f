// core/src/weather_api.rs
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use ureq::Agent;

use crate::error::WeatherError;
use crate::models::WeatherObservation;
use crate::weather::WeatherProvider;

pub const VISUAL_CROSSING_BASE_URL: &str =
    "https://weather.visualcrossing.com/VisualCrossingWebServices/rest/services/timeline";

const ELEMENTS: &str = "datetime,datetimeEpoch,temp,humidity,windspeed,winddir,conditions,icon";

#[derive(Debug, Clone, Deserialize)]
struct TimelineResp {
    #[serde(rename = "currentConditions")]
    current_conditions: Option<CurrentConditions>,
}

#[derive(Debug, Clone, Deserialize)]
struct CurrentConditions {
    temp: Option<f64>,      // °C (unitGroup=metric)
    humidity: Option<f64>,  // %
    windspeed: Option<f64>, // km/h
    winddir: Option<f64>,   // degrees
    #[serde(default)]
    icon: Option<String>,
}

/// Visual Crossing timeline API (blocking, ureq).
pub struct VisualCrossingClient {
    agent: Agent,
    api_key: String,
    base_url: String,
}

impl VisualCrossingClient {
    pub fn new(api_key: String, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            api_key,
            base_url: VISUAL_CROSSING_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Translate a timeline response into fixed units.
///
/// humidity % -> fraction, windspeed km/h -> m/s.
pub fn parse_visual_crossing(body: &str) -> Result<WeatherObservation, WeatherError> {
    let resp: TimelineResp = serde_json::from_str(body).map_err(|e| WeatherError::Decode(e.to_string()))?;
    let cur = resp.current_conditions.ok_or(WeatherError::MissingData)?;

    // an absent reading is not a measured zero
    let (Some(temperature), Some(humidity), Some(windspeed)) = (cur.temp, cur.humidity, cur.windspeed) else {
        return Err(WeatherError::MissingData);
    };
    Ok(WeatherObservation {
        icon: cur.icon.unwrap_or_default(),
        temperature,
        humidity: humidity / 100.0,
        wind: windspeed / 3.6,
        wind_bearing: cur.winddir,
    })
}

impl WeatherProvider for VisualCrossingClient {
    fn name(&self) -> &str {
        "visualcrossing"
    }

    fn fetch(&self, latitude: f64, longitude: f64, at: DateTime<Utc>) -> Result<WeatherObservation, WeatherError> {
        let url = format!("{}/{latitude},{longitude}/{}", self.base_url, at.timestamp());

        let resp = self
            .agent
            .get(&url)
            .query("key", &self.api_key)
            .query("iconSet", "icons1")
            .query("unitGroup", "metric")
            .query("contentType", "json")
            .query("elements", ELEMENTS)
            .query("include", "current")
            .call()
            .map_err(|e| WeatherError::Http(e.to_string()))?;

        let body = resp.into_string().map_err(|e| WeatherError::Decode(e.to_string()))?;
        parse_visual_crossing(&body)
    }
}
