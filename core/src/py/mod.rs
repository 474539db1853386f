// Python bindings (feature "python"). Everything crosses the boundary as
// JSON strings so the web layer can store the results as-is.

use std::sync::Arc;

use anyhow::Context;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::wrap_pyfunction;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_path_to_error as spte;

use crate::analyzer::{manual_summary, Analyzer};
use crate::chart::chart_data;
use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::gpx::parse_gpx;
use crate::metrics::Metrics;
use crate::models::{RawPoint, Track};
use crate::records::{evaluate, on_workout_removed, recompute};
use crate::types::{Record, WorkoutEntry};
use crate::weather::WeatherEnrichment;

// ──────────────────────────────────────────────────────────────────────────────
// HELPERS
// ──────────────────────────────────────────────────────────────────────────────

fn parse_json<T: DeserializeOwned>(what: &str, text: &str) -> anyhow::Result<T> {
    let mut de = serde_json::Deserializer::from_str(text);
    spte::deserialize(&mut de).map_err(|e| anyhow::anyhow!("{what} parse at {}: {}", e.path(), e.inner()))
}

fn to_json<T: Serialize>(v: &T) -> PyResult<String> {
    serde_json::to_string(v).map_err(|e| PyValueError::new_err(e.to_string()))
}

fn py_err(e: anyhow::Error) -> PyErr {
    PyValueError::new_err(format!("{e:#}"))
}

fn analysis_err(e: AnalysisError) -> PyErr {
    PyValueError::new_err(format!("{}: {e}", e.code()))
}

fn build_analyzer(config_json: Option<&str>) -> anyhow::Result<Analyzer> {
    let config = match config_json {
        Some(text) => AnalysisConfig::from_json(text).context("config")?,
        None => AnalysisConfig::default(),
    };
    let metrics = Arc::new(Metrics::new().context("metrics registry")?);
    let weather = WeatherEnrichment::from_config(&config.weather, metrics.clone());
    Ok(Analyzer::new(config, Some(weather), metrics))
}

// ──────────────────────────────────────────────────────────────────────────────
// ANALYSIS
// ──────────────────────────────────────────────────────────────────────────────

#[pyfunction]
#[pyo3(signature = (gpx_xml, activity_type, config_json=None))]
fn analyze_gpx_json(gpx_xml: &str, activity_type: &str, config_json: Option<&str>) -> PyResult<String> {
    let analyzer = build_analyzer(config_json).map_err(py_err)?;
    let summary = analyzer.analyze_gpx(gpx_xml, activity_type).map_err(analysis_err)?;
    to_json(&summary)
}

/// `segments_json`: `[[{"time": .., "lat": .., "lon": .., "ele": ..}, ..], ..]`
#[pyfunction]
#[pyo3(signature = (segments_json, activity_type, config_json=None))]
fn analyze_points_json(segments_json: &str, activity_type: &str, config_json: Option<&str>) -> PyResult<String> {
    let raw: Vec<Vec<RawPoint>> = parse_json("segments", segments_json).map_err(py_err)?;
    let analyzer = build_analyzer(config_json).map_err(py_err)?;
    let summary = analyzer.analyze(raw, activity_type).map_err(analysis_err)?;
    to_json(&summary)
}

#[pyfunction]
#[pyo3(signature = (distance_km, duration_secs, ascent=None, descent=None))]
fn manual_summary_json(distance_km: f64, duration_secs: f64, ascent: Option<f64>, descent: Option<f64>) -> PyResult<String> {
    let summary = manual_summary(distance_km, duration_secs, ascent, descent).map_err(analysis_err)?;
    to_json(&summary)
}

#[pyfunction]
fn chart_data_json(gpx_xml: &str) -> PyResult<String> {
    let raw = parse_gpx(gpx_xml).map_err(analysis_err)?;
    let track = Track::from_raw_segments(raw).map_err(analysis_err)?;
    to_json(&chart_data(&track))
}

// ──────────────────────────────────────────────────────────────────────────────
// RECORDS
// ──────────────────────────────────────────────────────────────────────────────

#[pyfunction]
fn evaluate_records_json(workout_json: &str, records_json: &str) -> PyResult<String> {
    let entry: WorkoutEntry = parse_json("workout", workout_json).map_err(py_err)?;
    let current: Vec<Record> = parse_json("records", records_json).map_err(py_err)?;
    to_json(&evaluate(&entry, &current))
}

#[pyfunction]
fn recompute_records_json(user_id: i64, activity_type: &str, workouts_json: &str, records_json: &str) -> PyResult<String> {
    let workouts: Vec<WorkoutEntry> = parse_json("workouts", workouts_json).map_err(py_err)?;
    let current: Vec<Record> = parse_json("records", records_json).map_err(py_err)?;
    to_json(&recompute(user_id, activity_type, &workouts, &current))
}

#[pyfunction]
fn remove_workout_records_json(removed_json: &str, remaining_json: &str, records_json: &str) -> PyResult<String> {
    let removed: WorkoutEntry = parse_json("removed", removed_json).map_err(py_err)?;
    let remaining: Vec<WorkoutEntry> = parse_json("remaining", remaining_json).map_err(py_err)?;
    let current: Vec<Record> = parse_json("records", records_json).map_err(py_err)?;
    to_json(&on_workout_removed(&removed, &remaining, &current))
}

#[pymodule]
fn trackstat_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(analyze_gpx_json, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_points_json, m)?)?;
    m.add_function(wrap_pyfunction!(manual_summary_json, m)?)?;
    m.add_function(wrap_pyfunction!(chart_data_json, m)?)?;
    m.add_function(wrap_pyfunction!(evaluate_records_json, m)?)?;
    m.add_function(wrap_pyfunction!(recompute_records_json, m)?)?;
    m.add_function(wrap_pyfunction!(remove_workout_records_json, m)?)?;
    Ok(())
}
