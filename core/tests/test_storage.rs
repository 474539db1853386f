// core/tests/test_storage.rs
use trackstat_core::{load_config, save_config, ActivityConfig, AnalysisConfig};

#[test]
fn config_roundtrip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analysis.json");

    let mut cfg = AnalysisConfig::default();
    cfg.default_stopped_speed_threshold = 0.8;
    cfg.activities.insert("kayak".into(), ActivityConfig { stopped_speed_threshold: 0.5 });
    cfg.weather.timeout_secs = 2;

    save_config(&cfg, &path).unwrap();
    let loaded = load_config(&path).unwrap();
    assert_eq!(loaded, cfg);
    assert_eq!(loaded.stopped_speed_threshold("Kayak"), 0.5);
    assert_eq!(loaded.stopped_speed_threshold("unknown"), 0.8);
}

#[test]
fn missing_config_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config(&dir.path().join("nope.json")).unwrap();
    assert_eq!(cfg, AnalysisConfig::default());
    assert_eq!(cfg.stopped_speed_threshold("running"), 0.1);
}

#[test]
fn broken_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("analysis.json");
    std::fs::write(&path, r#"{"default_stopped_speed_threshold": [1]}"#).unwrap();
    let err = load_config(&path).unwrap_err().to_string();
    assert!(err.contains("default_stopped_speed_threshold"), "{err}");
}
