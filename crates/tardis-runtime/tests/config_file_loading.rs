#![forbid(unsafe_code)]

//! Loading [`TardisConfig`] from files on disk.
//!
//! Run:
//!   cargo test -p tardis-runtime --features config-file --test config_file_loading

use std::error::Error;
use std::fs;

use tardis_runtime::{ConfigError, SiblingSeed, Tardis, TardisConfig};
use web_time::Duration;

fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn toml_file_overrides_only_named_keys() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "tardis.toml", "debounce_ms = 120\nsibling_seed = \"snap_to_pick\"\n");

    let config = TardisConfig::load_validated(&path).unwrap();
    assert_eq!(config.debounce(), Duration::from_millis(120));
    assert_eq!(config.sibling_seed, SiblingSeed::SnapToPick);
    assert_eq!(config.tooltip_radius, TardisConfig::default().tooltip_radius);
    assert_eq!(config.viewport_width, TardisConfig::default().viewport_width);
}

#[test]
fn json_file_is_picked_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "tardis.json",
        r#"{"tooltip_radius": 8.5, "viewport_width": 1280.0}"#,
    );

    let config = TardisConfig::load_validated(&path).unwrap();
    assert_eq!(config.tooltip_radius, 8.5);
    assert_eq!(config.viewport_width, 1280.0);
    assert_eq!(config.debounce_ms, 300);
    assert_eq!(config.sibling_seed, SiblingSeed::LeaveAbsent);
}

#[test]
fn empty_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "empty.toml", "");
    assert_eq!(
        TardisConfig::load_validated(&path).unwrap(),
        TardisConfig::default()
    );
}

#[test]
fn malformed_toml_reports_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "broken.toml", "debounce_ms = = 3\n");

    let err = TardisConfig::load_validated(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err}");
    assert!(err.source().is_some());
    assert!(err.to_string().starts_with("TOML parse error"));
}

#[test]
fn malformed_json_reports_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "broken.json", "{\"debounce_ms\": }");

    let err = TardisConfig::from_json_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Json(_)), "{err}");
}

#[test]
fn unknown_seed_is_rejected() {
    let err = TardisConfig::from_toml_str("sibling_seed = \"sometimes\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn out_of_range_values_fail_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(
        &dir,
        "bad.toml",
        "debounce_ms = 120000\ntooltip_radius = -2.0\n",
    );

    // Parsing alone accepts the values.
    let parsed = TardisConfig::from_toml_file(&path).unwrap();
    assert_eq!(parsed.validate().len(), 2);

    match TardisConfig::load_validated(&path) {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 2);
            assert!(errors.iter().any(|e| e.contains("debounce_ms")));
            assert!(errors.iter().any(|e| e.contains("tooltip_radius")));
        }
        other => panic!("expected validation failure, got {other:?}"),
    }
    assert!(Tardis::try_new(parsed).is_err());
}

#[test]
fn missing_file_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TardisConfig::load_validated(dir.path().join("absent.toml")).unwrap_err();
    match &err {
        ConfigError::Io(io) => assert_eq!(io.kind(), std::io::ErrorKind::NotFound),
        other => panic!("expected I/O error, got {other:?}"),
    }
    assert!(err.source().is_some());
}

#[test]
fn loaded_config_drives_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = write(&dir, "tardis.toml", "debounce_ms = 50\n");

    let tardis = Tardis::try_new(TardisConfig::load_validated(&path).unwrap()).unwrap();
    assert_eq!(tardis.config().debounce(), Duration::from_millis(50));
}

#[test]
fn config_survives_serialize_then_load() {
    let dir = tempfile::tempdir().unwrap();
    let original = TardisConfig {
        debounce_ms: 450,
        tooltip_radius: 3.0,
        viewport_width: 640.0,
        sibling_seed: SiblingSeed::SnapToPick,
    };
    let path = write(&dir, "saved.toml", &toml::to_string(&original).unwrap());
    assert_eq!(TardisConfig::load_validated(&path).unwrap(), original);
}
