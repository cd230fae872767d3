//! Sweep configuration documents driving real runs
//!
//! These tests verify that:
//! - A JSON document materializes ranges at the configured resolution
//! - Fixed parameters hold their defaults and stay out of the pair sweep
//! - A config file read from disk drives a full sweep end to end
//! - A missing config file surfaces as an I/O config error

use std::fs;

use tempfile::tempdir;

use crate::cache::SweepCache;
use crate::config::SweepConfig;
use crate::error::ConfigError;
use crate::evaluate::{PairEvaluator, Suppression};
use crate::model::{GridShape, Metric, ParamVector};
use crate::sweep::SweepOrchestrator;

const DOC: &str = r#"{
    "args": { "resolution": 3, "processes": 2 },
    "params": {
        "Shh": { "default": 0.5, "range": [0.0, 1.0] },
        "mh":  { "default": 0.3, "range": [0.1, 0.5] },
        "Spp": { "default": 0.3 }
    }
}"#;

/// Test that a document loaded from disk drives a complete sweep
#[test]
fn test_config_file_drives_a_full_sweep() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sweep.json");
    fs::write(&path, DOC).unwrap();

    let config = SweepConfig::load(&path).unwrap();
    assert_eq!(config.settings.resolution, 3);
    assert_eq!(config.settings.workers, 2);

    let orchestrator = SweepOrchestrator::new(
        SweepCache::new(dir.path().join("run")),
        config.settings.workers,
    );
    let model = |p: &ParamVector| {
        p.get("Shh").unwrap() + p.get("mh").unwrap() + p.get("Spp").unwrap()
    };
    let evaluator = PairEvaluator::new(model, Suppression::none());
    let result = orchestrator.run(&config.space, &evaluator).unwrap();

    assert_eq!(result.varying(), &["Shh".to_string(), "mh".to_string()]);
    let plane = result.get_by_name(Metric::Den, "Shh", "mh").unwrap();
    assert_eq!(plane.shape(), GridShape::Plane(3, 3));
    // row 0 is Shh = 0.0, column 2 is mh = 0.5, Spp fixed at 0.3
    let actual = plane.get(0, 2).unwrap();
    assert!(
        (actual - 0.8).abs() < 1e-9,
        "expected 0.8, got {actual}"
    );
}

/// Test that fixed parameters appear in contexts but not in the sweep
#[test]
fn test_fixed_parameters_stay_out_of_the_sweep() {
    let config = SweepConfig::from_json(DOC).unwrap();
    assert_eq!(config.space.len(), 3);
    assert_eq!(config.space.varying_names(), vec!["Shh", "mh"]);
    assert_eq!(config.space.get("Spp").unwrap().samples(), &[0.3]);
}

/// Test that a missing file is reported with its path
#[test]
fn test_missing_config_file_is_an_io_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.json");
    let err = SweepConfig::load(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected Io error, got {other:?}"),
    }
}
