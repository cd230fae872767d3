//! Sweep configuration documents.
//!
//! A sweep is described by a JSON document:
//!
//! ```json
//! {
//!     "args": { "resolution": 40, "processes": 3 },
//!     "params": {
//!         "mh":  { "default": 0.25, "range": [0.0, 0.5] },
//!         "Shh": { "default": 0.1 }
//!     }
//! }
//! ```
//!
//! Each `range` is materialized into `resolution` evenly spaced samples
//! (endpoints inclusive); a parameter without a range is fixed at its
//! default. `processes` overrides the worker-count default.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::model::{ParamSpace, Parameter, linspace};

/// Worker-count default: available processing units minus one (reserving a
/// unit for the coordinating thread), never below one.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1))
        .unwrap_or(1)
        .max(1)
}

#[derive(Debug, Clone, Deserialize)]
struct RawConfig {
    args: RawArgs,
    params: BTreeMap<String, RawParam>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawArgs {
    resolution: usize,
    #[serde(default)]
    processes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawParam {
    #[serde(default)]
    default: Option<f64>,
    #[serde(default)]
    range: Option<[f64; 2]>,
}

/// Run-level settings extracted from a config document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSettings {
    /// Samples per swept range
    pub resolution: usize,
    /// Worker threads for pair evaluation
    pub workers: usize,
}

/// A parsed sweep configuration: the parameter space plus run settings.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    pub space: ParamSpace,
    pub settings: SweepSettings,
}

impl SweepConfig {
    /// Parse and validate a config document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;

        if raw.args.resolution == 0 {
            return Err(ConfigError::InvalidResolution { resolution: 0 });
        }

        let mut space = ParamSpace::new();
        for (name, param) in raw.params {
            let default = param
                .default
                .ok_or_else(|| ConfigError::MissingDefault { name: name.clone() })?;
            let samples = match param.range {
                Some([lo, hi]) => linspace(lo, hi, raw.args.resolution),
                None => vec![default],
            };
            space.insert(name, Parameter::from_samples(default, samples))?;
        }

        let workers = raw.args.processes.unwrap_or_else(default_workers).max(1);

        Ok(Self {
            space,
            settings: SweepSettings {
                resolution: raw.args.resolution,
                workers,
            },
        })
    }

    /// Read and parse a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }
}
