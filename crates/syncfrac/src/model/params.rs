//! Parameter definitions and evaluation contexts.
//!
//! A [`ParamSpace`] is built once from configuration and read-only afterwards.
//! Sample ranges are materialized eagerly so that "varying" is a property of
//! the data (`samples.len() > 1`), not of how the range was described.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Generate `count` evenly spaced values from `min` to `max`, endpoints
/// inclusive. A count of zero or one collapses to the single value `min`.
pub fn linspace(min: f64, max: f64, count: usize) -> Vec<f64> {
    if count <= 1 {
        return vec![min];
    }
    let step = (max - min) / (count - 1) as f64;
    (0..count).map(|i| min + step * i as f64).collect()
}

/// A single model parameter: a default value plus the ordered sample values
/// it takes when swept. A parameter with one sample is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    default: f64,
    samples: Vec<f64>,
}

impl Parameter {
    /// A parameter that never varies; its only sample is its default.
    pub fn fixed(default: f64) -> Self {
        Self {
            default,
            samples: vec![default],
        }
    }

    /// A parameter with an explicit sample sequence.
    pub fn from_samples(default: f64, samples: Vec<f64>) -> Self {
        Self { default, samples }
    }

    /// A parameter swept over `count` evenly spaced samples in `[min, max]`.
    pub fn swept(default: f64, min: f64, max: f64, count: usize) -> Self {
        Self {
            default,
            samples: linspace(min, max, count),
        }
    }

    pub fn default_value(&self) -> f64 {
        self.default
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// A parameter varies iff it has more than one sample value.
    pub fn is_varying(&self) -> bool {
        self.samples.len() > 1
    }
}

/// The full parameter set for a sweep, keyed by unique name.
///
/// Iteration order is name-sorted, which makes pair enumeration and cache
/// hashing deterministic across runs regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamSpace {
    params: BTreeMap<String, Parameter>,
}

impl ParamSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, validating it on the way in. Replaces any existing
    /// parameter of the same name.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        param: Parameter,
    ) -> Result<(), ConfigError> {
        let name = name.into();
        if param.samples.is_empty() {
            return Err(ConfigError::EmptyRange { name });
        }
        if !param.default.is_finite() || param.samples.iter().any(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite { name });
        }
        self.params.insert(name, param);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    /// Sample values for a named parameter, or an error naming the missing one.
    pub fn samples(&self, name: &str) -> Result<&[f64], ConfigError> {
        self.params
            .get(name)
            .map(|p| p.samples())
            .ok_or_else(|| ConfigError::UnknownParameter {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Parameter)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Names of all varying parameters, in name-sorted order.
    pub fn varying_names(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|(_, p)| p.is_varying())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Every parameter at its default value.
    pub fn defaults(&self) -> ParamVector {
        ParamVector {
            values: self
                .params
                .iter()
                .map(|(k, p)| (k.clone(), p.default))
                .collect(),
        }
    }
}

/// A concrete assignment of values to parameter names, the input handed to
/// the external correlation model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamVector {
    values: BTreeMap<String, f64>,
}

impl ParamVector {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Insert or replace a value.
    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: f64) -> Self {
        self.set(name, value);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, f64)> for ParamVector {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace_endpoints_inclusive() {
        let vals = linspace(0.0, 1.0, 5);
        assert_eq!(vals.len(), 5);
        assert!((vals[0] - 0.0).abs() < 1e-12);
        assert!((vals[2] - 0.5).abs() < 1e-12);
        assert!((vals[4] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_linspace_single_point_is_min() {
        assert_eq!(linspace(0.3, 0.9, 1), vec![0.3]);
        assert_eq!(linspace(0.3, 0.9, 0), vec![0.3]);
    }

    #[test]
    fn test_fixed_parameter_does_not_vary() {
        let p = Parameter::fixed(2.5);
        assert!(!p.is_varying());
        assert_eq!(p.samples(), &[2.5]);
    }

    #[test]
    fn test_swept_parameter_varies() {
        let p = Parameter::swept(1.0, 0.0, 2.0, 3);
        assert!(p.is_varying());
        assert_eq!(p.samples().len(), 3);
        assert!((p.samples()[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_insert_rejects_empty_samples() {
        let mut space = ParamSpace::new();
        let err = space
            .insert("a", Parameter::from_samples(1.0, vec![]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRange { .. }));
    }

    #[test]
    fn test_insert_rejects_non_finite() {
        let mut space = ParamSpace::new();
        let err = space
            .insert("a", Parameter::from_samples(f64::NAN, vec![1.0]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite { .. }));

        let err = space
            .insert("a", Parameter::from_samples(1.0, vec![1.0, f64::INFINITY]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::NonFinite { .. }));
    }

    #[test]
    fn test_varying_names_are_sorted_regardless_of_insertion() {
        let mut space = ParamSpace::new();
        space.insert("zeta", Parameter::swept(0.0, 0.0, 1.0, 3)).unwrap();
        space.insert("alpha", Parameter::swept(0.0, 0.0, 1.0, 3)).unwrap();
        space.insert("mid", Parameter::fixed(7.0)).unwrap();
        assert_eq!(space.varying_names(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_defaults_cover_every_parameter() {
        let mut space = ParamSpace::new();
        space.insert("a", Parameter::swept(1.0, 0.0, 2.0, 3)).unwrap();
        space.insert("b", Parameter::fixed(5.0)).unwrap();
        let defaults = space.defaults();
        assert_eq!(defaults.len(), 2);
        assert_eq!(defaults.get("a"), Some(1.0));
        assert_eq!(defaults.get("b"), Some(5.0));
    }

    #[test]
    fn test_vector_with_overrides_existing() {
        let v = ParamVector::default().with("x", 1.0).with("x", 2.0);
        assert_eq!(v.get("x"), Some(2.0));
        assert_eq!(v.len(), 1);
    }

    #[test]
    fn test_samples_lookup_unknown_name_errors() {
        let space = ParamSpace::new();
        let err = space.samples("missing").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownParameter { .. }));
    }
}
