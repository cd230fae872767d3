//! Synchrony metrics computed at each grid cell.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The metrics stored for every grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Correlation with the synchronizing influences suppressed
    Num,
    /// Correlation with all influences present
    Den,
    /// Fraction of synchrony: `num / den`
    Ratio,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Num, Metric::Den, Metric::Ratio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Num => "num",
            Metric::Den => "den",
            Metric::Ratio => "ratio",
        }
    }

    /// Descriptive label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Num => "correlation, synchronizing influences suppressed",
            Metric::Den => "correlation, all influences present",
            Metric::Ratio => "fraction of synchrony",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The metric values for one grid cell.
///
/// `ratio` is never a raw division artifact: if either correlation is NaN
/// the ratio is NaN. A zero denominator follows IEEE division.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBundle {
    #[serde(with = "corr_value")]
    pub num: f64,
    #[serde(with = "corr_value")]
    pub den: f64,
    #[serde(with = "corr_value")]
    pub ratio: f64,
}

impl Default for MetricBundle {
    /// An unevaluated cell: all NaN.
    fn default() -> Self {
        Self {
            num: f64::NAN,
            den: f64::NAN,
            ratio: f64::NAN,
        }
    }
}

impl MetricBundle {
    /// Bundle two correlations with their NaN-guarded ratio.
    pub fn from_correlations(num: f64, den: f64) -> Self {
        let ratio = if num.is_nan() || den.is_nan() {
            f64::NAN
        } else {
            num / den
        };
        Self { num, den, ratio }
    }

    pub fn get(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Num => self.num,
            Metric::Den => self.den,
            Metric::Ratio => self.ratio,
        }
    }
}

/// Serde representation for correlation cells.
///
/// JSON cannot express NaN or infinities; non-finite values are written as
/// the string sentinels `"NaN"`, `"inf"`, `"-inf"` so cache files round-trip
/// exactly.
mod corr_value {
    use std::fmt;

    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else if value.is_nan() {
            serializer.serialize_str("NaN")
        } else if *value > 0.0 {
            serializer.serialize_str("inf")
        } else {
            serializer.serialize_str("-inf")
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        struct CorrVisitor;

        impl Visitor<'_> for CorrVisitor {
            type Value = f64;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a float or one of \"NaN\", \"inf\", \"-inf\"")
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
                Ok(v)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
                Ok(v as f64)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<f64, E> {
                match v {
                    "NaN" => Ok(f64::NAN),
                    "inf" => Ok(f64::INFINITY),
                    "-inf" => Ok(f64::NEG_INFINITY),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }
        }

        deserializer.deserialize_any(CorrVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratio_is_division_when_finite() {
        let b = MetricBundle::from_correlations(0.5, 0.8);
        assert!((b.ratio - 0.625).abs() < 1e-12);
    }

    #[test]
    fn test_nan_numerator_forces_nan_ratio() {
        let b = MetricBundle::from_correlations(f64::NAN, 0.8);
        assert!(b.ratio.is_nan());
    }

    #[test]
    fn test_nan_denominator_forces_nan_ratio() {
        let b = MetricBundle::from_correlations(0.5, f64::NAN);
        assert!(b.ratio.is_nan());
    }

    #[test]
    fn test_zero_denominator_gives_infinity() {
        let b = MetricBundle::from_correlations(0.5, 0.0);
        assert!(b.ratio.is_infinite());
    }

    #[test]
    fn test_bundle_round_trips_through_json() {
        let b = MetricBundle::from_correlations(0.123456789, 0.987654321);
        let json = serde_json::to_string(&b).unwrap();
        let back: MetricBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }

    #[test]
    fn test_non_finite_cells_round_trip_as_sentinels() {
        let b = MetricBundle::from_correlations(f64::NAN, 0.0);
        let json = serde_json::to_string(&b).unwrap();
        assert!(json.contains("\"NaN\""));
        let back: MetricBundle = serde_json::from_str(&json).unwrap();
        assert!(back.num.is_nan());
        assert!(back.ratio.is_nan());
        assert_eq!(back.den, 0.0);

        let inf = MetricBundle::from_correlations(0.5, 0.0);
        let json = serde_json::to_string(&inf).unwrap();
        assert!(json.contains("\"inf\""));
        let back: MetricBundle = serde_json::from_str(&json).unwrap();
        assert!(back.ratio.is_infinite() && back.ratio > 0.0);
    }

    #[test]
    fn test_metric_names_match_wire_names() {
        assert_eq!(Metric::Num.as_str(), "num");
        assert_eq!(Metric::Den.as_str(), "den");
        assert_eq!(Metric::Ratio.as_str(), "ratio");
        assert_eq!(Metric::ALL.len(), 3);
    }
}
