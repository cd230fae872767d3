//! Reduction of per-pair grids into per-metric lookup tables.
//!
//! A finished sweep produces one grid per unordered pair of varying
//! parameters. Reduction folds those into a symmetric K×K table per
//! metric so consumers can ask "give me the ratio surface for (a, b)"
//! in either name order.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;

use crate::error::{ReduceError, Result};
use crate::model::{Metric, PairGrid, ValueGrid};

/// Final product of a sweep: for every metric, a symmetric K×K table of
/// value grids over the K varying parameters.
///
/// Each unordered pair is stored once. The symmetric lookup hands back the
/// grid exactly as computed, so its rows always follow the
/// lexicographically first name of the pair; no transpose happens on the
/// mirrored lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    varying: Vec<String>,
    /// Row-major K×K map from `(i, j)` to a slot in each metric's table.
    pair_index: Vec<usize>,
    tables: BTreeMap<Metric, Vec<ValueGrid>>,
}

impl SweepResult {
    /// Varying parameter names, sorted.
    pub fn varying(&self) -> &[String] {
        &self.varying
    }

    /// Number of distinct unordered pairs covered.
    pub fn pair_count(&self) -> usize {
        let k = self.varying.len();
        k * (k + 1) / 2
    }

    /// Grid for `metric` at varying-name positions `(i, j)`.
    pub fn get(&self, metric: Metric, i: usize, j: usize) -> Option<&ValueGrid> {
        let k = self.varying.len();
        if i >= k || j >= k {
            return None;
        }
        let slot = self.pair_index[i * k + j];
        self.tables.get(&metric).and_then(|table| table.get(slot))
    }

    /// Grid for `metric` by parameter names, accepted in either order.
    pub fn get_by_name(&self, metric: Metric, k1: &str, k2: &str) -> Option<&ValueGrid> {
        let i = self.varying.binary_search_by(|v| v.as_str().cmp(k1)).ok()?;
        let j = self.varying.binary_search_by(|v| v.as_str().cmp(k2)).ok()?;
        self.get(metric, i, j)
    }

    /// All grids for one metric, in pair submission order.
    pub fn table(&self, metric: Metric) -> &[ValueGrid] {
        self.tables.get(&metric).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Fold per-pair grids into symmetric per-metric tables.
///
/// `pairs` and `grids` must line up slot for slot, and every unordered
/// pair over `varying` must appear exactly once. A missing pair or a
/// duplicate (including a mirrored duplicate such as `(b, a)` next to
/// `(a, b)`) is an error, never a silent fallback to some other grid.
pub fn reduce(
    pairs: &[(String, String)],
    grids: &[PairGrid],
    varying: &[String],
) -> Result<SweepResult> {
    if pairs.len() != grids.len() {
        return Err(ReduceError::LengthMismatch {
            pairs: pairs.len(),
            grids: grids.len(),
        }
        .into());
    }

    let mut slots: FxHashMap<(&str, &str), usize> = FxHashMap::default();
    for (slot, (k1, k2)) in pairs.iter().enumerate() {
        if slots.insert(normalized(k1, k2), slot).is_some() {
            return Err(ReduceError::DuplicatePair {
                k1: k1.clone(),
                k2: k2.clone(),
            }
            .into());
        }
    }

    let k = varying.len();
    let mut pair_index = vec![0usize; k * k];
    for (i, k1) in varying.iter().enumerate() {
        for (j, k2) in varying.iter().enumerate() {
            let slot = slots
                .get(&normalized(k1, k2))
                .copied()
                .ok_or_else(|| ReduceError::MissingPair {
                    k1: k1.clone(),
                    k2: k2.clone(),
                })?;
            pair_index[i * k + j] = slot;
        }
    }

    let mut tables = BTreeMap::new();
    for metric in Metric::ALL {
        let table: Vec<ValueGrid> = grids.iter().map(|g| g.metric_values(metric)).collect();
        tables.insert(metric, table);
    }

    Ok(SweepResult {
        varying: varying.to_vec(),
        pair_index,
        tables,
    })
}

fn normalized<'a>(k1: &'a str, k2: &'a str) -> (&'a str, &'a str) {
    if k1 <= k2 { (k1, k2) } else { (k2, k1) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SweepError;
    use crate::model::{GridShape, MetricBundle};

    fn pair(k1: &str, k2: &str) -> (String, String) {
        (k1.to_string(), k2.to_string())
    }

    fn filled_grid(shape: GridShape, num: f64, den: f64) -> PairGrid {
        let mut grid = PairGrid::new(shape);
        match shape {
            GridShape::Line(n) => {
                for i in 0..n {
                    grid.set(i, i, MetricBundle::from_correlations(num, den));
                }
            }
            GridShape::Plane(rows, cols) => {
                for i in 0..rows {
                    for j in 0..cols {
                        grid.set(i, j, MetricBundle::from_correlations(num, den));
                    }
                }
            }
        }
        grid
    }

    fn two_varying() -> (Vec<(String, String)>, Vec<PairGrid>, Vec<String>) {
        let pairs = vec![pair("a", "a"), pair("a", "b"), pair("b", "b")];
        let grids = vec![
            filled_grid(GridShape::Line(2), 0.1, 0.2),
            filled_grid(GridShape::Plane(2, 2), 0.3, 0.4),
            filled_grid(GridShape::Line(2), 0.5, 0.6),
        ];
        let varying = vec!["a".to_string(), "b".to_string()];
        (pairs, grids, varying)
    }

    #[test]
    fn test_builds_symmetric_tables() {
        let (pairs, grids, varying) = two_varying();
        let result = reduce(&pairs, &grids, &varying).unwrap();

        assert_eq!(result.varying(), &["a".to_string(), "b".to_string()]);
        assert_eq!(result.pair_count(), 3);
        for metric in Metric::ALL {
            assert_eq!(result.table(metric).len(), 3);
        }

        let on_diag = result.get(Metric::Num, 0, 0).unwrap();
        assert_eq!(on_diag.shape(), GridShape::Line(2));
        assert_eq!(on_diag.get(0, 0), Some(0.1));

        // mirrored lookup hits the same slot, untransposed
        assert_eq!(result.get(Metric::Den, 0, 1), result.get(Metric::Den, 1, 0));
        assert_eq!(
            result.get(Metric::Den, 0, 1).unwrap().get(1, 0),
            Some(0.4)
        );
    }

    #[test]
    fn test_lookup_by_name_accepts_either_order() {
        let (pairs, grids, varying) = two_varying();
        let result = reduce(&pairs, &grids, &varying).unwrap();

        let ab = result.get_by_name(Metric::Ratio, "a", "b").unwrap();
        let ba = result.get_by_name(Metric::Ratio, "b", "a").unwrap();
        assert_eq!(ab, ba);
        assert_eq!(result.get_by_name(Metric::Ratio, "a", "z"), None);
    }

    #[test]
    fn test_out_of_range_positions_are_none() {
        let (pairs, grids, varying) = two_varying();
        let result = reduce(&pairs, &grids, &varying).unwrap();
        assert_eq!(result.get(Metric::Num, 2, 0), None);
        assert_eq!(result.get(Metric::Num, 0, 2), None);
    }

    #[test]
    fn test_length_mismatch_is_rejected() {
        let (pairs, mut grids, varying) = two_varying();
        grids.pop();
        let err = reduce(&pairs, &grids, &varying).unwrap_err();
        assert!(matches!(
            err,
            SweepError::Reduce(ReduceError::LengthMismatch { pairs: 3, grids: 2 })
        ));
    }

    #[test]
    fn test_missing_pair_is_rejected() {
        let pairs = vec![pair("a", "a"), pair("b", "b")];
        let grids = vec![
            filled_grid(GridShape::Line(2), 0.1, 0.2),
            filled_grid(GridShape::Line(2), 0.5, 0.6),
        ];
        let varying = vec!["a".to_string(), "b".to_string()];
        let err = reduce(&pairs, &grids, &varying).unwrap_err();
        assert!(matches!(
            err,
            SweepError::Reduce(ReduceError::MissingPair { .. })
        ));
    }

    #[test]
    fn test_mirrored_duplicate_is_rejected() {
        let pairs = vec![
            pair("a", "a"),
            pair("a", "b"),
            pair("b", "a"),
            pair("b", "b"),
        ];
        let grids = vec![
            filled_grid(GridShape::Line(2), 0.1, 0.2),
            filled_grid(GridShape::Plane(2, 2), 0.3, 0.4),
            filled_grid(GridShape::Plane(2, 2), 0.3, 0.4),
            filled_grid(GridShape::Line(2), 0.5, 0.6),
        ];
        let varying = vec!["a".to_string(), "b".to_string()];
        let err = reduce(&pairs, &grids, &varying).unwrap_err();
        assert!(matches!(
            err,
            SweepError::Reduce(ReduceError::DuplicatePair { .. })
        ));
    }
}
