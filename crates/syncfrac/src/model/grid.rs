//! Grid storage for pair sweeps.
//!
//! Cells are stored in a flat row-major vector behind an explicit shape. A
//! diagonal sweep (a parameter paired with itself) is genuinely
//! one-dimensional, and the shape records that, so a K×K allocation for the
//! diagonal case cannot happen by accident.

use serde::{Deserialize, Serialize};

use super::metrics::{Metric, MetricBundle};

/// Shape of a pair grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridShape {
    /// Diagonal sweep (k1 == k2): one axis of `n` samples, cell `i`
    /// evaluated at `(r1[i], r1[i])`.
    Line(usize),
    /// Cross sweep (k1 != k2): rows sweep k1, columns sweep k2, row-major.
    Plane(usize, usize),
}

impl GridShape {
    /// Total number of cells.
    pub fn len(&self) -> usize {
        match self {
            GridShape::Line(n) => *n,
            GridShape::Plane(rows, cols) => rows * cols,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_line(&self) -> bool {
        matches!(self, GridShape::Line(_))
    }

    /// Flat index for cell `(i, j)`. On a line only the diagonal addresses
    /// `i == j` exist; out-of-bounds indices return `None`.
    pub fn flat_index(&self, i: usize, j: usize) -> Option<usize> {
        match self {
            GridShape::Line(n) => (i == j && i < *n).then_some(i),
            GridShape::Plane(rows, cols) => (i < *rows && j < *cols).then(|| i * cols + j),
        }
    }
}

/// The full metric-bundle grid for one parameter pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairGrid {
    shape: GridShape,
    cells: Vec<MetricBundle>,
}

impl PairGrid {
    /// Create a grid of the given shape with every cell unevaluated.
    pub fn new(shape: GridShape) -> Self {
        Self {
            shape,
            cells: vec![MetricBundle::default(); shape.len()],
        }
    }

    /// Create a grid from existing row-major cells. Returns `None` when the
    /// cell count does not match the shape.
    pub fn from_cells(shape: GridShape, cells: Vec<MetricBundle>) -> Option<Self> {
        if cells.len() != shape.len() {
            return None;
        }
        Some(Self { shape, cells })
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<&MetricBundle> {
        self.shape.flat_index(i, j).map(|idx| &self.cells[idx])
    }

    /// Set the cell at `(i, j)`. Returns false for an invalid address.
    pub fn set(&mut self, i: usize, j: usize, bundle: MetricBundle) -> bool {
        match self.shape.flat_index(i, j) {
            Some(idx) => {
                self.cells[idx] = bundle;
                true
            }
            None => false,
        }
    }

    /// The underlying row-major cells.
    pub fn cells(&self) -> &[MetricBundle] {
        &self.cells
    }

    /// Shape/cell-count consistency, used when validating loaded cache files.
    pub fn is_consistent(&self) -> bool {
        self.cells.len() == self.shape.len()
    }

    /// Extract a single metric's values as a grid of the same shape and
    /// orientation.
    pub fn metric_values(&self, metric: Metric) -> ValueGrid {
        ValueGrid {
            shape: self.shape,
            values: self.cells.iter().map(|c| c.get(metric)).collect(),
        }
    }
}

/// One metric's values over a pair grid.
///
/// Keeps the originating grid's shape and (k1, k2) axis orientation. A
/// symmetric by-name lookup that reaches this grid through swapped names
/// does not transpose it.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueGrid {
    shape: GridShape,
    values: Vec<f64>,
}

impl ValueGrid {
    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.shape.flat_index(i, j).map(|idx| self.values[idx])
    }

    /// The underlying row-major values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(v: f64) -> MetricBundle {
        MetricBundle::from_correlations(v, 1.0)
    }

    #[test]
    fn test_plane_indexing_is_row_major() {
        let mut grid = PairGrid::new(GridShape::Plane(2, 3));
        assert_eq!(grid.len(), 6);
        assert!(grid.set(1, 2, bundle(42.0)));
        assert_eq!(grid.cells()[5].num, 42.0);
        assert_eq!(grid.get(1, 2).unwrap().num, 42.0);
    }

    #[test]
    fn test_plane_rejects_out_of_bounds() {
        let grid = PairGrid::new(GridShape::Plane(2, 3));
        assert!(grid.get(2, 0).is_none());
        assert!(grid.get(0, 3).is_none());
    }

    #[test]
    fn test_line_addresses_only_the_diagonal() {
        let mut grid = PairGrid::new(GridShape::Line(3));
        assert_eq!(grid.len(), 3);
        assert!(grid.set(1, 1, bundle(7.0)));
        assert!(!grid.set(0, 1, bundle(9.0)));
        assert_eq!(grid.get(1, 1).unwrap().num, 7.0);
        assert!(grid.get(0, 1).is_none());
    }

    #[test]
    fn test_from_cells_checks_length() {
        let cells = vec![bundle(1.0); 5];
        assert!(PairGrid::from_cells(GridShape::Plane(2, 3), cells.clone()).is_none());
        assert!(PairGrid::from_cells(GridShape::Line(5), cells).is_some());
    }

    #[test]
    fn test_metric_values_preserve_shape() {
        let mut grid = PairGrid::new(GridShape::Plane(2, 2));
        grid.set(0, 0, MetricBundle::from_correlations(0.1, 0.2));
        grid.set(1, 1, MetricBundle::from_correlations(0.3, 0.4));
        let nums = grid.metric_values(Metric::Num);
        assert_eq!(nums.shape(), GridShape::Plane(2, 2));
        assert_eq!(nums.get(0, 0), Some(0.1));
        assert_eq!(nums.get(1, 1), Some(0.3));
    }

    #[test]
    fn test_grid_round_trips_through_json_with_nan_cells() {
        let mut grid = PairGrid::new(GridShape::Line(2));
        grid.set(0, 0, MetricBundle::from_correlations(f64::NAN, 0.5));
        grid.set(1, 1, MetricBundle::from_correlations(0.25, 0.5));

        let json = serde_json::to_string(&grid).unwrap();
        let back: PairGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back.shape(), GridShape::Line(2));
        assert!(back.get(0, 0).unwrap().num.is_nan());
        assert!(back.get(0, 0).unwrap().ratio.is_nan());
        assert_eq!(back.get(1, 1).unwrap().ratio, 0.5);
    }
}
