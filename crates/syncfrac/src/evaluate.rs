//! Pair grid evaluation against the external correlation model.
//!
//! The model is an explicit collaborator handed to [`PairEvaluator::new`],
//! never ambient state. For each grid point the evaluator builds two
//! contexts from the space defaults: the denominator context overrides only
//! the swept pair, the numerator context additionally pins the suppression
//! set. The ratio of the two correlations is the fraction of synchrony.

use crate::error::Result;
use crate::model::{GridShape, MetricBundle, PairGrid, ParamSpace, ParamVector};

/// The external correlation model.
///
/// Implementations must be pure: the same parameter vector always yields
/// the same value, and the durable cache depends on it. NaN is a valid
/// result for numerically degenerate inputs, not an error.
pub trait CorrelationModel: Sync {
    fn correlation(&self, params: &ParamVector) -> f64;
}

impl<F> CorrelationModel for F
where
    F: Fn(&ParamVector) -> f64 + Sync,
{
    fn correlation(&self, params: &ParamVector) -> f64 {
        self(params)
    }
}

/// Forced overrides applied to the numerator context.
///
/// Each entry names a parameter and the value it is pinned to while the
/// suppressed correlation is computed. The set is explicit data: which
/// parameters are pinned is part of the sweep's definition, not something
/// inferred by filtering keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Suppression {
    forced: Vec<(String, f64)>,
}

impl Suppression {
    /// No forced overrides; numerator and denominator contexts coincide.
    pub fn none() -> Self {
        Self { forced: Vec::new() }
    }

    /// Pin each named parameter to zero.
    pub fn zeroed<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            forced: names.into_iter().map(|n| (n.into(), 0.0)).collect(),
        }
    }

    /// The parasitoid-synchrony suppression set: environmental correlation
    /// `Spp`, dispersal `mp`, and noise covariance `Cpp` pinned to zero.
    pub fn parasitoid_synchrony() -> Self {
        Self::zeroed(["Spp", "mp", "Cpp"])
    }

    pub fn is_empty(&self) -> bool {
        self.forced.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.forced.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Merge the forced values over a base context.
    pub fn apply(&self, base: &ParamVector) -> ParamVector {
        let mut ctx = base.clone();
        for (name, value) in &self.forced {
            ctx.set(name.clone(), *value);
        }
        ctx
    }
}

/// Computes the full metric grid for one parameter pair.
pub struct PairEvaluator<M> {
    model: M,
    suppression: Suppression,
}

impl<M: CorrelationModel> PairEvaluator<M> {
    pub fn new(model: M, suppression: Suppression) -> Self {
        Self { model, suppression }
    }

    pub fn suppression(&self) -> &Suppression {
        &self.suppression
    }

    /// Evaluate the grid for `(k1, k2)`: all other parameters at default,
    /// k1 swept over its samples against k2 over its samples. A parameter
    /// paired with itself yields the 1-D diagonal sweep.
    pub fn evaluate_pair(&self, space: &ParamSpace, k1: &str, k2: &str) -> Result<PairGrid> {
        let defaults = space.defaults();
        let r1 = space.samples(k1)?;

        if k1 == k2 {
            let mut grid = PairGrid::new(GridShape::Line(r1.len()));
            for (i, &a) in r1.iter().enumerate() {
                grid.set(i, i, self.evaluate_cell(&defaults, k1, a, k2, a));
            }
            Ok(grid)
        } else {
            let r2 = space.samples(k2)?;
            let mut grid = PairGrid::new(GridShape::Plane(r1.len(), r2.len()));
            for (i, &a) in r1.iter().enumerate() {
                for (j, &b) in r2.iter().enumerate() {
                    grid.set(i, j, self.evaluate_cell(&defaults, k1, a, k2, b));
                }
            }
            Ok(grid)
        }
    }

    fn evaluate_cell(
        &self,
        defaults: &ParamVector,
        k1: &str,
        a: f64,
        k2: &str,
        b: f64,
    ) -> MetricBundle {
        let den_ctx = pair_context(defaults, k1, a, k2, b);
        // Suppression wins when a swept name is itself in the suppression set.
        let num_ctx = self.suppression.apply(&den_ctx);
        MetricBundle::from_correlations(
            self.model.correlation(&num_ctx),
            self.model.correlation(&den_ctx),
        )
    }
}

/// The space defaults overridden by the swept pair values.
fn pair_context(defaults: &ParamVector, k1: &str, a: f64, k2: &str, b: f64) -> ParamVector {
    let mut ctx = defaults.clone();
    ctx.set(k1, a);
    ctx.set(k2, b);
    ctx
}
