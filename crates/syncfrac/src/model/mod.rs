mod grid;
mod metrics;
mod params;

pub use grid::{GridShape, PairGrid, ValueGrid};
pub use metrics::{Metric, MetricBundle};
pub use params::{ParamSpace, ParamVector, Parameter, linspace};
