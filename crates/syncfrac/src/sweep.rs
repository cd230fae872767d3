//! Sweep orchestration.
//!
//! Enumerates the unordered pairs of varying parameters, evaluates them on
//! a bounded worker pool, persists per-pair results through the cache, and
//! finishes by writing the aggregate and deleting the scratch files.

use std::time::Instant;

use jiff::Timestamp;
use rayon::ThreadPoolBuilder;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, info};

use crate::cache::{AggregateEntry, AggregateRecord, CACHE_SCHEMA_VERSION, CacheKey, SweepCache};
use crate::config::default_workers;
use crate::error::{ConfigError, Result};
use crate::evaluate::{CorrelationModel, PairEvaluator};
use crate::model::ParamSpace;
use crate::reduce::{self, SweepResult};

/// One unit of work: evaluate the grid for the pair `(k1, k2)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairTask {
    pub k1: String,
    pub k2: String,
    /// Zero-based position in the submission order.
    pub index: usize,
    pub total: usize,
}

/// All unordered pairs with repetition over `varying`, in nested-loop
/// order: `[a, b, c]` yields `(a,a), (a,b), (a,c), (b,b), (b,c), (c,c)`.
pub fn enumerate_pairs(varying: &[String]) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(varying.len() * (varying.len() + 1) / 2);
    for (i, k1) in varying.iter().enumerate() {
        for k2 in &varying[i..] {
            pairs.push((k1.clone(), k2.clone()));
        }
    }
    pairs
}

/// Drives a full sweep: enumerate, evaluate in parallel, persist, reduce.
#[derive(Debug, Clone)]
pub struct SweepOrchestrator {
    cache: SweepCache,
    workers: usize,
}

impl SweepOrchestrator {
    /// `workers` is clamped to at least one.
    pub fn new(cache: SweepCache, workers: usize) -> Self {
        Self {
            cache,
            workers: workers.max(1),
        }
    }

    /// Orchestrator sized to the machine: one worker less than the
    /// available parallelism, floor one.
    pub fn with_default_workers(cache: SweepCache) -> Self {
        Self::new(cache, default_workers())
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn cache(&self) -> &SweepCache {
        &self.cache
    }

    /// Run the sweep over every unordered pair of varying parameters.
    ///
    /// The aggregate subsumes the per-pair files: on a full hit nothing is
    /// evaluated at all, and after a computed sweep the scratch files are
    /// deleted once the aggregate is durable. Any failing pair fails the
    /// whole sweep before the aggregate is written.
    pub fn run<M: CorrelationModel>(
        &self,
        space: &ParamSpace,
        evaluator: &PairEvaluator<M>,
    ) -> Result<SweepResult> {
        let varying = space.varying_names();
        if varying.is_empty() {
            return Err(ConfigError::NoVaryingParameters.into());
        }
        let pairs = enumerate_pairs(&varying);
        let sweep_key = CacheKey::for_sweep(space, &pairs)?;

        if let Some(aggregate) = self.cache.load_aggregate(&sweep_key, pairs.len())? {
            let grids: Vec<_> = aggregate.entries.into_iter().map(|e| e.grid).collect();
            return reduce::reduce(&pairs, &grids, &varying);
        }

        info!(
            pairs = pairs.len(),
            workers = self.workers,
            varying = ?varying,
            "starting sweep"
        );
        let started = Instant::now();

        let total = pairs.len();
        let tasks: Vec<PairTask> = pairs
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, (k1, k2))| PairTask {
                k1,
                k2,
                index,
                total,
            })
            .collect();

        let pool = ThreadPoolBuilder::new().num_threads(self.workers).build()?;
        let records = pool.install(|| {
            tasks
                .par_iter()
                .map(|task| self.cache.get_or_compute(space, task, evaluator))
                .collect::<Result<Vec<_>>>()
        })?;

        info!(
            elapsed_secs = started.elapsed().as_secs_f64(),
            pairs = records.len(),
            "sweep finished"
        );

        let entries: Vec<AggregateEntry> = tasks
            .iter()
            .zip(&records)
            .map(|(task, record)| AggregateEntry {
                k1: task.k1.clone(),
                k2: task.k2.clone(),
                elapsed_secs: record.elapsed_secs,
                grid: record.grid.clone(),
            })
            .collect();
        let aggregate = AggregateRecord {
            schema: CACHE_SCHEMA_VERSION,
            key: sweep_key,
            written_at: Timestamp::now(),
            entries,
        };
        self.cache.store_aggregate(&aggregate)?;

        let removed = self.cache.remove_part_files()?;
        debug!(removed, "cleaned up scratch files");

        let grids: Vec<_> = records.into_iter().map(|r| r.grid).collect();
        reduce::reduce(&pairs, &grids, &varying)
    }
}
