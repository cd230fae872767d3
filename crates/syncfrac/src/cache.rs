//! Durable grid cache.
//!
//! Layout: one scratch file per pair (`<prefix>-<key>-part.json`) plus one
//! aggregate (`<prefix>-products.json`). Every file is a versioned envelope
//! carrying the schema generation, the producing key, and a written-at
//! timestamp. Writes go through a temp-file rename so a killed process
//! never leaves a partial file at a final path.
//!
//! The key hashes the entire parameter set and is the only staleness guard:
//! changing the model's internals invalidates nothing. A cache file that
//! exists but cannot be trusted (undecodable, wrong schema generation,
//! inconsistent envelope) is a fatal error, never a silent recompute.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{CacheError, Result};
use crate::evaluate::{CorrelationModel, PairEvaluator};
use crate::model::{PairGrid, ParamSpace};
use crate::sweep::PairTask;

/// Cache schema generation; bumped on any envelope or payload format change.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Filename suffix for per-pair scratch files.
pub const PART_SUFFIX: &str = "-part.json";
/// Filename suffix for the aggregate file.
pub const PRODUCTS_SUFFIX: &str = "-products.json";

/// Deterministic digest naming a cache entry.
///
/// SHA-256 over a canonical JSON encoding of the inputs. Parameter maps
/// serialize in sorted name order, so two logically equal configurations
/// hash identically no matter how they were built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key for one pair's grid: the whole parameter set plus the ordered
    /// pair of swept names.
    pub fn for_pair(
        space: &ParamSpace,
        k1: &str,
        k2: &str,
    ) -> std::result::Result<Self, CacheError> {
        #[derive(Serialize)]
        struct PairInput<'a> {
            params: &'a ParamSpace,
            k1: &'a str,
            k2: &'a str,
        }
        Self::digest(&PairInput {
            params: space,
            k1,
            k2,
        })
    }

    /// Key for the aggregate: the parameter set plus the full pair
    /// enumeration.
    pub fn for_sweep(
        space: &ParamSpace,
        pairs: &[(String, String)],
    ) -> std::result::Result<Self, CacheError> {
        #[derive(Serialize)]
        struct SweepInput<'a> {
            params: &'a ParamSpace,
            pairs: &'a [(String, String)],
        }
        Self::digest(&SweepInput {
            params: space,
            pairs,
        })
    }

    fn digest<T: Serialize>(input: &T) -> std::result::Result<Self, CacheError> {
        let bytes = serde_json::to_vec(input).map_err(CacheError::Encode)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(Self(hex::encode(hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One pair's cached result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    pub schema: u32,
    pub key: CacheKey,
    pub written_at: Timestamp,
    /// Wall-clock evaluation time; diagnostics only
    pub elapsed_secs: f64,
    pub grid: PairGrid,
}

/// One entry of the aggregate: the pair it covers plus its grid and timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateEntry {
    pub k1: String,
    pub k2: String,
    pub elapsed_secs: f64,
    pub grid: PairGrid,
}

/// The aggregate envelope covering a whole sweep, in submission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub schema: u32,
    pub key: CacheKey,
    pub written_at: Timestamp,
    pub entries: Vec<AggregateEntry>,
}

/// Durable key→grid store under a path prefix.
///
/// The prefix is a directory path plus basename stem: `out/run7` produces
/// `out/run7-<key>-part.json` scratch files and `out/run7-products.json`.
#[derive(Debug, Clone)]
pub struct SweepCache {
    prefix: PathBuf,
}

impl SweepCache {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    /// Path of the scratch file for one pair key.
    pub fn pair_path(&self, key: &CacheKey) -> PathBuf {
        self.suffixed(&format!("-{key}{PART_SUFFIX}"))
    }

    /// Path of the aggregate file.
    pub fn aggregate_path(&self) -> PathBuf {
        self.suffixed(PRODUCTS_SUFFIX)
    }

    fn suffixed(&self, suffix: &str) -> PathBuf {
        let mut name = self.prefix.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Load the pair's grid if cached, else evaluate and persist it.
    ///
    /// A cache hit is returned verbatim; the key in the filename already
    /// guarantees the contents match the current parameter set.
    pub fn get_or_compute<M: CorrelationModel>(
        &self,
        space: &ParamSpace,
        task: &PairTask,
        evaluator: &PairEvaluator<M>,
    ) -> Result<PairRecord> {
        let key = CacheKey::for_pair(space, &task.k1, &task.k2)?;
        let path = self.pair_path(&key);

        if path.exists() {
            debug!(
                index = task.index + 1,
                total = task.total,
                k1 = %task.k1,
                k2 = %task.k2,
                path = %path.display(),
                "loading cached pair grid"
            );
            return Ok(self.load_pair(&path, &key)?);
        }

        debug!(
            index = task.index + 1,
            total = task.total,
            k1 = %task.k1,
            k2 = %task.k2,
            "computing pair grid"
        );
        let started = Instant::now();
        let grid = evaluator.evaluate_pair(space, &task.k1, &task.k2)?;
        let record = PairRecord {
            schema: CACHE_SCHEMA_VERSION,
            key,
            written_at: Timestamp::now(),
            elapsed_secs: started.elapsed().as_secs_f64(),
            grid,
        };
        self.store_pair(&path, &record)?;
        debug!(
            index = task.index + 1,
            total = task.total,
            k1 = %task.k1,
            k2 = %task.k2,
            elapsed_secs = record.elapsed_secs,
            "stored pair grid"
        );
        Ok(record)
    }

    /// Load and validate one pair file against the key its path was derived
    /// from.
    pub fn load_pair(
        &self,
        path: &Path,
        expected: &CacheKey,
    ) -> std::result::Result<PairRecord, CacheError> {
        let bytes = fs::read(path).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let record: PairRecord =
            serde_json::from_slice(&bytes).map_err(|source| CacheError::Decode {
                path: path.to_path_buf(),
                source,
            })?;
        if record.schema != CACHE_SCHEMA_VERSION {
            return Err(CacheError::SchemaMismatch {
                path: path.to_path_buf(),
                found: record.schema,
                expected: CACHE_SCHEMA_VERSION,
            });
        }
        if record.key != *expected {
            return Err(CacheError::KeyMismatch {
                path: path.to_path_buf(),
                found: record.key.to_string(),
                expected: expected.to_string(),
            });
        }
        if !record.grid.is_consistent() {
            return Err(CacheError::Malformed {
                path: path.to_path_buf(),
                detail: "grid cell count does not match its shape".to_string(),
            });
        }
        Ok(record)
    }

    fn store_pair(&self, path: &Path, record: &PairRecord) -> std::result::Result<(), CacheError> {
        let bytes = serde_json::to_vec_pretty(record).map_err(CacheError::Encode)?;
        atomic_write_bytes(path, &bytes).map_err(|source| CacheError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the aggregate if one exists and belongs to `expected`.
    ///
    /// `Ok(None)` means a genuine miss: no file, or a file written for a
    /// different sweep configuration (stale; the caller recomputes and
    /// overwrites). Undecodable files and schema mismatches are errors.
    pub fn load_aggregate(
        &self,
        expected: &CacheKey,
        expected_entries: usize,
    ) -> std::result::Result<Option<AggregateRecord>, CacheError> {
        let path = self.aggregate_path();
        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        let record: AggregateRecord =
            serde_json::from_slice(&bytes).map_err(|source| CacheError::Decode {
                path: path.clone(),
                source,
            })?;
        if record.schema != CACHE_SCHEMA_VERSION {
            return Err(CacheError::SchemaMismatch {
                path,
                found: record.schema,
                expected: CACHE_SCHEMA_VERSION,
            });
        }
        if record.key != *expected {
            warn!(
                path = %path.display(),
                found = %record.key,
                expected = %expected,
                "aggregate cache belongs to a different sweep configuration; recomputing"
            );
            return Ok(None);
        }
        if record.entries.len() != expected_entries {
            return Err(CacheError::Malformed {
                path,
                detail: format!(
                    "expected {expected_entries} entries, found {}",
                    record.entries.len()
                ),
            });
        }
        if let Some(bad) = record.entries.iter().find(|e| !e.grid.is_consistent()) {
            return Err(CacheError::Malformed {
                path,
                detail: format!(
                    "grid cell count does not match its shape for pair ({}, {})",
                    bad.k1, bad.k2
                ),
            });
        }

        info!(
            path = %path.display(),
            entries = record.entries.len(),
            written_at = %record.written_at,
            "loaded aggregate cache"
        );
        Ok(Some(record))
    }

    /// Persist the aggregate atomically.
    pub fn store_aggregate(&self, record: &AggregateRecord) -> std::result::Result<(), CacheError> {
        let path = self.aggregate_path();
        let bytes = serde_json::to_vec_pretty(record).map_err(CacheError::Encode)?;
        atomic_write_bytes(&path, &bytes).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;
        info!(
            path = %path.display(),
            entries = record.entries.len(),
            "stored aggregate cache"
        );
        Ok(())
    }

    /// Delete every per-pair scratch file under this prefix, returning how
    /// many were removed. Files of other prefixes and the aggregate are
    /// untouched.
    pub fn remove_part_files(&self) -> std::result::Result<usize, CacheError> {
        let dir = match self.prefix.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let Some(stem) = self.prefix.file_name().and_then(|s| s.to_str()) else {
            return Ok(0);
        };
        let head = format!("{stem}-");

        let mut removed = 0;
        let entries = fs::read_dir(dir).map_err(|source| CacheError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        for entry in entries {
            let entry = entry.map_err(|source| CacheError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with(&head) && name.ends_with(PART_SUFFIX) {
                let path = entry.path();
                fs::remove_file(&path).map_err(|source| CacheError::Io { path, source })?;
                removed += 1;
            }
        }

        debug!(removed, prefix = %self.prefix.display(), "removed per-pair scratch files");
        Ok(removed)
    }
}

/// Write-then-rename: the content lands at `path` completely or not at all.
fn atomic_write_bytes(path: &Path, content: &[u8]) -> io::Result<()> {
    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;
    Ok(())
}
