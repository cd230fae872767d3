use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors raised while building or validating a sweep configuration
#[derive(Debug)]
pub enum ConfigError {
    /// Every parameter needs a default value, even when it also has a range
    MissingDefault { name: String },
    /// A parameter materialized to an empty sample sequence
    EmptyRange { name: String },
    /// Defaults and samples must be finite (NaN/inf cannot be hashed or swept)
    NonFinite { name: String },
    /// Range resolution must be at least one sample
    InvalidResolution { resolution: usize },
    /// A pair names a parameter that is not in the space
    UnknownParameter { name: String },
    /// A sweep over zero varying parameters has nothing to enumerate
    NoVaryingParameters,
    Parse(serde_json::Error),
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingDefault { name } => {
                write!(f, "parameter {name:?} has no default value")
            }
            ConfigError::EmptyRange { name } => {
                write!(f, "parameter {name:?} has an empty sample range")
            }
            ConfigError::NonFinite { name } => {
                write!(f, "parameter {name:?} contains a non-finite value")
            }
            ConfigError::InvalidResolution { resolution } => {
                write!(f, "range resolution must be >= 1, got {resolution}")
            }
            ConfigError::UnknownParameter { name } => {
                write!(f, "parameter {name:?} not found in the parameter space")
            }
            ConfigError::NoVaryingParameters => {
                write!(f, "no parameter varies over more than one value")
            }
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::Io { path, source } => {
                write!(f, "config read error for {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            ConfigError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

/// Errors raised by the durable grid cache.
///
/// Everything here is fatal for the sweep: a cache file that cannot be
/// trusted must never be silently recomputed over, because that would mask
/// data-integrity bugs behind a fresh-looking result.
#[derive(Debug)]
pub enum CacheError {
    Io { path: PathBuf, source: io::Error },
    /// An existing cache file failed to deserialize
    Decode { path: PathBuf, source: serde_json::Error },
    /// The file was written by a different cache schema generation
    SchemaMismatch { path: PathBuf, found: u32, expected: u32 },
    /// The embedded key does not match the key the path was derived from
    KeyMismatch { path: PathBuf, found: String, expected: String },
    /// The envelope decoded but its contents are inconsistent
    Malformed { path: PathBuf, detail: String },
    Encode(serde_json::Error),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Io { path, source } => {
                write!(f, "cache io error for {}: {source}", path.display())
            }
            CacheError::Decode { path, source } => {
                write!(f, "corrupt cache file {}: {source}", path.display())
            }
            CacheError::SchemaMismatch {
                path,
                found,
                expected,
            } => {
                write!(
                    f,
                    "cache file {} has schema version {found}, expected {expected}; \
                     clear the cache directory to recompute",
                    path.display()
                )
            }
            CacheError::KeyMismatch {
                path,
                found,
                expected,
            } => {
                write!(
                    f,
                    "cache file {} embeds key {found} but was loaded for key {expected}",
                    path.display()
                )
            }
            CacheError::Malformed { path, detail } => {
                write!(f, "malformed cache file {}: {detail}", path.display())
            }
            CacheError::Encode(e) => write!(f, "cache encode error: {e}"),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::Io { source, .. } => Some(source),
            CacheError::Decode { source, .. } => Some(source),
            CacheError::Encode(e) => Some(e),
            _ => None,
        }
    }
}

/// Errors raised while reducing per-pair grids into the symmetric lookup
#[derive(Debug, Clone)]
pub enum ReduceError {
    /// The pair list and the result list must be the same length
    LengthMismatch { pairs: usize, grids: usize },
    /// No stored grid covers the requested unordered pair
    MissingPair { k1: String, k2: String },
    /// More than one stored grid covers the same unordered pair
    DuplicatePair { k1: String, k2: String },
}

impl fmt::Display for ReduceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReduceError::LengthMismatch { pairs, grids } => {
                write!(f, "{pairs} pairs but {grids} result grids")
            }
            ReduceError::MissingPair { k1, k2 } => {
                write!(f, "no result grid for pair ({k1}, {k2})")
            }
            ReduceError::DuplicatePair { k1, k2 } => {
                write!(f, "duplicate result grids for pair ({k1}, {k2})")
            }
        }
    }
}

impl std::error::Error for ReduceError {}

/// Top-level error type for a sweep run
#[derive(Debug)]
pub enum SweepError {
    Config(ConfigError),
    Cache(CacheError),
    Reduce(ReduceError),
    /// The worker pool could not be constructed
    Pool(rayon::ThreadPoolBuildError),
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepError::Config(e) => write!(f, "{e}"),
            SweepError::Cache(e) => write!(f, "{e}"),
            SweepError::Reduce(e) => write!(f, "{e}"),
            SweepError::Pool(e) => write!(f, "worker pool error: {e}"),
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::Config(e) => Some(e),
            SweepError::Cache(e) => Some(e),
            SweepError::Reduce(e) => Some(e),
            SweepError::Pool(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SweepError {
    fn from(e: ConfigError) -> Self {
        SweepError::Config(e)
    }
}

impl From<CacheError> for SweepError {
    fn from(e: CacheError) -> Self {
        SweepError::Cache(e)
    }
}

impl From<ReduceError> for SweepError {
    fn from(e: ReduceError) -> Self {
        SweepError::Reduce(e)
    }
}

impl From<rayon::ThreadPoolBuildError> for SweepError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        SweepError::Pool(e)
    }
}

pub type Result<T> = std::result::Result<T, SweepError>;
