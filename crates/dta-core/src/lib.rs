//! dta-core: shared leaf utilities for DTA experiment analysis.
//!
//! Contains:
//! - duration (nanosecond / `H:MM:SS[.ffffff]` duration tokens)
//! - path_meta (algorithm, instance and repetition from output directories)
//! - numeric (lenient float tokens + small aggregates)
//! - error (shared error types)

pub mod duration;
pub mod error;
pub mod numeric;
pub mod path_meta;

// Re-exports: nice ergonomics for downstream crates
pub use duration::parse_duration_seconds;
pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use path_meta::{
    AlgorithmName, DEFAULT_SAMPLED_FAMILIES, PathMetadata, PathMetadataResolver,
    UNKNOWN_ALGORITHM, resolve_instance_and_repetition,
};
