//! dta-params: experiment parameter file (one instance per row).

pub mod instance;
pub mod loader;

pub use instance::{Instance, sanitize_for_filename};
pub use loader::{LoadedInstances, RejectReason, RejectedRow, load_instances, parse_instances};

use std::path::PathBuf;

pub type ParamsResult<T> = Result<T, ParamsError>;

#[derive(thiserror::Error, Debug)]
pub enum ParamsError {
    #[error("Failed to read parameter file: {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
