//! dta-log: reconstruction of experiment runs from dua-iterate console logs.

pub mod matchers;
pub mod parser;
pub mod types;

pub use matchers::{LineEvent, LineRecognizer, Metric, PhaseKind, RecognizerContext, TimingField};
pub use parser::{LogParser, ParseStats, ParsedLog};
pub use types::*;

use std::path::PathBuf;

pub type LogResult<T> = Result<T, LogError>;

#[derive(thiserror::Error, Debug)]
pub enum LogError {
    #[error("Failed to read log file: {path}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid line pattern: {0}")]
    Pattern(#[from] regex::Error),
}
