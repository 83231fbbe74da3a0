use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Everything that can go wrong between opening the trace and writing the chart.
#[derive(Debug, Error)]
pub enum PerfError {
    #[error("could not read {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("empty input, expected a header row")]
    MissingHeader,

    #[error("line {line}: expected `time;sent;dropped`, found {found} field(s) in {row:?}")]
    Arity {
        line: usize,
        found: usize,
        row: String,
    },

    #[error("line {line}: {column} is not an integer in {row:?}: {source}")]
    Field {
        line: usize,
        column: &'static str,
        row: String,
        source: ParseIntError,
    },

    #[error("line {line}: row is not valid UTF-8: {source}")]
    Encoding {
        line: usize,
        source: std::io::Error,
    },

    #[error("sampling period {second} - {first} does not fit in a 64-bit integer")]
    PeriodOverflow { first: i64, second: i64 },

    #[error("need at least 2 samples to compute the sampling period, found {found}")]
    InsufficientData { found: usize },

    #[error("plotting failed: {0}")]
    Plot(String),
}

pub type Result<T, E = PerfError> = std::result::Result<T, E>;
