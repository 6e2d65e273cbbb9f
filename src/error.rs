//! Error types for gatherbench

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using gatherbench's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while preparing or running a benchmark
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid argument or configuration value
    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument {
        /// The argument name
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Aligned allocation failed
    #[error("Out of memory: failed to allocate {size} bytes")]
    OutOfMemory {
        /// Requested size in bytes
        size: usize,
    },

    /// File could not be opened, read or written
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        /// File involved in the failed operation
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Malformed neighbor-list trace record
    #[error("Trace line {line}: {reason}")]
    TraceParse {
        /// 1-based line number
        line: usize,
        /// What was wrong with the line
        reason: String,
    },

    /// The `N:` capacity record appeared more than once
    #[error(
        "Trace line {line}: number of atoms and neighbor lists capacity defined more than once"
    )]
    DuplicateCapacity {
        /// 1-based line number of the second declaration
        line: usize,
    },

    /// The `N:` capacity record declared a non-positive size
    #[error(
        "Trace line {line}: number of local atoms ({nlocal}) and neighbor lists capacity ({maxneighs}) must be greater than zero"
    )]
    InvalidCapacity {
        /// 1-based line number
        line: usize,
        /// Declared local atom count
        nlocal: i64,
        /// Declared neighbor capacity per atom
        maxneighs: i64,
    },

    /// Requested gather strategy cannot run on this host
    #[error("Strategy '{strategy}' requires {required}, but this CPU only supports {detected}")]
    UnsupportedStrategy {
        /// Strategy name
        strategy: &'static str,
        /// Instruction set the strategy needs
        required: &'static str,
        /// Best instruction set detected on the host
        detected: &'static str,
    },

    /// Gathered output differs from the value encoded by the dataset
    #[error(
        "Test failed: output position {position}, field {field}: expected {expected}, got {got}"
    )]
    VerificationFailed {
        /// Output record position
        position: usize,
        /// Field (dimension) index
        field: usize,
        /// Value the encoding predicts
        expected: f64,
        /// Value found in the destination buffer
        got: f64,
    },
}

impl Error {
    /// Create an invalid argument error
    pub fn invalid_argument(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            arg,
            reason: reason.into(),
        }
    }

    /// Create a trace parse error
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::TraceParse {
            line,
            reason: reason.into(),
        }
    }

    /// Wrap an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true for a correctness mismatch (as opposed to a setup failure)
    pub fn is_verification_failure(&self) -> bool {
        matches!(self, Self::VerificationFailed { .. })
    }
}
