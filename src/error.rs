//! Custom error types for the crate.
//!
//! Only conditions that make further processing impossible surface as
//! [`Cs135Error`]: unreadable input, export failures, bad metadata. Everything
//! that can go wrong *inside* a record (truncation, bad tokens, checksum
//! mismatches, failed merge recovery) is recoverable by design and is counted
//! in [`crate::record::DecodeStats`] instead of propagating as an error, so a
//! single corrupt record never aborts the rest of a file.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type Result<T> = std::result::Result<T, Cs135Error>;

/// Fatal errors surfaced to the caller.
#[derive(Error, Debug)]
pub enum Cs135Error {
    /// An I/O operation outside of file reading failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An input file could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Input file that could not be read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The site metadata file did not parse.
    #[error("metadata error: {0}")]
    Metadata(String),

    /// An export backend reported a failure.
    #[error("export error: {0}")]
    Export(String),

    /// No record survived decoding, so there is nothing to export.
    #[error("no decodable records in input")]
    NoRecords,

    /// A feature-gated backend was called in a build without that feature.
    #[error("Feature '{0}' is not enabled. Please build with --features {0}")]
    FeatureNotEnabled(&'static str),
}
