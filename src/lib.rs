//! # CS135 Ceilometer Log Decoder
//!
//! This crate decodes logged serial output from the Campbell Scientific CS135
//! ceilometer and exports the recovered backscatter profiles. The instrument
//! emits line-oriented text records protected by a CRC-16 variant; logging
//! pipelines are known to drop the delimiter between consecutive records,
//! concatenating them ("merged" records). The decoder recovers correct,
//! individually verified records from such streams, including transitive
//! demerging, and converts the fixed-width hexadecimal backscatter payload
//! into calibrated signed measurements.
//!
//! ## Crate Structure
//!
//! - **`checksum`**: Table-driven CRC-16 engine, bit-exact with the CS135
//!   firmware. Everything downstream depends on it agreeing with the
//!   instrument.
//! - **`codec`**: Pure field codecs for the record body: status line, profile
//!   parameter line, range-gate derivation, and the two's-complement hex
//!   backscatter payload.
//! - **`framer`**: The record framing state machine. Assembles one logical
//!   record from 4-6 physical lines, auto-detects the on-disk line variant,
//!   detects and repairs merged records, and validates checksums.
//! - **`decoder`**: Drives the framer over whole files and accumulates the
//!   ordered record sequence plus decode statistics.
//! - **`record`**: The validated [`Record`] value type and [`DecodeStats`]
//!   counters.
//! - **`table`**: Assembles records into a timestamp x altitude profile table
//!   for the exporters.
//! - **`metadata`**: Site/instrument metadata loaded from TOML and merged
//!   into export attributes.
//! - **`export`**: Feature-gated CSV and netCDF writers.
//! - **`error`**: The crate-wide [`Cs135Error`] type.
//! - **`logging`**: `tracing` subscriber initialization for the CLI.
//!
//! ## Example
//!
//! ```no_run
//! fn main() -> Result<(), cs135_decode::Cs135Error> {
//!     let output = cs135_decode::decode_file("ceilometer-20180910.csv")?;
//!     println!(
//!         "{} records, {} checksum failures, {} merges recovered",
//!         output.records.len(),
//!         output.stats.checksum_failures,
//!         output.stats.merges_recovered
//!     );
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod codec;
pub mod decoder;
pub mod error;
pub mod export;
pub mod framer;
pub mod logging;
pub mod metadata;
pub mod record;
pub mod table;

pub use decoder::{decode_file, decode_files, decode_reader, DecodeOutput};
pub use error::{Cs135Error, Result};
pub use framer::Framer;
pub use record::{DecodeStats, Record};
