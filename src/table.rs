//! Timestamp x altitude profile table for the exporters.
//!
//! The decoder hands over records in source order; this module lines them up
//! into a rectangular table: one row per record, one column per range gate.
//! Records whose range axis differs from the first record's (instrument
//! reconfigured mid-file) or whose timestamp does not parse are skipped with
//! a warning rather than failing the export.

use chrono::{NaiveDateTime, Timelike};
use tracing::warn;

use crate::error::{Cs135Error, Result};
use crate::record::Record;

/// Timestamp layout the instrument logger writes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Marker the instrument uses for an unavailable value.
const UNAVAILABLE: &str = "/////";

/// Rectangular view over a set of decoded records.
#[derive(Debug, Clone)]
pub struct ProfileTable {
    ranges: Vec<u32>,
    records: Vec<Record>,
    times: Vec<NaiveDateTime>,
}

impl ProfileTable {
    /// Build a table from decoded records, keeping source order.
    ///
    /// Returns [`Cs135Error::NoRecords`] if nothing usable remains.
    pub fn from_records(records: Vec<Record>) -> Result<Self> {
        let mut ranges: Option<Vec<u32>> = None;
        let mut kept = Vec::with_capacity(records.len());
        let mut times = Vec::with_capacity(records.len());
        for record in records {
            let time = match NaiveDateTime::parse_from_str(&record.timestamp, TIMESTAMP_FORMAT) {
                Ok(time) => time,
                Err(error) => {
                    warn!(
                        timestamp = %record.timestamp,
                        %error,
                        "unparseable timestamp; row skipped"
                    );
                    continue;
                }
            };
            match &ranges {
                None => ranges = Some(record.ranges.clone()),
                Some(axis) if *axis != record.ranges => {
                    warn!(
                        timestamp = %record.timestamp,
                        "range axis differs from first record; row skipped"
                    );
                    continue;
                }
                Some(_) => {}
            }
            times.push(time);
            kept.push(record);
        }
        match ranges {
            Some(ranges) if !kept.is_empty() => Ok(Self {
                ranges,
                records: kept,
                times,
            }),
            _ => Err(Cs135Error::NoRecords),
        }
    }

    /// Altitude bin edges shared by every row, in metres.
    pub fn ranges(&self) -> &[u32] {
        &self.ranges
    }

    /// Rows in source order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Parsed timestamps, parallel to [`records`](Self::records).
    pub fn times(&self) -> &[NaiveDateTime] {
        &self.times
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First and last row timestamps.
    pub fn time_coverage(&self) -> (NaiveDateTime, NaiveDateTime) {
        (self.times[0], self.times[self.times.len() - 1])
    }

    /// `YYYYmmdd` of the first row, used in export file names.
    pub fn file_date(&self) -> String {
        self.times[0].format("%Y%m%d").to_string()
    }

    /// One numeric value per row from a passthrough text field; `/////` and
    /// anything unparseable become NaN.
    pub fn numeric_column<F>(&self, field: F) -> Vec<f64>
    where
        F: Fn(&Record) -> &str,
    {
        self.records.iter().map(|r| numeric(field(r))).collect()
    }

    /// Cloud-base heights `h1..h4` per row, flattened row-major, NaN where
    /// no layer was detected.
    pub fn cloud_base_values(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.records.len() * 4);
        for record in &self.records {
            values.push(numeric(&record.h1));
            values.push(numeric(&record.h2));
            values.push(numeric(&record.h3));
            values.push(numeric(&record.h4));
        }
        values
    }

    /// Fractional day of year per row (1-based, as in the NCAS products).
    pub fn day_of_year(&self) -> Vec<f64> {
        use chrono::Datelike;
        self.times
            .iter()
            .map(|t| {
                f64::from(t.ordinal())
                    + f64::from(t.num_seconds_from_midnight()) / 86_400.0
                    + f64::from(t.nanosecond()) / 1e9 / 86_400.0
            })
            .collect()
    }
}

fn numeric(text: &str) -> f64 {
    if text == UNAVAILABLE {
        return f64::NAN;
    }
    text.parse().unwrap_or(f64::NAN)
}
