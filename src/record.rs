//! Validated record values and decode statistics.

use serde::Serialize;

/// One complete, checksum-verified measurement report from the ceilometer.
///
/// A record spans several physical lines in the log; the framer only
/// constructs one once every structural check and the CRC have passed, so a
/// `Record` handed downstream is always internally consistent:
/// `ranges.len() == backscatter_profile.len() == length`.
///
/// Fields the decoder does not interpret (cloud-base heights, housekeeping
/// values) are passed through verbatim as text; `"/////"` marks an
/// unavailable value in the instrument's own convention.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    /// Instrument-reported time string, verbatim. Source of truth for
    /// ordering; not validated or reformatted by the decoder.
    pub timestamp: String,
    /// Message identifier with framing control characters stripped,
    /// e.g. `CS0001002`.
    pub identifier: String,
    /// Message number, characters 6..9 of the identifier (`002` or `004`).
    pub message_number: String,
    /// Self-test status flag from the status line.
    pub status: char,
    /// Warning/alarm flag from the status line.
    pub warning_alarm: char,
    /// Window transmission, percent, verbatim.
    pub window_transmission: String,
    /// First cloud-base height, verbatim (`/////` if no layer detected).
    pub h1: String,
    /// Second cloud-base height, verbatim.
    pub h2: String,
    /// Third cloud-base height, verbatim.
    pub h3: String,
    /// Fourth cloud-base height, verbatim.
    pub h4: String,
    /// Status flag word from the status line, verbatim.
    pub flags: String,
    /// Raw sky-condition line of a message 004; `None` for message 002.
    pub sky_condition: Option<String>,
    /// Attenuated-scale percentage applied to the backscatter payload.
    pub attenuated_scale: u32,
    /// Raw resolution field; stripped of trailing zeros it parses to the
    /// range-gate spacing in metres.
    pub resolution: String,
    /// Declared number of backscatter samples.
    pub length: usize,
    /// Laser pulse energy, percent, verbatim.
    pub energy: String,
    /// Laser temperature, degrees Celsius, verbatim.
    pub laser_temp: String,
    /// Total tilt of the instrument from vertical, degrees, verbatim.
    pub total_tilt: String,
    /// Background light level, verbatim.
    pub background_light: String,
    /// Pulse count divided by 1000, verbatim.
    pub pulse: String,
    /// Sample rate, verbatim.
    pub sample_rate: String,
    /// Backscatter sum over the profile, verbatim.
    pub backscatter_sum: String,
    /// Altitude bin edges: `resolution_interval * i` for each sample index.
    pub ranges: Vec<u32>,
    /// Calibrated backscatter profile, one value per range gate.
    pub backscatter_profile: Vec<f64>,
    /// Always `true` on emitted records; kept so downstream consumers can
    /// assert the contract.
    pub checksum_verified: bool,
}

/// Counters for everything the decoder saw besides clean records.
///
/// Silent data loss is unacceptable in an instrument pipeline, so every
/// discard and every recovery is countable and reportable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    /// Records that passed every check and were emitted.
    pub validated: u64,
    /// Records discarded because the computed CRC did not match the
    /// checksum field.
    pub checksum_failures: u64,
    /// Records discarded for structural reasons: wrong token counts,
    /// non-hexadecimal payload, unparseable numeric fields, or a demerged
    /// tail that did not start a record.
    pub malformed: u64,
    /// Records discarded because their message number carries no
    /// backscatter payload (001/003) or was unrecognized.
    pub unsupported: u64,
    /// Partial records discarded because the input ended mid-record.
    pub truncated: u64,
    /// Records recovered by splitting a merged checksum line.
    pub merges_recovered: u64,
}

impl DecodeStats {
    /// Total number of records discarded for any reason.
    pub fn discarded(&self) -> u64 {
        self.checksum_failures + self.malformed + self.unsupported + self.truncated
    }

    /// Fold another set of counters into this one (multi-file decodes).
    pub fn absorb(&mut self, other: DecodeStats) {
        self.validated += other.validated;
        self.checksum_failures += other.checksum_failures;
        self.malformed += other.malformed;
        self.unsupported += other.unsupported;
        self.truncated += other.truncated;
        self.merges_recovered += other.merges_recovered;
    }
}
