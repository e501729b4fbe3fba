//! Pure field codecs for the record body.
//!
//! Each codec converts one fixed-format text field into typed values and
//! reports a [`CodecError`] on malformed input. Codec failures are always
//! recoverable at the stream level: the framer discards the offending record
//! and resynchronizes on the next start marker.

use thiserror::Error;

/// Width of one hexadecimal backscatter sample (20 bits).
pub const HEX_GROUP_WIDTH: usize = 5;

/// Largest positive value representable in a 20-bit two's-complement sample.
const MAX_POSITIVE: i64 = (1 << 19) - 1;

/// Recoverable field-level decode failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A fixed-format line had the wrong number of tokens.
    #[error("expected {expected} space-separated fields, found {found}")]
    FieldCount {
        /// Fields required by the line format.
        expected: usize,
        /// Fields actually present.
        found: usize,
    },

    /// A body line contained bytes that are not valid UTF-8.
    #[error("line is not valid text")]
    NotText,

    /// The first status token did not carry both flag characters.
    #[error("status field shorter than two characters")]
    StatusTooShort,

    /// The payload does not divide into whole hex groups.
    #[error("backscatter payload length {0} is not a multiple of {HEX_GROUP_WIDTH}")]
    PayloadLength(usize),

    /// A payload group contained a non-hexadecimal character.
    #[error("invalid hex group {0:?} in backscatter payload")]
    InvalidHex(String),

    /// A numeric field failed to parse.
    #[error("invalid {field} field {value:?}")]
    InvalidNumber {
        /// Name of the offending field.
        field: &'static str,
        /// Raw text that failed to parse.
        value: String,
    },

    /// The declared sample count disagrees with the payload.
    #[error("declared length {declared} does not match {decoded} decoded samples")]
    LengthMismatch {
        /// Sample count declared on the profile parameter line.
        declared: usize,
        /// Samples actually present in the payload.
        decoded: usize,
    },

    /// The checksum field is empty, too wide, or not hexadecimal.
    #[error("checksum field {0:?} is not a hexadecimal value")]
    ChecksumField(String),

    /// The record header line did not split into timestamp and identifier.
    #[error("record header {0:?} is malformed")]
    Header(String),
}

/// Decoded fields of the first data line (status and cloud-base heights).
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    /// Self-test status flag.
    pub status: char,
    /// Warning/alarm flag.
    pub warning_alarm: char,
    /// Window transmission, verbatim.
    pub window_transmission: String,
    /// Cloud-base heights, verbatim.
    pub h1: String,
    /// Second cloud-base height.
    pub h2: String,
    /// Third cloud-base height.
    pub h3: String,
    /// Fourth cloud-base height.
    pub h4: String,
    /// Status flag word, verbatim.
    pub flags: String,
}

/// Parse the status line: exactly 7 single-space-delimited tokens, the first
/// of which carries the status and warning/alarm flags as its first two
/// characters.
pub fn parse_status_line(line: &str) -> Result<StatusLine, CodecError> {
    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() != 7 {
        return Err(CodecError::FieldCount {
            expected: 7,
            found: tokens.len(),
        });
    }
    let mut flags_chars = tokens[0].chars();
    let status = flags_chars.next().ok_or(CodecError::StatusTooShort)?;
    let warning_alarm = flags_chars.next().ok_or(CodecError::StatusTooShort)?;
    Ok(StatusLine {
        status,
        warning_alarm,
        window_transmission: tokens[1].to_string(),
        h1: tokens[2].to_string(),
        h2: tokens[3].to_string(),
        h3: tokens[4].to_string(),
        h4: tokens[5].to_string(),
        flags: tokens[6].to_string(),
    })
}

/// Raw fields of the backscatter parameter line.
///
/// Splitting and numeric interpretation are separate steps on purpose: the
/// token count is a structural check applied before the CRC, while the
/// numeric accessors run only on checksum-verified records.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileParams {
    /// Attenuated-scale percentage, raw.
    pub attenuated_scale: String,
    /// Range-gate resolution, raw.
    pub resolution: String,
    /// Declared sample count, raw.
    pub length: String,
    /// Laser pulse energy, raw.
    pub energy: String,
    /// Laser temperature, raw.
    pub laser_temp: String,
    /// Total tilt, raw.
    pub total_tilt: String,
    /// Background light, raw.
    pub background_light: String,
    /// Pulse count / 1000, raw.
    pub pulse: String,
    /// Sample rate, raw.
    pub sample_rate: String,
    /// Backscatter sum, raw.
    pub backscatter_sum: String,
}

/// Parse the backscatter parameter line: exactly 10 single-space-delimited
/// tokens, assigned positionally.
pub fn parse_profile_params(line: &str) -> Result<ProfileParams, CodecError> {
    let tokens: Vec<&str> = line.split(' ').collect();
    if tokens.len() != 10 {
        return Err(CodecError::FieldCount {
            expected: 10,
            found: tokens.len(),
        });
    }
    Ok(ProfileParams {
        attenuated_scale: tokens[0].to_string(),
        resolution: tokens[1].to_string(),
        length: tokens[2].to_string(),
        energy: tokens[3].to_string(),
        laser_temp: tokens[4].to_string(),
        total_tilt: tokens[5].to_string(),
        background_light: tokens[6].to_string(),
        pulse: tokens[7].to_string(),
        sample_rate: tokens[8].to_string(),
        backscatter_sum: tokens[9].to_string(),
    })
}

impl ProfileParams {
    /// Attenuated-scale percentage as a number.
    pub fn attenuated_scale(&self) -> Result<u32, CodecError> {
        self.attenuated_scale
            .parse()
            .map_err(|_| CodecError::InvalidNumber {
                field: "attenuated_scale",
                value: self.attenuated_scale.clone(),
            })
    }

    /// Declared number of backscatter samples.
    pub fn declared_length(&self) -> Result<usize, CodecError> {
        self.length.parse().map_err(|_| CodecError::InvalidNumber {
            field: "length",
            value: self.length.clone(),
        })
    }

    /// Range-gate spacing in metres: the resolution field with trailing zero
    /// characters removed, parsed as an integer.
    pub fn resolution_interval(&self) -> Result<u32, CodecError> {
        let stripped = self.resolution.trim_end_matches('0');
        stripped.parse().map_err(|_| CodecError::InvalidNumber {
            field: "resolution",
            value: self.resolution.clone(),
        })
    }
}

/// Derive the altitude bin edges for a profile: `interval * i` for each
/// sample index.
pub fn range_gates(interval: u32, length: usize) -> Vec<u32> {
    (0..length as u32).map(|i| interval * i).collect()
}

/// Decode the fixed-width hexadecimal backscatter payload.
///
/// The payload is consecutive 5-character hex groups, each an unsigned 20-bit
/// integer reinterpreted as two's complement, scaled by
/// `(attenuated_scale / 100) * 1e-8` to give backscatter in `m^-1 sr^-1`
/// (see section 2.4.1 of the CS135 manual).
pub fn decode_backscatter(payload: &str, attenuated_scale: u32) -> Result<Vec<f64>, CodecError> {
    if payload.len() % HEX_GROUP_WIDTH != 0 {
        return Err(CodecError::PayloadLength(payload.len()));
    }
    let scale = f64::from(attenuated_scale) / 100.0 * 1e-8;
    payload
        .as_bytes()
        .chunks(HEX_GROUP_WIDTH)
        .map(|group| {
            // from_str_radix tolerates a leading '+', so require pure hex
            // digits first.
            if !group.iter().all(u8::is_ascii_hexdigit) {
                return Err(CodecError::InvalidHex(
                    String::from_utf8_lossy(group).into_owned(),
                ));
            }
            let text = std::str::from_utf8(group).map_err(|_| CodecError::NotText)?;
            let raw = u32::from_str_radix(text, 16)
                .map_err(|_| CodecError::InvalidHex(text.to_string()))?;
            let mut value = i64::from(raw);
            if value > MAX_POSITIVE {
                value -= 1 << 20;
            }
            Ok(value as f64 * scale)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(values: &[i32]) -> String {
        values
            .iter()
            .map(|v| format!("{:05x}", (*v as i64 & 0xFFFFF)))
            .collect()
    }

    #[test]
    fn test_decode_backscatter_values() {
        let profile = decode_backscatter("00001fffff0000280000", 100).unwrap();
        assert_eq!(profile.len(), 4);
        assert!((profile[0] - 1e-8).abs() < 1e-16);
        assert!((profile[1] + 1e-8).abs() < 1e-16);
        assert!((profile[2] - 2e-8).abs() < 1e-16);
        assert!((profile[3] + 5.24288e-3).abs() < 1e-10);
    }

    #[test]
    fn test_decode_backscatter_scale() {
        // attenuated_scale of 50% halves every value.
        let full = decode_backscatter("00064", 100).unwrap();
        let half = decode_backscatter("00064", 50).unwrap();
        assert!((half[0] - full[0] / 2.0).abs() < 1e-18);
    }

    #[test]
    fn test_backscatter_round_trip_boundaries() {
        let values = [
            -(1 << 19),
            (1 << 19) - 1,
            -1,
            0,
            1,
            -262144,
            262143,
            12345,
            -12345,
        ];
        let payload = encode(&values);
        let decoded = decode_backscatter(&payload, 100).unwrap();
        for (original, decoded) in values.iter().zip(&decoded) {
            let recovered = (decoded / 1e-8).round() as i32;
            assert_eq!(recovered, *original);
        }
    }

    #[test]
    fn test_decode_backscatter_bad_length() {
        assert_eq!(
            decode_backscatter("0000", 100),
            Err(CodecError::PayloadLength(4))
        );
    }

    #[test]
    fn test_decode_backscatter_bad_hex() {
        let err = decode_backscatter("00001zzzzz", 100).unwrap_err();
        assert_eq!(err, CodecError::InvalidHex("zzzzz".to_string()));
    }

    #[test]
    fn test_decode_backscatter_rejects_signed_group() {
        // "+ffff" would sneak through a bare from_str_radix.
        assert!(decode_backscatter("+ffff", 100).is_err());
    }

    #[test]
    fn test_status_line() {
        let status = parse_status_line("00 0100 05500 ///// ///// ///// 000").unwrap();
        assert_eq!(status.status, '0');
        assert_eq!(status.warning_alarm, '0');
        assert_eq!(status.window_transmission, "0100");
        assert_eq!(status.h1, "05500");
        assert_eq!(status.h4, "/////");
        assert_eq!(status.flags, "000");
    }

    #[test]
    fn test_status_line_wrong_count() {
        assert_eq!(
            parse_status_line("00 0100 05500"),
            Err(CodecError::FieldCount {
                expected: 7,
                found: 3
            })
        );
    }

    #[test]
    fn test_status_line_short_flag_token() {
        assert_eq!(
            parse_status_line("0 0100 05500 ///// ///// ///// 000"),
            Err(CodecError::StatusTooShort)
        );
    }

    #[test]
    fn test_profile_params() {
        let params =
            parse_profile_params("100 50 4 005 +34 00 0100 00 0012 00003F").unwrap();
        assert_eq!(params.attenuated_scale().unwrap(), 100);
        assert_eq!(params.resolution_interval().unwrap(), 5);
        assert_eq!(params.declared_length().unwrap(), 4);
        assert_eq!(params.energy, "005");
        assert_eq!(params.laser_temp, "+34");
        assert_eq!(params.backscatter_sum, "00003F");
    }

    #[test]
    fn test_profile_params_wrong_count() {
        assert_eq!(
            parse_profile_params("100 50 4"),
            Err(CodecError::FieldCount {
                expected: 10,
                found: 3
            })
        );
    }

    #[test]
    fn test_resolution_all_zeros_is_invalid() {
        let mut params =
            parse_profile_params("100 50 4 005 +34 00 0100 00 0012 00003F").unwrap();
        params.resolution = "00".to_string();
        assert!(matches!(
            params.resolution_interval(),
            Err(CodecError::InvalidNumber { field: "resolution", .. })
        ));
    }

    #[test]
    fn test_range_gates() {
        assert_eq!(range_gates(5, 4), vec![0, 5, 10, 15]);
        assert_eq!(range_gates(10, 0), Vec::<u32>::new());
    }
}
