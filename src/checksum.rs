//! CRC-16 engine matching the CS135 instrument firmware.
//!
//! The ceilometer protects every message with a CRC-16/CCITT-style checksum:
//! polynomial `0x1021`, initial value `0xFFFF`, final XOR `0xFFFF`, computed
//! over the message bytes via a 256-entry lookup table. The implementation
//! here must be bit-exact with the firmware: any deviation in table
//! construction, masking, or the initial/final XOR yields different values
//! for *every* message, which shows up downstream as 100% checksum failures
//! rather than as any structural error.

use once_cell::sync::Lazy;

/// CRC polynomial used by the instrument.
const POLY: u16 = 0x1021;
/// Initial value of the running register.
const INIT: u16 = 0xFFFF;
/// Value XORed into the register after the last byte.
const XOR_OUT: u16 = 0xFFFF;

/// Lookup table, built once and shared read-only across all decodes.
static CRC_TABLE: Lazy<[u16; 256]> = Lazy::new(build_table);

fn build_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let mut crc: u16 = 0;
        let mut c = (i as u16) << 8;
        for _ in 0..8 {
            if (crc ^ c) & 0x8000 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
            c <<= 1;
        }
        *entry = crc;
    }
    table
}

/// Feed one byte into a running CRC register.
///
/// The register must be seeded with the protocol's initial value and XORed
/// with the final value after the last byte; [`Crc16`] does both. Exposed so
/// callers can checksum data incrementally without buffering it.
#[inline]
pub fn update(crc: u16, byte: u8) -> u16 {
    let index = (crc >> 8) ^ u16::from(byte);
    (crc << 8) ^ CRC_TABLE[usize::from(index & 0xFF)]
}

/// Checksum a complete message the way the CS135 firmware does.
pub fn crc_message(message: &[u8]) -> u16 {
    let mut digest = Crc16::new();
    digest.write(message);
    digest.finalize()
}

/// Incremental CRC digest.
///
/// Produces identical results to [`crc_message`] over the same bytes in any
/// chunking.
#[derive(Debug, Clone)]
pub struct Crc16 {
    crc: u16,
}

impl Crc16 {
    /// Start a new digest.
    pub fn new() -> Self {
        Self { crc: INIT }
    }

    /// Feed bytes into the digest.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.crc = update(self.crc, b);
        }
    }

    /// Finish and return the message checksum.
    pub fn finalize(self) -> u16 {
        self.crc ^ XOR_OUT
    }
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_spot_values() {
        assert_eq!(CRC_TABLE[0], 0x0000);
        assert_eq!(CRC_TABLE[1], 0x1021);
        assert_eq!(CRC_TABLE[255], 0x1EF0);
    }

    #[test]
    fn test_hello_world_reference_vector() {
        // Canonical self-consistency vector for this firmware variant.
        assert_eq!(crc_message(b"Hello World"), 0xB2DA);
    }

    #[test]
    fn test_check_string() {
        // CCITT-FALSE check value 0x29B1, XORed with the firmware's 0xFFFF.
        assert_eq!(crc_message(b"123456789"), 0xD64E);
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(crc_message(b""), 0x0000);
    }

    #[test]
    fn test_incremental_matches_whole_message() {
        let message = b"Hello World";
        let mut digest = Crc16::new();
        for &b in message.iter() {
            digest.write(&[b]);
        }
        assert_eq!(digest.finalize(), crc_message(message));
    }

    #[test]
    fn test_chunked_matches_whole_message() {
        let message = b"2018-09-10T11:40:58.503741 some record body";
        let mut digest = Crc16::new();
        digest.write(&message[..7]);
        digest.write(&message[7..]);
        assert_eq!(digest.finalize(), crc_message(message));
    }

    #[test]
    fn test_single_bit_changes_checksum() {
        let mut message = b"Hello World".to_vec();
        let reference = crc_message(&message);
        message[3] ^= 0x01;
        assert_ne!(crc_message(&message), reference);
    }
}
