//! Synthetic record builders shared by the integration tests.
//!
//! Records are rendered exactly the way the two logger formats lay them out
//! on disk; checksums are computed with the crate's own engine, which is
//! pinned to the firmware algorithm by literal vectors in the unit tests.
#![allow(dead_code)]

use cs135_decode::checksum;

/// One synthetic message 002 record.
#[derive(Clone)]
pub struct TestRecord {
    pub timestamp: String,
    pub identifier: String,
    pub status_line: String,
    pub params_line: String,
    pub payload: String,
}

impl TestRecord {
    pub fn new(timestamp: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
            identifier: "CS0001002".to_string(),
            status_line: "00 0100 05500 ///// ///// ///// 000".to_string(),
            params_line: "100 50 4 005 +34 00 0100 00 0012 00003F".to_string(),
            payload: "00001fffff0000280000".to_string(),
        }
    }

    pub fn crc(&self) -> u16 {
        let message = format!(
            "{}\u{02}\r\n{}\r\n{}\r\n{}\r\n\u{03}",
            self.identifier, self.status_line, self.params_line, self.payload
        );
        checksum::crc_message(message.as_bytes())
    }

    /// Rendering with control characters retained (`.csv` logs).
    pub fn delimited(&self) -> String {
        format!(
            "{},\u{01}{}\u{02}\r\n{}\r\n{}\r\n{}\r\n\u{03}{:04x}\n",
            self.timestamp,
            self.identifier,
            self.status_line,
            self.params_line,
            self.payload,
            self.crc()
        )
    }

    /// Rendering with control characters stripped and the timestamp repeated
    /// as a 27-byte prefix on body lines (`.txt` logs).
    pub fn stripped(&self) -> String {
        let prefix = format!("{} ", self.timestamp);
        assert_eq!(prefix.len(), 27, "test timestamps must be 26 characters");
        format!(
            "{} {}\n{prefix}{}\n{prefix}{}\n{prefix}{}\n{prefix}{:04x}\n",
            self.timestamp,
            self.identifier,
            self.status_line,
            self.params_line,
            self.payload,
            self.crc()
        )
    }
}

/// Concatenate rendered records with the terminator between each pair
/// deleted, simulating the logger dropping the inter-record delimiter.
pub fn merge(rendered: &[String]) -> String {
    let mut out = String::new();
    for (i, record) in rendered.iter().enumerate() {
        if i + 1 < rendered.len() {
            out.push_str(record.trim_end_matches('\n'));
        } else {
            out.push_str(record);
        }
    }
    out
}
