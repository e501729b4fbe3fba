//! Record framing state machine.
//!
//! The framer consumes a line-based byte stream and assembles one logical
//! record from 4-6 physical lines: a header, a status line, an optional
//! sky-condition line (message 004), a profile parameter line, the
//! backscatter payload, and a checksum line. Two on-disk renderings are
//! auto-detected per line:
//!
//! - **Delimited** (`.csv` logs): the header contains the SOH control
//!   character and splits `timestamp,identifier` on a comma; body lines are
//!   taken verbatim.
//! - **Stripped** (`.txt` logs, control characters removed): the second
//!   whitespace token of the header starts with `CS` and the header splits on
//!   a single space; each body line carries a repeated 27-byte timestamp
//!   prefix that is removed before decoding.
//!
//! The logging pipeline is known to drop the terminator between consecutive
//! records, so the checksum line of one record can run straight into the
//! header of the next ("merged" records). When the captured checksum line is
//! wider than its expected width, the framer truncates it, validates the
//! current record against the head, and pushes the tail back into the line
//! stream so the following record is reassembled from the very same bytes.
//! The pushback queue makes this transitive: a chain of merges unwinds one
//! record per iteration without recursion and without losing or duplicating
//! any well-formed record.
//!
//! Every discard and every recovery is counted in [`DecodeStats`]; nothing
//! short of an I/O error aborts the stream.

use std::collections::VecDeque;
use std::io::{self, BufRead};

use tracing::{debug, info, warn};

use crate::checksum;
use crate::codec::{self, CodecError};
use crate::record::{DecodeStats, Record};

const SOH: u8 = 0x01;
const STX: u8 = 0x02;
const ETX: u8 = 0x03;

/// Bytes of repeated timestamp prefix on body lines in the stripped
/// rendering. Observed from captured logs, not derived from a documented
/// format rule.
const STRIPPED_PREFIX_LEN: usize = 27;

/// Width of a correctly terminated checksum line with control characters
/// retained: ETX plus four hex digits (the line terminator is already
/// removed by the cursor).
const CHECKSUM_WIDTH_DELIMITED: usize = 5;
/// Width with control characters stripped: four hex digits.
const CHECKSUM_WIDTH_STRIPPED: usize = 4;

/// On-disk line rendering, detected per record start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Variant {
    Delimited,
    Stripped,
}

impl Variant {
    fn checksum_width(self) -> usize {
        match self {
            Variant::Delimited => CHECKSUM_WIDTH_DELIMITED,
            Variant::Stripped => CHECKSUM_WIDTH_STRIPPED,
        }
    }
}

/// Line source with pushback, so a demerged tail can be re-read as input
/// against the same remaining stream.
struct LineCursor<R> {
    reader: R,
    pending: VecDeque<Vec<u8>>,
}

impl<R: BufRead> LineCursor<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            pending: VecDeque::new(),
        }
    }

    /// Next line with the trailing terminator removed, pushed-back lines
    /// first. `None` at end of input.
    fn next_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        if let Some(line) = self.pending.pop_front() {
            return Ok(Some(line));
        }
        let mut buf = Vec::new();
        if self.reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        while matches!(buf.last(), Some(b'\n' | b'\r')) {
            buf.pop();
        }
        Ok(Some(buf))
    }

    fn push_back(&mut self, line: Vec<u8>) {
        self.pending.push_front(line);
    }
}

/// Parsed record header.
#[derive(Debug)]
struct Header {
    timestamp: String,
    identifier: String,
    message_number: String,
}

/// Captured raw lines of one record, before validation.
struct RawRecord {
    header: Header,
    status_line: Vec<u8>,
    sky_line: Option<Vec<u8>>,
    params_line: Vec<u8>,
    payload_line: Vec<u8>,
    checksum_line: Vec<u8>,
}

/// Outcome of assembling lines for one start marker.
enum Step {
    Complete(Box<RawRecord>),
    Unsupported { message_number: String, timestamp: String },
    BadHeader(CodecError),
    Truncated,
}

/// Why a fully assembled record was rejected.
enum Reject {
    Checksum { computed: u16, expected: u16 },
    Malformed(CodecError),
}

/// The record framing state machine.
///
/// One `Framer` decodes one stream; statistics accumulate across calls so a
/// caller can feed several readers through the same instance if desired.
#[derive(Default)]
pub struct Framer {
    stats: DecodeStats,
    /// Set when a demerged tail has been pushed back and not yet recognized.
    merge_tail_pending: bool,
}

impl Framer {
    /// Create a framer with zeroed statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Decode an entire line stream, appending verified records to `records`.
    ///
    /// Only I/O errors propagate; every malformed, truncated, unsupported, or
    /// checksum-failed record is counted and skipped, and framing resumes at
    /// the next recognizable start marker.
    pub fn decode<R: BufRead>(&mut self, reader: R, records: &mut Vec<Record>) -> io::Result<()> {
        let mut cursor = LineCursor::new(reader);
        while let Some(line) = cursor.next_line()? {
            let Some(variant) = start_variant(&line) else {
                if self.merge_tail_pending {
                    self.merge_tail_pending = false;
                    self.stats.malformed += 1;
                    warn!("demerged trailing bytes do not start a record; dropped");
                }
                continue;
            };
            if self.merge_tail_pending {
                self.merge_tail_pending = false;
                self.stats.merges_recovered += 1;
                info!("recovered record merged into previous checksum line");
            }
            match self.assemble(variant, &line, &mut cursor)? {
                Step::Complete(raw) => match resolve(&raw) {
                    Ok(record) => {
                        debug!(
                            timestamp = %record.timestamp,
                            samples = record.length,
                            "record accepted"
                        );
                        self.stats.validated += 1;
                        records.push(record);
                    }
                    Err(Reject::Checksum { computed, expected }) => {
                        self.stats.checksum_failures += 1;
                        warn!(
                            timestamp = %raw.header.timestamp,
                            computed = %format_args!("{computed:04x}"),
                            expected = %format_args!("{expected:04x}"),
                            "checksum mismatch; record discarded"
                        );
                    }
                    Err(Reject::Malformed(error)) => {
                        self.stats.malformed += 1;
                        warn!(
                            timestamp = %raw.header.timestamp,
                            %error,
                            "malformed record discarded"
                        );
                    }
                },
                Step::Unsupported { message_number, timestamp } => {
                    self.stats.unsupported += 1;
                    debug!(
                        %timestamp,
                        %message_number,
                        "message without backscatter payload skipped"
                    );
                }
                Step::BadHeader(error) => {
                    self.stats.malformed += 1;
                    warn!(%error, "unparseable record header; record discarded");
                }
                Step::Truncated => {
                    self.stats.truncated += 1;
                    warn!("input ended mid-record; partial record discarded");
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Collect the body lines for one record start. Consumes exactly the
    /// record's own lines; a merged tail found on the checksum line is pushed
    /// back for the next iteration.
    fn assemble<R: BufRead>(
        &mut self,
        variant: Variant,
        start: &[u8],
        cursor: &mut LineCursor<R>,
    ) -> io::Result<Step> {
        let header = match parse_header(variant, start) {
            Ok(header) => header,
            Err(error) => return Ok(Step::BadHeader(error)),
        };
        let has_sky_line = match header.message_number.as_str() {
            "002" => false,
            "004" => true,
            _ => {
                return Ok(Step::Unsupported {
                    message_number: header.message_number,
                    timestamp: header.timestamp,
                })
            }
        };

        let body_count = if has_sky_line { 5 } else { 4 };
        let mut body: Vec<Vec<u8>> = Vec::with_capacity(body_count);
        for _ in 0..body_count {
            let Some(mut line) = cursor.next_line()? else {
                return Ok(Step::Truncated);
            };
            if variant == Variant::Stripped {
                // Remove the repeated timestamp prefix; short lines degrade
                // to empty and fail structural checks downstream.
                line.drain(..STRIPPED_PREFIX_LEN.min(line.len()));
            }
            body.push(line);
        }

        let mut checksum_line = body.pop().unwrap_or_default();
        let width = variant.checksum_width();
        if checksum_line.len() > width {
            // Excess bytes are the start of the next record, concatenated
            // because the terminator between records was lost.
            let tail = checksum_line.split_off(width);
            cursor.push_back(tail);
            self.merge_tail_pending = true;
        }

        let payload_line = body.pop().unwrap_or_default();
        let params_line = body.pop().unwrap_or_default();
        let sky_line = if has_sky_line { body.pop() } else { None };
        let status_line = body.pop().unwrap_or_default();

        Ok(Step::Complete(Box::new(RawRecord {
            header,
            status_line,
            sky_line,
            params_line,
            payload_line,
            checksum_line,
        })))
    }
}

/// Does this line open a record, and in which rendering?
fn start_variant(line: &[u8]) -> Option<Variant> {
    if line.contains(&SOH) {
        return Some(Variant::Delimited);
    }
    let text = std::str::from_utf8(line).ok()?;
    let second = text.split(' ').nth(1)?;
    second.starts_with("CS").then_some(Variant::Stripped)
}

fn parse_header(variant: Variant, line: &[u8]) -> Result<Header, CodecError> {
    let text = std::str::from_utf8(line).map_err(|_| CodecError::NotText)?;
    let (timestamp, raw_identifier) = match variant {
        Variant::Delimited => text
            .split_once(',')
            .ok_or_else(|| CodecError::Header(text.to_string()))?,
        Variant::Stripped => {
            let mut tokens = text.split(' ');
            let timestamp = tokens
                .next()
                .ok_or_else(|| CodecError::Header(text.to_string()))?;
            let identifier = tokens
                .next()
                .ok_or_else(|| CodecError::Header(text.to_string()))?;
            if tokens.next().is_some() {
                return Err(CodecError::Header(text.to_string()));
            }
            (timestamp, identifier)
        }
    };
    // SOH is framing, not payload; STX and stray terminators are likewise
    // not part of the identifier.
    let identifier = raw_identifier
        .trim_start_matches('\u{01}')
        .trim_matches(|c: char| matches!(c, '\u{02}' | '\r' | '\n'))
        .to_string();
    let message_number = identifier.get(6..9).unwrap_or_default().to_string();
    Ok(Header {
        timestamp: timestamp.to_string(),
        identifier,
        message_number,
    })
}

/// Extract the expected checksum from the (possibly demerged) checksum field.
fn parse_checksum_field(line: &[u8]) -> Result<u16, CodecError> {
    let text = std::str::from_utf8(line).map_err(|_| CodecError::NotText)?;
    let field = text.trim_start_matches('\u{03}').trim();
    if field.is_empty() || field.len() > 4 {
        return Err(CodecError::ChecksumField(field.to_string()));
    }
    u16::from_str_radix(field, 16).map_err(|_| CodecError::ChecksumField(field.to_string()))
}

/// The exact byte sequence the instrument CRCs for one record.
///
/// This concatenation is the most fragile contract in the decoder: the
/// identifier with control markers stripped, then STX CRLF, each body data
/// line trimmed of surrounding whitespace followed by CRLF, and a final ETX.
/// It must be byte-exact in both renderings, which is why the stripped
/// variant re-inserts the control characters its logs have lost.
fn checksum_input(
    identifier: &str,
    status_line: &[u8],
    sky_line: Option<&[u8]>,
    params_line: &[u8],
    payload_line: &[u8],
) -> Vec<u8> {
    let mut message = Vec::with_capacity(payload_line.len() + 128);
    message.extend_from_slice(identifier.as_bytes());
    message.extend_from_slice(&[STX, b'\r', b'\n']);
    for line in [Some(status_line), sky_line, Some(params_line), Some(payload_line)]
        .into_iter()
        .flatten()
    {
        message.extend_from_slice(line.trim_ascii());
        message.extend_from_slice(b"\r\n");
    }
    message.push(ETX);
    message
}

/// Validate an assembled record and decode its fields.
///
/// Check order mirrors the wire format: structural token counts first, then
/// the CRC over the raw bytes, then numeric interpretation of the verified
/// content.
fn resolve(raw: &RawRecord) -> Result<Record, Reject> {
    let status_text = body_text(&raw.status_line)?;
    let params_text = body_text(&raw.params_line)?;
    let payload_text = body_text(&raw.payload_line)?;
    let sky_condition = match &raw.sky_line {
        Some(line) => Some(body_text(line)?.to_string()),
        None => None,
    };

    let status = codec::parse_status_line(status_text).map_err(Reject::Malformed)?;
    let params = codec::parse_profile_params(params_text).map_err(Reject::Malformed)?;
    let expected = parse_checksum_field(&raw.checksum_line).map_err(Reject::Malformed)?;

    let message = checksum_input(
        &raw.header.identifier,
        &raw.status_line,
        raw.sky_line.as_deref(),
        &raw.params_line,
        &raw.payload_line,
    );
    let computed = checksum::crc_message(&message);
    if computed != expected {
        return Err(Reject::Checksum { computed, expected });
    }

    let attenuated_scale = params.attenuated_scale().map_err(Reject::Malformed)?;
    let length = params.declared_length().map_err(Reject::Malformed)?;
    let interval = params.resolution_interval().map_err(Reject::Malformed)?;
    let backscatter_profile =
        codec::decode_backscatter(payload_text, attenuated_scale).map_err(Reject::Malformed)?;
    if backscatter_profile.len() != length {
        return Err(Reject::Malformed(CodecError::LengthMismatch {
            declared: length,
            decoded: backscatter_profile.len(),
        }));
    }
    let ranges = codec::range_gates(interval, length);

    Ok(Record {
        timestamp: raw.header.timestamp.clone(),
        identifier: raw.header.identifier.clone(),
        message_number: raw.header.message_number.clone(),
        status: status.status,
        warning_alarm: status.warning_alarm,
        window_transmission: status.window_transmission,
        h1: status.h1,
        h2: status.h2,
        h3: status.h3,
        h4: status.h4,
        flags: status.flags,
        sky_condition,
        attenuated_scale,
        resolution: params.resolution,
        length,
        energy: params.energy,
        laser_temp: params.laser_temp,
        total_tilt: params.total_tilt,
        background_light: params.background_light,
        pulse: params.pulse,
        sample_rate: params.sample_rate,
        backscatter_sum: params.backscatter_sum,
        ranges,
        backscatter_profile,
        checksum_verified: true,
    })
}

/// Trimmed text view of a raw body line.
fn body_text(line: &[u8]) -> Result<&str, Reject> {
    std::str::from_utf8(line.trim_ascii())
        .map_err(|_| Reject::Malformed(CodecError::NotText))
}
