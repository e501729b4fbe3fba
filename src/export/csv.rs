//! CSV writer for the profile table.
//!
//! One row per record: the verbatim instrument timestamp followed by the
//! backscatter value of each range gate. The header row carries the altitude
//! bin edges in metres.

#[cfg(feature = "export_csv")]
use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::Result;
use crate::table::ProfileTable;

#[cfg(feature = "export_csv")]
use crate::error::Cs135Error;

/// Write the table as CSV.
#[cfg(feature = "export_csv")]
pub fn write_table<W: io::Write>(table: &ProfileTable, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut header = Vec::with_capacity(table.ranges().len() + 1);
    header.push("timestamp".to_string());
    header.extend(table.ranges().iter().map(u32::to_string));
    csv_writer
        .write_record(&header)
        .map_err(|e| Cs135Error::Export(e.to_string()))?;

    for record in table.records() {
        let mut row = Vec::with_capacity(record.backscatter_profile.len() + 1);
        row.push(record.timestamp.clone());
        row.extend(record.backscatter_profile.iter().map(f64::to_string));
        csv_writer
            .write_record(&row)
            .map_err(|e| Cs135Error::Export(e.to_string()))?;
    }
    csv_writer
        .flush()
        .map_err(|e| Cs135Error::Export(e.to_string()))?;
    Ok(())
}

/// Stub when the `export_csv` feature is disabled.
#[cfg(not(feature = "export_csv"))]
pub fn write_table<W: io::Write>(_table: &ProfileTable, _writer: W) -> Result<()> {
    Err(crate::error::Cs135Error::FeatureNotEnabled("export_csv"))
}

/// Write the table as CSV to a file.
#[cfg(feature = "export_csv")]
pub fn write_table_to_path<P: AsRef<Path>>(table: &ProfileTable, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    write_table(table, file)
}

/// Stub when the `export_csv` feature is disabled.
#[cfg(not(feature = "export_csv"))]
pub fn write_table_to_path<P: AsRef<Path>>(_table: &ProfileTable, _path: P) -> Result<()> {
    Err(crate::error::Cs135Error::FeatureNotEnabled("export_csv"))
}

#[cfg(all(test, feature = "export_csv"))]
mod tests {
    use super::*;
    use crate::record::Record;

    fn record(timestamp: &str) -> Record {
        Record {
            timestamp: timestamp.to_string(),
            identifier: "CS0001002".to_string(),
            message_number: "002".to_string(),
            status: '0',
            warning_alarm: '0',
            window_transmission: "0100".to_string(),
            h1: "/////".to_string(),
            h2: "/////".to_string(),
            h3: "/////".to_string(),
            h4: "/////".to_string(),
            flags: "000".to_string(),
            sky_condition: None,
            attenuated_scale: 100,
            resolution: "50".to_string(),
            length: 2,
            energy: "005".to_string(),
            laser_temp: "+34".to_string(),
            total_tilt: "00".to_string(),
            background_light: "0100".to_string(),
            pulse: "00".to_string(),
            sample_rate: "0012".to_string(),
            backscatter_sum: "00003F".to_string(),
            ranges: vec![0, 5],
            backscatter_profile: vec![1e-8, -2e-8],
            checksum_verified: true,
        }
    }

    #[test]
    fn test_csv_layout() {
        let table = ProfileTable::from_records(vec![
            record("2018-09-10T11:40:58.503741"),
            record("2018-09-10T11:41:28.211056"),
        ])
        .unwrap();
        let mut buffer = Vec::new();
        write_table(&table, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("timestamp,0,5"));
        assert_eq!(
            lines.next(),
            Some("2018-09-10T11:40:58.503741,0.00000001,-0.00000002")
        );
        assert_eq!(lines.count(), 1);
    }
}
