//! NetCDF writer for the NCAS-flavoured ceilometer products.
//!
//! Two products are generated from the same decoded table:
//!
//! - `aerosol-backscatter`: time x altitude attenuated aerosol backscatter
//!   coefficients, with the altitude axis tilt-corrected from the first
//!   record's total tilt.
//! - `cloud-base`: time x layer-index cloud-base altitudes from the `h1..h4`
//!   fields, fill-valued where the instrument reported no layer.
//!
//! Both carry the shared time axis (epoch seconds plus the decomposed
//! calendar fields), per-profile housekeeping variables, and the site
//! metadata as global attributes.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::export::Product;
use crate::metadata::SiteMetadata;
use crate::table::ProfileTable;

/// Fill value for masked floating-point data.
#[cfg(feature = "export_netcdf")]
const FILL_VALUE: f32 = -1.0e20;

/// Write one product file into `outdir`, returning its path.
///
/// The output directory is created if absent; the file name follows
/// [`SiteMetadata::product_filename`].
#[cfg(feature = "export_netcdf")]
pub fn write_product(
    table: &ProfileTable,
    metadata: &SiteMetadata,
    outdir: &Path,
    product: Product,
) -> Result<PathBuf> {
    std::fs::create_dir_all(outdir)?;
    let path = outdir.join(metadata.product_filename(&table.file_date(), product));
    let mut file = netcdf::create(&path).map_err(nc_err)?;

    let rows = table.len();
    file.add_dimension("time", rows).map_err(nc_err)?;
    match product {
        Product::AerosolBackscatter => {
            file.add_dimension("altitude", table.ranges().len())
                .map_err(nc_err)?;
            write_backscatter(&mut file, table)?;
        }
        Product::CloudBase => {
            file.add_dimension("layer_index", 4).map_err(nc_err)?;
            write_cloud_base(&mut file, table)?;
        }
    }
    write_time_axis(&mut file, table)?;
    write_housekeeping(&mut file, table)?;
    write_global_attributes(&mut file, table, metadata)?;

    tracing::info!(path = %path.display(), %product, rows, "wrote netCDF product");
    Ok(path)
}

/// Stub when the `export_netcdf` feature is disabled.
#[cfg(not(feature = "export_netcdf"))]
pub fn write_product(
    _table: &ProfileTable,
    _metadata: &SiteMetadata,
    _outdir: &Path,
    _product: Product,
) -> Result<PathBuf> {
    Err(crate::error::Cs135Error::FeatureNotEnabled("export_netcdf"))
}

#[cfg(feature = "export_netcdf")]
fn nc_err(e: netcdf::Error) -> crate::error::Cs135Error {
    crate::error::Cs135Error::Export(e.to_string())
}

#[cfg(feature = "export_netcdf")]
fn write_backscatter(file: &mut netcdf::FileMut, table: &ProfileTable) -> Result<()> {
    // Tilt-corrected geometric altitude from the first record.
    let tilt = table
        .records()
        .first()
        .map(|r| r.total_tilt.parse::<f64>().unwrap_or(0.0))
        .unwrap_or(0.0);
    let correction = (90.0 - tilt).to_radians().sin();
    let altitude: Vec<f32> = table
        .ranges()
        .iter()
        .map(|r| (f64::from(*r) * correction) as f32)
        .collect();

    let mut var = file.add_variable::<f32>("altitude", &["altitude"]).map_err(nc_err)?;
    var.put_values(&altitude, ..).map_err(nc_err)?;
    var.add_attribute("units", "m").map_err(nc_err)?;
    var.add_attribute("standard_name", "altitude").map_err(nc_err)?;
    var.add_attribute("long_name", "Geometric height above geoid (WGS84)")
        .map_err(nc_err)?;
    var.add_attribute("axis", "Z").map_err(nc_err)?;

    let values: Vec<f32> = table
        .records()
        .iter()
        .flat_map(|r| r.backscatter_profile.iter().map(|v| *v as f32))
        .collect();
    let mut var = file
        .add_variable::<f32>(
            "attenuated_aerosol_backscatter_coefficient",
            &["time", "altitude"],
        )
        .map_err(nc_err)?;
    var.set_fill_value(FILL_VALUE).map_err(nc_err)?;
    var.put_values(&values, ..).map_err(nc_err)?;
    var.add_attribute("units", "m-1 sr-1").map_err(nc_err)?;
    var.add_attribute(
        "standard_name",
        "attenuated_aerosol_backscatter_coefficient",
    )
    .map_err(nc_err)?;
    var.add_attribute("long_name", "Attenuated Aerosol Backscatter Coefficient")
        .map_err(nc_err)?;
    Ok(())
}

#[cfg(feature = "export_netcdf")]
fn write_cloud_base(file: &mut netcdf::FileMut, table: &ProfileTable) -> Result<()> {
    let values: Vec<f32> = table
        .cloud_base_values()
        .iter()
        .map(|v| if v.is_nan() { FILL_VALUE } else { *v as f32 })
        .collect();
    let mut var = file
        .add_variable::<f32>("cloud_base_altitude", &["time", "layer_index"])
        .map_err(nc_err)?;
    var.set_fill_value(FILL_VALUE).map_err(nc_err)?;
    var.put_values(&values, ..).map_err(nc_err)?;
    var.add_attribute("units", "m").map_err(nc_err)?;
    var.add_attribute("standard_name", "cloud_base_altitude")
        .map_err(nc_err)?;
    var.add_attribute("long_name", "Cloud Base Altitude").map_err(nc_err)?;
    Ok(())
}

#[cfg(feature = "export_netcdf")]
fn write_time_axis(file: &mut netcdf::FileMut, table: &ProfileTable) -> Result<()> {
    use chrono::{Datelike, Timelike};

    let seconds: Vec<f64> = table
        .times()
        .iter()
        .map(|t| t.and_utc().timestamp_micros() as f64 / 1e6)
        .collect();
    let mut var = file.add_variable::<f64>("time", &["time"]).map_err(nc_err)?;
    var.put_values(&seconds, ..).map_err(nc_err)?;
    var.add_attribute("units", "seconds since 1970-01-01 00:00:00 UTC")
        .map_err(nc_err)?;
    var.add_attribute("standard_name", "time").map_err(nc_err)?;
    var.add_attribute("axis", "T").map_err(nc_err)?;

    let calendar: [(&str, Vec<i32>); 6] = [
        ("year", table.times().iter().map(|t| t.year()).collect()),
        ("month", table.times().iter().map(|t| t.month() as i32).collect()),
        ("day", table.times().iter().map(|t| t.day() as i32).collect()),
        ("hour", table.times().iter().map(|t| t.hour() as i32).collect()),
        ("minute", table.times().iter().map(|t| t.minute() as i32).collect()),
        ("second", table.times().iter().map(|t| t.second() as i32).collect()),
    ];
    for (name, values) in calendar {
        let mut var = file.add_variable::<i32>(name, &["time"]).map_err(nc_err)?;
        var.put_values(&values, ..).map_err(nc_err)?;
    }

    let mut var = file
        .add_variable::<f64>("day_of_year", &["time"])
        .map_err(nc_err)?;
    var.put_values(&table.day_of_year(), ..).map_err(nc_err)?;
    var.add_attribute("units", "1").map_err(nc_err)?;
    Ok(())
}

#[cfg(feature = "export_netcdf")]
fn write_housekeeping(file: &mut netcdf::FileMut, table: &ProfileTable) -> Result<()> {
    let columns: [(&str, &str, Vec<f64>); 6] = [
        (
            "laser_temperature",
            "degree_Celsius",
            table.numeric_column(|r| &r.laser_temp),
        ),
        (
            "laser_pulse_energy",
            "percent",
            table.numeric_column(|r| &r.energy),
        ),
        (
            "window_transmittance",
            "percent",
            table.numeric_column(|r| &r.window_transmission),
        ),
        (
            "backscatter_sum",
            "sr-1",
            table.numeric_column(|r| &r.backscatter_sum),
        ),
        (
            "background_light",
            "mV",
            table.numeric_column(|r| &r.background_light),
        ),
        (
            "sensor_zenith_angle",
            "degree",
            table.numeric_column(|r| &r.total_tilt),
        ),
    ];
    for (name, units, values) in columns {
        let data: Vec<f32> = values
            .iter()
            .map(|v| if v.is_nan() { FILL_VALUE } else { *v as f32 })
            .collect();
        let mut var = file.add_variable::<f32>(name, &["time"]).map_err(nc_err)?;
        var.set_fill_value(FILL_VALUE).map_err(nc_err)?;
        var.put_values(&data, ..).map_err(nc_err)?;
        var.add_attribute("units", units).map_err(nc_err)?;
    }

    // Integer housekeeping: pulse count is logged divided by 1000.
    let pulses: Vec<i32> = table
        .records()
        .iter()
        .map(|r| r.pulse.parse::<i32>().unwrap_or(0) * 1000)
        .collect();
    let mut var = file
        .add_variable::<i32>("profile_pulses", &["time"])
        .map_err(nc_err)?;
    var.put_values(&pulses, ..).map_err(nc_err)?;
    var.add_attribute("units", "1").map_err(nc_err)?;

    let scaling: Vec<i32> = table
        .records()
        .iter()
        .map(|r| r.attenuated_scale as i32)
        .collect();
    let mut var = file
        .add_variable::<i32>("profile_scaling", &["time"])
        .map_err(nc_err)?;
    var.put_values(&scaling, ..).map_err(nc_err)?;
    var.add_attribute("units", "percent").map_err(nc_err)?;
    Ok(())
}

#[cfg(feature = "export_netcdf")]
fn write_global_attributes(
    file: &mut netcdf::FileMut,
    table: &ProfileTable,
    metadata: &SiteMetadata,
) -> Result<()> {
    let (start, end) = table.time_coverage();
    file.add_attribute("Conventions", "CF-1.6, NCAS-AMF-1.0")
        .map_err(nc_err)?;
    file.add_attribute("source", "Campbell Scientific CS135 ceilometer")
        .map_err(nc_err)?;
    file.add_attribute(
        "time_coverage_start",
        start.format("%Y-%m-%dT%H:%M:%S UTC").to_string(),
    )
    .map_err(nc_err)?;
    file.add_attribute(
        "time_coverage_end",
        end.format("%Y-%m-%dT%H:%M:%S UTC").to_string(),
    )
    .map_err(nc_err)?;
    for (name, value) in &metadata.attributes {
        file.add_attribute(name, value.as_str()).map_err(nc_err)?;
    }
    Ok(())
}
