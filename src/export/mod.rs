//! Export backends for decoded profile tables.
//!
//! Both writers are feature-gated the same way the input formats they wrap
//! are optional system dependencies: `export_csv` (on by default) and
//! `export_netcdf` (requires a netCDF installation). A disabled backend
//! surfaces [`crate::Cs135Error::FeatureNotEnabled`] instead of silently
//! doing nothing.

pub mod csv;
pub mod netcdf;

use std::fmt;

/// NetCDF product to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Product {
    /// Time x altitude attenuated aerosol backscatter coefficients.
    AerosolBackscatter,
    /// Time x layer-index cloud-base altitudes.
    CloudBase,
}

impl Product {
    /// Product name as it appears in export file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Product::AerosolBackscatter => "aerosol-backscatter",
            Product::CloudBase => "cloud-base",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
