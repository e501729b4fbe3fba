//! Site and instrument metadata for export attributes.
//!
//! Loaded from a small TOML file supplied with `-m`; the defaults match the
//! deployment this decoder was written for, so exports work without one.
//!
//! ```toml
//! [instrument]
//! name = "ncas-ceilometer-3"
//! platform = "iao"
//!
//! [attributes]
//! institution = "National Centre for Atmospheric Science"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Cs135Error, Result};
use crate::export::Product;

/// Instrument identity used in export file names.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstrumentInfo {
    /// Instrument name, e.g. `ncas-ceilometer-3`.
    pub name: String,
    /// Deployment platform, e.g. `iao`.
    pub platform: String,
}

impl Default for InstrumentInfo {
    fn default() -> Self {
        Self {
            name: "ncas-ceilometer-3".to_string(),
            platform: "iao".to_string(),
        }
    }
}

/// Metadata merged into export products.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SiteMetadata {
    /// Instrument identity.
    #[serde(default)]
    pub instrument: InstrumentInfo,
    /// Free-form global attributes copied onto exported datasets.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl SiteMetadata {
    /// Load metadata from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| Cs135Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|e| Cs135Error::Metadata(e.to_string()))
    }

    /// Product file name: `<instrument>_<platform>_<date>_<product>_v1.0.nc`.
    pub fn product_filename(&self, file_date: &str, product: Product) -> String {
        format!(
            "{}_{}_{}_{}_v1.0.nc",
            self.instrument.name, self.instrument.platform, file_date, product
        )
    }
}
