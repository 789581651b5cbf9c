//! Dataset manifest and store loading.
//!
//! A deployment describes its source arrays in a small TOML manifest: the
//! regular grid, the monthly time axis, and one file per field. The store
//! is loaded once at process start from that manifest (netcdf ingest is
//! behind the `netcdf` cargo feature so the default build carries no system
//! library dependency); tests and embedders construct stores directly from
//! in-memory arrays instead.
//!
//! ```toml
//! [grid]
//! lat_start = -44.5
//! lat_step = 0.25
//! lat_count = 139
//! lon_start = 112.0
//! lon_step = 0.25
//! lon_count = 169
//!
//! [time]
//! start_year = 1962
//! start_month = 1
//! months = 744
//!
//! [files]
//! d2h = "netcdfs/aus_prec.d2H_v1_196201-202312_monthly_median.nc"
//! d18o = "netcdfs/aus_prec.d18O_v1_196201-202312_monthly_median.nc"
//! dxs = "netcdfs/aus_prec.dxs_v1_196201-202312_monthly_median.nc"
//! precipitation = "netcdfs/aus_prec_v1_196201-202312_monthly.nc"
//! ```

use crate::errors::{ApicError, ApicResult};
use crate::grid::GridAxis;
use crate::timeline::{MonthAxis, MonthStamp};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub lat_start: f64,
    pub lat_step: f64,
    pub lat_count: usize,
    pub lon_start: f64,
    pub lon_step: f64,
    pub lon_count: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeSpec {
    pub start_year: i32,
    /// Calendar month of the first step, 1..=12.
    pub start_month: u32,
    /// Number of monthly steps.
    pub months: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldFiles {
    pub d2h: PathBuf,
    pub d18o: PathBuf,
    pub dxs: PathBuf,
    pub precipitation: PathBuf,
}

/// Variable names inside the source files; defaults match the published
/// dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableNames {
    pub d2h: String,
    pub d18o: String,
    pub dxs: String,
    pub precipitation: String,
}

impl Default for VariableNames {
    fn default() -> Self {
        Self {
            d2h: "d2Hp".to_string(),
            d18o: "d18Op".to_string(),
            dxs: "dxsp".to_string(),
            precipitation: "prec".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetManifest {
    pub grid: GridSpec,
    pub time: TimeSpec,
    pub files: FieldFiles,
    #[serde(default)]
    pub variables: VariableNames,
}

impl DatasetManifest {
    pub fn from_toml_str(text: &str) -> ApicResult<Self> {
        toml::from_str(text).map_err(|e| ApicError::Manifest(e.to_string()))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> ApicResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Construct the shared latitude/longitude axes.
    pub fn grid_axes(&self) -> ApicResult<(Arc<GridAxis>, Arc<GridAxis>)> {
        let lat = GridAxis::regular(self.grid.lat_start, self.grid.lat_step, self.grid.lat_count)?;
        let lon = GridAxis::regular(self.grid.lon_start, self.grid.lon_step, self.grid.lon_count)?;
        Ok((Arc::new(lat), Arc::new(lon)))
    }

    /// Construct the monthly time axis.
    pub fn month_axis(&self) -> ApicResult<MonthAxis> {
        if !(1..=12).contains(&self.time.start_month) {
            return Err(ApicError::Manifest(format!(
                "start_month {} is not in 1..=12",
                self.time.start_month
            )));
        }
        MonthAxis::new(
            MonthStamp::new(self.time.start_year, self.time.start_month),
            self.time.months,
        )
    }
}

#[cfg(feature = "netcdf")]
mod loader {
    use super::*;
    use crate::field::MonthlyField;
    use crate::store::GriddedStore;
    use crate::timeline::FloatValue;
    use log::debug;
    use ndarray::Array3;

    /// Values this large are fill values, not data.
    const FILL_THRESHOLD: f64 = 1.0e30;

    fn read_field(
        path: &Path,
        variable: &str,
        axis: &MonthAxis,
        lat: &Arc<GridAxis>,
        lon: &Arc<GridAxis>,
    ) -> ApicResult<MonthlyField> {
        debug!("reading {} from {}", variable, path.display());
        let file = netcdf::open(path)?;
        let var = file.variable(variable).ok_or_else(|| {
            ApicError::Manifest(format!(
                "variable {} missing from {}",
                variable,
                path.display()
            ))
        })?;
        let data: Vec<f64> = var.get_values(..)?;
        let mut values = Array3::from_shape_vec((axis.len(), lat.len(), lon.len()), data)
            .map_err(|e| ApicError::Manifest(format!("{}: {}", path.display(), e)))?;
        values.mapv_inplace(|v| {
            if v.is_finite() && v.abs() < FILL_THRESHOLD {
                v
            } else {
                FloatValue::NAN
            }
        });
        MonthlyField::new(axis.clone(), Arc::clone(lat), Arc::clone(lon), values)
    }

    /// Load a complete store from the manifest's source files.
    pub fn load_store(manifest: &DatasetManifest) -> ApicResult<GriddedStore> {
        let (lat, lon) = manifest.grid_axes()?;
        let axis = manifest.month_axis()?;
        let names = &manifest.variables;
        GriddedStore::new(
            read_field(&manifest.files.d2h, &names.d2h, &axis, &lat, &lon)?,
            read_field(&manifest.files.d18o, &names.d18o, &axis, &lat, &lon)?,
            read_field(&manifest.files.dxs, &names.dxs, &axis, &lat, &lon)?,
            read_field(
                &manifest.files.precipitation,
                &names.precipitation,
                &axis,
                &lat,
                &lon,
            )?,
        )
    }
}

#[cfg(feature = "netcdf")]
pub use loader::load_store;
