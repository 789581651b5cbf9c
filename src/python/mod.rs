//! Python wrappers for the store and query results.
//!
//! The store is constructed from numpy arrays (or loaded from a dataset
//! manifest when the `netcdf` feature is enabled) and queried with plain
//! Python scalars and strings; results come back as numpy arrays.

use apic_core::aggregate::MonthSet;
use apic_core::errors::ApicError;
use apic_core::export;
use apic_core::extract::PointSeries;
use apic_core::field::MonthlyField;
use apic_core::grid::GridAxis;
use apic_core::mwl;
use apic_core::queries::{SearchMode, SpatialQuery, TimeseriesQuery};
use apic_core::resample::Resolution;
use apic_core::store::{GriddedStore, Tracer};
use apic_core::timeline::{MonthAxis, MonthStamp};
use chrono::NaiveDate;
use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray3, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use std::sync::Arc;

fn to_py_err(error: ApicError) -> PyErr {
    PyValueError::new_err(error.to_string())
}

fn parse_date(text: &str) -> PyResult<NaiveDate> {
    text.parse::<NaiveDate>()
        .map_err(|e| PyValueError::new_err(format!("invalid date {:?}: {}", text, e)))
}

/// Python wrapper for the immutable gridded store.
#[pyclass]
#[pyo3(name = "GriddedStore")]
pub struct PyGriddedStore {
    store: GriddedStore,
}

#[pymethods]
impl PyGriddedStore {
    /// Assemble a store from coordinate vectors and four (time, lat, lon)
    /// arrays sharing the monthly axis that starts at
    /// `start_year`-`start_month`.
    #[new]
    fn new(
        lat: PyReadonlyArray1<f64>,
        lon: PyReadonlyArray1<f64>,
        start_year: i32,
        start_month: u32,
        d2h: PyReadonlyArray3<f64>,
        d18o: PyReadonlyArray3<f64>,
        dxs: PyReadonlyArray3<f64>,
        precipitation: PyReadonlyArray3<f64>,
    ) -> PyResult<Self> {
        if !(1..=12).contains(&start_month) {
            return Err(PyValueError::new_err(format!(
                "start_month must be in 1..=12, got {}",
                start_month
            )));
        }
        let lat = Arc::new(GridAxis::new(lat.as_array().to_owned()).map_err(to_py_err)?);
        let lon = Arc::new(GridAxis::new(lon.as_array().to_owned()).map_err(to_py_err)?);
        let months = d2h.as_array().shape()[0];
        let axis = MonthAxis::new(MonthStamp::new(start_year, start_month), months)
            .map_err(to_py_err)?;

        let field = |values: PyReadonlyArray3<f64>| {
            MonthlyField::new(
                axis.clone(),
                Arc::clone(&lat),
                Arc::clone(&lon),
                values.as_array().to_owned(),
            )
            .map_err(to_py_err)
        };
        let store = GriddedStore::new(
            field(d2h)?,
            field(d18o)?,
            field(dxs)?,
            field(precipitation)?,
        )
        .map_err(to_py_err)?;
        Ok(Self { store })
    }

    /// Load a store from a TOML dataset manifest (netcdf sources).
    #[cfg(feature = "netcdf")]
    #[staticmethod]
    fn from_manifest(path: &str) -> PyResult<Self> {
        let manifest =
            apic_core::manifest::DatasetManifest::from_path(path).map_err(to_py_err)?;
        let store = apic_core::manifest::load_store(&manifest).map_err(to_py_err)?;
        Ok(Self { store })
    }

    /// Extract the isotope series nearest to a coordinate.
    ///
    /// `resolution` is one of the selector tags (`monthly`, `ann`,
    /// `ann_trop`, `DJF`, `MAM`, `JJA`, `SON`, `3mrm`, `6mrm`, `12mrm`);
    /// `date_range` is an optional inclusive `(start, end)` pair of ISO
    /// dates.
    #[pyo3(signature = (lat, lon, resolution, date_range=None, site=None))]
    fn extract_timeseries(
        &self,
        lat: f64,
        lon: f64,
        resolution: &str,
        date_range: Option<(String, String)>,
        site: Option<String>,
    ) -> PyResult<PyPointSeries> {
        let resolution: Resolution = resolution.parse().map_err(to_py_err)?;
        let date_range = match date_range {
            Some((start, end)) => Some((parse_date(&start)?, parse_date(&end)?)),
            None => None,
        };
        let query = TimeseriesQuery {
            latitude: lat,
            longitude: lon,
            resolution,
            date_range,
            site,
        };
        self.store
            .extract_timeseries(&query)
            .map(PyPointSeries)
            .map_err(to_py_err)
    }

    /// Search for grid cells matching a target value; returns the masked
    /// grid of matching cell values (NaN where the cell is missing or
    /// outside the interval).
    ///
    /// With `year_start`/`year_end` the search runs over the amount-weighted
    /// mean of that period (restricted to `months` when given); without
    /// them it runs over the long-term mean.
    #[pyo3(signature = (tracer, value, offset=0.0, range=2.0, year_start=None, year_end=None, months=None))]
    #[allow(clippy::too_many_arguments)]
    fn search_spatial<'py>(
        &self,
        py: Python<'py>,
        tracer: &str,
        value: f64,
        offset: f64,
        range: f64,
        year_start: Option<i32>,
        year_end: Option<i32>,
        months: Option<Vec<u32>>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let tracer: Tracer = tracer.parse().map_err(to_py_err)?;
        let mode = match (year_start, year_end) {
            (Some(year_start), Some(year_end)) => {
                let months = match months {
                    Some(months) => MonthSet::from_months(&months).map_err(to_py_err)?,
                    None => MonthSet::all(),
                };
                SearchMode::PeriodMean {
                    year_start,
                    year_end,
                    months,
                }
            }
            (None, None) => SearchMode::LongTermMean,
            _ => {
                return Err(PyValueError::new_err(
                    "year_start and year_end must be given together",
                ))
            }
        };
        let query = SpatialQuery {
            tracer,
            value,
            offset,
            range,
            mode,
        };
        let mask = self.store.search_spatial(&query).map_err(to_py_err)?;
        Ok(mask.matched_values().to_pyarray_bound(py))
    }

    /// Latitude coordinates of the grid.
    fn lat<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.store.lat().values().to_pyarray_bound(py)
    }

    /// Longitude coordinates of the grid.
    fn lon<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.store.lon().values().to_pyarray_bound(py)
    }

    fn __repr__(&self) -> String {
        format!(
            "GriddedStore({} months x {} lat x {} lon)",
            self.store.months().len(),
            self.store.lat().len(),
            self.store.lon().len()
        )
    }
}

/// Python wrapper for an extracted point series.
#[pyclass]
#[pyo3(name = "PointSeries")]
pub struct PyPointSeries(pub PointSeries);

#[pymethods]
impl PyPointSeries {
    #[getter]
    fn site(&self) -> Option<String> {
        self.0.site.clone()
    }

    #[getter]
    fn latitude(&self) -> f64 {
        self.0.latitude
    }

    #[getter]
    fn longitude(&self) -> f64 {
        self.0.longitude
    }

    #[getter]
    fn grid_latitude(&self) -> f64 {
        self.0.grid_latitude
    }

    #[getter]
    fn grid_longitude(&self) -> f64 {
        self.0.grid_longitude
    }

    #[getter]
    fn resolution(&self) -> &'static str {
        self.0.resolution.tag()
    }

    /// Time labels, one per step: bare years for annual-family resolutions,
    /// `YYYY-MM` otherwise.
    fn labels(&self) -> Vec<String> {
        self.0.samples.iter().map(|s| s.label.to_string()).collect()
    }

    /// Anchor date (first day of each step's period) as ISO strings.
    fn dates(&self) -> Vec<String> {
        let resolution = self.0.resolution;
        self.0
            .samples
            .iter()
            .map(|s| resolution.anchor_date(s.label).to_string())
            .collect()
    }

    fn d2h<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.0
            .samples
            .iter()
            .map(|s| s.d2h)
            .collect::<Vec<_>>()
            .into_pyarray_bound(py)
    }

    fn d18o<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.0
            .samples
            .iter()
            .map(|s| s.d18o)
            .collect::<Vec<_>>()
            .into_pyarray_bound(py)
    }

    fn dxs<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.0
            .samples
            .iter()
            .map(|s| s.dxs)
            .collect::<Vec<_>>()
            .into_pyarray_bound(py)
    }

    /// Render the series as CSV (comment lines, header, one row per step).
    fn to_csv(&self) -> PyResult<String> {
        export::csv_string(&self.0).map_err(to_py_err)
    }

    /// Download filename for the given inclusive date range.
    fn csv_filename(&self, start: &str, end: &str) -> PyResult<String> {
        Ok(export::csv_filename(
            &self.0,
            parse_date(start)?,
            parse_date(end)?,
        ))
    }

    /// Local meteoric water line fit as `(slope, intercept, r_squared, n)`,
    /// or `None` when the series is too short or degenerate.
    fn lmwl(&self) -> Option<(f64, f64, f64, usize)> {
        mwl::fit(&self.0).map(|line| (line.slope, line.intercept, line.r_squared, line.samples))
    }

    fn __len__(&self) -> usize {
        self.0.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "PointSeries(site={:?}, lat={}, lon={}, resolution={}, steps={})",
            self.0.site_label(),
            self.0.latitude,
            self.0.longitude,
            self.0.resolution,
            self.0.len()
        )
    }
}

/// Register the binding classes on the module.
pub fn register(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyGriddedStore>()?;
    m.add_class::<PyPointSeries>()?;
    Ok(())
}
