//! Gridded monthly fields.
//!
//! A [`MonthlyField`] is the immutable (time, lat, lon) array a store owns
//! for each isotope system and for the precipitation amount. Values live in
//! an `Arc` so derived views can alias the storage without copying; the
//! latitude/longitude axes are `Arc`-shared across every field of a store.

use crate::errors::{ApicError, ApicResult};
use crate::grid::GridAxis;
use crate::timeline::{FloatValue, MonthAxis};
use ndarray::{Array3, ArrayView2};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonthlyField {
    axis: MonthAxis,
    lat: Arc<GridAxis>,
    lon: Arc<GridAxis>,
    values: Arc<Array3<FloatValue>>,
}

impl MonthlyField {
    /// Create a field, checking that the array shape matches the axes.
    pub fn new(
        axis: MonthAxis,
        lat: Arc<GridAxis>,
        lon: Arc<GridAxis>,
        values: Array3<FloatValue>,
    ) -> ApicResult<Self> {
        let shape = values.shape();
        if shape != [axis.len(), lat.len(), lon.len()] {
            return Err(ApicError::AxisMismatch(format!(
                "field shape {:?} does not match axes (time {}, lat {}, lon {})",
                shape,
                axis.len(),
                lat.len(),
                lon.len()
            )));
        }
        Ok(Self {
            axis,
            lat,
            lon,
            values: Arc::new(values),
        })
    }

    pub fn axis(&self) -> &MonthAxis {
        &self.axis
    }

    pub fn lat(&self) -> &Arc<GridAxis> {
        &self.lat
    }

    pub fn lon(&self) -> &Arc<GridAxis> {
        &self.lon
    }

    pub fn values(&self) -> &Array3<FloatValue> {
        &self.values
    }

    /// Share the underlying storage (used by the identity resolution view).
    pub fn values_shared(&self) -> Arc<Array3<FloatValue>> {
        Arc::clone(&self.values)
    }

    /// Value at (time, lat, lon) index.
    pub fn value(&self, time: usize, lat: usize, lon: usize) -> FloatValue {
        self.values[[time, lat, lon]]
    }

    /// The lat × lon slab at one time index.
    pub fn slab(&self, time: usize) -> ArrayView2<'_, FloatValue> {
        self.values.index_axis(ndarray::Axis(0), time)
    }

    /// Whether two fields share identical time and spatial axes.
    pub fn axes_match(&self, other: &MonthlyField) -> bool {
        self.axis == other.axis && self.lat == other.lat && self.lon == other.lon
    }
}
