//! Spatial coordinate axes for the regular latitude/longitude grid.
//!
//! Both axes of the 0.25° continental grid are represented by [`GridAxis`]:
//! an ordered list of cell-centre coordinates. Nearest-neighbour selection
//! snaps each axis independently (the original selection semantics), so a
//! query point is matched per-axis rather than by 2-D Euclidean distance.
//! Snapping is unclamped; whether the selected cell holds data is decided by
//! the data mask, not by the axis.

use crate::errors::{ApicError, ApicResult};
use crate::timeline::FloatValue;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// An ordered 1-D coordinate axis of grid-cell centres.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridAxis {
    values: Array1<FloatValue>,
}

impl GridAxis {
    /// Create an axis from explicit coordinates.
    ///
    /// Coordinates must be finite and strictly ascending.
    pub fn new(values: Array1<FloatValue>) -> ApicResult<Self> {
        if values.is_empty() {
            return Err(ApicError::AxisMismatch("grid axis is empty".to_string()));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ApicError::AxisMismatch(
                "grid axis contains non-finite coordinates".to_string(),
            ));
        }
        if values.iter().zip(values.iter().skip(1)).any(|(a, b)| a >= b) {
            return Err(ApicError::AxisMismatch(
                "grid axis coordinates must be strictly ascending".to_string(),
            ));
        }
        Ok(Self { values })
    }

    /// Create a regular axis of `len` coordinates starting at `start` with
    /// spacing `step` (e.g. a 0.25° axis).
    pub fn regular(start: FloatValue, step: FloatValue, len: usize) -> ApicResult<Self> {
        if step <= 0.0 {
            return Err(ApicError::AxisMismatch(format!(
                "grid axis step must be positive, got {}",
                step
            )));
        }
        let values = Array1::from_iter((0..len).map(|i| start + step * i as FloatValue));
        Self::new(values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &Array1<FloatValue> {
        &self.values
    }

    /// Coordinate at index `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn coord(&self, index: usize) -> FloatValue {
        self.values[index]
    }

    /// Index of the coordinate nearest to `target`.
    ///
    /// Ties between two equidistant neighbours resolve to the lower index.
    /// Targets beyond either end of the axis snap to the end cell.
    pub fn nearest(&self, target: FloatValue) -> usize {
        let n = self.values.len();
        // First index whose coordinate is >= target
        let upper = self.values.iter().position(|&v| v >= target).unwrap_or(n);
        if upper == 0 {
            return 0;
        }
        if upper == n {
            return n - 1;
        }
        let below = upper - 1;
        if (target - self.values[below]) <= (self.values[upper] - target) {
            below
        } else {
            upper
        }
    }
}
