//! Spatial value search over an aggregated field.
//!
//! Given a target isotope value, an optional constant offset and a ± range,
//! the matcher filters a (lat, lon) field to the cells whose value lies in
//! the source-water-equivalent interval. Missing source cells stay missing
//! in the output, never coerced into "match" or "no match".

use crate::grid::GridAxis;
use crate::timeline::FloatValue;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Inclusive value interval a cell must fall in to match.
///
/// The offset is subtracted from the target before the range is applied:
/// the search compares the sample's source-water-equivalent value against
/// the modelled precipitation field.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchBounds {
    pub lower: FloatValue,
    pub upper: FloatValue,
}

impl MatchBounds {
    /// `[target − offset − range, target − offset + range]`.
    ///
    /// A negative `range` produces an empty interval that matches nothing.
    pub fn new(target: FloatValue, offset: FloatValue, range: FloatValue) -> Self {
        let adjusted = target - offset;
        Self {
            lower: adjusted - range,
            upper: adjusted + range,
        }
    }

    pub fn contains(&self, value: FloatValue) -> bool {
        self.lower <= value && value <= self.upper
    }
}

/// Per-cell outcome of a spatial search.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellMatch {
    /// No source data at this cell (outside the data mask, or the
    /// aggregation left the cell undefined).
    Missing,
    /// Valid data, outside the search interval.
    Outside,
    /// Valid data inside the interval; carries the cell's field value.
    Matched(FloatValue),
}

/// Grid of per-cell match outcomes, recomputed per search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchMask {
    lat: Arc<GridAxis>,
    lon: Arc<GridAxis>,
    bounds: MatchBounds,
    cells: Array2<CellMatch>,
}

impl MatchMask {
    pub fn lat(&self) -> &Arc<GridAxis> {
        &self.lat
    }

    pub fn lon(&self) -> &Arc<GridAxis> {
        &self.lon
    }

    pub fn bounds(&self) -> MatchBounds {
        self.bounds
    }

    pub fn cells(&self) -> &Array2<CellMatch> {
        &self.cells
    }

    pub fn cell(&self, lat: usize, lon: usize) -> CellMatch {
        self.cells[[lat, lon]]
    }

    pub fn matched_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, CellMatch::Matched(_)))
            .count()
    }

    /// The field values of matching cells, NaN elsewhere: the masked grid
    /// consumed by map rendering.
    pub fn matched_values(&self) -> Array2<FloatValue> {
        self.cells.mapv(|cell| match cell {
            CellMatch::Matched(value) => value,
            _ => FloatValue::NAN,
        })
    }
}

/// Filter `field` to the cells whose value lies within `bounds`.
pub fn match_range(
    field: &Array2<FloatValue>,
    lat: Arc<GridAxis>,
    lon: Arc<GridAxis>,
    bounds: MatchBounds,
) -> MatchMask {
    let cells = field.mapv(|value| {
        if value.is_nan() {
            CellMatch::Missing
        } else if bounds.contains(value) {
            CellMatch::Matched(value)
        } else {
            CellMatch::Outside
        }
    });
    MatchMask {
        lat,
        lon,
        bounds,
        cells,
    }
}
