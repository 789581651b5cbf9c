//! The engine's boundary with the presentation layer.
//!
//! Two request/response entry points compose the components: timeseries
//! extraction (store → resolution views → point extraction) and spatial
//! search (store → amount-weighted aggregation → range match). Both are
//! pure functions of the query and the immutable store; each request's
//! derived values are owned by that request alone.

use crate::aggregate::{self, MonthSet};
use crate::errors::ApicResult;
use crate::extract::{self, PointSeries};
use crate::resample::{project, Resolution};
use crate::search::{match_range, MatchBounds, MatchMask};
use crate::store::{GriddedStore, Tracer};
use crate::timeline::FloatValue;
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameters of a timeseries extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeseriesQuery {
    pub latitude: FloatValue,
    pub longitude: FloatValue,
    pub resolution: Resolution,
    /// Optional inclusive date bound applied to each step's anchor date.
    #[serde(default)]
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    /// Optional site label carried through to the exported series.
    #[serde(default)]
    pub site: Option<String>,
}

/// Which field the spatial search runs against.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SearchMode {
    /// Amount-weighted mean over the whole data period.
    LongTermMean,
    /// Amount-weighted mean over a chosen year range and month subset.
    PeriodMean {
        year_start: i32,
        year_end: i32,
        months: MonthSet,
    },
}

/// Parameters of a spatial search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialQuery {
    pub tracer: Tracer,
    /// Measured sample value (‰ VSMOW).
    pub value: FloatValue,
    /// Expected offset between the sample and precipitation; subtracted from
    /// `value` before matching.
    pub offset: FloatValue,
    /// Half-width of the accepted interval (± ‰).
    pub range: FloatValue,
    pub mode: SearchMode,
}

impl GriddedStore {
    /// Extract the isotope series at a coordinate and temporal resolution.
    pub fn extract_timeseries(&self, query: &TimeseriesQuery) -> ApicResult<PointSeries> {
        debug!(
            "timeseries query: ({}, {}) at {}",
            query.latitude, query.longitude, query.resolution
        );
        let d2h = project(self.tracer(Tracer::D2H), query.resolution);
        let d18o = project(self.tracer(Tracer::D18O), query.resolution);
        let dxs = project(self.tracer(Tracer::Dxs), query.resolution);
        extract::extract(
            &d2h,
            &d18o,
            &dxs,
            query.latitude,
            query.longitude,
            query.site.as_deref(),
            query.date_range,
        )
    }

    /// Find the grid cells whose amount-weighted mean value falls within the
    /// query's source-water-equivalent interval.
    pub fn search_spatial(&self, query: &SpatialQuery) -> ApicResult<MatchMask> {
        let isotope = self.tracer(query.tracer);
        let field = match &query.mode {
            SearchMode::LongTermMean => {
                debug!("spatial search: {} against the long-term mean", query.tracer);
                aggregate::long_term_mean(isotope, self.precipitation())?
            }
            SearchMode::PeriodMean {
                year_start,
                year_end,
                months,
            } => {
                debug!(
                    "spatial search: {} over {}..={}, {} month(s)",
                    query.tracer,
                    year_start,
                    year_end,
                    months.len()
                );
                aggregate::weighted_mean(
                    isotope,
                    self.precipitation(),
                    *year_start,
                    *year_end,
                    *months,
                )?
            }
        };
        let bounds = MatchBounds::new(query.value, query.offset, query.range);
        Ok(match_range(
            &field,
            Arc::clone(self.lat()),
            Arc::clone(self.lon()),
            bounds,
        ))
    }
}
