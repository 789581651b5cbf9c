//! Temporal-resolution resampling of monthly fields.
//!
//! This module projects the single monthly source field onto the named
//! temporal resolutions served by the calculator:
//!
//! | tag       | reduction                              | label        |
//! |-----------|----------------------------------------|--------------|
//! | `monthly` | identity                               | month        |
//! | `ann`     | mean of Jan–Dec of year Y              | Y            |
//! | `ann_trop`| mean of Jul(Y)–Jun(Y+1)                | Y (Jul year) |
//! | `DJF`     | mean of Dec(Y), Jan(Y+1), Feb(Y+1)     | Y (Dec year) |
//! | `MAM`     | mean of Mar–May(Y)                     | Y            |
//! | `JJA`     | mean of Jun–Aug(Y)                     | Y            |
//! | `SON`     | mean of Sep–Nov(Y)                     | Y            |
//! | `3mrm`    | trailing 3-month mean ending at M      | M            |
//! | `6mrm`    | trailing 6-month mean ending at M      | M            |
//! | `12mrm`   | trailing 12-month mean ending at M     | M            |
//!
//! Every annual-family reduction is a single year-window rule
//! `(first_month, len)`: year Y is emitted iff the whole window lies on the
//! source axis, which drops the trailing partial fiscal year and the trailing
//! partial DJF season automatically. Running means are right-aligned and
//! undefined (NaN) until a full window of history exists. Window means
//! propagate NaN: a missing month makes the period missing, and all-NaN
//! ocean cells stay NaN at every resolution.

use crate::errors::ApicError;
use crate::field::MonthlyField;
use crate::grid::GridAxis;
use crate::timeline::{FloatValue, MonthStamp, TimeLabel};
use chrono::NaiveDate;
use ndarray::{s, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Named temporal resolution of a derived view.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    Monthly,
    /// Calendar-year mean (Jan–Dec).
    Annual,
    /// Jul–Jun fiscal-year mean, labelled by the July year.
    AnnualJulJun,
    /// Dec–Feb mean, labelled by the December year.
    Djf,
    /// Mar–May mean.
    Mam,
    /// Jun–Aug mean.
    Jja,
    /// Sep–Nov mean.
    Son,
    /// Trailing 3-month running mean.
    Running3,
    /// Trailing 6-month running mean.
    Running6,
    /// Trailing 12-month running mean.
    Running12,
}

impl Resolution {
    pub const ALL: [Resolution; 10] = [
        Resolution::Monthly,
        Resolution::Annual,
        Resolution::AnnualJulJun,
        Resolution::Djf,
        Resolution::Mam,
        Resolution::Jja,
        Resolution::Son,
        Resolution::Running3,
        Resolution::Running6,
        Resolution::Running12,
    ];

    /// The selector tag used by the calculator front end.
    pub fn tag(&self) -> &'static str {
        match self {
            Resolution::Monthly => "monthly",
            Resolution::Annual => "ann",
            Resolution::AnnualJulJun => "ann_trop",
            Resolution::Djf => "DJF",
            Resolution::Mam => "MAM",
            Resolution::Jja => "JJA",
            Resolution::Son => "SON",
            Resolution::Running3 => "3mrm",
            Resolution::Running6 => "6mrm",
            Resolution::Running12 => "12mrm",
        }
    }

    /// Whether steps are labelled by year rather than by month.
    pub fn is_annual(&self) -> bool {
        self.year_window().is_some()
    }

    /// `(first_month, window length)` for annual-family reductions.
    fn year_window(&self) -> Option<(u32, usize)> {
        match self {
            Resolution::Annual => Some((1, 12)),
            Resolution::AnnualJulJun => Some((7, 12)),
            Resolution::Djf => Some((12, 3)),
            Resolution::Mam => Some((3, 3)),
            Resolution::Jja => Some((6, 3)),
            Resolution::Son => Some((9, 3)),
            _ => None,
        }
    }

    /// Trailing window length for running-mean reductions.
    fn running_window(&self) -> Option<usize> {
        match self {
            Resolution::Running3 => Some(3),
            Resolution::Running6 => Some(6),
            Resolution::Running12 => Some(12),
            _ => None,
        }
    }

    /// The calendar date a label is anchored to: the first day of the period
    /// the step covers (e.g. 1990 DJF anchors to 1990-12-01). Used for
    /// date-range filtering and CSV output.
    pub fn anchor_date(&self, label: TimeLabel) -> NaiveDate {
        match label {
            TimeLabel::Month(m) => m.first_day(),
            TimeLabel::Year(y) => {
                let first_month = self.year_window().map(|(m, _)| m).unwrap_or(1);
                MonthStamp::new(y, first_month).first_day()
            }
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Resolution {
    type Err = ApicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::ALL
            .iter()
            .copied()
            .find(|r| r.tag() == s)
            .ok_or_else(|| ApicError::UnknownResolution(s.to_string()))
    }
}

/// A monthly field projected onto one temporal resolution.
///
/// Created on demand per query and discarded after use. The identity
/// (monthly) projection aliases the source storage; every reduction owns a
/// freshly computed array.
#[derive(Clone, Debug)]
pub struct ResolutionView {
    resolution: Resolution,
    labels: Vec<TimeLabel>,
    lat: Arc<GridAxis>,
    lon: Arc<GridAxis>,
    values: Arc<Array3<FloatValue>>,
}

impl ResolutionView {
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn labels(&self) -> &[TimeLabel] {
        &self.labels
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

    /// Number of time steps.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn value(&self, time: usize, lat: usize, lon: usize) -> FloatValue {
        self.values[[time, lat, lon]]
    }

    /// Anchor date of the step at `index` (see [`Resolution::anchor_date`]).
    pub fn anchor_date(&self, index: usize) -> NaiveDate {
        self.resolution.anchor_date(self.labels[index])
    }

    /// Whether another view has the same resolution and time labelling.
    pub fn labels_match(&self, other: &ResolutionView) -> bool {
        self.resolution == other.resolution && self.labels == other.labels
    }
}

/// Project a monthly field onto the requested resolution.
pub fn project(field: &MonthlyField, resolution: Resolution) -> ResolutionView {
    if let Some((first_month, len)) = resolution.year_window() {
        return project_year_window(field, resolution, first_month, len);
    }
    if let Some(window) = resolution.running_window() {
        return project_running_mean(field, resolution, window);
    }
    // Identity: share storage, relabel by month
    ResolutionView {
        resolution,
        labels: field.axis().iter().map(TimeLabel::Month).collect(),
        lat: Arc::clone(field.lat()),
        lon: Arc::clone(field.lon()),
        values: field.values_shared(),
    }
}

fn project_year_window(
    field: &MonthlyField,
    resolution: Resolution,
    first_month: u32,
    len: usize,
) -> ResolutionView {
    let axis = field.axis();

    // A year is emitted iff its whole window lies on the axis; this drops
    // the trailing partial fiscal year / DJF season.
    let mut labels = Vec::new();
    let mut starts = Vec::new();
    for year in axis.first().year..=axis.last().year {
        if let Some(start) = axis.index_of(MonthStamp::new(year, first_month)) {
            if start + len <= axis.len() {
                labels.push(TimeLabel::Year(year));
                starts.push(start);
            }
        }
    }

    let (nlat, nlon) = (field.lat().len(), field.lon().len());
    let mut out = Array3::zeros((labels.len(), nlat, nlon));
    for (step, &start) in starts.iter().enumerate() {
        let window = field.values().slice(s![start..start + len, .., ..]);
        let mean = window.sum_axis(Axis(0)) / len as FloatValue;
        out.slice_mut(s![step, .., ..]).assign(&mean);
    }

    ResolutionView {
        resolution,
        labels,
        lat: Arc::clone(field.lat()),
        lon: Arc::clone(field.lon()),
        values: Arc::new(out),
    }
}

fn project_running_mean(field: &MonthlyField, resolution: Resolution, window: usize) -> ResolutionView {
    let axis = field.axis();
    let (nlat, nlon) = (field.lat().len(), field.lon().len());

    // Undefined (NaN, never zero) until a full window of history exists
    let mut out = Array3::from_elem((axis.len(), nlat, nlon), FloatValue::NAN);
    for end in (window - 1)..axis.len() {
        let trailing = field.values().slice(s![end + 1 - window..end + 1, .., ..]);
        let mean = trailing.sum_axis(Axis(0)) / window as FloatValue;
        out.slice_mut(s![end, .., ..]).assign(&mean);
    }

    ResolutionView {
        resolution,
        labels: axis.iter().map(TimeLabel::Month).collect(),
        lat: Arc::clone(field.lat()),
        lon: Arc::clone(field.lon()),
        values: Arc::new(out),
    }
}
