//! Nearest-neighbour point extraction from resolution views.
//!
//! Selects a single grid cell's time series from the three isotope views and
//! returns it as an ordered, labelled series with provenance. Selection
//! snaps latitude and longitude independently to the closest grid
//! coordinate; a coordinate whose nearest cell holds no data in any isotope
//! system (open ocean, outside the data mask) is rejected with
//! [`ApicError::OutOfGrid`] rather than yielding a series of NaNs.

use crate::errors::{ApicError, ApicResult};
use crate::resample::{Resolution, ResolutionView};
use crate::timeline::{FloatValue, TimeLabel};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One time step of an extracted series.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointSample {
    pub label: TimeLabel,
    pub d2h: FloatValue,
    pub d18o: FloatValue,
    pub dxs: FloatValue,
}

/// An extracted single-cell time series with provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointSeries {
    /// User-supplied site label, normalized (whitespace replaced by `_`);
    /// `None` when no label was given.
    pub site: Option<String>,
    /// Requested coordinates.
    pub latitude: FloatValue,
    pub longitude: FloatValue,
    /// Centre of the grid cell the request snapped to.
    pub grid_latitude: FloatValue,
    pub grid_longitude: FloatValue,
    pub resolution: Resolution,
    pub samples: Vec<PointSample>,
}

impl PointSeries {
    /// Display label for the site (`site` when none was supplied).
    pub fn site_label(&self) -> &str {
        self.site.as_deref().unwrap_or("site")
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Normalize a user-supplied site name: trim, collapse whitespace to `_`.
fn normalize_site(site: Option<&str>) -> Option<String> {
    let site = site?.trim();
    if site.is_empty() {
        return None;
    }
    Some(site.split_whitespace().collect::<Vec<_>>().join("_"))
}

/// Extract the cell nearest to (`latitude`, `longitude`) from the three
/// isotope views, optionally restricted to an inclusive date range.
///
/// The three views must come from the same store and resolution (their time
/// labelling must agree). Extraction is a pure read: identical inputs yield
/// identical series.
pub fn extract(
    d2h: &ResolutionView,
    d18o: &ResolutionView,
    dxs: &ResolutionView,
    latitude: FloatValue,
    longitude: FloatValue,
    site: Option<&str>,
    date_range: Option<(NaiveDate, NaiveDate)>,
) -> ApicResult<PointSeries> {
    if !d2h.labels_match(d18o) || !d2h.labels_match(dxs) {
        return Err(ApicError::AxisMismatch(
            "isotope views disagree on time labelling".to_string(),
        ));
    }
    if let Some((start, end)) = date_range {
        if end < start {
            return Err(ApicError::InvalidPeriod(format!(
                "date range end {} precedes start {}",
                end, start
            )));
        }
    }

    let lat_index = d2h.lat().nearest(latitude);
    let lon_index = d2h.lon().nearest(longitude);

    // Outside the data mask: nothing valid in any isotope system at this cell
    let all_missing = (0..d2h.len()).all(|t| {
        d2h.value(t, lat_index, lon_index).is_nan()
            && d18o.value(t, lat_index, lon_index).is_nan()
            && dxs.value(t, lat_index, lon_index).is_nan()
    });
    if all_missing {
        return Err(ApicError::OutOfGrid {
            lat: latitude,
            lon: longitude,
        });
    }

    let resolution = d2h.resolution();
    let samples = d2h
        .labels()
        .iter()
        .enumerate()
        .filter(|(index, _)| match date_range {
            Some((start, end)) => {
                let anchor = d2h.anchor_date(*index);
                start <= anchor && anchor <= end
            }
            None => true,
        })
        .map(|(index, &label)| PointSample {
            label,
            d2h: d2h.value(index, lat_index, lon_index),
            d18o: d18o.value(index, lat_index, lon_index),
            dxs: dxs.value(index, lat_index, lon_index),
        })
        .collect();

    Ok(PointSeries {
        site: normalize_site(site),
        latitude,
        longitude,
        grid_latitude: d2h.lat().coord(lat_index),
        grid_longitude: d2h.lon().coord(lon_index),
        resolution,
        samples,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::MonthlyField;
    use crate::grid::GridAxis;
    use crate::resample::project;
    use crate::timeline::{MonthAxis, MonthStamp};
    use ndarray::Array3;
    use std::sync::Arc;

    /// 2×2 grid over two years; cell (0, 0) is ocean (all NaN), the others
    /// hold distinct constants per tracer.
    fn views(resolution: Resolution) -> (ResolutionView, ResolutionView, ResolutionView) {
        let axis = MonthAxis::new(MonthStamp::new(1990, 1), 24).unwrap();
        let lat = Arc::new(GridAxis::regular(-28.0, 0.25, 2).unwrap());
        let lon = Arc::new(GridAxis::regular(134.0, 0.25, 2).unwrap());

        let tracer_field = |base: FloatValue| {
            let mut values = Array3::from_elem((24, 2, 2), base);
            for t in 0..24 {
                values[[t, 0, 0]] = FloatValue::NAN;
                values[[t, 1, 1]] = base + 1.0;
            }
            MonthlyField::new(axis.clone(), lat.clone(), lon.clone(), values).unwrap()
        };

        (
            project(&tracer_field(-40.0), resolution),
            project(&tracer_field(-6.0), resolution),
            project(&tracer_field(8.0), resolution),
        )
    }

    #[test]
    fn extracts_nearest_cell() {
        let (d2h, d18o, dxs) = views(Resolution::Monthly);
        // (-27.8, 134.3) snaps to the (-27.75, 134.25) cell, index (1, 1)
        let series = extract(&d2h, &d18o, &dxs, -27.8, 134.3, Some("Alice Springs"), None).unwrap();
        assert_eq!(series.len(), 24);
        assert_eq!(series.grid_latitude, -27.75);
        assert_eq!(series.grid_longitude, 134.25);
        assert_eq!(series.site.as_deref(), Some("Alice_Springs"));
        assert_eq!(series.samples[0].d2h, -39.0);
        assert_eq!(series.samples[0].d18o, -5.0);
        assert_eq!(series.samples[0].dxs, 9.0);
    }

    #[test]
    fn extraction_is_idempotent() {
        let (d2h, d18o, dxs) = views(Resolution::Annual);
        let a = extract(&d2h, &d18o, &dxs, -28.0, 134.0, None, None).unwrap();
        let b = extract(&d2h, &d18o, &dxs, -28.0, 134.0, None, None).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_coordinate_outside_data_mask() {
        let (d2h, d18o, dxs) = views(Resolution::Monthly);
        // Snaps to the all-NaN (0, 0) cell
        let result = extract(&d2h, &d18o, &dxs, -28.1, 133.9, None, None);
        match result {
            Err(ApicError::OutOfGrid { lat, lon }) => {
                assert_eq!(lat, -28.1);
                assert_eq!(lon, 133.9);
            }
            other => panic!("expected OutOfGrid, got {:?}", other),
        }
    }

    #[test]
    fn date_range_filters_annual_labels_inclusively() {
        let (d2h, d18o, dxs) = views(Resolution::Annual);
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let series = extract(
            &d2h,
            &d18o,
            &dxs,
            -27.75,
            134.25,
            None,
            Some((date(1991, 1, 1), date(1991, 12, 31))),
        )
        .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series.samples[0].label, TimeLabel::Year(1991));
    }

    #[test]
    fn rejects_inverted_date_range() {
        let (d2h, d18o, dxs) = views(Resolution::Monthly);
        let date = |y: i32, m: u32, d: u32| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let result = extract(
            &d2h,
            &d18o,
            &dxs,
            -28.0,
            134.0,
            None,
            Some((date(1992, 1, 1), date(1990, 1, 1))),
        );
        assert!(matches!(result, Err(ApicError::InvalidPeriod(_))));
    }

    #[test]
    fn empty_site_is_normalized_away() {
        let (d2h, d18o, dxs) = views(Resolution::Monthly);
        let series = extract(&d2h, &d18o, &dxs, -28.0, 134.0, Some("   "), None).unwrap();
        assert_eq!(series.site, None);
        assert_eq!(series.site_label(), "site");
    }
}
