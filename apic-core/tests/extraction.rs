//! End-to-end scenarios over a synthetic store.
//!
//! Exercises both full query paths (store to resolution view to point series
//! to CSV, and store to amount-weighted mean to match mask) against
//! hand-computed expectations.

use apic_core::errors::ApicError;
use apic_core::export;
use apic_core::extract::PointSeries;
use apic_core::field::MonthlyField;
use apic_core::grid::GridAxis;
use apic_core::queries::{SearchMode, SpatialQuery, TimeseriesQuery};
use apic_core::resample::Resolution;
use apic_core::search::CellMatch;
use apic_core::store::{GriddedStore, Tracer};
use apic_core::timeline::{MonthAxis, MonthStamp, TimeLabel};
use chrono::NaiveDate;
use is_close::is_close;
use ndarray::Array3;
use std::sync::Arc;

/// δ²H at (t, i, j): varies with time and cell so extraction errors show up.
fn d2h_value(t: usize, i: usize, j: usize) -> f64 {
    -(t as f64) - 10.0 * i as f64 - 0.1 * j as f64
}

/// δ¹⁸O at (i, j): constant in time, so every amount-weighted mean equals
/// the cell value and spatial-search expectations stay hand-computable.
fn d18o_value(i: usize, j: usize) -> f64 {
    -9.0 + 0.5 * (i + j) as f64
}

/// 5×5 grid (0.25°, centred near −28/134) over 1989-01..=1991-12.
/// Cell (0, 0) is open ocean: NaN in every isotope system.
fn synthetic_store() -> GriddedStore {
    let axis = MonthAxis::new(MonthStamp::new(1989, 1), 36).unwrap();
    let lat = Arc::new(GridAxis::regular(-28.5, 0.25, 5).unwrap());
    let lon = Arc::new(GridAxis::regular(133.5, 0.25, 5).unwrap());

    let build = |f: &dyn Fn(usize, usize, usize) -> f64, mask_ocean: bool| {
        let mut values = Array3::zeros((36, 5, 5));
        for t in 0..36 {
            for i in 0..5 {
                for j in 0..5 {
                    values[[t, i, j]] = if mask_ocean && i == 0 && j == 0 {
                        f64::NAN
                    } else {
                        f(t, i, j)
                    };
                }
            }
        }
        MonthlyField::new(axis.clone(), lat.clone(), lon.clone(), values).unwrap()
    };

    GriddedStore::new(
        build(&|t, i, j| d2h_value(t, i, j), true),
        build(&|_, i, j| d18o_value(i, j), true),
        build(&|t, i, j| d2h_value(t, i, j) - 8.0 * d18o_value(i, j), true),
        build(&|t, _, _| 1.0 + (t % 12) as f64, false),
    )
    .unwrap()
}

fn extract_1990_monthly(store: &GriddedStore) -> PointSeries {
    let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
    store
        .extract_timeseries(&TimeseriesQuery {
            latitude: -28.0,
            longitude: 134.0,
            resolution: Resolution::Monthly,
            date_range: Some((date(1990, 1, 1), date(1990, 12, 31))),
            site: Some("Test site".to_string()),
        })
        .unwrap()
}

#[test]
fn monthly_extraction_returns_one_row_per_month_of_1990() {
    let store = synthetic_store();
    let series = extract_1990_monthly(&store);

    assert_eq!(series.len(), 12);
    assert_eq!(series.grid_latitude, -28.0);
    assert_eq!(series.grid_longitude, 134.0);
    assert_eq!(series.site.as_deref(), Some("Test_site"));

    // (-28.0, 134.0) is cell (2, 2); 1990 starts at time index 12
    for (row, sample) in series.samples.iter().enumerate() {
        let t = 12 + row;
        assert_eq!(
            sample.label,
            TimeLabel::Month(MonthStamp::new(1990, row as u32 + 1))
        );
        assert!(is_close!(sample.d2h, d2h_value(t, 2, 2)));
        assert!(is_close!(sample.d18o, d18o_value(2, 2)));
        assert!(is_close!(sample.dxs, d2h_value(t, 2, 2) - 8.0 * d18o_value(2, 2)));
    }
}

#[test]
fn fiscal_year_view_averages_jul_through_jun() {
    let store = synthetic_store();
    let series = store
        .extract_timeseries(&TimeseriesQuery {
            latitude: -28.0,
            longitude: 134.0,
            resolution: Resolution::AnnualJulJun,
            date_range: None,
            site: None,
        })
        .unwrap();

    // Jul 1991–Jun 1992 is incomplete and must be dropped
    assert_eq!(
        series.samples.iter().map(|s| s.label).collect::<Vec<_>>(),
        vec![TimeLabel::Year(1989), TimeLabel::Year(1990)]
    );

    // 1989 fiscal year covers time indices 6..=17
    let expected: f64 = (6..=17).map(|t| d2h_value(t, 2, 2)).sum::<f64>() / 12.0;
    assert!(is_close!(series.samples[0].d2h, expected));
}

#[test]
fn ocean_coordinate_is_rejected_not_returned_as_nans() {
    let store = synthetic_store();
    let result = store.extract_timeseries(&TimeseriesQuery {
        latitude: -28.6,
        longitude: 133.4,
        resolution: Resolution::Monthly,
        date_range: None,
        site: None,
    });
    assert!(matches!(result, Err(ApicError::OutOfGrid { .. })));
}

#[test]
fn csv_export_has_comments_header_and_twelve_rows() {
    let store = synthetic_store();
    let series = extract_1990_monthly(&store);

    let mut buffer = Vec::new();
    let generated = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
    export::write_csv(&series, generated, &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    let lines: Vec<&str> = text.lines().collect();

    assert_eq!(lines.len(), 2 + 1 + 12);
    assert!(lines[0].starts_with("# Data downloaded "));
    assert!(lines[1].starts_with("# "));
    assert_eq!(lines[2], "site_name,date,lat,lon,d2H,d18O,dxs");
    assert!(lines[3].starts_with("Test_site,1990-01-01,-28,134,"));
    assert!(lines[14].starts_with("Test_site,1990-12-01,"));
}

#[test]
fn spatial_search_masks_the_expected_cells() {
    let store = synthetic_store();
    // target −5, offset 2, range 1 ⇒ accepts δ¹⁸O in [−8, −6]:
    // cells with 2 <= i + j <= 6, i.e. 19 of the 25 cells
    let mask = store
        .search_spatial(&SpatialQuery {
            tracer: Tracer::D18O,
            value: -5.0,
            offset: 2.0,
            range: 1.0,
            mode: SearchMode::PeriodMean {
                year_start: 1990,
                year_end: 1990,
                months: apic_core::aggregate::MonthSet::all(),
            },
        })
        .unwrap();

    assert_eq!(mask.matched_count(), 19);
    assert_eq!(mask.cell(0, 0), CellMatch::Missing, "ocean stays missing");
    assert_eq!(mask.cell(0, 1), CellMatch::Outside); // δ¹⁸O = −8.5
    assert_eq!(mask.cell(1, 1), CellMatch::Matched(-8.0)); // inclusive lower bound
    assert_eq!(mask.cell(4, 4), CellMatch::Outside); // δ¹⁸O = −5.0
}

#[test]
fn long_term_and_period_search_agree_on_time_constant_fields() {
    let store = synthetic_store();
    let base = SpatialQuery {
        tracer: Tracer::D18O,
        value: -7.0,
        offset: 0.0,
        range: 0.5,
        mode: SearchMode::LongTermMean,
    };
    let period = SpatialQuery {
        mode: SearchMode::PeriodMean {
            year_start: 1989,
            year_end: 1991,
            months: apic_core::aggregate::MonthSet::all(),
        },
        ..base.clone()
    };
    let a = store.search_spatial(&base).unwrap();
    let b = store.search_spatial(&period).unwrap();
    assert_eq!(a.cells(), b.cells());
}
