//! CSV export of extracted point series.
//!
//! Layout: two leading comment lines (generation date, citation), a header
//! row, then one row per time step. Annual-family series write a bare year
//! in the time column; monthly and running-mean series write the step's
//! anchor date. Missing values become empty cells.

use crate::errors::ApicResult;
use crate::extract::PointSeries;
use crate::timeline::{FloatValue, TimeLabel};
use chrono::{NaiveDate, Utc};
use std::io::Write;

const CITATION: &str = "# Please see Falster et al 2025 (HESS) for reference and data details";

/// Site name written when the user supplied none.
const UNNAMED_SITE: &str = "no_sitename_specified";

fn format_value(value: FloatValue) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

/// Write `series` as CSV, stamped with `generated` in the first comment line.
pub fn write_csv<W: Write>(
    series: &PointSeries,
    generated: NaiveDate,
    mut writer: W,
) -> ApicResult<()> {
    writeln!(writer, "# Data downloaded {}", generated.format("%Y-%m-%d"))?;
    writeln!(writer, "{}", CITATION)?;

    let mut rows = csv::Writer::from_writer(writer);
    let time_column = if series.resolution.is_annual() {
        "year"
    } else {
        "date"
    };
    rows.write_record(["site_name", time_column, "lat", "lon", "d2H", "d18O", "dxs"])?;

    let site = series.site.as_deref().unwrap_or(UNNAMED_SITE);
    let lat = series.latitude.to_string();
    let lon = series.longitude.to_string();
    for sample in &series.samples {
        let time = match sample.label {
            TimeLabel::Year(year) => year.to_string(),
            TimeLabel::Month(month) => month.first_day().to_string(),
        };
        rows.write_record([
            site,
            &time,
            &lat,
            &lon,
            &format_value(sample.d2h),
            &format_value(sample.d18o),
            &format_value(sample.dxs),
        ])?;
    }
    rows.flush()?;
    Ok(())
}

/// Render `series` to a CSV string stamped with today's date.
pub fn csv_string(series: &PointSeries) -> ApicResult<String> {
    let mut buffer = Vec::new();
    write_csv(series, Utc::now().date_naive(), &mut buffer)?;
    Ok(String::from_utf8(buffer).expect("CSV output is UTF-8"))
}

/// Download filename for an exported series:
/// `{site_}lat{lat}_lon{lon}_{tag}_{YYYYMMDD}-{YYYYMMDD}.csv`, made
/// path-safe.
pub fn csv_filename(series: &PointSeries, start: NaiveDate, end: NaiveDate) -> String {
    let site = series
        .site
        .as_deref()
        .map(|s| format!("{}_", s))
        .unwrap_or_default();
    let name = format!(
        "{}lat{}_lon{}_{}_{}-{}.csv",
        site,
        series.latitude,
        series.longitude,
        series.resolution.tag(),
        start.format("%Y%m%d"),
        end.format("%Y%m%d"),
    );
    name.replace(['/', '\\'], "_").replace(' ', "")
}
