//! Precipitation-amount-weighted temporal means.
//!
//! Isotope ratios in precipitation must be averaged proportionally to the
//! mass of water contributing each month, not as a flat arithmetic mean.
//! For the spatial search this module reduces the monthly isotope field over
//! an arbitrary year range and month subset: within each included year every
//! month is weighted by its share of that year's precipitation total (over
//! the included months only), and the per-year weighted values are then
//! averaged across years per cell.
//!
//! A year whose precipitation total is zero or missing for a cell has no
//! defined weighting there; that year is excluded from the cell's cross-year
//! average rather than treated as zero. A cell with no valid year at all is
//! NaN in the result: a soft per-cell outcome, never an error.

use crate::errors::{ApicError, ApicResult};
use crate::field::MonthlyField;
use crate::timeline::{FloatValue, MonthStamp};
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

/// A non-empty subset of the calendar months 1..=12.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<u32>", try_from = "Vec<u32>")]
pub struct MonthSet(u16);

impl MonthSet {
    const ALL_BITS: u16 = 0x0fff;

    /// All twelve months.
    pub fn all() -> Self {
        Self(Self::ALL_BITS)
    }

    /// Build a set from calendar month numbers.
    ///
    /// Rejects months outside 1..=12 and the empty set (an empty
    /// included-months selection is an invalid search period).
    pub fn from_months(months: &[u32]) -> ApicResult<Self> {
        let mut bits = 0u16;
        for &month in months {
            if !(1..=12).contains(&month) {
                return Err(ApicError::InvalidPeriod(format!(
                    "month {} is not in 1..=12",
                    month
                )));
            }
            bits |= 1 << (month - 1);
        }
        if bits == 0 {
            return Err(ApicError::InvalidPeriod(
                "included-months set is empty".to_string(),
            ));
        }
        Ok(Self(bits))
    }

    pub fn contains(&self, month: u32) -> bool {
        (1..=12).contains(&month) && self.0 & (1 << (month - 1)) != 0
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        (1..=12).filter(|&m| self.contains(m))
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_all(&self) -> bool {
        self.0 == Self::ALL_BITS
    }
}

impl From<MonthSet> for Vec<u32> {
    fn from(set: MonthSet) -> Self {
        set.iter().collect()
    }
}

impl TryFrom<Vec<u32>> for MonthSet {
    type Error = ApicError;

    fn try_from(months: Vec<u32>) -> Result<Self, Self::Error> {
        Self::from_months(&months)
    }
}

/// Amount-weighted mean of `isotope` over `[year_start, year_end]` and the
/// included `months`, one value per grid cell.
///
/// For each included year `Y` and cell, the month weights are
/// `precipitation(Y, m) / Σ precipitation(Y, m')` summed over the included
/// months present on the axis; the weights therefore sum to 1 whenever every
/// included month has nonzero, non-missing precipitation. The per-year
/// weighted values are then averaged over the years that have a defined
/// weighting for the cell.
///
/// The year range is clipped to the data period; a range that does not
/// intersect it at all is rejected with [`ApicError::InvalidPeriod`].
pub fn weighted_mean(
    isotope: &MonthlyField,
    precipitation: &MonthlyField,
    year_start: i32,
    year_end: i32,
    months: MonthSet,
) -> ApicResult<Array2<FloatValue>> {
    if !isotope.axes_match(precipitation) {
        return Err(ApicError::AxisMismatch(
            "isotope and precipitation fields carry different axes".to_string(),
        ));
    }
    if year_end < year_start {
        return Err(ApicError::InvalidPeriod(format!(
            "year range end {} precedes start {}",
            year_end, year_start
        )));
    }

    let axis = isotope.axis();
    let first_year = year_start.max(axis.first().year);
    let last_year = year_end.min(axis.last().year);
    if last_year < first_year {
        return Err(ApicError::InvalidPeriod(format!(
            "year range {}..={} does not intersect the data period {}..={}",
            year_start,
            year_end,
            axis.first().year,
            axis.last().year
        )));
    }

    let (nlat, nlon) = (isotope.lat().len(), isotope.lon().len());
    let mut year_value_sum = Array2::<FloatValue>::zeros((nlat, nlon));
    let mut valid_years = Array2::<FloatValue>::zeros((nlat, nlon));

    for year in first_year..=last_year {
        let indices: Vec<usize> = months
            .iter()
            .filter_map(|month| axis.index_of(MonthStamp::new(year, month)))
            .collect();
        if indices.is_empty() {
            continue;
        }

        let mut total = Array2::<FloatValue>::zeros((nlat, nlon));
        let mut weighted = Array2::<FloatValue>::zeros((nlat, nlon));
        for &t in &indices {
            let amount = precipitation.slab(t);
            let value = isotope.slab(t);
            total += &amount;
            weighted += &(&value * &amount);
        }

        Zip::from(&mut year_value_sum)
            .and(&mut valid_years)
            .and(&total)
            .and(&weighted)
            .for_each(|sum, count, &total, &weighted| {
                // Zero or missing total: the weighting is undefined, so the
                // year is excluded for this cell rather than counted as zero
                if total.is_finite() && total > 0.0 && weighted.is_finite() {
                    *sum += weighted / total;
                    *count += 1.0;
                }
            });
    }

    let mut mean = Array2::from_elem((nlat, nlon), FloatValue::NAN);
    Zip::from(&mut mean)
        .and(&year_value_sum)
        .and(&valid_years)
        .for_each(|mean, &sum, &count| {
            if count > 0.0 {
                *mean = sum / count;
            }
        });
    Ok(mean)
}

/// Amount-weighted mean over the whole data period and all twelve months:
/// the long-term mean used by the default spatial-search mode.
pub fn long_term_mean(
    isotope: &MonthlyField,
    precipitation: &MonthlyField,
) -> ApicResult<Array2<FloatValue>> {
    let axis = isotope.axis();
    weighted_mean(
        isotope,
        precipitation,
        axis.first().year,
        axis.last().year,
        MonthSet::all(),
    )
}
