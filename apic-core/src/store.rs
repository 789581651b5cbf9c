//! The immutable gridded-series store.
//!
//! A [`GriddedStore`] owns the four monthly source fields (three isotope
//! systems plus precipitation amount) on one shared 0.25° grid and one
//! shared monthly time axis. It is constructed once at process start, is
//! never mutated, and is safe to share across sessions: every derived value
//! (resolution view, point series, match mask) is freshly allocated per
//! request.

use crate::errors::{ApicError, ApicResult};
use crate::field::MonthlyField;
use crate::grid::GridAxis;
use crate::timeline::MonthAxis;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// The three isotope systems served by the calculator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tracer {
    /// δ²H of precipitation (‰ VSMOW)
    D2H,
    /// δ¹⁸O of precipitation (‰ VSMOW)
    D18O,
    /// Deuterium excess, d = δ²H − 8·δ¹⁸O (‰ VSMOW)
    Dxs,
}

impl Tracer {
    pub const ALL: [Tracer; 3] = [Tracer::D2H, Tracer::D18O, Tracer::Dxs];

    pub fn tag(&self) -> &'static str {
        match self {
            Tracer::D2H => "d2H",
            Tracer::D18O => "d18O",
            Tracer::Dxs => "dxs",
        }
    }
}

impl fmt::Display for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Tracer {
    type Err = ApicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tracer::ALL
            .iter()
            .copied()
            .find(|t| t.tag() == s)
            .ok_or_else(|| ApicError::Manifest(format!("unknown tracer: {}", s)))
    }
}

/// Immutable store of the monthly source fields.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GriddedStore {
    d2h: MonthlyField,
    d18o: MonthlyField,
    dxs: MonthlyField,
    precipitation: MonthlyField,
}

impl GriddedStore {
    /// Assemble a store, checking the shared-axis invariant: all four fields
    /// must carry identical time, latitude and longitude axes.
    pub fn new(
        d2h: MonthlyField,
        d18o: MonthlyField,
        dxs: MonthlyField,
        precipitation: MonthlyField,
    ) -> ApicResult<Self> {
        for (name, field) in [
            ("d18O", &d18o),
            ("dxs", &dxs),
            ("precipitation", &precipitation),
        ] {
            if !d2h.axes_match(field) {
                return Err(ApicError::AxisMismatch(format!(
                    "{} axes differ from the d2H axes",
                    name
                )));
            }
        }
        debug!(
            "store assembled: {} months x {} lat x {} lon",
            d2h.axis().len(),
            d2h.lat().len(),
            d2h.lon().len()
        );
        Ok(Self {
            d2h,
            d18o,
            dxs,
            precipitation,
        })
    }

    pub fn tracer(&self, tracer: Tracer) -> &MonthlyField {
        match tracer {
            Tracer::D2H => &self.d2h,
            Tracer::D18O => &self.d18o,
            Tracer::Dxs => &self.dxs,
        }
    }

    pub fn precipitation(&self) -> &MonthlyField {
        &self.precipitation
    }

    pub fn months(&self) -> &MonthAxis {
        self.d2h.axis()
    }

    pub fn lat(&self) -> &Arc<GridAxis> {
        self.d2h.lat()
    }

    pub fn lon(&self) -> &Arc<GridAxis> {
        self.d2h.lon()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::MonthStamp;
    use ndarray::Array3;

    fn field(axis: MonthAxis, lat: Arc<GridAxis>, lon: Arc<GridAxis>) -> MonthlyField {
        let shape = (axis.len(), lat.len(), lon.len());
        MonthlyField::new(axis, lat, lon, Array3::zeros(shape)).unwrap()
    }

    #[test]
    fn accepts_shared_axes() {
        let axis = MonthAxis::new(MonthStamp::new(1962, 1), 24).unwrap();
        let lat = Arc::new(GridAxis::regular(-44.0, 0.25, 4).unwrap());
        let lon = Arc::new(GridAxis::regular(112.0, 0.25, 5).unwrap());
        let make = || field(axis.clone(), lat.clone(), lon.clone());
        let store = GriddedStore::new(make(), make(), make(), make()).unwrap();
        assert_eq!(store.months().len(), 24);
        assert_eq!(store.tracer(Tracer::Dxs).lat().len(), 4);
    }

    #[test]
    fn rejects_mismatched_time_axis() {
        let lat = Arc::new(GridAxis::regular(-44.0, 0.25, 4).unwrap());
        let lon = Arc::new(GridAxis::regular(112.0, 0.25, 5).unwrap());
        let axis_a = MonthAxis::new(MonthStamp::new(1962, 1), 24).unwrap();
        let axis_b = MonthAxis::new(MonthStamp::new(1962, 2), 24).unwrap();
        let result = GriddedStore::new(
            field(axis_a.clone(), lat.clone(), lon.clone()),
            field(axis_a.clone(), lat.clone(), lon.clone()),
            field(axis_a, lat.clone(), lon.clone()),
            field(axis_b, lat, lon),
        );
        assert!(matches!(result, Err(ApicError::AxisMismatch(_))));
    }

    #[test]
    fn tracer_tags_parse() {
        for tracer in Tracer::ALL {
            assert_eq!(tracer.tag().parse::<Tracer>().unwrap(), tracer);
        }
        assert!("d17O".parse::<Tracer>().is_err());
    }

    #[test]
    fn store_snapshot_round_trip() {
        let axis = MonthAxis::new(MonthStamp::new(1962, 1), 12).unwrap();
        let lat = Arc::new(GridAxis::regular(-44.0, 0.25, 2).unwrap());
        let lon = Arc::new(GridAxis::regular(112.0, 0.25, 3).unwrap());
        let make = || field(axis.clone(), lat.clone(), lon.clone());
        let store = GriddedStore::new(make(), make(), make(), make()).unwrap();

        let serialised = serde_json::to_string(&store).unwrap();
        let deserialised: GriddedStore = serde_json::from_str(&serialised).unwrap();
        assert_eq!(deserialised.months(), store.months());
        assert_eq!(deserialised.lat().values(), store.lat().values());
        assert_eq!(
            deserialised.tracer(Tracer::D2H).values(),
            store.tracer(Tracer::D2H).values()
        );
    }
}
