//! Meteoric water line fitting.
//!
//! A local meteoric water line (LMWL) is the least-squares fit of δ²H
//! against δ¹⁸O for one site's extracted series; it is compared against the
//! global meteoric water line δ²H = 8·δ¹⁸O + 10.

use crate::extract::PointSeries;
use crate::timeline::FloatValue;
use serde::{Deserialize, Serialize};

/// Global meteoric water line slope.
pub const GLOBAL_SLOPE: FloatValue = 8.0;
/// Global meteoric water line intercept (‰ VSMOW).
pub const GLOBAL_INTERCEPT: FloatValue = 10.0;

/// Fitted meteoric water line for one extracted series.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeteoricWaterLine {
    pub slope: FloatValue,
    pub intercept: FloatValue,
    pub r_squared: FloatValue,
    /// Number of (δ¹⁸O, δ²H) pairs used in the fit.
    pub samples: usize,
}

impl MeteoricWaterLine {
    /// δ²H predicted by this line for a δ¹⁸O value.
    pub fn predict(&self, d18o: FloatValue) -> FloatValue {
        self.slope * d18o + self.intercept
    }
}

/// Least-squares fit of δ²H against δ¹⁸O, skipping steps where either value
/// is missing. Returns `None` with fewer than two valid pairs or when δ¹⁸O
/// carries no variance.
pub fn fit(series: &PointSeries) -> Option<MeteoricWaterLine> {
    let pairs: Vec<(FloatValue, FloatValue)> = series
        .samples
        .iter()
        .filter(|s| !s.d18o.is_nan() && !s.d2h.is_nan())
        .map(|s| (s.d18o, s.d2h))
        .collect();
    let n = pairs.len();
    if n < 2 {
        return None;
    }

    let nf = n as FloatValue;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<FloatValue>() / nf;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<FloatValue>() / nf;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    let mut syy = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxx += dx * dx;
        sxy += dx * dy;
        syy += dy * dy;
    }
    if sxx == 0.0 {
        return None;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if syy > 0.0 { (sxy * sxy) / (sxx * syy) } else { 1.0 };
    Some(MeteoricWaterLine {
        slope,
        intercept,
        r_squared,
        samples: n,
    })
}
