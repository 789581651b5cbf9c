use thiserror::Error;

/// Error type for invalid operations.
///
/// Missingness arising from legitimate data gaps (ocean cells, undefined
/// running-mean head, years with zero precipitation) is represented as NaN in
/// the returned fields and is never an error.
#[derive(Error, Debug)]
pub enum ApicError {
    #[error("no valid data at the grid cell nearest to ({lat}, {lon}); the coordinate is outside the data mask")]
    OutOfGrid { lat: f64, lon: f64 },
    #[error("invalid period: {0}")]
    InvalidPeriod(String),
    #[error("axis mismatch: {0}")]
    AxisMismatch(String),
    #[error("unknown resolution tag: {0}")]
    UnknownResolution(String),
    #[error("manifest error: {0}")]
    Manifest(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[cfg(feature = "netcdf")]
    #[error(transparent)]
    NetCdf(#[from] netcdf::Error),
}

/// Convenience type for `Result<T, ApicError>`.
pub type ApicResult<T> = Result<T, ApicError>;
