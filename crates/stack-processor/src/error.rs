//! Error types for stack processing.

use thiserror::Error;

/// Errors raised while building or reducing raster stacks.
#[derive(Debug, Error)]
pub enum StackError {
    // === Validation errors (raised before expensive work starts) ===
    /// Member rasters do not share one extent.
    #[error("input rasters do not have aligned extents: {0}")]
    ExtentMismatch(String),

    /// More than one CRS among the member rasters.
    #[error("more than one unique CRS found in file list: {0}")]
    CrsMismatch(String),

    /// An extent is not a whole number of pixels at the given resolution.
    #[error("extent and resolution do not produce an integral grid: {0}")]
    NonIntegralGrid(String),

    /// A statistic name outside the supported set.
    #[error("unsupported statistic: {0}. Expected one of nobs, mean, median, std")]
    UnsupportedStatistic(String),

    /// An argument outside its allowed range or combination.
    #[error("invalid value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// The reference profile carries no nodata value.
    #[error("no nodata value in the profile of {0}")]
    MissingNodata(String),

    // === Empty-result errors ===
    /// A subset filter excluded every entry.
    #[error("no entries left after subsetting")]
    EmptySubset,

    // === I/O (propagated, not retried) ===
    /// Failure in the underlying raster store.
    #[error("store error: {0}")]
    Store(#[from] raster_store::StoreError),
}

impl StackError {
    /// Create an InvalidParameter error.
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Whether this error was raised by up-front validation.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ExtentMismatch(_)
                | Self::CrsMismatch(_)
                | Self::NonIntegralGrid(_)
                | Self::UnsupportedStatistic(_)
                | Self::InvalidParameter { .. }
                | Self::MissingNodata(_)
        )
    }
}

impl From<raster_common::TileGridError> for StackError {
    fn from(err: raster_common::TileGridError) -> Self {
        match err {
            raster_common::TileGridError::NonIntegralGrid(msg) => Self::NonIntegralGrid(msg),
        }
    }
}

/// Result type for stack processing operations.
pub type Result<T> = std::result::Result<T, StackError>;
