//! Spatial extent type and operations.

use serde::{Deserialize, Serialize};

use crate::transform::GeoTransform;

/// A rectangular spatial extent in CRS units.
///
/// For geographic CRS the units are degrees, for projected CRS meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl Extent {
    /// Create a new extent from corner coordinates.
    pub fn new(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Derive the extent of a raster from its transform and dimensions.
    ///
    /// The row count advances the x axis and the column count the y axis;
    /// callers that tile square imagery rely on exactly this derivation.
    pub fn from_raster(transform: &GeoTransform, width: usize, height: usize) -> Self {
        let xmin = transform.c;
        let ymax = transform.f;
        let xmax = transform.c + height as f64 * transform.a;
        let ymin = transform.f + width as f64 * transform.e;

        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Width of the extent in coordinate units.
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height of the extent in coordinate units.
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Component-wise union of two extents.
    pub fn union(&self, other: &Extent) -> Extent {
        Extent {
            xmin: self.xmin.min(other.xmin),
            ymin: self.ymin.min(other.ymin),
            xmax: self.xmax.max(other.xmax),
            ymax: self.ymax.max(other.ymax),
        }
    }

    /// Check if this extent intersects another.
    pub fn intersects(&self, other: &Extent) -> bool {
        self.xmin < other.xmax
            && self.xmax > other.xmin
            && self.ymin < other.ymax
            && self.ymax > other.ymin
    }

    /// Check if a point is contained within this extent.
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.xmin && x <= self.xmax && y >= self.ymin && y <= self.ymax
    }

    /// Exact coordinate-wise equality with another extent.
    pub fn coords_equal(&self, other: &Extent) -> bool {
        self.xmin == other.xmin
            && self.ymin == other.ymin
            && self.xmax == other.xmax
            && self.ymax == other.ymax
    }
}
