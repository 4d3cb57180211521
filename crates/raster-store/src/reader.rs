//! Reader and store traits.

use std::ops::Range;

use crate::error::Result;
use crate::profile::RasterProfile;

/// An open raster dataset handle.
///
/// Handles are cheap, short-lived views: acquire one, read, drop it. The
/// processing pipeline never holds a handle across chunk boundaries.
pub trait RasterReader {
    /// Dataset metadata.
    fn profile(&self) -> &RasterProfile;

    /// Read one full band (1-based index) as f32, row-major.
    fn read_band(&self, band: usize) -> Result<Vec<f32>> {
        let height = self.profile().height;
        self.read_band_window(band, 0..height)
    }

    /// Read a horizontal row window of one band (1-based index) as f32,
    /// row-major. `rows` is half-open and must lie within the dataset
    /// height.
    fn read_band_window(&self, band: usize, rows: Range<usize>) -> Result<Vec<f32>>;
}

/// A collection of raster datasets addressable by path.
///
/// Backends decode and encode the actual file format; the pipeline only
/// sees profiles and f32 band buffers.
pub trait RasterStore: Send + Sync {
    /// Open a dataset for reading.
    fn open(&self, path: &str) -> Result<Box<dyn RasterReader + '_>>;

    /// Persist a dataset: one row-major f32 buffer per band, encoded
    /// according to `profile` (dtype quantisation, compression). Replaces
    /// any existing dataset at `path`.
    fn create(&self, path: &str, profile: &RasterProfile, bands: &[Vec<f32>]) -> Result<()>;

    /// Whether a dataset exists at `path`.
    fn exists(&self, path: &str) -> bool;
}
