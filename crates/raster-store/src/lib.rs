//! Raster dataset access for stack processing.
//!
//! Provides the seam between the processing pipeline and raster file
//! formats:
//!
//! - [`RasterProfile`] — per-dataset metadata (dimensions, bands, dtype,
//!   nodata, transform, CRS)
//! - [`RasterReader`] / [`RasterStore`] — traits for opening datasets,
//!   windowed band reads and whole-dataset writes
//! - [`MemoryStore`] — an in-process backend used by tests and in-memory
//!   pipelines
//!
//! Format codecs (GeoTIFF and friends) live behind these traits in backend
//! crates; processing code never touches bytes on disk directly. Handles are
//! opened per operation and dropped when the read completes, which keeps the
//! open-descriptor count of a parallel run proportional to the worker count
//! rather than the stack depth.

pub mod error;
pub mod memory;
pub mod profile;
pub mod reader;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use profile::{Compression, RasterProfile};
pub use reader::{RasterReader, RasterStore};
