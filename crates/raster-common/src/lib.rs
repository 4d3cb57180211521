//! Shared value types for raster stack processing.
//!
//! This crate holds the spatial and temporal primitives used across the
//! workspace: extents, affine transforms, pixel data types, tile grids and
//! the calendar policy for time-series classification. Everything here is an
//! immutable value object with no I/O.

pub mod calendar;
pub mod dtype;
pub mod extent;
pub mod tile;
pub mod transform;

pub use calendar::{CalendarPolicy, DateAttributes, ParseSeasonError, Season};
pub use dtype::PixelType;
pub use extent::Extent;
pub use tile::{Tile, TileGrid, TileGridError};
pub use transform::GeoTransform;
