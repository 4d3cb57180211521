//! Chunked pixel-wise statistics and spatial partitioning over stacks of
//! spatially-aligned rasters.
//!
//! The pipeline runs in two halves:
//!
//! - **Partitioning** builds aligned inputs from non-aligned source
//!   mosaics: derive and union extents, lay a tile grid over the union,
//!   crop every source onto each tile's grid.
//! - **Reduction** computes per-pixel statistics (valid-observation count,
//!   mean, median, population standard deviation) across the member axis of
//!   an aligned stack, optionally restricted to a calendar subset of a time
//!   series.
//!
//! ```text
//! source mosaics
//!      │
//!      ▼
//! union_extent ──► TileGrid ──► batch_crop_to_extent      (aligned tiles)
//!                                      │
//!                                      ▼
//!                           RasterTimeSeries (calendar index)
//!                                      │
//!                          SubsetQuery (keep-mask, conjunctive)
//!                                      │
//!                                      ▼
//!                        compute_stack_stats (row chunks)
//!                                      │
//!                                      ▼
//!                       StatGrid per statistic / written raster
//! ```
//!
//! Images are routinely too large to hold in full, so the reduction reads
//! row chunks: a chunk of height H costs about
//! `#files * H * width * 4` bytes, and H is the sole memory knob. Chunks
//! are independent units of work; reassembly is strictly by ascending row
//! index regardless of worker completion order.
//!
//! # Example
//!
//! ```ignore
//! use stack_processor::{RasterTimeSeries, StatsConfig, StatsPlan, SubsetQuery};
//!
//! let series = RasterTimeSeries::new(&store, files, dates)?;
//! let summer_2001 = SubsetQuery::new().months([6, 7, 8]).years([2001]);
//! let grids = series.compute_stats(&store, &summer_2001, &StatsPlan::default(),
//!                                  &StatsConfig::default())?;
//! ```

pub mod batch;
pub mod config;
pub mod crop;
pub mod error;
pub mod extent;
pub mod pool;
pub mod resample;
pub mod stack;
pub mod stats;
pub mod subset;

// Re-export commonly used types at crate root
pub use batch::{annual_stats, seasonal_stats, tile_and_crop, PeriodReport, TilingReport};
pub use config::{StatsConfig, WideningPolicy};
pub use crop::{batch_crop_to_extent, crop_to_extent, CropOptions, CropResult};
pub use error::{Result, StackError};
pub use extent::{equal_extents, image_crs, image_extent, union_extent};
pub use pool::WorkerPool;
pub use resample::{NearestResampler, Resampler};
pub use stack::{RasterStack, RasterTimeSeries, SeriesEntry, SingleFileStack, StackEntry};
pub use stats::{
    compute_band_stats, compute_stack_stats, mask_invalid, recode_missing, resolve_output_dtype,
    MaskRule, StatGrid, Statistic, StatsPlan,
};
pub use subset::SubsetQuery;
