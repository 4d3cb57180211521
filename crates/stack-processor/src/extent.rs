//! Extent derivation and validation across raster collections.

use std::collections::BTreeSet;

use raster_common::Extent;
use raster_store::RasterStore;

use crate::error::{Result, StackError};
use crate::pool::WorkerPool;

/// Extent of a single raster, from its transform and dimensions.
///
/// The handle is opened for this read only and released on return.
pub fn image_extent(store: &dyn RasterStore, path: &str) -> Result<Extent> {
    let reader = store.open(path)?;
    Ok(reader.profile().extent())
}

/// CRS identifier of a single raster.
pub fn image_crs(store: &dyn RasterStore, path: &str) -> Result<Option<String>> {
    let reader = store.open(path)?;
    Ok(reader.profile().crs.clone())
}

/// Check whether all rasters share one exact extent.
///
/// With `check_crs`, more than one distinct CRS among the rasters is an
/// error rather than a mismatch. Coordinates are compared exactly; rasters
/// cropped to the same target grid agree to the bit.
pub fn equal_extents(store: &dyn RasterStore, paths: &[String], check_crs: bool) -> Result<bool> {
    if check_crs {
        let mut seen = BTreeSet::new();
        for path in paths {
            seen.insert(image_crs(store, path)?.unwrap_or_default());
        }
        if seen.len() > 1 {
            return Err(StackError::CrsMismatch(
                seen.into_iter().collect::<Vec<_>>().join(", "),
            ));
        }
    }

    let mut first: Option<Extent> = None;
    for path in paths {
        let extent = image_extent(store, path)?;
        match &first {
            None => first = Some(extent),
            Some(reference) => {
                if !reference.coords_equal(&extent) {
                    return Ok(false);
                }
            }
        }
    }

    Ok(true)
}

/// Component-wise union of the extents of all rasters.
///
/// Per-file extent reads go through the worker pool; the union itself is
/// commutative, so worker completion order is irrelevant.
pub fn union_extent(
    store: &dyn RasterStore,
    paths: &[String],
    pool: &WorkerPool,
) -> Result<Extent> {
    if paths.is_empty() {
        return Err(StackError::invalid_parameter(
            "files",
            "at least one raster is required",
        ));
    }

    let tasks: Vec<_> = paths
        .iter()
        .map(|path| {
            let path = path.clone();
            move || image_extent(store, &path)
        })
        .collect();
    let extents = pool.run(tasks)?;

    let mut union = extents[0];
    for extent in &extents[1..] {
        union = union.union(extent);
    }
    Ok(union)
}
