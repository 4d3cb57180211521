//! Crop-to-extent resampling.

use std::path::Path;

use raster_common::{Extent, GeoTransform};
use raster_store::{Compression, RasterProfile, RasterStore};

use crate::error::{Result, StackError};
use crate::pool::WorkerPool;
use crate::resample::Resampler;

/// Options for [`crop_to_extent`].
#[derive(Debug, Clone)]
pub struct CropOptions {
    /// Target resolution in CRS units per pixel.
    pub resolution: f64,
    /// Output prefix; when set, each crop is written to
    /// `{outdir}/{stem}_{suffix}.tif`.
    pub outdir: Option<String>,
    /// Filename suffix for written crops.
    pub suffix: String,
    /// Skip the write when every destination pixel is nodata.
    pub check_if_empty: bool,
    /// CRS override; the source CRS is used when unset.
    pub crs: Option<String>,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            resolution: 30.0,
            outdir: None,
            suffix: "crop".to_string(),
            check_if_empty: false,
            crs: None,
        }
    }
}

/// One cropped raster: resampled band buffers plus the destination profile.
#[derive(Debug, Clone)]
pub struct CropResult {
    pub bands: Vec<Vec<f32>>,
    pub width: usize,
    pub height: usize,
    pub profile: RasterProfile,
    /// Path of the written dataset, when a write happened.
    pub written: Option<String>,
}

impl CropResult {
    /// Whether every destination pixel equals the nodata value.
    pub fn is_empty_of_data(&self) -> bool {
        let Some(nodata) = self.profile.nodata else {
            return false;
        };
        self.bands.iter().all(|band| {
            band.iter()
                .all(|&v| v as f64 == nodata || (nodata.is_nan() && v.is_nan()))
        })
    }
}

/// Resample one raster onto the grid spanned by `target` at `resolution`.
///
/// The destination transform is anchored at the target's upper-left corner
/// with square pixels. The source nodata value is carried through as the
/// destination nodata. With an output prefix set, the crop is written with
/// LZW compression and the source dtype/band-count/nodata — unless
/// `check_if_empty` is set and the result holds no valid data.
pub fn crop_to_extent(
    store: &dyn RasterStore,
    resampler: &dyn Resampler,
    path: &str,
    target: &Extent,
    options: &CropOptions,
) -> Result<CropResult> {
    let target_h = target.height() / options.resolution;
    let target_w = target.width() / options.resolution;
    if target_h.fract() != 0.0 || target_w.fract() != 0.0 {
        return Err(StackError::NonIntegralGrid(format!(
            "target {:.3} x {:.3} pixels at resolution {}",
            target_w, target_h, options.resolution
        )));
    }
    let (target_w, target_h) = (target_w as usize, target_h as usize);

    let reader = store.open(path)?;
    let src_profile = reader.profile().clone();
    let dst_transform =
        GeoTransform::from_origin(target.xmin, target.ymax, options.resolution, options.resolution);

    let mut bands = Vec::with_capacity(src_profile.count);
    for band in 1..=src_profile.count {
        let src = reader.read_band(band)?;
        bands.push(resampler.resample(
            &src,
            src_profile.width,
            src_profile.height,
            &src_profile.transform,
            target_w,
            target_h,
            &dst_transform,
            src_profile.nodata,
            src_profile.nodata,
        ));
    }
    drop(reader);

    let profile = RasterProfile {
        width: target_w,
        height: target_h,
        count: src_profile.count,
        dtype: src_profile.dtype,
        nodata: src_profile.nodata,
        transform: dst_transform,
        crs: options.crs.clone().or(src_profile.crs),
        compression: Compression::Lzw,
        block_size: Some((target_w, 1)),
    };

    let mut result = CropResult {
        bands,
        width: target_w,
        height: target_h,
        profile,
        written: None,
    };

    if let Some(outdir) = &options.outdir {
        if options.check_if_empty && result.is_empty_of_data() {
            tracing::debug!(path, "crop holds no valid data, skipping write");
        } else {
            let outfile = crop_output_path(outdir, path, &options.suffix);
            store.create(&outfile, &result.profile, &result.bands)?;
            result.written = Some(outfile);
        }
    }

    Ok(result)
}

/// Crop a list of rasters to one target extent.
///
/// Per-raster work is independent and dispatched through the worker pool;
/// results come back keyed by input order regardless of completion order.
pub fn batch_crop_to_extent(
    store: &dyn RasterStore,
    resampler: &dyn Resampler,
    paths: &[String],
    target: &Extent,
    options: &CropOptions,
    pool: &WorkerPool,
) -> Result<Vec<CropResult>> {
    let tasks: Vec<_> = paths
        .iter()
        .map(|path| {
            let path = path.clone();
            let target = *target;
            let options = options.clone();
            move || crop_to_extent(store, resampler, &path, &target, &options)
        })
        .collect();
    pool.run(tasks)
}

/// Output path for a written crop: `{outdir}/{stem}_{suffix}.tif`.
pub fn crop_output_path(outdir: &str, input: &str, suffix: &str) -> String {
    let stem = Path::new(input)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(input);
    format!("{}/{}_{}.tif", outdir, stem, suffix)
}
