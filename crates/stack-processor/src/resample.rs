//! Resampling seam between grids.

use raster_common::GeoTransform;

/// Reprojection primitive: fill a destination grid from a source grid.
///
/// Implementations map each destination pixel through the two affine
/// transforms and sample the source. The algorithm itself (nearest,
/// bilinear, a GDAL warp behind FFI) is interchangeable; the engine only
/// relies on nodata handling: source cells equal to `src_nodata` must come
/// out as `dst_nodata`, as must destination cells with no source coverage.
pub trait Resampler: Send + Sync {
    #[allow(clippy::too_many_arguments)]
    fn resample(
        &self,
        src: &[f32],
        src_width: usize,
        src_height: usize,
        src_transform: &GeoTransform,
        dst_width: usize,
        dst_height: usize,
        dst_transform: &GeoTransform,
        src_nodata: Option<f64>,
        dst_nodata: Option<f64>,
    ) -> Vec<f32>;
}

/// Nearest-neighbour resampler.
///
/// Samples the source cell containing each destination pixel center.
/// Exact-value preserving, which keeps categorical and masked data intact.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestResampler;

impl Resampler for NearestResampler {
    fn resample(
        &self,
        src: &[f32],
        src_width: usize,
        src_height: usize,
        src_transform: &GeoTransform,
        dst_width: usize,
        dst_height: usize,
        dst_transform: &GeoTransform,
        src_nodata: Option<f64>,
        dst_nodata: Option<f64>,
    ) -> Vec<f32> {
        let fill = dst_nodata.map(|v| v as f32).unwrap_or(f32::NAN);
        let mut dst = vec![fill; dst_width * dst_height];

        for dst_row in 0..dst_height {
            for dst_col in 0..dst_width {
                let (x, y) =
                    dst_transform.apply(dst_col as f64 + 0.5, dst_row as f64 + 0.5);
                let Some((src_col, src_row)) = src_transform.invert(x, y) else {
                    continue;
                };
                if src_col < 0.0 || src_row < 0.0 {
                    continue;
                }

                let (col, row) = (src_col.floor() as usize, src_row.floor() as usize);
                if col >= src_width || row >= src_height {
                    continue;
                }

                let value = src[row * src_width + col];
                let is_nodata = match src_nodata {
                    Some(nd) => value as f64 == nd || (nd.is_nan() && value.is_nan()),
                    None => false,
                };
                dst[dst_row * dst_width + dst_col] = if is_nodata { fill } else { value };
            }
        }

        dst
    }
}
