//! Dataset metadata.

use serde::{Deserialize, Serialize};

use raster_common::{Extent, GeoTransform, PixelType};

/// On-disk compression of a written dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    None,
    Lzw,
    Deflate,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lzw => "lzw",
            Self::Deflate => "deflate",
        }
    }
}

/// Metadata describing one raster dataset.
///
/// Mirrors the profile a format driver exposes when opening a file; a copy
/// of the first member's profile, with band count, dtype and compression
/// updated, becomes the profile of every written output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterProfile {
    /// Columns.
    pub width: usize,
    /// Rows.
    pub height: usize,
    /// Number of bands.
    pub count: usize,
    /// Pixel data type.
    pub dtype: PixelType,
    /// Sentinel value meaning "no valid observation", if the dataset has one.
    pub nodata: Option<f64>,
    /// Pixel-to-world affine transform.
    pub transform: GeoTransform,
    /// CRS identifier, e.g. "epsg:32632".
    pub crs: Option<String>,
    /// Compression of the persisted dataset.
    #[serde(default)]
    pub compression: Compression,
    /// Tiling block size (columns, rows), if the format is blocked.
    #[serde(default)]
    pub block_size: Option<(usize, usize)>,
}

impl RasterProfile {
    /// Extent derived from the transform and dimensions.
    pub fn extent(&self) -> Extent {
        Extent::from_raster(&self.transform, self.width, self.height)
    }

    /// Number of pixels in one band.
    pub fn band_len(&self) -> usize {
        self.width * self.height
    }

    /// Copy of this profile reshaped for a derived output.
    pub fn with_output(&self, count: usize, dtype: PixelType, compression: Compression) -> Self {
        Self {
            count,
            dtype,
            compression,
            ..self.clone()
        }
    }
}
