//! In-memory raster store.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::profile::RasterProfile;
use crate::reader::{RasterReader, RasterStore};

/// A raster store backed by process memory.
///
/// Stands in for a format backend in tests and in-process pipelines. Values
/// are quantised to the profile dtype at write time, the same way a format
/// encoder would, so reads observe exactly what a persisted dataset would
/// contain.
#[derive(Default)]
pub struct MemoryStore {
    datasets: RwLock<HashMap<String, Dataset>>,
}

#[derive(Clone)]
struct Dataset {
    profile: RasterProfile,
    bands: Vec<Vec<f32>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths of all stored datasets, sorted.
    pub fn paths(&self) -> Vec<String> {
        let datasets = self.datasets.read().expect("store lock poisoned");
        let mut paths: Vec<String> = datasets.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Remove a dataset, if present.
    pub fn remove(&self, path: &str) {
        let mut datasets = self.datasets.write().expect("store lock poisoned");
        datasets.remove(path);
    }
}

impl RasterStore for MemoryStore {
    fn open(&self, path: &str) -> Result<Box<dyn RasterReader + '_>> {
        let datasets = self.datasets.read().expect("store lock poisoned");
        let dataset = datasets
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;

        Ok(Box::new(MemoryReader {
            path: path.to_string(),
            dataset,
        }))
    }

    fn create(&self, path: &str, profile: &RasterProfile, bands: &[Vec<f32>]) -> Result<()> {
        let expected = profile.band_len();
        for band in bands {
            if band.len() != expected {
                return Err(StoreError::ShapeMismatch {
                    expected,
                    actual: band.len(),
                });
            }
        }

        // encode: quantise every value to the profile dtype
        let bands: Vec<Vec<f32>> = bands
            .iter()
            .map(|band| band.iter().map(|&v| profile.dtype.cast(v)).collect())
            .collect();

        let mut profile = profile.clone();
        profile.count = bands.len();

        tracing::debug!(path, bands = profile.count, "storing dataset");
        let mut datasets = self.datasets.write().expect("store lock poisoned");
        datasets.insert(
            path.to_string(),
            Dataset {
                profile,
                bands,
            },
        );
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        let datasets = self.datasets.read().expect("store lock poisoned");
        datasets.contains_key(path)
    }
}

struct MemoryReader {
    path: String,
    dataset: Dataset,
}

impl RasterReader for MemoryReader {
    fn profile(&self) -> &RasterProfile {
        &self.dataset.profile
    }

    fn read_band_window(&self, band: usize, rows: Range<usize>) -> Result<Vec<f32>> {
        let profile = &self.dataset.profile;
        if band == 0 || band > profile.count {
            return Err(StoreError::BandOutOfRange {
                path: self.path.clone(),
                band,
                count: profile.count,
            });
        }
        if rows.start > rows.end || rows.end > profile.height {
            return Err(StoreError::WindowOutOfRange {
                start: rows.start,
                end: rows.end,
                height: profile.height,
            });
        }

        let data = &self.dataset.bands[band - 1];
        Ok(data[rows.start * profile.width..rows.end * profile.width].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{GeoTransform, PixelType};

    fn profile(width: usize, height: usize, dtype: PixelType) -> RasterProfile {
        RasterProfile {
            width,
            height,
            count: 1,
            dtype,
            nodata: Some(0.0),
            transform: GeoTransform::from_origin(0.0, height as f64 * 30.0, 30.0, 30.0),
            crs: Some("epsg:32632".to_string()),
            compression: Default::default(),
            block_size: None,
        }
    }

    #[test]
    fn test_create_open_windowed_read() {
        let store = MemoryStore::new();
        let data: Vec<f32> = (0..12).map(|v| v as f32).collect();
        store
            .create("a.tif", &profile(4, 3, PixelType::Float32), &[data])
            .unwrap();

        let reader = store.open("a.tif").unwrap();
        assert_eq!(reader.profile().width, 4);

        let window = reader.read_band_window(1, 1..3).unwrap();
        assert_eq!(window, (4..12).map(|v| v as f32).collect::<Vec<_>>());

        let full = reader.read_band(1).unwrap();
        assert_eq!(full.len(), 12);
    }

    #[test]
    fn test_write_quantises_to_dtype() {
        let store = MemoryStore::new();
        let data = vec![1.7, -2.4, 300.0, 4.0];
        store
            .create("q.tif", &profile(2, 2, PixelType::Uint8), &[data])
            .unwrap();

        let reader = store.open("q.tif").unwrap();
        assert_eq!(reader.read_band(1).unwrap(), vec![1.0, 0.0, 255.0, 4.0]);
    }

    #[test]
    fn test_open_missing_dataset() {
        let store = MemoryStore::new();
        assert!(matches!(
            store.open("missing.tif"),
            Err(StoreError::NotFound(_))
        ));
        assert!(!store.exists("missing.tif"));
    }

    #[test]
    fn test_band_and_window_bounds() {
        let store = MemoryStore::new();
        let data = vec![1.0; 12];
        store
            .create("b.tif", &profile(4, 3, PixelType::Float32), &[data])
            .unwrap();

        let reader = store.open("b.tif").unwrap();
        assert!(matches!(
            reader.read_band_window(2, 0..1),
            Err(StoreError::BandOutOfRange { .. })
        ));
        assert!(matches!(
            reader.read_band_window(1, 0..4),
            Err(StoreError::WindowOutOfRange { .. })
        ));
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let store = MemoryStore::new();
        let result = store.create("s.tif", &profile(4, 3, PixelType::Float32), &[vec![0.0; 5]]);
        assert!(matches!(result, Err(StoreError::ShapeMismatch { .. })));
    }
}
