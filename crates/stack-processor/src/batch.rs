//! Batch orchestration over tiles and time periods.
//!
//! The engine itself fails fast; these drivers wrap it so one bad logical
//! unit (a tile, a year, a season) is logged and skipped instead of aborting
//! the whole run.

use raster_common::{Season, TileGrid};
use raster_store::RasterStore;

use crate::config::StatsConfig;
use crate::crop::{batch_crop_to_extent, CropOptions};
use crate::error::Result;
use crate::extent::union_extent;
use crate::pool::WorkerPool;
use crate::resample::Resampler;
use crate::stack::RasterTimeSeries;
use crate::stats::StatsPlan;
use crate::subset::SubsetQuery;

/// Outcome of a tiling run.
#[derive(Debug, Clone)]
pub struct TilingReport {
    /// The tile grid derived from the union extent.
    pub grid: TileGrid,
    /// Paths of every crop written.
    pub written: Vec<String>,
    /// Tile ids whose crop batch failed.
    pub skipped: Vec<String>,
}

/// Outcome of a per-period stats run.
#[derive(Debug, Clone, Default)]
pub struct PeriodReport {
    /// Output datasets written, one per completed period.
    pub written: Vec<String>,
    /// Period labels that failed or held no data.
    pub skipped: Vec<String>,
}

/// Tile the union extent of `files` and crop every file to every tile.
///
/// Crops land under `{outdir}/{prefix}_{tile_id}/` with the empty-check
/// enabled, so tiles a file does not reach produce no output. A failing
/// tile is logged and skipped; the remaining tiles still run.
#[allow(clippy::too_many_arguments)]
pub fn tile_and_crop(
    store: &dyn RasterStore,
    resampler: &dyn Resampler,
    files: &[String],
    tile_w: f64,
    tile_h: f64,
    resolution: f64,
    outdir: &str,
    prefix: &str,
    pool: &WorkerPool,
) -> Result<TilingReport> {
    let union = union_extent(store, files, pool)?;
    let grid = TileGrid::build(&union, tile_w, tile_h, resolution)?;
    tracing::info!(tiles = grid.len(), files = files.len(), "tiling union extent");

    let mut written = Vec::new();
    let mut skipped = Vec::new();
    for tile in grid.iter() {
        let options = CropOptions {
            resolution,
            outdir: Some(format!("{}/{}_{}", outdir, prefix, tile.id)),
            check_if_empty: true,
            ..Default::default()
        };
        match batch_crop_to_extent(store, resampler, files, &tile.extent, &options, pool) {
            Ok(results) => {
                written.extend(results.into_iter().filter_map(|r| r.written));
            }
            Err(err) => {
                tracing::warn!(tile = %tile.id, %err, "tile crop failed, skipping");
                skipped.push(tile.id.clone());
            }
        }
    }

    Ok(TilingReport {
        grid,
        written,
        skipped,
    })
}

/// One stats output per year, written to `{outdir}/{prefix}_{year}.tif`.
///
/// Years with no data or a failing computation are logged and skipped.
pub fn annual_stats(
    store: &dyn RasterStore,
    series: &RasterTimeSeries,
    years: &[i32],
    plan: &StatsPlan,
    outdir: &str,
    prefix: &str,
    config: &StatsConfig,
) -> Result<PeriodReport> {
    let mut report = PeriodReport::default();
    for &year in years {
        let outfile = format!("{}/{}_{}.tif", outdir, prefix, year);
        let query = SubsetQuery::new().years([year]);
        run_period(store, series, &query, plan, &outfile, config, &year.to_string(), &mut report);
    }
    Ok(report)
}

/// One stats output per season, written to `{outdir}/{prefix}_{season}.tif`.
pub fn seasonal_stats(
    store: &dyn RasterStore,
    series: &RasterTimeSeries,
    plan: &StatsPlan,
    outdir: &str,
    prefix: &str,
    config: &StatsConfig,
) -> Result<PeriodReport> {
    let mut report = PeriodReport::default();
    for &season in Season::all() {
        let outfile = format!("{}/{}_{}.tif", outdir, prefix, season);
        let query = SubsetQuery::new().seasons([season]);
        run_period(store, series, &query, plan, &outfile, config, season.as_str(), &mut report);
    }
    Ok(report)
}

#[allow(clippy::too_many_arguments)]
fn run_period(
    store: &dyn RasterStore,
    series: &RasterTimeSeries,
    query: &SubsetQuery,
    plan: &StatsPlan,
    outfile: &str,
    config: &StatsConfig,
    label: &str,
    report: &mut PeriodReport,
) {
    let plan = StatsPlan {
        output: Some(outfile.to_string()),
        ..plan.clone()
    };
    match series.compute_stats(store, query, &plan, config) {
        Ok(_) => report.written.push(outfile.to_string()),
        Err(err) => {
            tracing::warn!(period = label, %err, "period stats failed, skipping");
            report.skipped.push(label.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::NearestResampler;
    use chrono::NaiveDate;
    use raster_common::{GeoTransform, PixelType};
    use raster_store::{MemoryStore, RasterProfile};

    fn add_raster(store: &MemoryStore, path: &str, xmin: f64, ymax: f64, fill: f32) {
        let profile = RasterProfile {
            width: 2,
            height: 2,
            count: 1,
            dtype: PixelType::Float32,
            nodata: Some(-9999.0),
            transform: GeoTransform::from_origin(xmin, ymax, 30.0, 30.0),
            crs: Some("epsg:32632".to_string()),
            compression: Default::default(),
            block_size: None,
        };
        store.create(path, &profile, &[vec![fill; 4]]).unwrap();
    }

    #[test]
    fn test_tile_and_crop_skips_empty_tiles() {
        let store = MemoryStore::new();
        // two rasters side by side: union is 120 x 60 m
        add_raster(&store, "west.tif", 0.0, 60.0, 1.0);
        add_raster(&store, "east.tif", 60.0, 60.0, 2.0);

        let files = vec!["west.tif".to_string(), "east.tif".to_string()];
        let report = tile_and_crop(
            &store,
            &NearestResampler,
            &files,
            60.0,
            60.0,
            30.0,
            "tiles",
            "T",
            &WorkerPool::new(1),
        )
        .unwrap();

        assert_eq!(report.grid.len(), 2);
        assert!(report.skipped.is_empty());
        // each raster only reaches its own tile
        assert!(store.exists("tiles/T_01-01/west_crop.tif"));
        assert!(store.exists("tiles/T_01-02/east_crop.tif"));
        assert!(!store.exists("tiles/T_01-02/west_crop.tif"));
        assert!(!store.exists("tiles/T_01-01/east_crop.tif"));
        assert_eq!(report.written.len(), 2);
    }

    #[test]
    fn test_annual_stats_skips_empty_years() {
        let store = MemoryStore::new();
        add_raster(&store, "a.tif", 0.0, 60.0, 1.0);
        add_raster(&store, "b.tif", 0.0, 60.0, 3.0);

        let series = RasterTimeSeries::new(
            &store,
            vec!["a.tif".to_string(), "b.tif".to_string()],
            vec![
                NaiveDate::from_ymd_opt(2001, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2001, 8, 1).unwrap(),
            ],
        )
        .unwrap();

        let report = annual_stats(
            &store,
            &series,
            &[2000, 2001],
            &StatsPlan::default(),
            "stats",
            "annual",
            &StatsConfig::default(),
        )
        .unwrap();

        // 2000 holds no entries and is skipped, 2001 is written
        assert_eq!(report.skipped, vec!["2000".to_string()]);
        assert_eq!(report.written, vec!["stats/annual_2001.tif".to_string()]);
        assert!(store.exists("stats/annual_2001.tif"));
    }

    #[test]
    fn test_seasonal_stats_covers_all_seasons() {
        let store = MemoryStore::new();
        for path in ["w.tif", "sp.tif", "su.tif", "au.tif"] {
            add_raster(&store, path, 0.0, 60.0, 1.0);
        }

        let series = RasterTimeSeries::new(
            &store,
            vec![
                "w.tif".to_string(),
                "sp.tif".to_string(),
                "su.tif".to_string(),
                "au.tif".to_string(),
            ],
            vec![
                NaiveDate::from_ymd_opt(2001, 1, 10).unwrap(),
                NaiveDate::from_ymd_opt(2001, 4, 20).unwrap(),
                NaiveDate::from_ymd_opt(2001, 7, 10).unwrap(),
                NaiveDate::from_ymd_opt(2001, 10, 10).unwrap(),
            ],
        )
        .unwrap();

        let report = seasonal_stats(
            &store,
            &series,
            &StatsPlan::default(),
            "stats",
            "seasonal",
            &StatsConfig::default(),
        )
        .unwrap();

        assert!(report.skipped.is_empty());
        assert_eq!(report.written.len(), 4);
        assert!(store.exists("stats/seasonal_winter.tif"));
        assert!(store.exists("stats/seasonal_autumn.tif"));
    }
}
