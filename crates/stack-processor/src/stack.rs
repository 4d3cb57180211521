//! Stack and time-series indexes over collections of aligned rasters.

use chrono::NaiveDate;

use raster_common::{CalendarPolicy, Extent, Season};
use raster_store::{RasterProfile, RasterStore};

use crate::config::StatsConfig;
use crate::error::{Result, StackError};
use crate::extent::equal_extents;
use crate::pool::WorkerPool;
use crate::stats::{compute_band_stats, compute_stack_stats, StatGrid, Statistic, StatsPlan};
use crate::subset::SubsetQuery;

/// One member of a [`RasterStack`].
#[derive(Debug, Clone)]
pub struct StackEntry {
    pub path: String,
    /// Per-band count of valid pixels, filled by a dedicated scan.
    pub observed: Option<Vec<u64>>,
}

/// A collection of spatially-aligned rasters treated as one logical stack.
///
/// Construction validates that every member shares one extent and CRS; the
/// first member's profile becomes the reference for all derived outputs.
#[derive(Debug, Clone)]
pub struct RasterStack {
    entries: Vec<StackEntry>,
    extent: Extent,
    profile: RasterProfile,
}

impl RasterStack {
    pub fn new(store: &dyn RasterStore, files: Vec<String>) -> Result<Self> {
        if files.is_empty() {
            return Err(StackError::invalid_parameter(
                "files",
                "at least one raster is required",
            ));
        }
        if !equal_extents(store, &files, true)? {
            return Err(StackError::ExtentMismatch(format!(
                "{} input rasters",
                files.len()
            )));
        }

        let profile = store.open(&files[0])?.profile().clone();
        let extent = profile.extent();
        let entries = files
            .into_iter()
            .map(|path| StackEntry {
                path,
                observed: None,
            })
            .collect();

        Ok(Self {
            entries,
            extent,
            profile,
        })
    }

    pub fn entries(&self) -> &[StackEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn profile(&self) -> &RasterProfile {
        &self.profile
    }

    pub fn paths(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }

    /// Compute pixel-wise statistics across the whole stack.
    pub fn compute_stats(
        &self,
        store: &dyn RasterStore,
        plan: &StatsPlan,
        config: &StatsConfig,
    ) -> Result<Vec<StatGrid>> {
        compute_stack_stats(store, &self.paths(), plan, config)
    }

    /// Fill each entry's observed-count field with a parallel scan.
    pub fn count_observations(&mut self, store: &dyn RasterStore, pool: &WorkerPool) -> Result<()> {
        let counts = scan_observed(store, &self.paths(), pool)?;
        for (entry, observed) in self.entries.iter_mut().zip(counts) {
            entry.observed = Some(observed);
        }
        Ok(())
    }
}

/// One member of a [`RasterTimeSeries`] with its calendar attributes.
#[derive(Debug, Clone)]
pub struct SeriesEntry {
    pub path: String,
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    /// Day of year, 1-366.
    pub doy: u16,
    pub season: Season,
    /// Divisor-based quarter (see [`CalendarPolicy::quarter`]).
    pub quarter: u8,
    /// Per-band count of valid pixels, filled by a dedicated scan.
    pub observed: Option<Vec<u64>>,
}

/// A raster stack whose members carry acquisition dates.
///
/// Entries are kept sorted ascending by date and reindexed from zero.
#[derive(Debug, Clone)]
pub struct RasterTimeSeries {
    entries: Vec<SeriesEntry>,
    extent: Extent,
    profile: RasterProfile,
    calendar: CalendarPolicy,
}

impl RasterTimeSeries {
    /// Build a time series with the default calendar policy.
    pub fn new(
        store: &dyn RasterStore,
        files: Vec<String>,
        dates: Vec<NaiveDate>,
    ) -> Result<Self> {
        Self::with_calendar(store, files, dates, CalendarPolicy::default())
    }

    /// Build a time series, classifying entries with a custom calendar.
    pub fn with_calendar(
        store: &dyn RasterStore,
        files: Vec<String>,
        dates: Vec<NaiveDate>,
        calendar: CalendarPolicy,
    ) -> Result<Self> {
        if dates.len() != files.len() {
            return Err(StackError::invalid_parameter(
                "dates",
                format!(
                    "dates ({}) should be the same length as files ({})",
                    dates.len(),
                    files.len()
                ),
            ));
        }

        let stack = RasterStack::new(store, files)?;
        let mut entries: Vec<SeriesEntry> = stack
            .entries
            .iter()
            .zip(dates)
            .map(|(entry, date)| {
                let attrs = calendar.classify(date);
                SeriesEntry {
                    path: entry.path.clone(),
                    date,
                    year: attrs.year,
                    month: attrs.month,
                    doy: attrs.doy,
                    season: attrs.season,
                    quarter: attrs.quarter,
                    observed: None,
                }
            })
            .collect();

        entries.sort_by_key(|entry| entry.date);

        Ok(Self {
            entries,
            extent: stack.extent,
            profile: stack.profile,
            calendar,
        })
    }

    pub fn entries(&self) -> &[SeriesEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn extent(&self) -> &Extent {
        &self.extent
    }

    pub fn profile(&self) -> &RasterProfile {
        &self.profile
    }

    pub fn calendar(&self) -> &CalendarPolicy {
        &self.calendar
    }

    pub fn paths(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.path.clone()).collect()
    }

    /// Entries acquired on one day of year.
    pub fn entries_for_doy(&self, doy: u16) -> Vec<&SeriesEntry> {
        self.entries.iter().filter(|e| e.doy == doy).collect()
    }

    /// Compute pixel-wise statistics over the entries kept by `query`.
    ///
    /// The kept entries are re-sorted by date and reindexed before the
    /// reduction; an empty selection is an error.
    pub fn compute_stats(
        &self,
        store: &dyn RasterStore,
        query: &SubsetQuery,
        plan: &StatsPlan,
        config: &StatsConfig,
    ) -> Result<Vec<StatGrid>> {
        let kept = query.apply(&self.entries)?;
        let paths: Vec<String> = kept.iter().map(|e| e.path.clone()).collect();
        compute_stack_stats(store, &paths, plan, config)
    }

    /// Fill each entry's observed-count field with a parallel scan.
    pub fn count_observations(&mut self, store: &dyn RasterStore, pool: &WorkerPool) -> Result<()> {
        let counts = scan_observed(store, &self.paths(), pool)?;
        for (entry, observed) in self.entries.iter_mut().zip(counts) {
            entry.observed = Some(observed);
        }
        Ok(())
    }
}

/// A single multi-band raster reduced across its bands.
#[derive(Debug, Clone)]
pub struct SingleFileStack {
    path: String,
    profile: RasterProfile,
}

impl SingleFileStack {
    pub fn new(store: &dyn RasterStore, path: String) -> Result<Self> {
        let profile = store.open(&path)?.profile().clone();
        Ok(Self { path, profile })
    }

    pub fn profile(&self) -> &RasterProfile {
        &self.profile
    }

    /// Compute pixel-wise statistics across this dataset's bands.
    pub fn compute_stats(
        &self,
        store: &dyn RasterStore,
        statistics: &[Statistic],
        output: Option<&str>,
        config: &StatsConfig,
    ) -> Result<Vec<StatGrid>> {
        compute_band_stats(store, &self.path, statistics, output, config)
    }
}

/// Count valid (finite, non-nodata) pixels per band of each raster.
fn scan_observed(
    store: &dyn RasterStore,
    paths: &[String],
    pool: &WorkerPool,
) -> Result<Vec<Vec<u64>>> {
    let tasks: Vec<_> = paths
        .iter()
        .map(|path| {
            let path = path.clone();
            move || -> Result<Vec<u64>> {
                let reader = store.open(&path)?;
                let profile = reader.profile().clone();
                let mut counts = Vec::with_capacity(profile.count);
                for band in 1..=profile.count {
                    let data = reader.read_band(band)?;
                    let valid = data
                        .iter()
                        .filter(|&&v| {
                            v.is_finite()
                                && profile.nodata.map_or(true, |nd| v as f64 != nd)
                        })
                        .count();
                    counts.push(valid as u64);
                }
                Ok(counts)
            }
        })
        .collect();
    pool.run(tasks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::{GeoTransform, PixelType};
    use raster_store::MemoryStore;

    fn add_raster(store: &MemoryStore, path: &str, data: Vec<f32>) {
        let profile = RasterProfile {
            width: 2,
            height: 2,
            count: 1,
            dtype: PixelType::Float32,
            nodata: Some(-9999.0),
            transform: GeoTransform::from_origin(0.0, 60.0, 30.0, 30.0),
            crs: Some("epsg:32632".to_string()),
            compression: Default::default(),
            block_size: None,
        };
        store.create(path, &profile, &[data]).unwrap();
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_stack_rejects_misaligned_members() {
        let store = MemoryStore::new();
        add_raster(&store, "a.tif", vec![1.0; 4]);

        let profile = RasterProfile {
            width: 2,
            height: 2,
            count: 1,
            dtype: PixelType::Float32,
            nodata: Some(-9999.0),
            transform: GeoTransform::from_origin(30.0, 60.0, 30.0, 30.0),
            crs: Some("epsg:32632".to_string()),
            compression: Default::default(),
            block_size: None,
        };
        store.create("b.tif", &profile, &[vec![1.0; 4]]).unwrap();

        let result = RasterStack::new(
            &store,
            vec!["a.tif".to_string(), "b.tif".to_string()],
        );
        assert!(matches!(result, Err(StackError::ExtentMismatch(_))));
    }

    #[test]
    fn test_series_sorts_by_date_and_classifies() {
        let store = MemoryStore::new();
        add_raster(&store, "summer.tif", vec![1.0; 4]);
        add_raster(&store, "winter.tif", vec![2.0; 4]);

        let series = RasterTimeSeries::new(
            &store,
            vec!["summer.tif".to_string(), "winter.tif".to_string()],
            vec![date(2001, 7, 15), date(2001, 1, 5)],
        )
        .unwrap();

        // reindexed ascending by date
        assert_eq!(series.entries()[0].path, "winter.tif");
        assert_eq!(series.entries()[0].season, Season::Winter);
        assert_eq!(series.entries()[0].month, 1);
        assert_eq!(series.entries()[1].path, "summer.tif");
        assert_eq!(series.entries()[1].season, Season::Summer);
        assert_eq!(series.entries()[1].doy, 196);
        assert_eq!(series.entries()[1].quarter, 196 / 92 + 1);
    }

    #[test]
    fn test_series_rejects_length_mismatch() {
        let store = MemoryStore::new();
        add_raster(&store, "a.tif", vec![1.0; 4]);

        let result = RasterTimeSeries::new(
            &store,
            vec!["a.tif".to_string()],
            vec![date(2001, 1, 1), date(2001, 2, 1)],
        );
        assert!(matches!(
            result,
            Err(StackError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_count_observations() {
        let store = MemoryStore::new();
        add_raster(&store, "a.tif", vec![1.0, -9999.0, 3.0, -9999.0]);
        add_raster(&store, "b.tif", vec![1.0, 2.0, 3.0, 4.0]);

        let mut stack = RasterStack::new(
            &store,
            vec!["a.tif".to_string(), "b.tif".to_string()],
        )
        .unwrap();
        stack
            .count_observations(&store, &WorkerPool::new(2))
            .unwrap();

        assert_eq!(stack.entries()[0].observed, Some(vec![2]));
        assert_eq!(stack.entries()[1].observed, Some(vec![4]));
    }

    #[test]
    fn test_entries_for_doy() {
        let store = MemoryStore::new();
        add_raster(&store, "a.tif", vec![1.0; 4]);
        add_raster(&store, "b.tif", vec![2.0; 4]);
        add_raster(&store, "c.tif", vec![3.0; 4]);

        let series = RasterTimeSeries::new(
            &store,
            vec!["a.tif".to_string(), "b.tif".to_string(), "c.tif".to_string()],
            vec![date(2000, 3, 1), date(2001, 3, 1), date(2001, 3, 2)],
        )
        .unwrap();

        // doy 61 is Mar 1 in a non-leap year, Mar 1 2000 is doy 61 too
        let matches = series.entries_for_doy(61);
        assert_eq!(matches.len(), 2);
    }
}
