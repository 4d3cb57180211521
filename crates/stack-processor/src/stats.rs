//! Chunked pixel-wise statistics across a raster stack.

use raster_common::PixelType;
use raster_store::{Compression, RasterStore};

use crate::config::{StatsConfig, WideningPolicy};
use crate::error::{Result, StackError};
use crate::extent::equal_extents;
use crate::pool::WorkerPool;

/// A per-pixel statistic computed across the stack axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    /// Number of valid observations.
    Count,
    Mean,
    Median,
    /// Population standard deviation.
    StdDev,
}

impl Statistic {
    /// Parse a statistic name.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "nobs" | "count" => Ok(Self::Count),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "std" => Ok(Self::StdDev),
            _ => Err(StackError::UnsupportedStatistic(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "nobs",
            Self::Mean => "mean",
            Self::Median => "median",
            Self::StdDev => "std",
        }
    }

    /// Every supported statistic, in canonical order.
    pub fn all() -> &'static [Statistic] {
        &[Self::Count, Self::Mean, Self::Median, Self::StdDev]
    }
}

impl std::fmt::Display for Statistic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Marks stack cells invalid wherever a mask band matches a value.
#[derive(Debug, Clone, Copy)]
pub struct MaskRule {
    /// Band holding the mask (1-based).
    pub band: usize,
    /// Mask-band value flagging an invalid cell.
    pub value: f32,
}

impl MaskRule {
    pub fn new(band: usize) -> Self {
        Self { band, value: 1.0 }
    }
}

/// What to compute over a stack.
#[derive(Debug, Clone)]
pub struct StatsPlan {
    /// Data band to reduce (1-based).
    pub band: usize,
    /// Statistics to compute, in output order.
    pub statistics: Vec<Statistic>,
    /// Optional pre-reduction mask.
    pub mask: Option<MaskRule>,
    /// Optional output dataset path; statistics are stacked as its bands.
    pub output: Option<String>,
}

impl Default for StatsPlan {
    fn default() -> Self {
        Self {
            band: 1,
            statistics: Statistic::all().to_vec(),
            mask: None,
            output: None,
        }
    }
}

impl StatsPlan {
    fn validate(&self) -> Result<()> {
        if self.statistics.is_empty() {
            return Err(StackError::invalid_parameter(
                "stats",
                "at least one statistic is required",
            ));
        }
        if let Some(mask) = &self.mask {
            if mask.band == self.band {
                return Err(StackError::invalid_parameter(
                    "maskband",
                    "band number and maskband number should not be the same",
                ));
            }
        }
        Ok(())
    }
}

/// One computed statistic over the full stack extent.
#[derive(Debug, Clone)]
pub struct StatGrid {
    pub statistic: Statistic,
    /// Row-major values, already encoded to `dtype`'s representable set.
    pub data: Vec<f32>,
    pub width: usize,
    pub height: usize,
    pub dtype: PixelType,
}

/// Output dtype for a given source dtype under a widening policy.
pub fn resolve_output_dtype(source: PixelType, policy: WideningPolicy) -> PixelType {
    match policy {
        WideningPolicy::Uint8Only => match source {
            PixelType::Uint8 => PixelType::Int16,
            other => other,
        },
        WideningPolicy::AllIntegers => {
            if source.is_float() {
                source
            } else {
                PixelType::Int16
            }
        }
    }
}

/// Mark values invalid (NaN) wherever the mask band matches `mask_value`.
///
/// Applied per member before the reduction, so the statistic math never
/// sees mask semantics.
pub fn mask_invalid(values: &mut [f32], mask: &[f32], mask_value: f32) {
    for (value, &flag) in values.iter_mut().zip(mask) {
        if flag == mask_value {
            *value = f32::NAN;
        }
    }
}

/// Recode nodata and non-finite cells to NaN.
pub fn recode_missing(values: &mut [f32], nodata: f64) {
    let nodata_is_nan = nodata.is_nan();
    for value in values.iter_mut() {
        if *value as f64 == nodata || nodata_is_nan && value.is_nan() || !value.is_finite() {
            *value = f32::NAN;
        }
    }
}

/// Compute pixel-wise statistics across a stack of aligned rasters.
///
/// Work proceeds in row chunks of `config.chunk_rows`; each chunk reads the
/// requested band of every member (opening and dropping the handle within
/// the chunk), masks and recodes invalid cells, reduces across the member
/// axis and encodes to the resolved output dtype. Chunks are independent
/// units dispatched through the worker pool and reassembled strictly by
/// ascending row index.
///
/// Alignment is validated before any chunk work begins. A pixel with zero
/// valid observations comes out as the source nodata value in every
/// statistic. With `plan.output` set, the statistics are also written as a
/// multi-band LZW-compressed dataset in requested order.
pub fn compute_stack_stats(
    store: &dyn RasterStore,
    paths: &[String],
    plan: &StatsPlan,
    config: &StatsConfig,
) -> Result<Vec<StatGrid>> {
    plan.validate()?;
    config
        .validate()
        .map_err(|message| StackError::invalid_parameter("config", message))?;
    if paths.is_empty() {
        return Err(StackError::invalid_parameter(
            "files",
            "at least one raster is required",
        ));
    }
    if !equal_extents(store, paths, true)? {
        return Err(StackError::ExtentMismatch(format!(
            "{} input rasters",
            paths.len()
        )));
    }

    let reference = {
        let reader = store.open(&paths[0])?;
        reader.profile().clone()
    };
    let nodata = reference
        .nodata
        .ok_or_else(|| StackError::MissingNodata(paths[0].clone()))?;
    let out_dtype = resolve_output_dtype(reference.dtype, config.widening);

    let (width, height) = (reference.width, reference.height);
    let pool = WorkerPool::new(config.jobs);
    let chunk_rows = config.chunk_rows;

    let tasks: Vec<_> = (0..height)
        .step_by(chunk_rows)
        .map(|start| {
            let rows = chunk_rows.min(height - start);
            let paths = paths.to_vec();
            let plan = plan.clone();
            move || -> Result<ChunkStats> {
                let bands = reduce_stack_chunk(
                    store, &paths, &plan, width, nodata, out_dtype, start, rows,
                )?;
                Ok(ChunkStats { start, bands })
            }
        })
        .collect();

    let mut chunks = pool.run(tasks)?;
    chunks.sort_by_key(|chunk| chunk.start);

    finish_stats(store, plan, &reference, out_dtype, chunks)
}

/// Statistics across the bands of one multi-band raster.
///
/// Same chunked reduction as [`compute_stack_stats`], with the member axis
/// running over the dataset's bands instead of a file list.
pub fn compute_band_stats(
    store: &dyn RasterStore,
    path: &str,
    statistics: &[Statistic],
    output: Option<&str>,
    config: &StatsConfig,
) -> Result<Vec<StatGrid>> {
    let plan = StatsPlan {
        band: 1,
        statistics: statistics.to_vec(),
        mask: None,
        output: output.map(|s| s.to_string()),
    };
    plan.validate()?;
    config
        .validate()
        .map_err(|message| StackError::invalid_parameter("config", message))?;

    let reference = {
        let reader = store.open(path)?;
        reader.profile().clone()
    };
    let nodata = reference
        .nodata
        .ok_or_else(|| StackError::MissingNodata(path.to_string()))?;
    let out_dtype = resolve_output_dtype(reference.dtype, config.widening);

    let (width, height, count) = (reference.width, reference.height, reference.count);
    let pool = WorkerPool::new(config.jobs);

    let tasks: Vec<_> = (0..height)
        .step_by(config.chunk_rows)
        .map(|start| {
            let rows = config.chunk_rows.min(height - start);
            let path = path.to_string();
            let statistics = plan.statistics.clone();
            move || -> Result<ChunkStats> {
                let reader = store.open(&path)?;
                let mut buffer = Vec::with_capacity(count * rows * width);
                for band in 1..=count {
                    buffer.extend(reader.read_band_window(band, start..start + rows)?);
                }
                drop(reader);

                recode_missing(&mut buffer, nodata);
                let bands = reduce_buffer(
                    &buffer,
                    count,
                    rows * width,
                    &statistics,
                    nodata as f32,
                    out_dtype,
                );
                Ok(ChunkStats { start, bands })
            }
        })
        .collect();

    let mut chunks = pool.run(tasks)?;
    chunks.sort_by_key(|chunk| chunk.start);

    finish_stats(store, &plan, &reference, out_dtype, chunks)
}

struct ChunkStats {
    start: usize,
    /// One buffer per requested statistic, in plan order.
    bands: Vec<Vec<f32>>,
}

/// Read and reduce one row chunk of the stack.
#[allow(clippy::too_many_arguments)]
fn reduce_stack_chunk(
    store: &dyn RasterStore,
    paths: &[String],
    plan: &StatsPlan,
    width: usize,
    nodata: f64,
    out_dtype: PixelType,
    start: usize,
    rows: usize,
) -> Result<Vec<Vec<f32>>> {
    let pixels = rows * width;
    let mut buffer = Vec::with_capacity(paths.len() * pixels);

    tracing::debug!(start, rows, files = paths.len(), "reducing stack chunk");
    for path in paths {
        let reader = store.open(path)?;
        let mut member = reader.read_band_window(plan.band, start..start + rows)?;
        if let Some(mask) = &plan.mask {
            let flags = reader.read_band_window(mask.band, start..start + rows)?;
            mask_invalid(&mut member, &flags, mask.value);
        }
        buffer.extend(member);
        // handle dropped here; the next chunk reopens it
    }

    recode_missing(&mut buffer, nodata);
    Ok(reduce_buffer(
        &buffer,
        paths.len(),
        pixels,
        &plan.statistics,
        nodata as f32,
        out_dtype,
    ))
}

/// Reduce a (members x pixels) buffer across the member axis.
///
/// NaN cells are ignored; a pixel with no valid cells yields `nodata` in
/// every statistic. Results are encoded to `out_dtype`.
fn reduce_buffer(
    buffer: &[f32],
    members: usize,
    pixels: usize,
    statistics: &[Statistic],
    nodata: f32,
    out_dtype: PixelType,
) -> Vec<Vec<f32>> {
    let mut bands: Vec<Vec<f32>> = statistics.iter().map(|_| vec![0.0; pixels]).collect();
    let needs_sort = statistics.contains(&Statistic::Median);

    let mut valid = Vec::with_capacity(members);
    for pixel in 0..pixels {
        valid.clear();
        for member in 0..members {
            let value = buffer[member * pixels + pixel];
            if value.is_finite() {
                valid.push(value);
            }
        }
        if needs_sort {
            valid.sort_by(|a, b| a.total_cmp(b));
        }

        for (band, statistic) in bands.iter_mut().zip(statistics) {
            let value = if valid.is_empty() {
                nodata
            } else {
                match statistic {
                    Statistic::Count => valid.len() as f32,
                    Statistic::Mean => mean(&valid),
                    Statistic::Median => median_of_sorted(&valid),
                    Statistic::StdDev => population_std(&valid),
                }
            };
            band[pixel] = out_dtype.cast(value);
        }
    }

    bands
}

fn mean(values: &[f32]) -> f32 {
    let sum: f64 = values.iter().map(|&v| v as f64).sum();
    (sum / values.len() as f64) as f32
}

/// Median of an ascending-sorted slice; even counts average the middle pair.
fn median_of_sorted(values: &[f32]) -> f32 {
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

fn population_std(values: &[f32]) -> f32 {
    let m = mean(values) as f64;
    let sum_sq: f64 = values
        .iter()
        .map(|&v| {
            let d = v as f64 - m;
            d * d
        })
        .sum();
    (sum_sq / values.len() as f64).sqrt() as f32
}

/// Concatenate ordered chunks and optionally persist the result.
fn finish_stats(
    store: &dyn RasterStore,
    plan: &StatsPlan,
    reference: &raster_store::RasterProfile,
    out_dtype: PixelType,
    chunks: Vec<ChunkStats>,
) -> Result<Vec<StatGrid>> {
    let (width, height) = (reference.width, reference.height);

    let mut grids: Vec<StatGrid> = plan
        .statistics
        .iter()
        .map(|&statistic| StatGrid {
            statistic,
            data: Vec::with_capacity(width * height),
            width,
            height,
            dtype: out_dtype,
        })
        .collect();

    for chunk in chunks {
        for (grid, band) in grids.iter_mut().zip(chunk.bands) {
            grid.data.extend(band);
        }
    }

    if let Some(outfile) = &plan.output {
        let profile = reference.with_output(
            plan.statistics.len(),
            out_dtype,
            Compression::Lzw,
        );
        let bands: Vec<Vec<f32>> = grids.iter().map(|grid| grid.data.clone()).collect();
        store.create(outfile, &profile, &bands)?;
        tracing::debug!(outfile = %outfile, bands = profile.count, "wrote statistics dataset");
    }

    Ok(grids)
}
