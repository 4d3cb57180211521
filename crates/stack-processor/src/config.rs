//! Configuration for stack processing.

use serde::{Deserialize, Serialize};

/// Output-dtype widening applied to computed statistics.
///
/// Floating-point source dtypes are always preserved; the variants differ in
/// how integer sources are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WideningPolicy {
    /// Widen only unsigned 8-bit sources to signed 16-bit; keep every other
    /// integer dtype.
    #[default]
    Uint8Only,
    /// Widen every integer source dtype to signed 16-bit.
    AllIntegers,
}

impl WideningPolicy {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "all_integers" | "all" => Self::AllIntegers,
            _ => Self::Uint8Only,
        }
    }
}

/// Configuration for the chunked stats engine and batch operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Number of raster rows processed per chunk. The sole memory knob:
    /// peak per-chunk memory is about
    /// `#files * chunk_rows * width * 4` bytes per in-flight chunk.
    pub chunk_rows: usize,

    /// Worker count for parallel sections. 1 runs everything sequentially.
    pub jobs: usize,

    /// Output-dtype widening policy.
    pub widening: WideningPolicy,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            chunk_rows: 100,
            jobs: 1,
            widening: WideningPolicy::default(),
        }
    }
}

impl StatsConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("STACK_CHUNK_ROWS") {
            if let Ok(rows) = val.parse() {
                config.chunk_rows = rows;
            }
        }

        if let Ok(val) = std::env::var("STACK_JOBS") {
            if let Ok(jobs) = val.parse() {
                config.jobs = jobs;
            }
        }

        if let Ok(val) = std::env::var("STACK_WIDENING") {
            config.widening = WideningPolicy::from_str(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_rows == 0 {
            return Err("chunk_rows must be > 0".to_string());
        }

        if self.jobs == 0 {
            return Err("jobs must be > 0".to_string());
        }

        Ok(())
    }
}
