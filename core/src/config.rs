use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const DEFAULT_OVERLAP_EPSILON: f64 = 1e-6;
pub const DEFAULT_IDF_SMOOTHING: f64 = 1.0;
pub const DEFAULT_IDF_OFFSET: f64 = 1.0;
pub const DEFAULT_TOP_K: usize = 20;
pub const DEFAULT_HISTOGRAM_BINS: usize = 50;

/// Tunable constants for the analyses.
///
/// With the defaults, IDF is `ln((N + 1) / (df + 1)) + 1` and overlap ratios
/// divide by `|query tokens| + 1e-6`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub overlap_epsilon: f64,
    pub idf_smoothing: f64,
    pub idf_offset: f64,
    pub top_k: usize,
    pub histogram_bins: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            overlap_epsilon: DEFAULT_OVERLAP_EPSILON,
            idf_smoothing: DEFAULT_IDF_SMOOTHING,
            idf_offset: DEFAULT_IDF_OFFSET,
            top_k: DEFAULT_TOP_K,
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON object; missing fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: AnalysisConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.overlap_epsilon.is_finite() && self.overlap_epsilon > 0.0) {
            return Err(Error::invalid_argument(format!(
                "overlap_epsilon must be finite and > 0, got {}",
                self.overlap_epsilon
            )));
        }
        if !(self.idf_smoothing.is_finite() && self.idf_smoothing > 0.0) {
            return Err(Error::invalid_argument(format!(
                "idf_smoothing must be finite and > 0, got {}",
                self.idf_smoothing
            )));
        }
        if !self.idf_offset.is_finite() {
            return Err(Error::invalid_argument("idf_offset must be finite"));
        }
        if self.top_k == 0 {
            return Err(Error::invalid_argument("top_k must be positive"));
        }
        if self.histogram_bins == 0 {
            return Err(Error::invalid_argument("histogram_bins must be positive"));
        }
        Ok(())
    }
}
