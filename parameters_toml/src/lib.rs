#![deny(
    future_incompatible,
    nonstandard_style,
    rust_2018_idioms,
    unused,
    deprecated,
    elided_lifetimes_in_paths,
    unconditional_recursion,
    unused_comparisons
)]

use anyhow::{ensure, Context, Result};
use log::warn;
use serde::Deserialize;
use std::path::Path;

/// Tunable constants of the expression analysis core.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Lower clamp bound for ratio histogramming.
    pub min_ratio: f64,
    /// Upper clamp bound for ratio histogramming.
    pub max_ratio: f64,
    /// Ratio used for g1 == 0, g2 > 0, before clamping.
    pub min_ratio_sentinel: f64,
    /// Ratio used for g1 > 0, g2 == 0, before clamping.
    pub max_ratio_sentinel: f64,
    /// CALIBRATE maps the largest scaled raw intensity to this value.
    pub max_intensity_ceiling: f64,
    /// Pixel distance within which a click selects a spot.
    pub locator_dist_threshold: f64,
    /// Number of log-spaced intensity histogram bins.
    pub intensity_hist_bins: usize,
    /// Lower edge of the intensity histogram.
    pub intensity_hist_min: f64,
    /// Upper edge of the intensity histogram.
    pub intensity_hist_max: f64,
    /// Subtract the sample background before any intensity is used.
    pub subtract_background: bool,
}

const DEFAULT_PARAMETERS: Parameters = Parameters {
    min_ratio: 0.01,
    max_ratio: 100.0,
    min_ratio_sentinel: 0.001,
    max_ratio_sentinel: 1000.0,
    max_intensity_ceiling: 65535.0,
    locator_dist_threshold: 10.0,
    intensity_hist_bins: 40,
    intensity_hist_min: 1.0,
    intensity_hist_max: 65536.0,
    subtract_background: true,
};

impl Default for Parameters {
    fn default() -> Self {
        DEFAULT_PARAMETERS
    }
}

macro_rules! warn_non_default {
    ($p:expr, $($a:ident),+) => {
        $(
            if DEFAULT_PARAMETERS.$a != $p.$a {
                warn!("using non-default {} = {:?}", stringify!($a), $p.$a);
            }
        )+
    };
}

impl Parameters {
    /// Load parameters from a TOML file.
    /// A missing file falls back to the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Parameters> {
        if !path.exists() {
            warn!(
                "could not find {}, falling back to defaults",
                path.display()
            );
            return Ok(Parameters::default());
        }
        let s = std::fs::read_to_string(path).with_context(|| path.display().to_string())?;
        Parameters::from_toml_str(&s).with_context(|| path.display().to_string())
    }

    /// Parse and validate parameters from TOML text. Absent keys keep their
    /// default values.
    pub fn from_toml_str(s: &str) -> Result<Parameters> {
        let p: Parameters = toml::from_str(s)?;
        p.validate()?;
        warn_non_default!(
            p,
            min_ratio,
            max_ratio,
            min_ratio_sentinel,
            max_ratio_sentinel,
            max_intensity_ceiling,
            locator_dist_threshold,
            intensity_hist_bins,
            intensity_hist_min,
            intensity_hist_max,
            subtract_background
        );
        Ok(p)
    }

    /// Check the structural constraints between fields.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.min_ratio > 0.0 && self.min_ratio < 1.0 && self.max_ratio > 1.0,
            "ratio range must satisfy 0 < min_ratio < 1 < max_ratio, got [{}, {}]",
            self.min_ratio,
            self.max_ratio
        );
        ensure!(
            self.min_ratio_sentinel >= 0.0 && self.max_ratio_sentinel > 0.0,
            "ratio sentinels must be non-negative, got {} and {}",
            self.min_ratio_sentinel,
            self.max_ratio_sentinel
        );
        ensure!(
            self.max_intensity_ceiling > 0.0,
            "max_intensity_ceiling must be positive, got {}",
            self.max_intensity_ceiling
        );
        ensure!(
            self.locator_dist_threshold > 0.0,
            "locator_dist_threshold must be positive, got {}",
            self.locator_dist_threshold
        );
        ensure!(
            self.intensity_hist_bins >= 1,
            "intensity_hist_bins must be at least 1"
        );
        ensure!(
            self.intensity_hist_min > 0.0 && self.intensity_hist_min < self.intensity_hist_max,
            "intensity histogram range must satisfy 0 < min < max, got [{}, {}]",
            self.intensity_hist_min,
            self.intensity_hist_max
        );
        Ok(())
    }
}
