//! ma_core
//!
//! Analytical engines of the expression explorer: composite data extraction,
//! ratio and intensity histograms, cross-sample calibration, the sample
//! correlation table and the current-gene locator. `ExplorerSession` owns
//! their state and is the entry point for an interactive front end.
#![deny(missing_docs)]

pub mod calibration;
pub mod correlation;
pub mod extract;
pub mod histogram;
pub mod locator;
pub mod session;

pub use calibration::{
    CalibrationError, CalibrationState, ReferenceSubset, SubsetCalibration, SubsetKind,
};
pub use correlation::{CorrelationMatrix, CorrelationMatrixEngine, LogProgress, Progress};
pub use extract::{
    CompositeDataExtractor, Destination, ExtractMode, Extrema, FieldMode, PairedExtraction,
    Population, SampleSetAggregator, SetAggregator, SetMeanExtraction, SetStats, ValueKind,
};
pub use histogram::{Histogram, HistogramError, RatioRule, RATIO_BIN_EDGES};
pub use locator::{CurrentGene, CurrentGeneLocator, JumpOutcome, SpotHit};
pub use session::{ExplorerSession, HistogramRun};
