//! ma_types
//!
//! Data model shared by the expression analysis engines: the identifier
//! spaces of an array layout, genes and their cached values, samples and
//! their intensity tables, and gene-list filters.
#![deny(missing_docs)]

mod filter;
mod gene;
mod ids;
mod layout;
mod sample;

pub use filter::{AcceptAll, GeneFilter, GeneList};
pub use gene::{DerivedValues, Gene, GeneProps, GeneTable};
pub use ids::{GeneRef, GridCoords, PixelCoord, SampleId, SpotId, StableId};
pub use layout::{GeneIndexMaps, LayoutError};
pub use sample::{
    Background, Normalization, Sample, SampleCalibration, SampleStats, SampleStore,
};
