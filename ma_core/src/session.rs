//! `ExplorerSession`: the one owner of all analytical state, through which
//! every engine is driven.

use crate::calibration::{
    CalibrationError, CalibrationState, ReferenceSubset, SubsetCalibration,
};
use crate::correlation::{CorrelationMatrix, CorrelationMatrixEngine, Progress};
use crate::extract::{
    CompositeDataExtractor, Destination, ExtractMode, Extrema, FieldMode, PairedExtraction,
    Population, SampleSetAggregator, SetMeanExtraction,
};
use crate::histogram::{Histogram, HistogramError, RatioRule};
use crate::locator::{CurrentGene, CurrentGeneLocator, JumpOutcome, SpotHit};
use log::debug;
use ma_types::{
    AcceptAll, GeneFilter, GeneIndexMaps, GeneList, GeneProps, GeneTable, Normalization,
    PixelCoord, SampleId, SampleStore, StableId,
};
use parameters_toml::Parameters;
use std::ops::RangeInclusive;

/// Summary of one histogram batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramRun {
    /// Values binned; equals the sum of the counts.
    pub processed: usize,
    /// X/Y extrema of the extraction that fed the batch.
    pub extrema: Extrema,
}

/// Owns the layout, genes, samples, active filter and every engine's state.
pub struct ExplorerSession {
    params: Parameters,
    maps: GeneIndexMaps,
    genes: GeneTable,
    samples: SampleStore,
    filter: Option<GeneList>,
    ratio_hist: Histogram,
    intensity_hist: Histogram,
    calibration: CalibrationState,
    correlation: Option<CorrelationMatrix>,
    locator: CurrentGeneLocator,
}

fn extractor<'a>(
    maps: &'a GeneIndexMaps,
    samples: &'a SampleStore,
    filter: &'a Option<GeneList>,
    subtract_background: bool,
) -> CompositeDataExtractor<'a> {
    let filter: &dyn GeneFilter = match filter {
        Some(list) => list,
        None => &AcceptAll,
    };
    CompositeDataExtractor::new(maps, samples, filter, subtract_background)
}

impl ExplorerSession {
    /// New session. Genes printed on calibration spots are flagged
    /// `CALIBRATION_DNA`. Fails if the configured histogram geometry is
    /// unusable.
    pub fn new(
        params: Parameters,
        maps: GeneIndexMaps,
        mut genes: GeneTable,
        samples: SampleStore,
    ) -> Result<Self, HistogramError> {
        for &spot in maps.calibration_spots() {
            if let Some(gene) = maps.stable_of(spot).and_then(|id| genes.get_mut(id)) {
                gene.props.insert(GeneProps::CALIBRATION_DNA);
            }
        }
        Ok(ExplorerSession {
            ratio_hist: Histogram::ratio(&params)?,
            intensity_hist: Histogram::intensity(&params)?,
            params,
            maps,
            genes,
            samples,
            filter: None,
            calibration: CalibrationState::default(),
            correlation: None,
            locator: CurrentGeneLocator::new(),
        })
    }

    /// Active parameters.
    pub fn params(&self) -> &Parameters {
        &self.params
    }

    /// Layout tables.
    pub fn maps(&self) -> &GeneIndexMaps {
        &self.maps
    }

    /// Gene table with the last extraction's cached values.
    pub fn genes(&self) -> &GeneTable {
        &self.genes
    }

    /// Loaded samples.
    pub fn samples(&self) -> &SampleStore {
        &self.samples
    }

    /// Mutable access to the samples, e.g. to toggle validity. Calibration
    /// and correlation results go stale until recomputed.
    pub fn samples_mut(&mut self) -> &mut SampleStore {
        &mut self.samples
    }

    /// Replace the active filter; `None` lets every gene pass. Members of the
    /// list are flagged `IN_EDITED_LIST`.
    pub fn set_filter(&mut self, filter: Option<GeneList>) {
        debug!(
            "filter set to {}",
            filter.as_ref().map_or("<all genes>", |f| f.name())
        );
        for gene in self.genes.iter_mut() {
            let member = filter.as_ref().map_or(false, |f| f.contains(gene.stable_id()));
            gene.props.set(GeneProps::IN_EDITED_LIST, member);
        }
        self.filter = filter;
    }

    /// Active filter, if any.
    pub fn filter(&self) -> Option<&GeneList> {
        self.filter.as_ref()
    }

    /// Paired extraction of `x` against `y` through the active filter.
    pub fn extract_paired(
        &mut self,
        population: Population<'_>,
        x: SampleId,
        y: SampleId,
        mode: ExtractMode,
        dest: Destination,
    ) -> PairedExtraction {
        let ex = extractor(
            &self.maps,
            &self.samples,
            &self.filter,
            self.params.subtract_background,
        );
        ex.extract_paired(&mut self.genes, population, x, y, mode, dest)
    }

    /// Group-mean extraction with the store-backed aggregator.
    pub fn extract_set_mean(
        &mut self,
        population: Population<'_>,
        x_set: &[SampleId],
        y_set: &[SampleId],
        normalization: Normalization,
        fields: FieldMode,
        dest: Destination,
    ) -> SetMeanExtraction {
        let subtract = self.params.subtract_background;
        let ex = extractor(&self.maps, &self.samples, &self.filter, subtract);
        let agg =
            SampleSetAggregator::new(&self.maps, &self.samples, normalization, fields, subtract);
        ex.extract_set_mean(&mut self.genes, population, x_set, y_set, dest, &agg)
    }

    /// Extract the filtered population of `x` against `y` and rebuild the
    /// ratio histogram from it.
    pub fn bin_ratios(&mut self, x: SampleId, y: SampleId, mode: ExtractMode) -> HistogramRun {
        let pair = self.extract_paired(
            Population::Filtered,
            x,
            y,
            mode,
            Destination::with_capacity(usize::MAX),
        );
        let rule = RatioRule::from_parameters(&self.params);
        HistogramRun {
            processed: self.ratio_hist.bin_ratios(&pair.x, &pair.y, &rule),
            extrema: pair.extrema,
        }
    }

    /// Rebuild the intensity histogram from sample `x`.
    pub fn bin_intensities(&mut self, x: SampleId, mode: ExtractMode) -> HistogramRun {
        let pair = self.extract_paired(
            Population::Filtered,
            x,
            x,
            mode,
            Destination::with_capacity(usize::MAX),
        );
        HistogramRun {
            processed: self.intensity_hist.bin_values(&pair.x),
            extrema: pair.extrema,
        }
    }

    /// Ratio histogram of the last `bin_ratios` call.
    pub fn ratio_histogram(&self) -> &Histogram {
        &self.ratio_hist
    }

    /// Intensity histogram of the last `bin_intensities` call.
    pub fn intensity_histogram(&self) -> &Histogram {
        &self.intensity_hist
    }

    /// Refill `out` with the filtered genes whose last ratio falls in `bins`
    /// of the ratio histogram.
    pub fn select_ratio_bins(&self, bins: RangeInclusive<usize>, out: &mut GeneList) -> usize {
        let candidates = self
            .genes
            .iter()
            .filter(|g| self.filter.as_ref().map_or(true, |f| f.passes(g.stable_id())))
            .map(|g| &g.gene_ref);
        self.ratio_hist
            .select_genes_in_bins(&self.genes, candidates, bins, out)
    }

    /// Recalibrate every valid sample against `subset`.
    pub fn calibrate(
        &mut self,
        subset: ReferenceSubset<'_>,
    ) -> Result<&SubsetCalibration, CalibrationError> {
        self.calibration.calibrate(
            &mut self.samples,
            &self.maps,
            subset,
            self.params.max_intensity_ceiling,
            self.params.subtract_background,
        )
    }

    /// Last calibration results per subset kind.
    pub fn calibration(&self) -> &CalibrationState {
        &self.calibration
    }

    /// Recompute the sample correlation table over the filtered population.
    pub fn compute_correlation(&mut self, progress: &mut dyn Progress) -> &CorrelationMatrix {
        let ex = extractor(
            &self.maps,
            &self.samples,
            &self.filter,
            self.params.subtract_background,
        );
        let m = CorrelationMatrixEngine::compute(&ex, &mut self.genes, &self.samples, progress);
        self.correlation.insert(m)
    }

    /// Last computed correlation table.
    pub fn correlation(&self) -> Option<&CorrelationMatrix> {
        self.correlation.as_ref()
    }

    /// Resolve a click on `sample`'s image to the nearest spot within the
    /// configured threshold.
    pub fn locate(&mut self, sample: SampleId, at: PixelCoord) -> Option<SpotHit> {
        let s = self.samples.get(sample)?;
        self.locator
            .locate(&self.maps, s, at, self.params.locator_dist_threshold)
    }

    /// `locate`, reduced to the label; empty when nothing was found.
    pub fn locate_label(&mut self, sample: SampleId, at: PixelCoord) -> String {
        self.locate(sample, at)
            .map(|hit| hit.label)
            .unwrap_or_default()
    }

    /// Point the current gene at `id`, taking pixel positions from `sample`.
    pub fn jump_to_stable_id<F>(
        &mut self,
        sample: Option<SampleId>,
        id: StableId,
        refresh: F,
    ) -> JumpOutcome
    where
        F: FnMut(&mut CurrentGeneLocator),
    {
        let s = sample.and_then(|sid| self.samples.get(sid));
        self.locator.jump_to_stable_id(&self.maps, s, id, refresh)
    }

    /// The current-gene cursor.
    pub fn current_gene(&self) -> &CurrentGene {
        self.locator.cursor()
    }
}
