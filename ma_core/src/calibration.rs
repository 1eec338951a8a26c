//! Cross-sample calibration: scale every valid sample to a common mean over a
//! reference subset, then rescale so the largest scaled raw intensity maps to
//! a fixed ceiling.

use log::{info, warn};
use ma_types::{
    GeneIndexMaps, GeneList, Normalization, SampleCalibration, SampleId, SampleStore, SpotId,
};
use stats_utils::mean_and_std_dev;
use std::collections::BTreeMap;

/// Spots whose intensities define a sample's reference mean.
#[derive(Debug, Clone, Copy)]
pub enum ReferenceSubset<'a> {
    /// The calibration spots printed on every array.
    CalibrationSpots,
    /// The spots of a user-chosen gene set.
    GeneSet(&'a GeneList),
}

impl ReferenceSubset<'_> {
    /// Which slot of `CalibrationState` this subset fills.
    pub fn kind(&self) -> SubsetKind {
        match self {
            ReferenceSubset::CalibrationSpots => SubsetKind::CalibrationSpots,
            ReferenceSubset::GeneSet(_) => SubsetKind::GeneSet,
        }
    }

    fn spots(&self, maps: &GeneIndexMaps) -> Vec<SpotId> {
        match self {
            ReferenceSubset::CalibrationSpots => maps.calibration_spots().to_vec(),
            ReferenceSubset::GeneSet(list) => list
                .iter()
                .filter_map(|g| maps.spot_of(g.stable_id))
                .collect(),
        }
    }
}

/// The two kinds of reference subset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsetKind {
    /// Fixed calibration spots.
    CalibrationSpots,
    /// User gene set.
    GeneSet,
}

/// Calibration failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalibrationError {
    /// No sample has its valid-data flag set.
    #[error("no samples with valid data to calibrate")]
    NoValidSamples,
}

/// Result of one calibration run over one subset kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubsetCalibration {
    /// Mean of the per-sample reference means.
    pub grand_mean: f64,
    /// Ceiling / largest scaled raw maximum.
    pub rescale: f64,
    /// Per valid sample calibration fields.
    pub per_sample: BTreeMap<SampleId, SampleCalibration>,
}

/// Most recent calibration for each subset kind. Stale until recomputed.
#[derive(Debug, Clone, Default)]
pub struct CalibrationState {
    calibration_spots: Option<SubsetCalibration>,
    gene_set: Option<SubsetCalibration>,
}

impl CalibrationState {
    /// Last result for a subset kind.
    pub fn get(&self, kind: SubsetKind) -> Option<&SubsetCalibration> {
        match kind {
            SubsetKind::CalibrationSpots => self.calibration_spots.as_ref(),
            SubsetKind::GeneSet => self.gene_set.as_ref(),
        }
    }

    fn slot(&mut self, kind: SubsetKind) -> &mut Option<SubsetCalibration> {
        match kind {
            SubsetKind::CalibrationSpots => &mut self.calibration_spots,
            SubsetKind::GeneSet => &mut self.gene_set,
        }
    }

    /// Recompute scale factors for every valid sample and write the final
    /// scale back onto each of them.
    ///
    /// A sample whose reference mean is zero gets an infinite scale; this is
    /// logged but not corrected.
    pub fn calibrate(
        &mut self,
        samples: &mut SampleStore,
        maps: &GeneIndexMaps,
        subset: ReferenceSubset<'_>,
        ceiling: f64,
        subtract_background: bool,
    ) -> Result<&SubsetCalibration, CalibrationError> {
        let spots = subset.spots(maps);

        // Pass 1: reference statistics. The grand mean is kept as a running
        // mean so equal inputs reproduce it exactly.
        let mut per_sample = BTreeMap::new();
        let mut grand_mean = 0.0;
        for (id, sample) in samples.iter().filter(|(_, s)| s.has_valid_data()) {
            let values: Vec<f64> = spots
                .iter()
                .filter_map(|&spot| sample.intensity(spot, Normalization::Raw, subtract_background))
                .collect();
            let (mean, std_dev) = mean_and_std_dev(&values);
            if mean == 0.0 {
                warn!(
                    "sample {} has a zero reference mean over {} spots",
                    sample.name(),
                    values.len()
                );
            }
            per_sample.insert(
                id,
                SampleCalibration {
                    mean,
                    std_dev,
                    scale: 1.0,
                    final_scale: 1.0,
                },
            );
            grand_mean += (mean - grand_mean) / per_sample.len() as f64;
        }
        if per_sample.is_empty() {
            return Err(CalibrationError::NoValidSamples);
        }

        // Pass 2: scale to the grand mean, track the largest scaled maximum.
        let mut largest = f64::NEG_INFINITY;
        for (id, cal) in per_sample.iter_mut() {
            cal.scale = grand_mean / cal.mean;
            if let Some(sample) = samples.get(*id) {
                largest = largest.max(cal.scale * sample.stats().max_raw);
            }
        }

        // Pass 3: rescale to the ceiling and store.
        let rescale = ceiling / largest;
        for (id, cal) in per_sample.iter_mut() {
            cal.final_scale = rescale * cal.scale;
            if let Some(sample) = samples.get_mut(*id) {
                sample.apply_calibration(*cal);
            }
        }
        info!(
            "calibrated {} samples: grand mean {:.4}, rescale {:.6}",
            per_sample.len(),
            grand_mean,
            rescale
        );

        let slot = self.slot(subset.kind());
        Ok(slot.insert(SubsetCalibration {
            grand_mean,
            rescale,
            per_sample,
        }))
    }
}
