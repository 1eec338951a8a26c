use crate::ids::{PixelCoord, SampleId, SpotId};
use crate::layout::LayoutError;
use serde::{Deserialize, Serialize};

/// Background intensity of a sample.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Background {
    /// No background estimate.
    #[default]
    None,
    /// One value for the whole array.
    Scalar(f64),
    /// One value per spot.
    PerSpot(Vec<f64>),
}

/// Whether intensities are read as quantified or multiplied by the sample's
/// calibration factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Normalization {
    /// Background-corrected raw intensity.
    Raw,
    /// Raw intensity times the sample's final calibration scale.
    #[default]
    Normalized,
}

/// Summary statistics of a sample's intensities.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SampleStats {
    /// Smallest raw intensity.
    pub min_raw: f64,
    /// Largest raw intensity.
    pub max_raw: f64,
    /// Smallest raw intensity after the final calibration scale.
    pub min_scaled: f64,
    /// Largest raw intensity after the final calibration scale.
    pub max_scaled: f64,
}

/// Calibration fields written onto a sample by the calibration engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleCalibration {
    /// Mean over the reference subset.
    pub mean: f64,
    /// Standard deviation over the reference subset.
    pub std_dev: f64,
    /// grand mean / sample mean.
    pub scale: f64,
    /// `scale` times the global rescale-to-ceiling factor.
    pub final_scale: f64,
}

impl Default for SampleCalibration {
    fn default() -> Self {
        SampleCalibration {
            mean: 0.0,
            std_dev: 0.0,
            scale: 1.0,
            final_scale: 1.0,
        }
    }
}

/// One hybridized array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    name: String,
    raw: Vec<f64>,
    background: Background,
    pixels: Vec<PixelCoord>,
    stats: SampleStats,
    valid_data: bool,
    calibration: SampleCalibration,
}

impl Sample {
    /// Create a sample from its raw intensity table (indexed by spot id), its
    /// background and its pseudo-array pixel table (also indexed by spot id).
    /// An empty pixel table means the sample has no image layout.
    pub fn new(
        name: impl Into<String>,
        raw: Vec<f64>,
        background: Background,
        pixels: Vec<PixelCoord>,
    ) -> Result<Self, LayoutError> {
        if !pixels.is_empty() && pixels.len() != raw.len() {
            return Err(LayoutError::TableLengthMismatch {
                table: "pixels",
                expected: raw.len(),
                found: pixels.len(),
            });
        }
        if let Background::PerSpot(b) = &background {
            if b.len() != raw.len() {
                return Err(LayoutError::TableLengthMismatch {
                    table: "background",
                    expected: raw.len(),
                    found: b.len(),
                });
            }
        }
        let (min_raw, max_raw) = if raw.is_empty() {
            (0.0, 0.0)
        } else {
            raw.iter()
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                })
        };
        Ok(Sample {
            name: name.into(),
            valid_data: !raw.is_empty(),
            raw,
            background,
            pixels,
            stats: SampleStats {
                min_raw,
                max_raw,
                min_scaled: min_raw,
                max_scaled: max_raw,
            },
            calibration: SampleCalibration::default(),
        })
    }

    /// Sample name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of spots in the raw table.
    pub fn n_spots(&self) -> usize {
        self.raw.len()
    }

    /// Raw intensity of a spot.
    pub fn raw(&self, spot: SpotId) -> Option<f64> {
        self.raw.get(spot.0).copied()
    }

    /// Background at a spot.
    pub fn background_at(&self, spot: SpotId) -> f64 {
        match &self.background {
            Background::None => 0.0,
            Background::Scalar(b) => *b,
            Background::PerSpot(b) => b.get(spot.0).copied().unwrap_or(0.0),
        }
    }

    /// Intensity of a spot as seen by the engines.
    pub fn intensity(
        &self,
        spot: SpotId,
        normalization: Normalization,
        subtract_background: bool,
    ) -> Option<f64> {
        let mut v = self.raw(spot)?;
        if subtract_background {
            v -= self.background_at(spot);
        }
        Some(match normalization {
            Normalization::Raw => v,
            Normalization::Normalized => v * self.calibration.final_scale,
        })
    }

    /// Pixel position of a spot, the unset sentinel if unknown.
    pub fn pixel(&self, spot: SpotId) -> PixelCoord {
        self.pixels.get(spot.0).copied().unwrap_or_default()
    }

    /// Pixel table indexed by spot id.
    pub fn pixels(&self) -> &[PixelCoord] {
        &self.pixels
    }

    /// Summary statistics.
    pub fn stats(&self) -> &SampleStats {
        &self.stats
    }

    /// True if the sample carries usable data.
    pub fn has_valid_data(&self) -> bool {
        self.valid_data
    }

    /// Mark the sample usable or not.
    pub fn set_valid_data(&mut self, valid: bool) {
        self.valid_data = valid;
    }

    /// Current calibration fields.
    pub fn calibration(&self) -> &SampleCalibration {
        &self.calibration
    }

    /// Store calibration results and refresh the scaled statistics.
    pub fn apply_calibration(&mut self, calibration: SampleCalibration) {
        self.stats.min_scaled = self.stats.min_raw * calibration.final_scale;
        self.stats.max_scaled = self.stats.max_raw * calibration.final_scale;
        self.calibration = calibration;
    }
}

/// Samples of the database in load order.
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    samples: Vec<Sample>,
}

impl SampleStore {
    /// Empty store.
    pub fn new() -> Self {
        SampleStore::default()
    }

    /// Add a sample and return its id.
    pub fn push(&mut self, sample: Sample) -> SampleId {
        self.samples.push(sample);
        SampleId(self.samples.len() - 1)
    }

    /// Sample by id.
    pub fn get(&self, id: SampleId) -> Option<&Sample> {
        self.samples.get(id.0)
    }

    /// Mutable sample by id.
    pub fn get_mut(&mut self, id: SampleId) -> Option<&mut Sample> {
        self.samples.get_mut(id.0)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// True if no samples were loaded.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// All samples with their ids.
    pub fn iter(&self) -> impl Iterator<Item = (SampleId, &Sample)> {
        self.samples
            .iter()
            .enumerate()
            .map(|(i, s)| (SampleId(i), s))
    }

    /// Ids of samples with valid data, in load order.
    pub fn valid_ids(&self) -> Vec<SampleId> {
        self.iter()
            .filter(|(_, s)| s.has_valid_data())
            .map(|(id, _)| id)
            .collect()
    }
}
