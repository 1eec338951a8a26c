//! Pixel to nearest-spot lookup and the shared "current gene" cursor.

use log::debug;
use ma_types::{GeneIndexMaps, GridCoords, PixelCoord, Sample, SpotId, StableId};
use std::panic::{self, AssertUnwindSafe};

/// The gene every view highlights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CurrentGene {
    /// False until something is located, and after a failed lookup.
    pub valid: bool,
    /// Stable id of the gene.
    pub stable_id: StableId,
    /// Spot the gene is printed at.
    pub spot_id: Option<SpotId>,
    /// Its duplicate spot, if printed twice.
    pub gang_spot_id: Option<SpotId>,
    /// Print position of `spot_id`.
    pub coords: GridCoords,
    /// Pixel position of `spot_id` on the sample's pseudo-array.
    pub pixel: PixelCoord,
}

impl CurrentGene {
    /// `#id F.. G.. R.. C.. (x,y)`, or an empty string when invalid.
    pub fn label(&self) -> String {
        if !self.valid {
            return String::new();
        }
        format!("{} {} {}", self.stable_id, self.coords, self.pixel)
    }
}

/// Best spot found by `locate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotHit {
    /// Gene at the spot.
    pub stable_id: StableId,
    /// The spot.
    pub spot_id: SpotId,
    /// Squared pixel distance to the query.
    pub distance_sq: i64,
    /// Coordinate label of the spot.
    pub label: String,
}

/// Outcome of `jump_to_stable_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpOutcome {
    /// The cursor now points at the gene and the refresh ran.
    Moved,
    /// The gene has no spot; the cursor is unchanged.
    NotFound,
    /// A jump was already in progress.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum UpdateState {
    #[default]
    Idle,
    Updating,
}

/// Owns the current-gene cursor.
#[derive(Debug, Clone, Default)]
pub struct CurrentGeneLocator {
    cursor: CurrentGene,
    state: UpdateState,
}

impl CurrentGeneLocator {
    /// New locator with an invalid cursor.
    pub fn new() -> Self {
        CurrentGeneLocator::default()
    }

    /// The current gene.
    pub fn cursor(&self) -> &CurrentGene {
        &self.cursor
    }

    /// True while a jump is running its refresh.
    pub fn is_updating(&self) -> bool {
        self.state == UpdateState::Updating
    }

    /// Find the spot of `sample` closest to `at`, strictly within
    /// `dist_threshold` pixels.
    ///
    /// Every spot is scanned. Spots with no gene or with an unset pixel are
    /// skipped. The cursor follows each improvement and is invalidated when
    /// nothing qualifies.
    pub fn locate(
        &mut self,
        maps: &GeneIndexMaps,
        sample: &Sample,
        at: PixelCoord,
        dist_threshold: f64,
    ) -> Option<SpotHit> {
        let limit = dist_threshold * dist_threshold;
        let mut best: Option<(SpotId, StableId, i64)> = None;
        for spot in (0..maps.n_spots()).map(SpotId) {
            let Some(stable_id) = maps.stable_of(spot) else {
                continue;
            };
            let pixel = sample.pixel(spot);
            if !pixel.is_set() {
                continue;
            }
            let d = pixel.dist_sq(at);
            let closer = best.map_or(true, |(_, _, best_d)| d < best_d);
            if closer && (d as f64) < limit {
                best = Some((spot, stable_id, d));
                self.point_at(maps, stable_id, spot, pixel);
            }
        }
        match best {
            Some((spot_id, stable_id, distance_sq)) => Some(SpotHit {
                stable_id,
                spot_id,
                distance_sq,
                label: self.cursor.label(),
            }),
            None => {
                self.cursor.valid = false;
                None
            }
        }
    }

    /// `locate`, reduced to the label; empty when nothing was found.
    pub fn locate_label(
        &mut self,
        maps: &GeneIndexMaps,
        sample: &Sample,
        at: PixelCoord,
        dist_threshold: f64,
    ) -> String {
        self.locate(maps, sample, at, dist_threshold)
            .map(|hit| hit.label)
            .unwrap_or_default()
    }

    /// Point the cursor at a gene by id, then run `refresh`.
    ///
    /// `refresh` may call back into this method; such nested calls return
    /// `Ignored`. `sample` supplies the pixel position, if any. The guard is
    /// released even if `refresh` panics; the panic is then propagated.
    pub fn jump_to_stable_id<F>(
        &mut self,
        maps: &GeneIndexMaps,
        sample: Option<&Sample>,
        id: StableId,
        mut refresh: F,
    ) -> JumpOutcome
    where
        F: FnMut(&mut Self),
    {
        if self.state == UpdateState::Updating {
            debug!("nested jump to {id} ignored");
            return JumpOutcome::Ignored;
        }
        self.state = UpdateState::Updating;
        match maps.spot_of(id) {
            Some(spot) => {
                let pixel = sample.map(|s| s.pixel(spot)).unwrap_or_default();
                self.point_at(maps, id, spot, pixel);
                let refreshed = panic::catch_unwind(AssertUnwindSafe(|| refresh(self)));
                self.state = UpdateState::Idle;
                if let Err(payload) = refreshed {
                    panic::resume_unwind(payload);
                }
                JumpOutcome::Moved
            }
            None => {
                self.state = UpdateState::Idle;
                JumpOutcome::NotFound
            }
        }
    }

    fn point_at(
        &mut self,
        maps: &GeneIndexMaps,
        stable_id: StableId,
        spot: SpotId,
        pixel: PixelCoord,
    ) {
        self.cursor = CurrentGene {
            valid: true,
            stable_id,
            spot_id: Some(spot),
            gang_spot_id: maps.gang_of(spot),
            coords: maps.coords_of(spot).unwrap_or_default(),
            pixel,
        };
    }
}
