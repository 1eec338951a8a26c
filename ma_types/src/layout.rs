use crate::ids::{GeneRef, GridCoords, SpotId, StableId};

/// Structural problems found while building a `GeneIndexMaps`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    /// A per-spot table does not have one entry per spot.
    #[error("table '{table}' has {found} entries, expected {expected}")]
    TableLengthMismatch {
        /// Name of the offending table.
        table: &'static str,
        /// Number of spots on the layout.
        expected: usize,
        /// Number of entries given.
        found: usize,
    },

    /// A spot id points past the end of the layout.
    #[error("spot {spot} is out of range for a layout with {n_spots} spots")]
    SpotOutOfRange {
        /// Offending spot index.
        spot: usize,
        /// Number of spots on the layout.
        n_spots: usize,
    },

    /// Two genes claim the same spot.
    #[error("spot {spot} is assigned to both gene {first} and gene {second}")]
    SpotAssignedTwice {
        /// Spot index.
        spot: usize,
        /// Stable id seen first.
        first: usize,
        /// Stable id seen second.
        second: usize,
    },

    /// The layout must print each clone at least once.
    #[error("fields per clone must be at least 1")]
    ZeroFieldsPerClone,
}

/// Fixed translation tables between the identifier spaces of one array
/// layout. Built once at load time, never mutated.
#[derive(Debug, Clone)]
pub struct GeneIndexMaps {
    spot_by_stable: Vec<Option<SpotId>>,
    stable_by_spot: Vec<Option<StableId>>,
    gang_by_spot: Vec<Option<SpotId>>,
    coords_by_spot: Vec<GridCoords>,
    fields_per_clone: usize,
    calibration_spots: Vec<SpotId>,
}

impl GeneIndexMaps {
    /// Build the maps.
    ///
    /// `spot_by_stable[i]` is the spot of stable id `i`; `gang_by_spot[s]` is
    /// the duplicate spot of spot `s`; `coords_by_spot[s]` is its print
    /// position. The number of spots is `coords_by_spot.len()`.
    pub fn new(
        spot_by_stable: Vec<Option<SpotId>>,
        gang_by_spot: Vec<Option<SpotId>>,
        coords_by_spot: Vec<GridCoords>,
        fields_per_clone: usize,
    ) -> Result<Self, LayoutError> {
        if fields_per_clone == 0 {
            return Err(LayoutError::ZeroFieldsPerClone);
        }
        let n_spots = coords_by_spot.len();
        if gang_by_spot.len() != n_spots {
            return Err(LayoutError::TableLengthMismatch {
                table: "gang_by_spot",
                expected: n_spots,
                found: gang_by_spot.len(),
            });
        }
        for spot in gang_by_spot.iter().flatten() {
            check_spot(*spot, n_spots)?;
        }

        let mut stable_by_spot: Vec<Option<StableId>> = vec![None; n_spots];
        for (i, spot) in spot_by_stable.iter().enumerate() {
            let Some(spot) = spot else { continue };
            check_spot(*spot, n_spots)?;
            if let Some(first) = stable_by_spot[spot.0] {
                return Err(LayoutError::SpotAssignedTwice {
                    spot: spot.0,
                    first: first.0,
                    second: i,
                });
            }
            stable_by_spot[spot.0] = Some(StableId(i));
        }

        Ok(GeneIndexMaps {
            spot_by_stable,
            stable_by_spot,
            gang_by_spot,
            coords_by_spot,
            fields_per_clone,
            calibration_spots: Vec::new(),
        })
    }

    /// Attach the fixed calibration-reference spot set printed on every array.
    pub fn with_calibration_spots(mut self, spots: Vec<SpotId>) -> Result<Self, LayoutError> {
        for spot in &spots {
            check_spot(*spot, self.n_spots())?;
        }
        self.calibration_spots = spots;
        Ok(self)
    }

    /// Number of stable ids (gene slots).
    pub fn n_genes(&self) -> usize {
        self.spot_by_stable.len()
    }

    /// Number of physical spots.
    pub fn n_spots(&self) -> usize {
        self.coords_by_spot.len()
    }

    /// Number of duplicate fields each clone is printed in.
    pub fn fields_per_clone(&self) -> usize {
        self.fields_per_clone
    }

    /// Spot of a stable id, `None` if unassigned or out of range.
    pub fn spot_of(&self, id: StableId) -> Option<SpotId> {
        self.spot_by_stable.get(id.0).copied().flatten()
    }

    /// Stable id printed at a spot.
    pub fn stable_of(&self, spot: SpotId) -> Option<StableId> {
        self.stable_by_spot.get(spot.0).copied().flatten()
    }

    /// Duplicate ("gang") spot of a spot.
    pub fn gang_of(&self, spot: SpotId) -> Option<SpotId> {
        self.gang_by_spot.get(spot.0).copied().flatten()
    }

    /// Print position of a spot.
    pub fn coords_of(&self, spot: SpotId) -> Option<GridCoords> {
        self.coords_by_spot.get(spot.0).copied()
    }

    /// Resolve a stable id into a gene reference.
    pub fn gene_ref(&self, id: StableId) -> GeneRef {
        GeneRef::new(id, self.spot_of(id))
    }

    /// The calibration-reference spot set.
    pub fn calibration_spots(&self) -> &[SpotId] {
        &self.calibration_spots
    }
}

fn check_spot(spot: SpotId, n_spots: usize) -> Result<(), LayoutError> {
    if spot.0 >= n_spots {
        return Err(LayoutError::SpotOutOfRange {
            spot: spot.0,
            n_spots,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn coords(n: usize) -> Vec<GridCoords> {
        (0..n)
            .map(|i| GridCoords::new(1, 1, 1 + i as u32 / 4, 1 + i as u32 % 4))
            .collect()
    }

    #[test]
    fn test_round_trip_lookups() {
        let maps = GeneIndexMaps::new(
            vec![Some(SpotId(2)), None, Some(SpotId(0))],
            vec![Some(SpotId(1)), Some(SpotId(0)), None, None],
            coords(4),
            2,
        )
        .unwrap();
        assert_eq!(maps.n_genes(), 3);
        assert_eq!(maps.n_spots(), 4);
        assert_eq!(maps.spot_of(StableId(0)), Some(SpotId(2)));
        assert_eq!(maps.spot_of(StableId(1)), None);
        assert_eq!(maps.spot_of(StableId(99)), None);
        assert_eq!(maps.stable_of(SpotId(0)), Some(StableId(2)));
        assert_eq!(maps.stable_of(SpotId(3)), None);
        assert_eq!(maps.gang_of(SpotId(0)), Some(SpotId(1)));
        assert_eq!(maps.coords_of(SpotId(3)), Some(GridCoords::new(1, 1, 1, 4)));
        assert_eq!(maps.gene_ref(StableId(2)).spot_id, Some(SpotId(0)));
    }

    #[test]
    fn test_rejects_bad_tables() {
        assert_eq!(
            GeneIndexMaps::new(vec![], vec![None; 3], coords(4), 1).unwrap_err(),
            LayoutError::TableLengthMismatch {
                table: "gang_by_spot",
                expected: 4,
                found: 3
            }
        );
        assert_eq!(
            GeneIndexMaps::new(vec![Some(SpotId(4))], vec![None; 4], coords(4), 1).unwrap_err(),
            LayoutError::SpotOutOfRange {
                spot: 4,
                n_spots: 4
            }
        );
        assert!(matches!(
            GeneIndexMaps::new(
                vec![Some(SpotId(1)), Some(SpotId(1))],
                vec![None; 4],
                coords(4),
                1
            ),
            Err(LayoutError::SpotAssignedTwice {
                spot: 1,
                first: 0,
                second: 1
            })
        ));
        assert_eq!(
            GeneIndexMaps::new(vec![], vec![], vec![], 0).unwrap_err(),
            LayoutError::ZeroFieldsPerClone
        );
    }

    #[test]
    fn test_calibration_spots_checked() {
        let maps = GeneIndexMaps::new(vec![], vec![None; 2], coords(2), 1).unwrap();
        assert!(maps.clone().with_calibration_spots(vec![SpotId(2)]).is_err());
        let maps = maps.with_calibration_spots(vec![SpotId(1)]).unwrap();
        assert_eq!(maps.calibration_spots(), &[SpotId(1)]);
    }

    proptest! {
        #[test]
        fn prop_spot_and_stable_maps_invert(
            (perm, assigned) in (1usize..40).prop_flat_map(|n| (
                Just((0..n).collect::<Vec<usize>>()).prop_shuffle(),
                proptest::collection::vec(any::<bool>(), n),
            ))
        ) {
            let n = perm.len();
            let spot_by_stable: Vec<Option<SpotId>> = perm
                .iter()
                .zip(&assigned)
                .map(|(&spot, &a)| a.then_some(SpotId(spot)))
                .collect();
            let maps = GeneIndexMaps::new(spot_by_stable.clone(), vec![None; n], coords(n), 1)
                .unwrap();
            for (i, spot) in spot_by_stable.iter().enumerate() {
                prop_assert_eq!(maps.spot_of(StableId(i)), *spot);
                if let Some(spot) = spot {
                    prop_assert_eq!(maps.stable_of(*spot), Some(StableId(i)));
                }
            }
            let assigned_spots = (0..n).filter(|&s| maps.stable_of(SpotId(s)).is_some()).count();
            prop_assert_eq!(assigned_spots, assigned.iter().filter(|&&a| a).count());
        }
    }
}
