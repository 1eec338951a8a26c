use crate::ids::{GeneRef, StableId};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Per-gene property bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct GeneProps: u32 {
        /// Spot flagged unusable during quantification.
        const BAD_SPOT = 1;
        /// Spot belongs to the calibration DNA set.
        const CALIBRATION_DNA = 1 << 1;
        /// Emitted by an extraction although it failed the active filter.
        const NOT_FILTERED = 1 << 2;
        /// Member of the user's edited gene list.
        const IN_EDITED_LIST = 1 << 3;
    }
}

/// Values cached on a gene by the most recent extraction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DerivedValues {
    /// X / Y, or 0 when Y is 0.
    pub ratio: f64,
    /// X-role value.
    pub x: f64,
    /// Y-role value.
    pub y: f64,
}

/// One gene (clone) of the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gene {
    /// Identity and spot.
    pub gene_ref: GeneRef,
    /// Display name.
    pub name: String,
    /// Property bits.
    pub props: GeneProps,
    /// Last extracted values.
    pub derived: DerivedValues,
}

impl Gene {
    /// Create a gene with no properties set.
    pub fn new(gene_ref: GeneRef, name: impl Into<String>) -> Self {
        Gene {
            gene_ref,
            name: name.into(),
            props: GeneProps::empty(),
            derived: DerivedValues::default(),
        }
    }

    /// Stable id shortcut.
    pub fn stable_id(&self) -> StableId {
        self.gene_ref.stable_id
    }

    /// True if the spot was flagged bad.
    pub fn is_bad_spot(&self) -> bool {
        self.props.contains(GeneProps::BAD_SPOT)
    }
}

/// All genes indexed by stable id. A slot may be empty when a stable id was
/// reserved but no gene record was loaded for it.
#[derive(Debug, Clone, Default)]
pub struct GeneTable {
    slots: Vec<Option<Gene>>,
}

impl GeneTable {
    /// Place each gene in the slot of its stable id, growing the table as
    /// needed. A later gene with the same stable id replaces an earlier one.
    pub fn from_genes(genes: impl IntoIterator<Item = Gene>) -> Self {
        let mut slots: Vec<Option<Gene>> = Vec::new();
        for gene in genes {
            let i = gene.stable_id().0;
            if slots.len() <= i {
                slots.resize(i + 1, None);
            }
            slots[i] = Some(gene);
        }
        GeneTable { slots }
    }

    /// Number of slots, filled or not.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if there are no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Gene stored under a stable id.
    pub fn get(&self, id: StableId) -> Option<&Gene> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Mutable gene stored under a stable id.
    pub fn get_mut(&mut self, id: StableId) -> Option<&mut Gene> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Filled slots in stable-id order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Gene> {
        self.slots.iter().flatten()
    }

    /// Mutable filled slots in stable-id order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Gene> {
        self.slots.iter_mut().flatten()
    }

    /// Stable ids of every slot, filled or not, in order.
    pub fn ids(&self) -> impl Iterator<Item = StableId> {
        (0..self.slots.len()).map(StableId)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SpotId;

    #[test]
    fn test_table_slots() {
        let mut table = GeneTable::from_genes([
            Gene::new(GeneRef::new(StableId(3), Some(SpotId(0))), "c"),
            Gene::new(GeneRef::new(StableId(1), None), "a"),
        ]);
        assert_eq!(table.len(), 4);
        assert!(table.get(StableId(0)).is_none());
        assert_eq!(table.get(StableId(3)).unwrap().name, "c");
        assert_eq!(
            table.iter().map(|g| g.stable_id()).collect::<Vec<_>>(),
            vec![StableId(1), StableId(3)]
        );
        assert_eq!(
            table.iter().rev().map(|g| g.stable_id()).collect::<Vec<_>>(),
            vec![StableId(3), StableId(1)]
        );
        table.get_mut(StableId(1)).unwrap().props |= GeneProps::BAD_SPOT;
        assert!(table.get(StableId(1)).unwrap().is_bad_spot());
        assert_eq!(table.ids().count(), 4);
    }
}
