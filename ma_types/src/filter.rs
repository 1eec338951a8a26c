use crate::ids::{GeneRef, StableId};
use std::collections::HashSet;

/// Membership predicate over stable ids.
pub trait GeneFilter {
    /// True if the gene passes.
    fn passes(&self, id: StableId) -> bool;
}

impl<F> GeneFilter for F
where
    F: Fn(StableId) -> bool,
{
    fn passes(&self, id: StableId) -> bool {
        self(id)
    }
}

/// The filter that lets every gene through.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl GeneFilter for AcceptAll {
    fn passes(&self, _id: StableId) -> bool {
        true
    }
}

/// Ordered, appendable collection of gene references with constant-time
/// membership. Each stable id appears at most once.
#[derive(Debug, Clone, Default)]
pub struct GeneList {
    name: String,
    members: Vec<GeneRef>,
    index: HashSet<StableId>,
}

impl GeneList {
    /// Empty list with a display name.
    pub fn new(name: impl Into<String>) -> Self {
        GeneList {
            name: name.into(),
            members: Vec::new(),
            index: HashSet::new(),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a gene; returns false if it was already present.
    pub fn push(&mut self, gene: GeneRef) -> bool {
        if !self.index.insert(gene.stable_id) {
            return false;
        }
        self.members.push(gene);
        true
    }

    /// Remove every member.
    pub fn clear(&mut self) {
        self.members.clear();
        self.index.clear();
    }

    /// Replace the contents, keeping the order of `genes`.
    pub fn refill(&mut self, genes: impl IntoIterator<Item = GeneRef>) {
        self.clear();
        for gene in genes {
            self.push(gene);
        }
    }

    /// Membership test.
    pub fn contains(&self, id: StableId) -> bool {
        self.index.contains(&id)
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if the list has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GeneRef> {
        self.members.iter()
    }
}

impl GeneFilter for GeneList {
    fn passes(&self, id: StableId) -> bool {
        self.contains(id)
    }
}

impl Extend<GeneRef> for GeneList {
    fn extend<I: IntoIterator<Item = GeneRef>>(&mut self, iter: I) {
        for gene in iter {
            self.push(gene);
        }
    }
}
