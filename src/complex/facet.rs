use std::fmt;

use super::cell::{CellId, SubdomainIndex};
use super::vertex::VertexId;

/// A facet seen from one of its cells: the triangle opposite vertex `index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Facet {
    /// The cell the facet is seen from.
    pub cell: CellId,
    /// Local index (0..4) of the vertex opposite the facet.
    pub index: usize,
}

impl Facet {
    /// Creates a facet handle.
    #[must_use]
    pub fn new(cell: CellId, index: usize) -> Self {
        Self { cell, index }
    }
}

/// Orientation-free identity of a triangle: its sorted vertex triple.
///
/// Both facets describing the same triangle map to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FacetKey([VertexId; 3]);

impl FacetKey {
    /// Builds the canonical key of a vertex triple.
    #[must_use]
    pub fn new(mut vertices: [VertexId; 3]) -> Self {
        vertices.sort_unstable();
        Self(vertices)
    }

    /// The sorted vertex triple.
    #[must_use]
    pub fn vertices(&self) -> [VertexId; 3] {
        self.0
    }
}

/// Tag of a boundary facet: the unordered pair of subdomains it separates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchIndex {
    low: SubdomainIndex,
    high: SubdomainIndex,
}

impl PatchIndex {
    /// Creates a patch tag; the pair is stored in ascending order.
    #[must_use]
    pub fn new(a: SubdomainIndex, b: SubdomainIndex) -> Self {
        Self {
            low: a.min(b),
            high: a.max(b),
        }
    }

    /// The smaller subdomain index of the pair.
    #[must_use]
    pub fn low(&self) -> SubdomainIndex {
        self.low
    }

    /// The larger subdomain index of the pair.
    #[must_use]
    pub fn high(&self) -> SubdomainIndex {
        self.high
    }

    /// Returns `true` if `subdomain` is one of the two sides.
    #[must_use]
    pub fn contains(&self, subdomain: SubdomainIndex) -> bool {
        self.low == subdomain || self.high == subdomain
    }

    /// Given one side, returns the other one.
    #[must_use]
    pub fn other(&self, subdomain: SubdomainIndex) -> Option<SubdomainIndex> {
        if self.low == subdomain {
            Some(self.high)
        } else if self.high == subdomain {
            Some(self.low)
        } else {
            None
        }
    }
}

impl fmt::Display for PatchIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.low, self.high)
    }
}
