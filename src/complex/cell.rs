use super::facet::FacetKey;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for a tetrahedral cell of the triangulation.
    pub struct CellId;
}

/// Integer label of a subdomain. `0` is reserved for "outside".
pub type SubdomainIndex = i32;

/// The reserved subdomain index for cells outside the complex.
pub const OUTSIDE: SubdomainIndex = 0;

/// Data associated with a tetrahedral cell.
///
/// Neighbor `i` lies across the facet opposite vertex `i`. A `None` neighbor
/// is the infinite cell beyond the convex hull and reads as [`OUTSIDE`].
#[derive(Debug, Clone)]
pub struct CellData {
    /// The four corner vertices.
    pub vertices: [VertexId; 4],
    /// Adjacent cells, indexed by the opposite vertex.
    pub neighbors: [Option<CellId>; 4],
    /// Subdomain label; the cell is in the complex iff this is nonzero.
    pub subdomain: SubdomainIndex,
}

impl CellData {
    /// Creates an unlinked cell.
    #[must_use]
    pub fn new(vertices: [VertexId; 4], subdomain: SubdomainIndex) -> Self {
        Self {
            vertices,
            neighbors: [None; 4],
            subdomain,
        }
    }

    /// Returns `true` if the cell belongs to the complex.
    #[must_use]
    pub fn is_in_complex(&self) -> bool {
        self.subdomain != OUTSIDE
    }

    /// Vertices of the facet opposite vertex `index`, in cyclic order.
    ///
    /// # Panics
    ///
    /// Panics if `index >= 4`.
    #[must_use]
    pub fn facet_vertices(&self, index: usize) -> [VertexId; 3] {
        assert!(index < 4, "facet index {index} out of range");
        [
            self.vertices[(index + 1) & 3],
            self.vertices[(index + 2) & 3],
            self.vertices[(index + 3) & 3],
        ]
    }

    /// Canonical key of the facet opposite vertex `index`.
    #[must_use]
    pub fn facet_key(&self, index: usize) -> FacetKey {
        FacetKey::new(self.facet_vertices(index))
    }

    /// Returns `true` if `vertex` is one of the cell's corners.
    #[must_use]
    pub fn has_vertex(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }
}
