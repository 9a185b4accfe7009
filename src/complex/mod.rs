pub mod cell;
pub mod facet;
pub mod vertex;

pub use cell::{CellData, CellId, SubdomainIndex, OUTSIDE};
pub use facet::{Facet, FacetKey, PatchIndex};
pub use vertex::{VertexData, VertexId};

use std::collections::{BTreeSet, HashMap, HashSet};

use slotmap::SlotMap;

use crate::error::{ComplexError, Result};
use crate::math::{BoundingSphere, Point3};

/// A labeled tetrahedral complex embedded in a triangulation.
///
/// The arena keeps every vertex and cell of the triangulation, including
/// cells outside the complex (subdomain [`OUTSIDE`]), so neighbor queries
/// stay valid after cells are removed from the complex. Cells reference each
/// other via typed IDs (generational indices); a removed ID is never
/// dereferenced again.
///
/// Boundary facets between differing subdomains carry a [`PatchIndex`],
/// stored once per triangle under its canonical [`FacetKey`].
#[derive(Debug, Default, Clone)]
pub struct MeshComplex {
    vertices: SlotMap<VertexId, VertexData>,
    cells: SlotMap<CellId, CellData>,
    facets: HashMap<FacetKey, PatchIndex>,
}

impl MeshComplex {
    /// Creates a new, empty complex.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a complex from an indexed tetrahedron listing.
    ///
    /// `tetrahedra[k]` holds four indices into `points` and `subdomains[k]`
    /// its label; label `0` keeps the cell in the triangulation but outside
    /// the complex. Neighbors are linked and every facet between differing
    /// subdomains is tagged.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing lengths differ, an index is out of
    /// range, or a triangle is shared by more than two tetrahedra.
    pub fn from_tetrahedra(
        points: &[Point3],
        tetrahedra: &[[usize; 4]],
        subdomains: &[SubdomainIndex],
    ) -> Result<Self> {
        if tetrahedra.len() != subdomains.len() {
            return Err(ComplexError::Invalid(format!(
                "{} tetrahedra but {} subdomain labels",
                tetrahedra.len(),
                subdomains.len()
            ))
            .into());
        }

        let mut complex = Self::new();
        let ids: Vec<VertexId> = points.iter().map(|p| complex.add_vertex(*p)).collect();

        for (tet, &subdomain) in tetrahedra.iter().zip(subdomains) {
            let mut corners = [VertexId::default(); 4];
            for (slot, &index) in corners.iter_mut().zip(tet) {
                *slot = *ids.get(index).ok_or(ComplexError::VertexIndexOutOfRange {
                    index,
                    count: ids.len(),
                })?;
            }
            complex.cells.insert(CellData::new(corners, subdomain));
        }

        complex.link_neighbors()?;
        complex.tag_boundary_facets();
        Ok(complex)
    }

    // --- Vertex operations ---

    /// Inserts a vertex and returns its ID.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.vertices.insert(VertexData::new(point))
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not in the triangulation.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData> {
        self.vertices
            .get(id)
            .ok_or_else(|| ComplexError::EntityNotFound("vertex".into()).into())
    }

    /// Iterates over all finite vertices of the triangulation.
    pub fn finite_vertices(&self) -> impl Iterator<Item = (VertexId, &VertexData)> {
        self.vertices.iter()
    }

    /// Number of vertices in the triangulation.
    #[must_use]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Removes a batch of vertices from the triangulation.
    ///
    /// Cells outside the complex that use a removed vertex are deleted and
    /// their neighbors see the infinite cell in their place.
    ///
    /// # Errors
    ///
    /// Returns [`ComplexError::VertexInUse`] if any vertex is still used by a
    /// cell in the complex; nothing is removed in that case.
    pub fn remove_vertices(&mut self, vertices: &HashSet<VertexId>) -> Result<usize> {
        if vertices.is_empty() {
            return Ok(0);
        }
        let in_use = self
            .cells
            .values()
            .filter(|c| c.is_in_complex())
            .any(|c| c.vertices.iter().any(|v| vertices.contains(v)));
        if in_use {
            return Err(ComplexError::VertexInUse.into());
        }

        let doomed: HashSet<CellId> = self
            .cells
            .iter()
            .filter(|(_, c)| c.vertices.iter().any(|v| vertices.contains(v)))
            .map(|(id, _)| id)
            .collect();

        for cell in self.cells.values_mut() {
            for neighbor in &mut cell.neighbors {
                if neighbor.is_some_and(|n| doomed.contains(&n)) {
                    *neighbor = None;
                }
            }
        }
        for id in &doomed {
            self.cells.remove(*id);
        }

        let mut removed = 0;
        for v in vertices {
            if self.vertices.remove(*v).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Removes a single vertex from the triangulation.
    ///
    /// # Errors
    ///
    /// See [`remove_vertices`](Self::remove_vertices).
    pub fn remove_vertex(&mut self, vertex: VertexId) -> Result<bool> {
        let set = HashSet::from([vertex]);
        Ok(self.remove_vertices(&set)? == 1)
    }

    // --- Cell operations ---

    /// Returns a reference to the cell data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is not in the triangulation.
    pub fn cell(&self, id: CellId) -> Result<&CellData> {
        self.cells
            .get(id)
            .ok_or_else(|| ComplexError::EntityNotFound("cell".into()).into())
    }

    /// Iterates over every cell of the triangulation, in or out of the complex.
    pub fn all_cells(&self) -> impl Iterator<Item = (CellId, &CellData)> {
        self.cells.iter()
    }

    /// Iterates over the cells in the complex.
    pub fn cells_in_complex(&self) -> impl Iterator<Item = (CellId, &CellData)> {
        self.cells.iter().filter(|(_, c)| c.is_in_complex())
    }

    /// Number of cells in the triangulation.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// Number of cells in the complex.
    #[must_use]
    pub fn num_cells_in_complex(&self) -> usize {
        self.cells.values().filter(|c| c.is_in_complex()).count()
    }

    /// Subdomain of a cell; unknown cells read as [`OUTSIDE`].
    #[must_use]
    pub fn subdomain_index(&self, cell: CellId) -> SubdomainIndex {
        self.cells.get(cell).map_or(OUTSIDE, |c| c.subdomain)
    }

    /// Neighbor across the facet opposite vertex `index`.
    #[must_use]
    pub fn neighbor(&self, cell: CellId, index: usize) -> Option<CellId> {
        self.cells
            .get(cell)
            .and_then(|c| c.neighbors.get(index).copied().flatten())
    }

    /// Subdomain on the far side of facet `index`; the infinite cell is
    /// [`OUTSIDE`].
    #[must_use]
    pub fn neighbor_subdomain(&self, cell: CellId, index: usize) -> SubdomainIndex {
        self.neighbor(cell, index)
            .map_or(OUTSIDE, |n| self.subdomain_index(n))
    }

    /// Sets the subdomain of a cell. Setting [`OUTSIDE`] removes it from the
    /// complex. Facet tags are not touched.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is not in the triangulation.
    pub fn set_subdomain_index(&mut self, cell: CellId, subdomain: SubdomainIndex) -> Result<()> {
        let data = self
            .cells
            .get_mut(cell)
            .ok_or_else(|| ComplexError::EntityNotFound("cell".into()))?;
        data.subdomain = subdomain;
        Ok(())
    }

    /// Removes a cell from the complex; the triangulation keeps it.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is not in the triangulation.
    pub fn remove_from_complex(&mut self, cell: CellId) -> Result<()> {
        self.set_subdomain_index(cell, OUTSIDE)
    }

    /// Sorted set of subdomain indices used by cells in the complex.
    #[must_use]
    pub fn subdomains(&self) -> BTreeSet<SubdomainIndex> {
        self.cells_in_complex().map(|(_, c)| c.subdomain).collect()
    }

    // --- Facet operations ---

    /// Canonical key of a facet.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet's cell is not in the triangulation.
    pub fn facet_key(&self, facet: Facet) -> Result<FacetKey> {
        if facet.index >= 4 {
            return Err(ComplexError::Invalid(format!("facet index {}", facet.index)).into());
        }
        Ok(self.cell(facet.cell)?.facet_key(facet.index))
    }

    /// Tags a facet as part of the complex boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet's cell is not in the triangulation.
    pub fn add_facet_to_complex(&mut self, facet: Facet, patch: PatchIndex) -> Result<()> {
        let key = self.facet_key(facet)?;
        self.facets.insert(key, patch);
        Ok(())
    }

    /// Removes a facet's tag, returning the previous tag if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the facet's cell is not in the triangulation.
    pub fn remove_facet_from_complex(&mut self, facet: Facet) -> Result<Option<PatchIndex>> {
        let key = self.facet_key(facet)?;
        Ok(self.facets.remove(&key))
    }

    /// Returns the tag of a facet, if it is in the complex.
    #[must_use]
    pub fn facet_patch(&self, facet: Facet) -> Option<PatchIndex> {
        self.facet_key(facet)
            .ok()
            .and_then(|key| self.facets.get(&key).copied())
    }

    /// Iterates over the tagged facets.
    pub fn facets_in_complex(&self) -> impl Iterator<Item = (&FacetKey, &PatchIndex)> {
        self.facets.iter()
    }

    /// Number of tagged facets.
    #[must_use]
    pub fn num_facets_in_complex(&self) -> usize {
        self.facets.len()
    }

    /// The tag a facet must carry given its two cells' current subdomains.
    #[must_use]
    pub fn expected_patch(&self, cell: CellId, index: usize) -> Option<PatchIndex> {
        let own = self.subdomain_index(cell);
        let other = self.neighbor_subdomain(cell, index);
        (own != other).then(|| PatchIndex::new(own, other))
    }

    /// Rewrites the tags of the four facets of `cell` from the current
    /// subdomains on both sides.
    ///
    /// # Errors
    ///
    /// Returns an error if the cell is not in the triangulation.
    pub fn refresh_facet_tags(&mut self, cell: CellId) -> Result<()> {
        let data = self.cell(cell)?.clone();
        for index in 0..4 {
            let key = data.facet_key(index);
            match self.expected_patch(cell, index) {
                Some(patch) => {
                    self.facets.insert(key, patch);
                }
                None => {
                    self.facets.remove(&key);
                }
            }
        }
        Ok(())
    }

    /// Verifies the facet-tag invariant with a full scan: every facet between
    /// differing subdomains is tagged with exactly that pair, and no other
    /// facet is tagged.
    ///
    /// # Errors
    ///
    /// Returns [`ComplexError::InconsistentPatch`] on the first violation.
    pub fn check_facet_tags(&self) -> Result<()> {
        let mut expected: HashMap<FacetKey, PatchIndex> = HashMap::new();
        for (id, cell) in self.cells.iter() {
            for index in 0..4 {
                let own = cell.subdomain;
                let other = self.neighbor_subdomain(id, index);
                if own == other {
                    continue;
                }
                expected.insert(cell.facet_key(index), PatchIndex::new(own, other));
            }
        }

        for (key, patch) in &expected {
            match self.facets.get(key) {
                Some(found) if found == patch => {}
                Some(found) => {
                    return Err(ComplexError::InconsistentPatch {
                        expected: patch.to_string(),
                        found: found.to_string(),
                    }
                    .into());
                }
                None => {
                    return Err(ComplexError::InconsistentPatch {
                        expected: patch.to_string(),
                        found: "untagged".into(),
                    }
                    .into());
                }
            }
        }
        if let Some((_, stale)) = self.facets.iter().find(|(k, _)| !expected.contains_key(k)) {
            return Err(ComplexError::InconsistentPatch {
                expected: "untagged".into(),
                found: stale.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Rebuilds bookkeeping after structural changes: drops facet tags that
    /// no longer belong to a cell in the complex.
    pub fn rescan(&mut self) {
        let live: HashSet<FacetKey> = self
            .cells_in_complex()
            .flat_map(|(_, c)| (0..4).map(move |i| c.facet_key(i)))
            .collect();
        self.facets.retain(|key, _| live.contains(key));
    }

    /// Radius of the minimal ball enclosing every finite vertex.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        let mut ball = BoundingSphere::new();
        ball.extend(self.vertices.values().map(|v| &v.point));
        ball.radius()
    }

    /// Links each cell to the cells sharing its facets.
    fn link_neighbors(&mut self) -> Result<()> {
        let mut owners: HashMap<FacetKey, (CellId, usize)> = HashMap::new();
        let mut links: Vec<(CellId, usize, CellId, usize)> = Vec::new();
        let mut seen: HashSet<FacetKey> = HashSet::new();

        for (id, cell) in self.cells.iter() {
            for index in 0..4 {
                let key = cell.facet_key(index);
                if let Some(&(other, other_index)) = owners.get(&key) {
                    if !seen.insert(key) {
                        return Err(ComplexError::NonManifoldFacet.into());
                    }
                    links.push((id, index, other, other_index));
                } else {
                    owners.insert(key, (id, index));
                }
            }
        }

        for (a, ai, b, bi) in links {
            if let Some(cell) = self.cells.get_mut(a) {
                cell.neighbors[ai] = Some(b);
            }
            if let Some(cell) = self.cells.get_mut(b) {
                cell.neighbors[bi] = Some(a);
            }
        }
        Ok(())
    }

    /// Tags every facet whose two sides carry different subdomains.
    fn tag_boundary_facets(&mut self) {
        let mut tags = Vec::new();
        for (id, cell) in self.cells_in_complex() {
            for index in 0..4 {
                if let Some(patch) = self.expected_patch(id, index) {
                    tags.push((cell.facet_key(index), patch));
                }
            }
        }
        self.facets.extend(tags);
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::{MeshComplex, SubdomainIndex};
    use crate::math::Point3;

    /// A row of unit cubes along +x, cube `k` labeled `labels[k]`, each
    /// split into six tetrahedra around its main diagonal (Kuhn subdivision,
    /// conforming across shared faces).
    pub(crate) fn cube_row(labels: &[SubdomainIndex]) -> MeshComplex {
        let n = labels.len();
        let index = |x: usize, y: usize, z: usize| x * 4 + y * 2 + z;
        let mut points = Vec::new();
        for x in 0..=n {
            for y in 0..2 {
                for z in 0..2 {
                    #[allow(clippy::cast_precision_loss)]
                    points.push(Point3::new(x as f64, y as f64, z as f64));
                }
            }
        }

        let perms: [[usize; 3]; 6] = [
            [0, 1, 2],
            [0, 2, 1],
            [1, 0, 2],
            [1, 2, 0],
            [2, 0, 1],
            [2, 1, 0],
        ];
        let mut tets = Vec::new();
        let mut tags = Vec::new();
        for (k, &label) in labels.iter().enumerate() {
            for perm in &perms {
                let mut corner = [k, 0, 0];
                let mut tet = [index(corner[0], corner[1], corner[2]); 4];
                for (step, &axis) in perm.iter().enumerate() {
                    corner[axis] += 1;
                    tet[step + 1] = index(corner[0], corner[1], corner[2]);
                }
                tets.push(tet);
                tags.push(label);
            }
        }

        match MeshComplex::from_tetrahedra(&points, &tets, &tags) {
            Ok(complex) => complex,
            Err(e) => panic!("fixture complex is valid: {e}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::fixtures::cube_row;
    use super::*;

    #[test]
    fn cube_row_counts() {
        let complex = cube_row(&[1, 2, 3]);
        assert_eq!(complex.num_vertices(), 16);
        assert_eq!(complex.num_cells(), 18);
        assert_eq!(complex.num_cells_in_complex(), 18);
        assert_eq!(complex.subdomains(), BTreeSet::from([1, 2, 3]));
        complex.check_facet_tags().unwrap();
    }

    #[test]
    fn interfaces_and_hull_are_tagged() {
        let complex = cube_row(&[1, 2]);
        // Two interface triangles between the cubes, 2 hull triangles per
        // exposed cube face (5 per cube).
        let interface = complex
            .facets_in_complex()
            .filter(|(_, p)| **p == PatchIndex::new(1, 2))
            .count();
        assert_eq!(interface, 2);
        let hull = complex
            .facets_in_complex()
            .filter(|(_, p)| p.contains(OUTSIDE))
            .count();
        assert_eq!(hull, 20);
        assert_eq!(complex.num_facets_in_complex(), 22);
    }

    #[test]
    fn neighbors_are_symmetric() {
        let complex = cube_row(&[1, 1]);
        for (id, cell) in complex.all_cells() {
            for index in 0..4 {
                if let Some(n) = cell.neighbors[index] {
                    let back = complex.cell(n).unwrap();
                    assert!(back.neighbors.contains(&Some(id)));
                }
            }
        }
    }

    #[test]
    fn mismatched_listing_is_rejected() {
        let points = vec![Point3::origin(); 4];
        assert!(MeshComplex::from_tetrahedra(&points, &[[0, 1, 2, 3]], &[]).is_err());
        assert!(MeshComplex::from_tetrahedra(&points, &[[0, 1, 2, 9]], &[1]).is_err());
    }

    #[test]
    fn non_manifold_facet_is_rejected() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
            Point3::new(1.0, 1.0, 1.0),
        ];
        let tets = [[0, 1, 2, 3], [0, 1, 2, 4], [0, 1, 2, 5]];
        assert!(MeshComplex::from_tetrahedra(&points, &tets, &[1, 1, 1]).is_err());
    }

    #[test]
    fn stale_tag_fails_check() {
        let mut complex = cube_row(&[1, 1]);
        let (id, _) = complex.cells_in_complex().next().unwrap();
        // Every cell has at least one interior facet with an equal label.
        let index = (0..4)
            .find(|&i| complex.expected_patch(id, i).is_none())
            .unwrap();
        complex
            .add_facet_to_complex(Facet::new(id, index), PatchIndex::new(1, 9))
            .unwrap();
        assert!(complex.check_facet_tags().is_err());
    }

    #[test]
    fn in_use_vertex_cannot_be_removed() {
        let mut complex = cube_row(&[1]);
        let (v, _) = complex.finite_vertices().next().unwrap();
        assert!(complex.remove_vertex(v).is_err());
        assert_eq!(complex.num_vertices(), 8);
    }

    #[test]
    fn outside_vertices_can_be_removed() {
        let mut complex = cube_row(&[1, 0]);
        let far: HashSet<VertexId> = complex
            .finite_vertices()
            .filter(|(_, v)| v.point.x > 1.5)
            .map(|(id, _)| id)
            .collect();
        assert_eq!(far.len(), 4);
        assert_eq!(complex.remove_vertices(&far).unwrap(), 4);
        assert_eq!(complex.num_cells(), 6);
        for (_, cell) in complex.all_cells() {
            for n in cell.neighbors.iter().flatten() {
                assert!(complex.cell(*n).is_ok());
            }
        }
        complex.check_facet_tags().unwrap();
    }

    #[test]
    fn bounding_radius_of_cube() {
        let complex = cube_row(&[1]);
        assert!((complex.bounding_radius() - 3.0_f64.sqrt() / 2.0).abs() < 1e-9);
    }
}
