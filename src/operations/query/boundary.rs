use std::collections::HashMap;

use crate::complex::{Facet, MeshComplex, PatchIndex, SubdomainIndex, VertexId, OUTSIDE};
use crate::error::{OperationError, Result};
use crate::math::Point3;

/// Triangle soup of the facets bounding one subdomain.
#[derive(Debug, Clone, Default)]
pub struct BoundarySurface {
    pub vertices: Vec<Point3>,
    /// Triangles with outward-facing normals.
    pub faces: Vec<[usize; 3]>,
    /// Tag of each face.
    pub patches: Vec<PatchIndex>,
}

impl BoundarySurface {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Total area of the faces.
    #[must_use]
    pub fn area(&self) -> f64 {
        self.faces
            .iter()
            .map(|f| {
                let [a, b, c] = f.map(|i| self.vertices[i]);
                (b - a).cross(&(c - a)).norm() * 0.5
            })
            .sum()
    }

    /// Enclosed volume by the divergence theorem.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.faces
            .iter()
            .map(|f| {
                let [a, b, c] = f.map(|i| self.vertices[i].coords);
                a.dot(&b.cross(&c)) / 6.0
            })
            .sum()
    }
}

/// Collects the boundary of a subdomain.
pub struct Boundary {
    subdomain: SubdomainIndex,
}

impl Boundary {
    /// Creates a new `Boundary` query.
    #[must_use]
    pub fn new(subdomain: SubdomainIndex) -> Self {
        Self { subdomain }
    }

    /// Executes the query. An unused label yields an empty surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the subdomain is the reserved outside label or a
    /// cell references a missing vertex.
    pub fn execute(&self, complex: &MeshComplex) -> Result<BoundarySurface> {
        if self.subdomain == OUTSIDE {
            return Err(OperationError::InvalidInput(
                "the outside has no boundary of its own".into(),
            )
            .into());
        }

        let mut surface = BoundarySurface::default();
        let mut vertex_map: HashMap<VertexId, usize> = HashMap::new();

        for (id, cell) in complex.cells_in_complex() {
            if cell.subdomain != self.subdomain {
                continue;
            }
            for index in 0..4 {
                let Some(patch) = complex.facet_patch(Facet::new(id, index)) else {
                    continue;
                };
                if complex.neighbor_subdomain(id, index) == self.subdomain {
                    continue;
                }

                let mut tri = cell.facet_vertices(index);
                let [a, b, c] = tri.map(|v| complex.vertex(v).map(|d| d.point));
                let (a, b, c) = (a?, b?, c?);
                let apex = complex.vertex(cell.vertices[index])?.point;
                if (b - a).cross(&(c - a)).dot(&(apex - a)) > 0.0 {
                    tri.swap(1, 2);
                }

                let mut face = [0usize; 3];
                for (slot, v) in face.iter_mut().zip(tri) {
                    *slot = match vertex_map.get(&v) {
                        Some(&i) => i,
                        None => {
                            surface.vertices.push(complex.vertex(v)?.point);
                            let i = surface.vertices.len() - 1;
                            vertex_map.insert(v, i);
                            i
                        }
                    };
                }
                surface.faces.push(face);
                surface.patches.push(patch);
            }
        }
        Ok(surface)
    }
}
