use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::complex::{MeshComplex, SubdomainIndex, VertexId, OUTSIDE};
use crate::error::Result;
use crate::geometry::Plane;
use crate::math::Point3;
use crate::slice::Segment2;

/// Cuts the tagged boundary facets of a complex with a plane.
///
/// Each tagged facet crossing the plane yields one segment, filed under
/// every labeled subdomain on either side of the facet. Segments are given
/// in the plane's (u, v) frame.
#[derive(Debug, Clone)]
pub struct CutPlane {
    plane: Plane,
}

impl CutPlane {
    /// Creates the cut `a*x + b*y + c*z + d = 0`.
    ///
    /// # Errors
    ///
    /// Returns an error if `(a, b, c)` is zero-length.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Result<Self> {
        Ok(Self {
            plane: Plane::from_coefficients(a, b, c, d)?,
        })
    }

    /// Cuts with an existing plane.
    #[must_use]
    pub fn from_plane(plane: Plane) -> Self {
        Self { plane }
    }

    #[must_use]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Executes the cut, returning segments grouped by subdomain.
    ///
    /// # Errors
    ///
    /// Returns an error if a tagged facet references a missing vertex.
    #[instrument(skip_all)]
    pub fn execute(
        &self,
        complex: &MeshComplex,
    ) -> Result<BTreeMap<SubdomainIndex, Vec<Segment2>>> {
        let mut groups: BTreeMap<SubdomainIndex, Vec<Segment2>> = BTreeMap::new();
        let mut crossed = 0usize;

        for (key, patch) in complex.facets_in_complex() {
            let mut corners = [(VertexId::default(), Point3::origin()); 3];
            for (slot, v) in corners.iter_mut().zip(key.vertices()) {
                *slot = (v, complex.vertex(v)?.point);
            }
            let Some(segment) = self.cut_triangle(&corners) else {
                continue;
            };
            crossed += 1;
            for side in [patch.low(), patch.high()] {
                if side != OUTSIDE {
                    groups.entry(side).or_default().push(segment);
                }
            }
        }

        debug!(
            facets = complex.num_facets_in_complex(),
            crossed,
            subdomains = groups.len(),
            "boundary cut"
        );
        Ok(groups)
    }

    /// Intersects one triangle with the plane. Vertices on the plane count
    /// as below it, so a triangle touching the plane at a single vertex or
    /// lying in it yields nothing.
    fn cut_triangle(&self, corners: &[(VertexId, Point3); 3]) -> Option<Segment2> {
        let above = corners.map(|(_, p)| self.plane.signed_distance(&p) > 0.0);
        let count = above.iter().filter(|&&a| a).count();
        if count == 0 || count == 3 {
            return None;
        }
        // The corner alone on its side.
        let lone = (0..3).find(|&i| above.iter().filter(|&&a| a == above[i]).count() == 1)?;
        let a = self.edge_crossing(corners[lone], corners[(lone + 1) % 3]);
        let b = self.edge_crossing(corners[lone], corners[(lone + 2) % 3]);
        Some(Segment2::new(self.plane.project(&a), self.plane.project(&b)))
    }

    /// Crossing point of an edge whose ends lie on opposite sides. The ends
    /// are ordered by id so both triangles sharing the edge get the same
    /// point bit for bit.
    fn edge_crossing(&self, p: (VertexId, Point3), q: (VertexId, Point3)) -> Point3 {
        let ((_, from), (_, to)) = if p.0 <= q.0 { (p, q) } else { (q, p) };
        let df = self.plane.signed_distance(&from);
        let dt = self.plane.signed_distance(&to);
        let t = df / (df - dt);
        from + (to - from) * t
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::complex::fixtures::cube_row;
    use crate::math::polygon_2d::signed_area;
    use crate::slice::{assemble_loops, SliceParams};

    #[test]
    fn zero_normal_is_rejected() {
        assert!(CutPlane::new(0.0, 0.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn cut_through_middle_cube() {
        let complex = cube_row(&[1, 2, 3]);
        let groups = CutPlane::new(1.0, 0.0, 0.0, -1.5)
            .unwrap()
            .execute(&complex)
            .unwrap();
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![2]);
        assert_eq!(groups[&2].len(), 8);

        let loops = assemble_loops(&groups[&2], &SliceParams::default());
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].len(), 8);
        assert_relative_eq!(signed_area(&loops[0]).abs(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn interface_cut_files_segments_under_both_sides() {
        // A plane along the row's axis crosses the 1|2 interface triangles.
        let complex = cube_row(&[1, 2]);
        let groups = CutPlane::new(0.0, 0.0, 1.0, -0.5)
            .unwrap()
            .execute(&complex)
            .unwrap();
        let params = SliceParams::default();
        for subdomain in [1, 2] {
            let loops = assemble_loops(&groups[&subdomain], &params);
            assert_eq!(loops.len(), 1);
            assert_relative_eq!(signed_area(&loops[0]).abs(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn plane_missing_the_complex_yields_nothing() {
        let complex = cube_row(&[1]);
        let groups = CutPlane::new(0.0, 1.0, 0.0, -5.0)
            .unwrap()
            .execute(&complex)
            .unwrap();
        assert!(groups.is_empty());
    }
}
