use std::collections::{HashMap, VecDeque};

use spade::handles::{FixedFaceHandle, InnerTag};
use spade::{
    AngleLimit, ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2,
    PositionInTriangulation, RefinementParameters, Triangulation,
};
use tracing::{debug, warn};

use crate::complex::SubdomainIndex;
use crate::error::{Result, SliceError};
use crate::math::Point2;

use super::{Slice, SubdomainClassifier};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// A labeled planar triangle mesh.
///
/// Triangles are counter-clockwise; `subdomains[i]` is the nesting-depth
/// label of `triangles[i]`.
#[derive(Debug, Clone, Default)]
pub struct SliceMesh {
    pub vertices: Vec<Point2>,
    pub triangles: Vec<[u32; 3]>,
    pub subdomains: Vec<SubdomainIndex>,
}

impl SliceMesh {
    #[must_use]
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Corner points of triangle `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn triangle(&self, index: usize) -> [Point2; 3] {
        self.triangles[index].map(|v| self.vertices[v as usize])
    }

    /// Centroid of triangle `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn centroid(&self, index: usize) -> Point2 {
        let [a, b, c] = self.triangle(index);
        Point2::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// Total area of the triangles.
    #[must_use]
    pub fn area(&self) -> f64 {
        (0..self.triangles.len())
            .map(|i| {
                let [a, b, c] = self.triangle(i);
                0.5 * (b - a).perp(&(c - a))
            })
            .sum()
    }
}

impl Slice {
    /// Builds a refined constrained Delaunay triangulation of the slice.
    ///
    /// Edge lengths are bounded by `bounding_radius / resolution`. Faces
    /// reachable from the unbounded region or from a seed without crossing
    /// a constraint are left out; every other face is tagged with the label
    /// of its centroid. No-op with a diagnostic if the slice is invalid.
    ///
    /// # Errors
    ///
    /// Returns [`SliceError::InvalidParameters`] if `resolution` is not a
    /// positive finite number, and [`SliceError::Triangulation`] if a loop
    /// point cannot be inserted.
    pub fn build_triangulation(&mut self, resolution: f64) -> Result<()> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(SliceError::InvalidParameters(format!(
                "resolution must be positive and finite, got {resolution}"
            ))
            .into());
        }
        if !self.guard("build_triangulation") {
            return Ok(());
        }

        let mut cdt = Cdt::new();
        let mut skipped = 0;
        for l in &self.loops {
            skipped += insert_constraint_loop(&mut cdt, l)?;
        }
        if skipped > 0 {
            warn!(skipped, "constraint edges crossing earlier constraints were skipped");
        }

        let longest = self.bounds.radius() / resolution;
        let max_area = 3f64.sqrt() / 4.0 * longest * longest;
        let refinement = cdt.refine(
            RefinementParameters::<f64>::new()
                .exclude_outer_faces(false)
                .with_angle_limit(AngleLimit::from_deg(self.params.min_angle_deg))
                .with_max_allowed_area(max_area)
                .with_max_additional_vertices(self.params.max_additional_vertices),
        );
        if !refinement.refinement_complete {
            warn!(
                limit = self.params.max_additional_vertices,
                "refinement stopped at the Steiner point limit"
            );
        }

        let excluded = excluded_faces(&cdt, &self.seeds);
        let classifier = SubdomainClassifier::new(&self.loops);

        let mut mesh = SliceMesh::default();
        let mut vertex_map: HashMap<usize, u32> = HashMap::new();
        for face in cdt.inner_faces() {
            if excluded[face.fix().index()] {
                continue;
            }
            let mut tri = [0u32; 3];
            for (slot, vh) in tri.iter_mut().zip(face.vertices()) {
                *slot = *vertex_map.entry(vh.fix().index()).or_insert_with(|| {
                    let p = vh.position();
                    mesh.vertices.push(Point2::new(p.x, p.y));
                    u32::try_from(mesh.vertices.len() - 1).unwrap_or(u32::MAX)
                });
            }
            mesh.triangles.push(tri);
            let centroid = mesh.centroid(mesh.triangles.len() - 1);
            mesh.subdomains.push(classifier.classify(&centroid));
        }

        debug!(
            resolution,
            vertices = mesh.vertices.len(),
            triangles = mesh.triangles.len(),
            "slice triangulated"
        );
        self.mesh = Some(mesh);
        Ok(())
    }
}

/// Inserts a closed loop as constraint edges. Edges that would cross an
/// existing constraint are skipped; their count is returned.
fn insert_constraint_loop(cdt: &mut Cdt, points: &[Point2]) -> Result<usize> {
    let mut handles = Vec::with_capacity(points.len());
    for p in points {
        let h = cdt
            .insert(SpadePoint2::new(p.x, p.y))
            .map_err(|e: InsertionError| SliceError::Triangulation(format!("CDT insert: {e}")))?;
        handles.push(h);
    }

    let mut skipped = 0;
    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if from == to {
            continue;
        }
        if cdt.can_add_constraint(from, to) {
            cdt.add_constraint(from, to);
        } else {
            skipped += 1;
        }
    }
    Ok(skipped)
}

/// Marks the faces reachable without crossing a constraint from the outer
/// face or from the face containing a seed. Indexed by face index.
fn excluded_faces(cdt: &Cdt, seeds: &[Point2]) -> Vec<bool> {
    let mut excluded = vec![false; cdt.num_all_faces()];
    let mut queue: VecDeque<FixedFaceHandle<InnerTag>> = VecDeque::new();

    let mut visit = |face: FixedFaceHandle<InnerTag>,
                     queue: &mut VecDeque<FixedFaceHandle<InnerTag>>| {
        if !excluded[face.index()] {
            excluded[face.index()] = true;
            queue.push_back(face);
        }
    };

    for edge in cdt.convex_hull() {
        if cdt.is_constraint_edge(edge.as_undirected().fix()) {
            continue;
        }
        for face in [edge.face(), edge.rev().face()] {
            if let Some(inner) = face.as_inner() {
                visit(inner.fix(), &mut queue);
            }
        }
    }

    for seed in seeds {
        match cdt.locate(SpadePoint2::new(seed.x, seed.y)) {
            PositionInTriangulation::OnFace(face) => visit(face, &mut queue),
            PositionInTriangulation::OnEdge(edge) => {
                let edge = cdt.directed_edge(edge);
                for face in [edge.face(), edge.rev().face()] {
                    if let Some(inner) = face.as_inner() {
                        visit(inner.fix(), &mut queue);
                    }
                }
            }
            PositionInTriangulation::OnVertex(vertex) => {
                for edge in cdt.vertex(vertex).out_edges() {
                    if let Some(inner) = edge.face().as_inner() {
                        visit(inner.fix(), &mut queue);
                    }
                }
            }
            PositionInTriangulation::OutsideOfConvexHull(_)
            | PositionInTriangulation::NoTriangulation => {}
        }
    }

    while let Some(face) = queue.pop_front() {
        for edge in cdt.face(face).adjacent_edges() {
            if cdt.is_constraint_edge(edge.as_undirected().fix()) {
                continue;
            }
            if let Some(inner) = edge.rev().face().as_inner() {
                visit(inner.fix(), &mut queue);
            }
        }
    }

    excluded
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_relative_eq;

    use super::*;
    use crate::math::polygon_2d::{bounded_side, signed_area, BoundedSide};
    use crate::slice::fixtures::{circle, square};

    fn polygon_area(n: usize, r: f64) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let n = n as f64;
        0.5 * n * r * r * (2.0 * PI / n).sin()
    }

    #[test]
    fn seeded_hole_is_left_empty() {
        let mut slice = Slice::new(vec![circle(0.0, 0.0, 10.0, 40), circle(0.0, 0.0, 3.0, 16)]);
        slice.find_holes(3);
        assert_eq!(slice.seeds().len(), 1);
        slice.build_triangulation(5.0).unwrap();

        let mesh = slice.mesh().unwrap();
        assert!(!mesh.is_empty());
        let hole = slice.constraint(1);
        for i in 0..mesh.num_triangles() {
            assert_eq!(bounded_side(hole, &mesh.centroid(i)), BoundedSide::Outside);
            assert_eq!(mesh.subdomains[i], 2);
        }
        assert_relative_eq!(
            mesh.area(),
            polygon_area(40, 10.0) - polygon_area(16, 3.0),
            max_relative = 1e-9
        );
    }

    #[test]
    fn unseeded_inner_loop_is_meshed_and_labeled() {
        let mut slice = Slice::new(vec![circle(0.0, 0.0, 10.0, 40), circle(0.0, 0.0, 3.0, 16)]);
        slice.build_triangulation(5.0).unwrap();

        let mesh = slice.mesh().unwrap();
        let inner = slice.constraint(1);
        let mut inner_area = 0.0;
        for i in 0..mesh.num_triangles() {
            let expected = if bounded_side(inner, &mesh.centroid(i)) == BoundedSide::Inside {
                let [a, b, c] = mesh.triangle(i);
                inner_area += signed_area(&[a, b, c]);
                3
            } else {
                2
            };
            assert_eq!(mesh.subdomains[i], expected);
        }
        assert_relative_eq!(mesh.area(), polygon_area(40, 10.0), max_relative = 1e-9);
        assert_relative_eq!(inner_area, polygon_area(16, 3.0), max_relative = 1e-9);
    }

    #[test]
    fn single_loop_is_labeled_one() {
        let mut slice = Slice::new(vec![square(0.0, 0.0, 2.0, 6)]);
        slice.build_triangulation(4.0).unwrap();
        let mesh = slice.mesh().unwrap();
        assert!(mesh.subdomains.iter().all(|&s| s == 1));
        assert_relative_eq!(mesh.area(), 16.0, max_relative = 1e-9);
    }

    #[test]
    fn finer_resolution_gives_more_triangles() {
        let mut coarse = Slice::new(vec![circle(0.0, 0.0, 1.0, 24)]);
        let mut fine = coarse.clone();
        coarse.build_triangulation(1.0).unwrap();
        fine.build_triangulation(8.0).unwrap();
        assert!(
            fine.mesh().unwrap().num_triangles() > coarse.mesh().unwrap().num_triangles()
        );
    }

    #[test]
    fn resolution_must_be_positive() {
        let mut slice = Slice::new(vec![circle(0.0, 0.0, 1.0, 24)]);
        assert!(slice.build_triangulation(0.0).is_err());
        assert!(slice.build_triangulation(-2.0).is_err());
        assert!(slice.build_triangulation(f64::NAN).is_err());
        assert!(slice.mesh().is_none());
    }

    #[test]
    fn invalid_slice_is_not_triangulated() {
        let mut slice = Slice::new(vec![square(0.0, 0.0, 1.0, 1)]);
        slice.build_triangulation(2.0).unwrap();
        assert!(slice.mesh().is_none());
    }

    #[test]
    fn editing_constraints_discards_mesh() {
        let mut slice = Slice::new(vec![circle(0.0, 0.0, 1.0, 24)]);
        slice.build_triangulation(2.0).unwrap();
        assert!(slice.mesh().is_some());
        slice.add_constraints(vec![circle(0.0, 0.0, 0.5, 12)]);
        assert!(slice.mesh().is_none());
    }
}
