mod assemble;
mod classify;
mod holes;
mod simplify;
mod triangulate;

pub use assemble::{assemble_loops, Segment2};
pub use classify::SubdomainClassifier;
pub use simplify::simplify_loop;
pub use triangulate::SliceMesh;

use std::collections::BTreeMap;

use tracing::warn;

use crate::complex::SubdomainIndex;
use crate::math::{BoundingCircle, Point2};

/// A closed, ordered sequence of 2D points; the closing edge is implied.
pub type ConstraintLoop = Vec<Point2>;

/// Parameters controlling slice reconstruction.
#[derive(Debug, Clone, Copy)]
pub struct SliceParams {
    /// Minimum vertex count of the outer loop for the slice to be valid.
    pub min_outer_vertices: usize,
    /// Distance under which segment endpoints are merged.
    pub snap_tolerance: f64,
    /// Maximum gap closed when an assembled chain does not meet itself.
    pub close_tolerance: f64,
    /// Minimum interior angle (degrees) enforced by refinement.
    pub min_angle_deg: f64,
    /// Upper bound on Steiner points added by refinement.
    pub max_additional_vertices: usize,
}

impl Default for SliceParams {
    fn default() -> Self {
        Self {
            min_outer_vertices: 20,
            snap_tolerance: 1e-8,
            close_tolerance: 1e-6,
            min_angle_deg: 20.0,
            max_additional_vertices: 200_000,
        }
    }
}

impl SliceParams {
    /// Sets the minimum outer-loop vertex count.
    #[must_use]
    pub fn with_min_outer_vertices(mut self, count: usize) -> Self {
        self.min_outer_vertices = count;
        self
    }

    /// Sets the endpoint snapping and gap-closing tolerances.
    #[must_use]
    pub fn with_tolerances(mut self, snap: f64, close: f64) -> Self {
        self.snap_tolerance = snap;
        self.close_tolerance = close;
        self
    }
}

/// A planar cross-section: constraint loops, hole seeds and, once built,
/// its labeled triangulation.
///
/// Loops are kept sorted by descending vertex count; the first one is the
/// outer boundary and the containment reference for every nested test.
#[derive(Debug, Clone, Default)]
pub struct Slice {
    loops: Vec<ConstraintLoop>,
    seeds: Vec<Point2>,
    bounds: BoundingCircle,
    params: SliceParams,
    mesh: Option<SliceMesh>,
}

impl Slice {
    /// Creates a slice from loops with default parameters.
    #[must_use]
    pub fn new(loops: Vec<ConstraintLoop>) -> Self {
        Self::with_params(loops, SliceParams::default())
    }

    /// Creates a slice from loops; the loops are sorted by descending
    /// vertex count.
    #[must_use]
    pub fn with_params(loops: Vec<ConstraintLoop>, params: SliceParams) -> Self {
        let mut slice = Self {
            loops: Vec::new(),
            seeds: Vec::new(),
            bounds: BoundingCircle::new(),
            params,
            mesh: None,
        };
        slice.add_constraints(loops);
        slice
    }

    /// Assembles raw, unordered cut segments into loops.
    #[must_use]
    pub fn from_segments(segments: &[Segment2], params: SliceParams) -> Self {
        Self::with_params(assemble_loops(segments, &params), params)
    }

    /// Composites per-subdomain segment groups into one slice, assembling
    /// each group separately.
    #[must_use]
    pub fn from_subdomain_segments(
        groups: &BTreeMap<SubdomainIndex, Vec<Segment2>>,
        params: SliceParams,
    ) -> Self {
        let mut slice = Self::with_params(Vec::new(), params);
        for (subdomain, segments) in groups {
            let loops = assemble_loops(segments, &params);
            tracing::debug!(subdomain, loops = loops.len(), "assembled subdomain loops");
            slice.add_constraints(loops);
        }
        slice
    }

    /// The slice parameters.
    #[must_use]
    pub fn params(&self) -> &SliceParams {
        &self.params
    }

    /// Returns `true` if the slice can be processed: there is an outer loop
    /// with at least `min_outer_vertices` vertices and no loop is empty.
    #[must_use]
    pub fn check_validity(&self) -> bool {
        match self.loops.first() {
            None => false,
            Some(outer) if outer.len() < self.params.min_outer_vertices => false,
            Some(_) => self.loops.iter().all(|l| !l.is_empty()),
        }
    }

    /// Emits a diagnostic and returns `false` if the slice is invalid.
    pub(crate) fn guard(&self, operation: &'static str) -> bool {
        let valid = self.check_validity();
        if !valid {
            warn!(
                operation,
                loops = self.loops.len(),
                "missing constraints, skipping slice operation"
            );
        }
        valid
    }

    /// Number of constraint loops.
    #[must_use]
    pub fn num_constraints(&self) -> usize {
        self.loops.len()
    }

    /// All constraint loops, outer loop first.
    #[must_use]
    pub fn constraints(&self) -> &[ConstraintLoop] {
        &self.loops
    }

    /// The constraint loop at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= num_constraints()`.
    #[must_use]
    pub fn constraint(&self, index: usize) -> &ConstraintLoop {
        assert!(
            index < self.loops.len(),
            "constraint index {index} out of bounds for {} constraints",
            self.loops.len()
        );
        &self.loops[index]
    }

    /// Appends loops, keeping the descending-size order. Their points join
    /// the bounding set used for resolution scaling.
    pub fn add_constraints(&mut self, loops: impl IntoIterator<Item = ConstraintLoop>) {
        for l in loops {
            self.bounds.extend(l.iter());
            self.loops.push(l);
        }
        self.sort_loops();
        self.mesh = None;
    }

    /// Appends every loop of another slice.
    pub fn add_slice(&mut self, other: &Slice) {
        self.add_constraints(other.loops.iter().cloned());
    }

    /// Keeps only the loop at `index`. Seeds are cleared.
    ///
    /// # Panics
    ///
    /// Panics if `index >= num_constraints()`.
    pub fn keep_component(&mut self, index: usize) {
        let kept = self.constraint(index).clone();
        self.replace_loops(vec![kept]);
    }

    /// Keeps only the loops at `indices`. Seeds are cleared.
    ///
    /// # Panics
    ///
    /// Panics if any index is out of bounds.
    pub fn keep_components(&mut self, indices: &[usize]) {
        let kept = indices.iter().map(|&i| self.constraint(i).clone()).collect();
        self.replace_loops(kept);
    }

    /// Removes every loop and seed. The bounding set is kept.
    pub fn clear_constraints(&mut self) {
        self.replace_loops(Vec::new());
    }

    /// Seed points marking regions left untriangulated.
    #[must_use]
    pub fn seeds(&self) -> &[Point2] {
        &self.seeds
    }

    /// Radius of the minimal circle enclosing every point ever added.
    #[must_use]
    pub fn bounding_radius(&self) -> f64 {
        self.bounds.radius()
    }

    /// The triangulation produced by the last
    /// [`build_triangulation`](Self::build_triangulation).
    #[must_use]
    pub fn mesh(&self) -> Option<&SliceMesh> {
        self.mesh.as_ref()
    }

    /// Nesting-depth label of `point`: `1` for a single-loop slice;
    /// otherwise `2` plus one for every inner loop containing the point
    /// (boundary included).
    #[must_use]
    pub fn subdomain_of(&self, point: &Point2) -> SubdomainIndex {
        SubdomainClassifier::new(&self.loops).classify(point)
    }

    fn replace_loops(&mut self, loops: Vec<ConstraintLoop>) {
        self.loops = loops;
        self.seeds.clear();
        self.sort_loops();
        self.mesh = None;
    }

    fn sort_loops(&mut self) {
        self.loops.sort_by(|a, b| b.len().cmp(&a.len()));
    }
}
