use tracing::{debug, warn};

use crate::math::polygon_2d::{bounded_side, vertex_centroid, BoundedSide};

use super::Slice;

impl Slice {
    /// Sorts the inner loops into holes, plain inner boundaries and noise.
    ///
    /// For every loop after the outer one, its vertex centroid decides:
    /// - strictly inside the outer loop and strictly inside the loop itself,
    ///   with at least `min_loop_edges` edges: the loop is a hole and its
    ///   centroid becomes a seed;
    /// - outside the outer loop, or fewer than `min_loop_edges` edges: the
    ///   loop is dropped;
    /// - otherwise the loop is kept without a seed.
    ///
    /// No-op with a diagnostic if the slice is invalid.
    pub fn find_holes(&mut self, min_loop_edges: usize) {
        if !self.guard("find_holes") || self.loops.len() < 2 {
            return;
        }

        let outer = self.loops[0].clone();
        if let Some(c) = vertex_centroid(&outer) {
            if bounded_side(&outer, &c) == BoundedSide::Outside {
                warn!("outer loop centroid lies outside the outer loop; bad slice");
            }
        }

        let before = self.loops.len();
        let mut kept = Vec::with_capacity(before);
        kept.push(outer.clone());
        let mut seeds_added = 0;

        for inner in self.loops.drain(1..) {
            let Some(centroid) = vertex_centroid(&inner) else {
                continue;
            };
            let in_outer = bounded_side(&outer, &centroid);
            let enough_edges = inner.len() >= min_loop_edges;

            if in_outer == BoundedSide::Inside
                && bounded_side(&inner, &centroid) == BoundedSide::Inside
                && enough_edges
            {
                self.seeds.push(centroid);
                seeds_added += 1;
                kept.push(inner);
            } else if in_outer == BoundedSide::Outside || !enough_edges {
                continue;
            } else {
                kept.push(inner);
            }
        }

        self.loops = kept;
        self.mesh = None;
        debug!(
            dropped = before - self.loops.len(),
            seeds = seeds_added,
            "holes classified"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point2;
    use crate::slice::fixtures::{circle, square};
    use crate::slice::SliceParams;

    fn relaxed() -> SliceParams {
        SliceParams::default().with_min_outer_vertices(4)
    }

    #[test]
    fn enclosed_square_becomes_seeded_hole() {
        let mut slice = Slice::with_params(
            vec![square(0.0, 0.0, 10.0, 3), square(1.0, 2.0, 1.0, 2)],
            relaxed(),
        );
        slice.find_holes(4);
        assert_eq!(slice.num_constraints(), 2);
        assert_eq!(slice.seeds().len(), 1);
        let seed = slice.seeds()[0];
        assert!((seed.x - 1.0).abs() < 1e-12);
        assert!((seed.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn four_vertex_outer_with_enclosed_hole() {
        let outer = vec![
            Point2::new(0.0, 0.0),
            Point2::new(10.0, 0.0),
            Point2::new(10.0, 10.0),
            Point2::new(0.0, 10.0),
        ];
        let inner = vec![
            Point2::new(4.0, 4.0),
            Point2::new(6.0, 4.0),
            Point2::new(6.0, 6.0),
            Point2::new(4.0, 6.0),
        ];
        let mut slice = Slice::with_params(vec![outer, inner], relaxed());
        slice.find_holes(4);
        assert_eq!(slice.num_constraints(), 2);
        assert_eq!(slice.seeds(), &[Point2::new(5.0, 5.0)]);
    }

    #[test]
    fn loop_outside_outer_is_discarded() {
        let mut slice = Slice::new(vec![circle(0.0, 0.0, 5.0, 40), circle(20.0, 0.0, 1.0, 12)]);
        slice.find_holes(3);
        assert_eq!(slice.num_constraints(), 1);
        assert!(slice.seeds().is_empty());
    }

    #[test]
    fn short_loop_is_discarded() {
        let mut slice = Slice::new(vec![circle(0.0, 0.0, 5.0, 40), circle(0.0, 0.0, 1.0, 5)]);
        slice.find_holes(6);
        assert_eq!(slice.num_constraints(), 1);
        assert!(slice.seeds().is_empty());
    }

    #[test]
    fn loop_with_centroid_outside_itself_is_kept_unseeded() {
        // A C-shaped loop whose vertex centroid falls in its notch.
        let c_shape = vec![
            Point2::new(-2.0, -2.0),
            Point2::new(2.0, -2.0),
            Point2::new(2.0, -1.5),
            Point2::new(-1.5, -1.5),
            Point2::new(-1.5, 1.5),
            Point2::new(2.0, 1.5),
            Point2::new(2.0, 2.0),
            Point2::new(-2.0, 2.0),
        ];
        let mut slice = Slice::new(vec![circle(0.0, 0.0, 10.0, 40), c_shape]);
        slice.find_holes(4);
        assert_eq!(slice.num_constraints(), 2);
        assert!(slice.seeds().is_empty());
    }

    #[test]
    fn invalid_slice_is_untouched() {
        let mut slice = Slice::new(vec![square(0.0, 0.0, 10.0, 1), square(50.0, 0.0, 1.0, 1)]);
        slice.find_holes(3);
        assert_eq!(slice.num_constraints(), 2);
        assert!(slice.seeds().is_empty());
    }
}
