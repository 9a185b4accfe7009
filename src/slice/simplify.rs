use tracing::debug;

use crate::math::polygon_2d::point_segment_dist_sq;
use crate::math::Point2;

use super::{ConstraintLoop, Slice};

impl Slice {
    /// Simplifies every loop down to `ratio` of its vertex count.
    ///
    /// Loops left with two points or fewer are dropped. `ratio` is clamped
    /// to `[0, 1]`; `1` keeps every vertex. No-op with a diagnostic if the
    /// slice is invalid.
    pub fn simplify(&mut self, ratio: f64) {
        if !self.guard("simplify") {
            return;
        }
        let before: usize = self.loops.iter().map(Vec::len).sum();
        let loops: Vec<ConstraintLoop> = self
            .loops
            .iter()
            .map(|l| simplify_loop(l, ratio))
            .filter(|l| l.len() > 2)
            .collect();
        let after: usize = loops.iter().map(Vec::len).sum();
        debug!(before, after, loops = loops.len(), "loops simplified");
        self.loops = loops;
        self.sort_loops();
        self.mesh = None;
    }
}

/// Reduces a closed loop to `ceil(ratio * len)` vertices (at least two).
///
/// Vertices are removed greedily; the cost of removing a vertex is the
/// largest squared distance from any original point between its two
/// surviving neighbors to the segment joining them.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn simplify_loop(points: &[Point2], ratio: f64) -> ConstraintLoop {
    let n = points.len();
    let ratio = if ratio.is_nan() { 1.0 } else { ratio.clamp(0.0, 1.0) };
    let target = ((ratio * n as f64).ceil() as usize).max(2);
    if n < 3 || n <= target {
        return points.to_vec();
    }

    let mut prev: Vec<usize> = (0..n).map(|i| (i + n - 1) % n).collect();
    let mut next: Vec<usize> = (0..n).map(|i| (i + 1) % n).collect();
    let mut alive = vec![true; n];
    let mut cost: Vec<f64> = (0..n)
        .map(|i| removal_cost(points, prev[i], next[i]))
        .collect();
    let mut remaining = n;

    while remaining > target {
        let mut victim = None;
        let mut best = f64::INFINITY;
        for i in (0..n).filter(|&i| alive[i]) {
            if cost[i] < best {
                best = cost[i];
                victim = Some(i);
            }
        }
        let Some(v) = victim else { break };

        let (p, q) = (prev[v], next[v]);
        next[p] = q;
        prev[q] = p;
        alive[v] = false;
        remaining -= 1;

        cost[p] = removal_cost(points, prev[p], next[p]);
        cost[q] = removal_cost(points, prev[q], next[q]);
    }

    (0..n).filter(|&i| alive[i]).map(|i| points[i]).collect()
}

/// Largest squared distance from the original points strictly between
/// `from` and `to` (cyclically) to the segment `from`–`to`.
fn removal_cost(points: &[Point2], from: usize, to: usize) -> f64 {
    let n = points.len();
    let a = &points[from];
    let b = &points[to];
    let mut worst: f64 = 0.0;
    let mut i = (from + 1) % n;
    while i != to {
        worst = worst.max(point_segment_dist_sq(&points[i], a, b));
        i = (i + 1) % n;
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slice::fixtures::{circle, square};

    #[test]
    fn ratio_one_keeps_every_vertex() {
        let pts = circle(0.0, 0.0, 1.0, 37);
        assert_eq!(simplify_loop(&pts, 1.0).len(), 37);
    }

    #[test]
    fn collinear_points_go_first() {
        // 4 corners plus 4 points on each side: all 16 side points are free.
        let pts = square(0.0, 0.0, 1.0, 5);
        let out = simplify_loop(&pts, 0.2);
        assert_eq!(out.len(), 4);
        for p in &out {
            assert!((p.x.abs() - 1.0).abs() < 1e-12);
            assert!((p.y.abs() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn ratio_rounds_up() {
        let pts = circle(0.0, 0.0, 1.0, 10);
        assert_eq!(simplify_loop(&pts, 0.55).len(), 6);
        assert_eq!(simplify_loop(&pts, 0.0).len(), 2);
    }

    #[test]
    fn slice_simplify_with_ratio_one_is_identity() {
        let mut slice = Slice::new(vec![
            circle(0.0, 0.0, 10.0, 60),
            circle(0.0, 0.0, 2.0, 12),
            vec![Point2::new(1.0, 1.0), Point2::new(1.5, 1.0)],
        ]);
        slice.simplify(1.0);
        assert_eq!(slice.num_constraints(), 2);
        assert_eq!(slice.constraint(0).len(), 60);
        assert_eq!(slice.constraint(1).len(), 12);
    }

    #[test]
    fn slice_simplify_drops_collapsed_loops() {
        let mut slice = Slice::new(vec![circle(0.0, 0.0, 10.0, 64), circle(0.0, 0.0, 2.0, 12)]);
        slice.simplify(0.125);
        assert_eq!(slice.num_constraints(), 1);
        assert_eq!(slice.constraint(0).len(), 8);
    }

    #[test]
    fn invalid_slice_is_not_simplified() {
        let mut slice = Slice::new(vec![square(0.0, 0.0, 1.0, 2)]);
        slice.simplify(0.1);
        assert_eq!(slice.constraint(0).len(), 8);
    }
}
