use nalgebra::{DMatrix, DVector, SVector};

use super::TOLERANCE;

/// Core-set iterations used when the accumulated set contains balls of
/// positive radius.
const BALL_ITERATIONS: usize = 4096;

/// Minimal-enclosing-ball accumulator.
///
/// Balls (a center and a radius, zero for plain points) are collected with
/// [`add`](Self::add); [`radius`](Self::radius) recomputes the minimal ball
/// enclosing the whole set on every call. Point sets are solved exactly with
/// Welzl's move-to-front algorithm. When some radius is positive the ball of
/// the centers seeds a Badoiu-Clarkson iteration, which converges to the
/// enclosing ball of the balls from above.
#[derive(Debug, Clone)]
pub struct BoundingRadius<const D: usize> {
    balls: Vec<(SVector<f64, D>, f64)>,
}

/// Accumulator for 2D slice points.
pub type BoundingCircle = BoundingRadius<2>;

/// Accumulator for 3D complex vertices.
pub type BoundingSphere = BoundingRadius<3>;

impl<const D: usize> Default for BoundingRadius<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const D: usize> BoundingRadius<D> {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self { balls: Vec::new() }
    }

    /// Adds a ball to the enclosed set. Negative radii are treated as zero.
    pub fn add(&mut self, point: &nalgebra::Point<f64, D>, radius: f64) {
        self.balls.push((point.coords, radius.max(0.0)));
    }

    /// Adds every point of `points` with zero radius.
    pub fn extend<'a, I>(&mut self, points: I)
    where
        I: IntoIterator<Item = &'a nalgebra::Point<f64, D>>,
    {
        self.balls
            .extend(points.into_iter().map(|p| (p.coords, 0.0)));
    }

    /// Number of accumulated balls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.balls.len()
    }

    /// Returns `true` if nothing has been added yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.balls.is_empty()
    }

    /// Removes every accumulated ball.
    pub fn clear(&mut self) {
        self.balls.clear();
    }

    /// Radius of the minimal ball enclosing the accumulated set.
    ///
    /// Returns `0.0` for an empty set.
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.ball().map_or(0.0, |(_, r)| r)
    }

    /// Center and radius of the minimal enclosing ball, or `None` when empty.
    #[must_use]
    pub fn ball(&self) -> Option<(nalgebra::Point<f64, D>, f64)> {
        if self.balls.is_empty() {
            return None;
        }

        let mut centers: Vec<SVector<f64, D>> = self.balls.iter().map(|(c, _)| *c).collect();
        let mut support = Vec::with_capacity(D + 1);
        let end = centers.len();
        let point_ball = move_to_front(&mut centers, end, &mut support);

        if self.balls.iter().all(|(_, r)| *r <= 0.0) {
            return Some((point_ball.center.into(), point_ball.radius.max(0.0)));
        }

        Some(self.refine_for_radii(point_ball.center))
    }

    /// Returns the index of the ball farthest from `center` and the distance
    /// to its far side.
    fn farthest(&self, center: &SVector<f64, D>) -> (usize, f64) {
        let mut best = (0, f64::NEG_INFINITY);
        for (i, (c, r)) in self.balls.iter().enumerate() {
            let d = (c - center).norm() + r;
            if d > best.1 {
                best = (i, d);
            }
        }
        best
    }

    #[allow(clippy::cast_precision_loss)]
    fn refine_for_radii(&self, start: SVector<f64, D>) -> (nalgebra::Point<f64, D>, f64) {
        let mut center = start;
        let mut best_center = start;
        let mut best_radius = self.farthest(&center).1;

        for k in 1..=BALL_ITERATIONS {
            let (idx, dist) = self.farthest(&center);
            if dist < best_radius {
                best_radius = dist;
                best_center = center;
            }
            let (c, r) = self.balls[idx];
            let dir = c - center;
            let len = dir.norm();
            let far = if len > TOLERANCE {
                c + dir * (r / len)
            } else {
                let mut unit = SVector::<f64, D>::zeros();
                if D > 0 {
                    unit[0] = 1.0;
                }
                c + unit * r
            };
            center += (far - center) / (k as f64 + 1.0);
        }

        let (_, dist) = self.farthest(&center);
        if dist < best_radius {
            (center.into(), dist)
        } else {
            (best_center.into(), best_radius)
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Ball<const D: usize> {
    center: SVector<f64, D>,
    radius: f64,
}

impl<const D: usize> Ball<D> {
    fn contains(&self, p: &SVector<f64, D>) -> bool {
        let slack = 1e-12 * self.radius.max(1.0);
        (p - self.center).norm() <= self.radius + slack
    }
}

/// Welzl's algorithm with the move-to-front heuristic. Recursion depth is
/// bounded by the size of the support set (at most `D + 1`).
fn move_to_front<const D: usize>(
    points: &mut [SVector<f64, D>],
    end: usize,
    support: &mut Vec<SVector<f64, D>>,
) -> Ball<D> {
    let mut ball = circumball(support);
    if support.len() == D + 1 {
        return ball;
    }

    for i in 0..end {
        if ball.contains(&points[i]) {
            continue;
        }
        support.push(points[i]);
        ball = move_to_front(points, i, support);
        support.pop();
        points[..=i].rotate_right(1);
    }

    ball
}

/// Smallest ball with every support point on its boundary.
fn circumball<const D: usize>(support: &[SVector<f64, D>]) -> Ball<D> {
    match support {
        [] => Ball {
            center: SVector::zeros(),
            radius: -1.0,
        },
        [p] => Ball {
            center: *p,
            radius: 0.0,
        },
        [p0, rest @ ..] => {
            let k = rest.len();
            let v: Vec<SVector<f64, D>> = rest.iter().map(|p| p - p0).collect();
            let gram = DMatrix::from_fn(k, k, |i, j| 2.0 * v[i].dot(&v[j]));
            let rhs = DVector::from_fn(k, |i, _| v[i].norm_squared());

            if let Some(lambda) = gram.lu().solve(&rhs) {
                let offset = v
                    .iter()
                    .zip(lambda.iter())
                    .fold(SVector::<f64, D>::zeros(), |acc, (vi, l)| acc + vi * *l);
                let center = p0 + offset;
                let radius = support
                    .iter()
                    .map(|p| (p - center).norm())
                    .fold(0.0, f64::max);
                if radius.is_finite() {
                    return Ball { center, radius };
                }
            }

            diametral_ball(support)
        }
    }
}

/// Ball spanned by the two farthest-apart points; fallback for degenerate
/// (affinely dependent) support sets.
fn diametral_ball<const D: usize>(support: &[SVector<f64, D>]) -> Ball<D> {
    let mut best = (support[0], support[0], 0.0);
    for (i, a) in support.iter().enumerate() {
        for b in &support[i + 1..] {
            let d = (a - b).norm();
            if d > best.2 {
                best = (*a, *b, d);
            }
        }
    }
    Ball {
        center: (best.0 + best.1) * 0.5,
        radius: best.2 * 0.5,
    }
}
