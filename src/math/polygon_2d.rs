use super::{Point2, Vector2, TOLERANCE};

/// Position of a point relative to a closed polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundedSide {
    /// Strictly inside the polygon.
    Inside,
    /// On one of the polygon's edges (within [`TOLERANCE`]).
    Boundary,
    /// Strictly outside the polygon.
    Outside,
}

impl BoundedSide {
    /// Returns `true` unless the point is strictly outside.
    #[must_use]
    pub fn is_contained(self) -> bool {
        self != Self::Outside
    }
}

/// Computes the signed area of a closed polygon (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Returns the vertex centroid (arithmetic mean of the points).
///
/// Returns `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn vertex_centroid(points: &[Point2]) -> Option<Point2> {
    if points.is_empty() {
        return None;
    }
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc, p| acc + p.coords);
    Some(Point2::from(sum / points.len() as f64))
}

/// Returns the squared distance from `p` to the segment `a`–`b`.
#[must_use]
pub fn point_segment_dist_sq(p: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < 1e-20 {
        return (p - a).norm_squared();
    }
    let t = ((p - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    let closest = a + ab * t;
    (p - closest).norm_squared()
}

/// Classifies `point` against the closed polygon `polygon`.
///
/// The closing edge from the last vertex back to the first is implied.
#[must_use]
pub fn bounded_side(polygon: &[Point2], point: &Point2) -> BoundedSide {
    let n = polygon.len();
    if n == 0 {
        return BoundedSide::Outside;
    }

    let tol_sq = TOLERANCE * TOLERANCE;
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[(i + 1) % n];
        if point_segment_dist_sq(point, a, b) <= tol_sq {
            return BoundedSide::Boundary;
        }
    }
    if n < 3 {
        return BoundedSide::Outside;
    }

    // Crossing number along a ray towards +x.
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let a = &polygon[i];
        let b = &polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    if inside {
        BoundedSide::Inside
    } else {
        BoundedSide::Outside
    }
}
