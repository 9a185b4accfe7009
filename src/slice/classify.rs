use crate::complex::SubdomainIndex;
use crate::math::polygon_2d::bounded_side;
use crate::math::Point2;

use super::ConstraintLoop;

/// Labels points of a slice by how deeply they are nested in its loops.
///
/// The first loop is the outer boundary and is not counted. A slice with a
/// single loop labels everything `1`; otherwise labels start at `2` and grow
/// by one for every inner loop containing the point, boundary included. The
/// label is a depth count, not a compact rank: a point three loops deep
/// (outer plus two inner) gets `4`.
#[derive(Debug, Clone, Copy)]
pub struct SubdomainClassifier<'a> {
    loops: &'a [ConstraintLoop],
}

impl<'a> SubdomainClassifier<'a> {
    /// Creates a classifier over loops sorted outer-first.
    #[must_use]
    pub fn new(loops: &'a [ConstraintLoop]) -> Self {
        Self { loops }
    }

    /// Returns the nesting-depth label of `point`.
    #[must_use]
    pub fn classify(&self, point: &Point2) -> SubdomainIndex {
        if self.loops.len() <= 1 {
            return 1;
        }
        let mut label = 2;
        for inner in &self.loops[1..] {
            if bounded_side(inner, point).is_contained() {
                label += 1;
            }
        }
        label
    }
}
