use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use crate::math::Point2;

use super::{ConstraintLoop, SliceParams};

/// An unordered 2D segment, typically the trace of one triangle on a cut
/// plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment2 {
    pub start: Point2,
    pub end: Point2,
}

impl Segment2 {
    #[must_use]
    pub fn new(start: Point2, end: Point2) -> Self {
        Self { start, end }
    }

    #[must_use]
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }
}

/// Merges points that fall within a tolerance of an earlier one.
struct NodeSnapper {
    tolerance: f64,
    cell: f64,
    grid: HashMap<(i64, i64), Vec<usize>>,
    points: Vec<Point2>,
}

impl NodeSnapper {
    fn new(tolerance: f64) -> Self {
        let tolerance = tolerance.max(0.0);
        Self {
            tolerance,
            cell: tolerance.max(f64::MIN_POSITIVE),
            grid: HashMap::new(),
            points: Vec::new(),
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn cell_of(&self, p: &Point2) -> (i64, i64) {
        ((p.x / self.cell).floor() as i64, (p.y / self.cell).floor() as i64)
    }

    fn insert(&mut self, p: Point2) -> usize {
        let (cx, cy) = self.cell_of(&p);
        for dx in -1..=1 {
            for dy in -1..=1 {
                let key = (cx.saturating_add(dx), cy.saturating_add(dy));
                if let Some(bucket) = self.grid.get(&key) {
                    if let Some(&found) = bucket
                        .iter()
                        .find(|&&i| (self.points[i] - p).norm() <= self.tolerance)
                    {
                        return found;
                    }
                }
            }
        }
        let id = self.points.len();
        self.points.push(p);
        self.grid.entry((cx, cy)).or_default().push(id);
        id
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Chains unordered segments into closed loops.
///
/// Endpoints within `snap_tolerance` are merged and repeated or degenerate
/// segments are ignored. A chain that does not return to its start is closed
/// if the gap between its ends is at most `close_tolerance` and dropped with
/// a warning otherwise. Loops with fewer than three points are dropped.
#[must_use]
pub fn assemble_loops(segments: &[Segment2], params: &SliceParams) -> Vec<ConstraintLoop> {
    let mut snapper = NodeSnapper::new(params.snap_tolerance);
    let mut edges = BTreeSet::new();
    for seg in segments {
        let a = snapper.insert(seg.start);
        let b = snapper.insert(seg.end);
        if a != b {
            edges.insert(edge_key(a, b));
        }
    }

    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); snapper.points.len()];
    for &(a, b) in &edges {
        adjacency[a].push(b);
        adjacency[b].push(a);
    }

    let mut used: HashSet<(usize, usize)> = HashSet::with_capacity(edges.len());
    let mut loops = Vec::new();
    let mut dropped = 0usize;

    for &(a, b) in &edges {
        if used.contains(&(a, b)) {
            continue;
        }
        used.insert((a, b));
        let mut chain: VecDeque<usize> = VecDeque::from([a, b]);

        let mut closed = extend(&mut chain, &adjacency, &mut used, true);
        if !closed {
            closed = extend(&mut chain, &adjacency, &mut used, false);
        }

        let points: ConstraintLoop = chain.iter().map(|&i| snapper.points[i]).collect();
        if !closed {
            let gap = match (points.first(), points.last()) {
                (Some(first), Some(last)) => (last - first).norm(),
                _ => f64::INFINITY,
            };
            if gap > params.close_tolerance {
                warn!(points = points.len(), gap, "dropping open cut chain");
                dropped += 1;
                continue;
            }
        }
        if points.len() < 3 {
            dropped += 1;
            continue;
        }
        loops.push(points);
    }

    debug!(
        segments = segments.len(),
        nodes = snapper.points.len(),
        loops = loops.len(),
        dropped,
        "segments assembled"
    );
    loops
}

/// Walks unused edges from one end of `chain`. Returns `true` when the walk
/// reaches the other end, closing the loop.
fn extend(
    chain: &mut VecDeque<usize>,
    adjacency: &[Vec<usize>],
    used: &mut HashSet<(usize, usize)>,
    forward: bool,
) -> bool {
    loop {
        let (tip, other_end) = if forward {
            (chain.back(), chain.front())
        } else {
            (chain.front(), chain.back())
        };
        let (Some(&tip), Some(&other_end)) = (tip, other_end) else {
            return false;
        };
        let Some(&next) = adjacency[tip]
            .iter()
            .find(|&&n| !used.contains(&edge_key(tip, n)))
        else {
            return false;
        };
        used.insert(edge_key(tip, next));
        if next == other_end {
            return true;
        }
        if forward {
            chain.push_back(next);
        } else {
            chain.push_front(next);
        }
    }
}
