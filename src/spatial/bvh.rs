//! Bounding volume hierarchy built with the surface area heuristic.

use super::{SpatialEntry, SpatialIndex};
use crate::core::NodeId;
use crate::math::{Aabb, Ray};
use log::debug;

/// Candidate split planes tried per axis.
pub const SAH_BUCKETS: usize = 12;

/// One split considered during construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitCandidate {
    /// Axis (0 = x, 1 = y, 2 = z).
    pub axis: usize,
    /// Last bucket that goes to the left child.
    pub bucket: usize,
    /// `A(L)·|L| + A(R)·|R|`.
    pub cost: f64,
}

#[derive(Debug, Clone, Copy)]
enum BvhNode {
    Leaf { bounds: Aabb, entry: usize },
    Internal { bounds: Aabb, left: usize, right: usize },
}

impl BvhNode {
    #[inline]
    fn bounds(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { bounds, .. } | BvhNode::Internal { bounds, .. } => bounds,
        }
    }
}

/// Binary tree of bounds with exactly one entry per leaf.
///
/// Built top-down; there is no refitting, so rebuild after objects move.
#[derive(Debug, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    entries: Vec<SpatialEntry>,
    root: Option<usize>,
}

fn bucket_of(value: f64, min: f64, extent: f64) -> usize {
    (((value - min) / extent) * SAH_BUCKETS as f64).clamp(0.0, (SAH_BUCKETS - 1) as f64) as usize
}

fn centroid_bounds(entries: &[SpatialEntry], indices: &[usize]) -> Aabb {
    let mut bounds = Aabb::EMPTY;
    for &i in indices {
        bounds.expand_by_point(&entries[i].bounds.center());
    }
    bounds
}

/// Every bucket split along every axis with a non-empty side on both ends.
fn candidates(entries: &[SpatialEntry], indices: &[usize]) -> Vec<SplitCandidate> {
    let cb = centroid_bounds(entries, indices);
    let mut out = Vec::new();
    for axis in 0..3 {
        let (min, extent) = (cb.min[axis], cb.max[axis] - cb.min[axis]);
        if !(extent > 0.0) {
            continue;
        }
        let mut boxes = [Aabb::EMPTY; SAH_BUCKETS];
        let mut counts = [0usize; SAH_BUCKETS];
        for &i in indices {
            let b = bucket_of(entries[i].bounds.center()[axis], min, extent);
            boxes[b] = boxes[b].union(&entries[i].bounds);
            counts[b] += 1;
        }
        for split in 0..SAH_BUCKETS - 1 {
            let (mut left, mut right) = (Aabb::EMPTY, Aabb::EMPTY);
            let (mut nl, mut nr) = (0usize, 0usize);
            for b in 0..=split {
                left = left.union(&boxes[b]);
                nl += counts[b];
            }
            for b in split + 1..SAH_BUCKETS {
                right = right.union(&boxes[b]);
                nr += counts[b];
            }
            if nl == 0 || nr == 0 {
                continue;
            }
            out.push(SplitCandidate {
                axis,
                bucket: split,
                cost: left.surface_area() * nl as f64 + right.surface_area() * nr as f64,
            });
        }
    }
    out
}

fn build_node(nodes: &mut Vec<BvhNode>, entries: &[SpatialEntry], indices: &mut [usize]) -> usize {
    if let [only] = indices {
        nodes.push(BvhNode::Leaf {
            bounds: entries[*only].bounds,
            entry: *only,
        });
        return nodes.len() - 1;
    }

    let best = candidates(entries, indices)
        .into_iter()
        .min_by(|a, b| a.cost.total_cmp(&b.cost));

    let mid = match best {
        Some(split) => {
            let cb = centroid_bounds(entries, indices);
            let (min, extent) = (cb.min[split.axis], cb.max[split.axis] - cb.min[split.axis]);
            let goes_left =
                |i: &usize| bucket_of(entries[*i].bounds.center()[split.axis], min, extent) <= split.bucket;
            let (mut left, right): (Vec<usize>, Vec<usize>) = indices.iter().partition(|i| goes_left(i));
            let mid = left.len();
            left.extend(right);
            indices.copy_from_slice(&left);
            mid
        }
        // All centroids coincide: any split is as good as another.
        None => indices.len() / 2,
    };

    let (lo, hi) = indices.split_at_mut(mid);
    let left = build_node(nodes, entries, lo);
    let right = build_node(nodes, entries, hi);
    let bounds = nodes[left].bounds().union(nodes[right].bounds());
    nodes.push(BvhNode::Internal { bounds, left, right });
    nodes.len() - 1
}

impl Bvh {
    /// Build from entries. Entries with empty bounds are ignored.
    pub fn build(entries: &[SpatialEntry]) -> Self {
        let entries: Vec<SpatialEntry> = entries.iter().filter(|e| !e.bounds.is_empty()).copied().collect();
        let mut nodes = Vec::with_capacity(entries.len() * 2);
        let root = if entries.is_empty() {
            None
        } else {
            let mut indices: Vec<usize> = (0..entries.len()).collect();
            Some(build_node(&mut nodes, &entries, &mut indices))
        };
        debug!("bvh built: {} entries, {} nodes", entries.len(), nodes.len());
        Self { nodes, entries, root }
    }

    /// Splits the builder considers for the top level over `entries`.
    pub fn evaluate_splits(entries: &[SpatialEntry]) -> Vec<SplitCandidate> {
        let entries: Vec<SpatialEntry> = entries.iter().filter(|e| !e.bounds.is_empty()).copied().collect();
        let indices: Vec<usize> = (0..entries.len()).collect();
        candidates(&entries, &indices)
    }

    /// Bounds of everything in the tree.
    pub fn bounds(&self) -> Aabb {
        self.root.map_or(Aabb::EMPTY, |r| *self.nodes[r].bounds())
    }

    /// Number of tree nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn leaves_under(&self, node: usize) -> usize {
        match self.nodes[node] {
            BvhNode::Leaf { .. } => 1,
            BvhNode::Internal { left, right, .. } => self.leaves_under(left) + self.leaves_under(right),
        }
    }

    /// `A(L)·|L| + A(R)·|R|` of the root split, counting leaves below each
    /// child. `None` for trees with fewer than two entries.
    pub fn split_cost(&self) -> Option<f64> {
        match self.nodes.get(self.root?)? {
            BvhNode::Leaf { .. } => None,
            BvhNode::Internal { left, right, .. } => Some(
                self.nodes[*left].bounds().surface_area() * self.leaves_under(*left) as f64
                    + self.nodes[*right].bounds().surface_area() * self.leaves_under(*right) as f64,
            ),
        }
    }

    /// Height of the tree; a single leaf has depth 1.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[BvhNode], i: usize) -> usize {
            match nodes[i] {
                BvhNode::Leaf { .. } => 1,
                BvhNode::Internal { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        self.root.map_or(0, |r| walk(&self.nodes, r))
    }

    fn collect(&self, mut accept: impl FnMut(&Aabb) -> bool) -> Vec<NodeId> {
        let mut hits = Vec::new();
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(i) = stack.pop() {
            let node = &self.nodes[i];
            if !accept(node.bounds()) {
                continue;
            }
            match *node {
                BvhNode::Leaf { entry, .. } => hits.push(entry),
                BvhNode::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        hits.sort_unstable();
        hits.into_iter().map(|i| self.entries[i].id).collect()
    }
}

impl SpatialIndex for Bvh {
    fn query_aabb(&self, query: &Aabb) -> Vec<NodeId> {
        self.collect(|b| b.intersects_box(query))
    }

    fn query_ray(&self, ray: &Ray, max_distance: f64) -> Vec<NodeId> {
        self.collect(|b| b.intersect_ray(ray, max_distance).is_some())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::IdGenerator;
    use crate::math::Vector3;

    fn row(n: usize) -> Vec<SpatialEntry> {
        let ids = IdGenerator::new();
        (0..n)
            .map(|i| {
                let c = Vector3::new(i as f64 * 3.0, 0.0, 0.0);
                SpatialEntry::new(ids.next_id(), Aabb::from_center_size(c, Vector3::ONE))
            })
            .collect()
    }

    #[test]
    fn test_one_entry_per_leaf() {
        let bvh = Bvh::build(&row(7));
        assert_eq!(bvh.len(), 7);
        assert_eq!(bvh.node_count(), 13);
        assert_eq!(bvh.leaves_under(bvh.root.unwrap()), 7);
    }

    #[test]
    fn test_balanced_for_uniform_row() {
        let bvh = Bvh::build(&row(16));
        assert!(bvh.depth() <= 6);
    }

    #[test]
    fn test_root_uses_cheapest_split() {
        let entries = row(20);
        let bvh = Bvh::build(&entries);
        let best = Bvh::evaluate_splits(&entries)
            .iter()
            .map(|c| c.cost)
            .fold(f64::INFINITY, f64::min);
        let cost = bvh.split_cost().unwrap();
        assert!((cost - best).abs() < 1e-9);
    }

    #[test]
    fn test_coincident_centroids() {
        let ids = IdGenerator::new();
        let entries: Vec<_> = (0..5)
            .map(|_| SpatialEntry::new(ids.next_id(), Aabb::from_center_size(Vector3::ZERO, Vector3::ONE)))
            .collect();
        let bvh = Bvh::build(&entries);
        assert!(Bvh::evaluate_splits(&entries).is_empty());
        assert_eq!(bvh.query_aabb(&bvh.bounds()).len(), 5);
    }

    #[test]
    fn test_queries() {
        let entries = row(10);
        let bvh = Bvh::build(&entries);
        let q = Aabb::new(Vector3::new(2.0, -1.0, -1.0), Vector3::new(7.0, 1.0, 1.0));
        assert_eq!(bvh.query_aabb(&q), vec![entries[1].id, entries[2].id]);

        let ray = Ray::new(Vector3::new(-5.0, 0.0, 0.0), Vector3::UNIT_X);
        assert_eq!(bvh.query_ray(&ray, 1000.0).len(), 10);
        assert_eq!(bvh.query_ray(&ray, 5.0), vec![entries[0].id]);
    }

    #[test]
    fn test_empty() {
        let bvh = Bvh::build(&[]);
        assert!(bvh.is_empty());
        assert_eq!(bvh.depth(), 0);
        assert!(bvh.split_cost().is_none());
    }
}
