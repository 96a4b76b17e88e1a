//! Octree for static scenes.

use super::{SpatialEntry, SpatialIndex};
use crate::core::NodeId;
use crate::math::{Aabb, Ray};
use log::debug;

/// Subdivision limits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OctreeConfig {
    /// Deepest level that may be created (root is depth 0).
    pub max_depth: usize,
    /// A leaf splits once it holds more than this many entries.
    pub max_objects_per_leaf: usize,
    /// Padding added around the union of all entry bounds.
    pub margin: f64,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_objects_per_leaf: 8,
            margin: 0.01,
        }
    }
}

#[derive(Debug)]
struct OctreeNode {
    bounds: Aabb,
    depth: usize,
    items: Vec<usize>,
    children: Option<Box<[OctreeNode; 8]>>,
}

impl OctreeNode {
    fn leaf(bounds: Aabb, depth: usize) -> Self {
        Self {
            bounds,
            depth,
            items: Vec::new(),
            children: None,
        }
    }

    fn insert(&mut self, index: usize, entries: &[SpatialEntry], config: &OctreeConfig) {
        let bounds = entries[index].bounds;
        if let Some(children) = self.children.as_mut() {
            // Straddlers go into every child they touch.
            for child in children.iter_mut() {
                if child.bounds.intersects_box(&bounds) {
                    child.insert(index, entries, config);
                }
            }
            return;
        }
        self.items.push(index);
        if self.items.len() > config.max_objects_per_leaf
            && self.depth < config.max_depth
            && self.split_separates(entries)
        {
            self.subdivide(entries, config);
        }
    }

    /// Whether splitting tells entries apart: some octant takes only part of
    /// them, or all of them fit in a single octant. Otherwise every occupied
    /// child would be a copy of this leaf.
    fn split_separates(&self, entries: &[SpatialEntry]) -> bool {
        let total = self.items.len();
        let counts = self.bounds.octants().map(|octant| {
            self.items
                .iter()
                .filter(|&&i| octant.intersects_box(&entries[i].bounds))
                .count()
        });
        let occupied = counts.iter().filter(|&&c| c > 0).count();
        occupied == 1 || counts.iter().any(|&c| c > 0 && c < total)
    }

    fn subdivide(&mut self, entries: &[SpatialEntry], config: &OctreeConfig) {
        let depth = self.depth + 1;
        let octants = self.bounds.octants();
        self.children = Some(Box::new(octants.map(|b| OctreeNode::leaf(b, depth))));
        for index in std::mem::take(&mut self.items) {
            self.insert(index, entries, config);
        }
    }

    fn count(&self) -> usize {
        1 + self
            .children
            .as_ref()
            .map_or(0, |c| c.iter().map(OctreeNode::count).sum())
    }
}

/// Octree over entry bounds. Child boxes partition their parent; entries
/// that straddle a split are referenced from every child they overlap.
#[derive(Debug)]
pub struct Octree {
    root: OctreeNode,
    entries: Vec<SpatialEntry>,
    config: OctreeConfig,
}

impl Octree {
    /// Build from entries. Entries with empty bounds are ignored.
    pub fn build(entries: &[SpatialEntry], config: OctreeConfig) -> Self {
        let entries: Vec<SpatialEntry> = entries.iter().filter(|e| !e.bounds.is_empty()).copied().collect();
        let mut bounds = entries.iter().fold(Aabb::EMPTY, |acc, e| acc.union(&e.bounds));
        if bounds.is_empty() {
            bounds = Aabb::new(Default::default(), Default::default());
        }
        bounds.expand_by_scalar(config.margin);

        let mut root = OctreeNode::leaf(bounds, 0);
        for index in 0..entries.len() {
            root.insert(index, &entries, &config);
        }
        let tree = Self { root, entries, config };
        debug!("octree built: {} entries, {} nodes", tree.entries.len(), tree.node_count());
        tree
    }

    /// Root bounds including the margin.
    #[inline]
    pub fn bounds(&self) -> &Aabb {
        &self.root.bounds
    }

    /// Limits used at build time.
    #[inline]
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Number of tree nodes.
    pub fn node_count(&self) -> usize {
        self.root.count()
    }

    fn collect(&self, mut visit_node: impl FnMut(&Aabb) -> bool, mut accept: impl FnMut(&SpatialEntry) -> bool) -> Vec<NodeId> {
        let mut seen = vec![false; self.entries.len()];
        let mut hits = Vec::new();
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            if !visit_node(&node.bounds) {
                continue;
            }
            for &index in &node.items {
                if !seen[index] {
                    seen[index] = true;
                    if accept(&self.entries[index]) {
                        hits.push(index);
                    }
                }
            }
            if let Some(children) = node.children.as_ref() {
                stack.extend(children.iter());
            }
        }
        hits.sort_unstable();
        hits.into_iter().map(|i| self.entries[i].id).collect()
    }
}

impl SpatialIndex for Octree {
    fn query_aabb(&self, query: &Aabb) -> Vec<NodeId> {
        self.collect(|b| b.intersects_box(query), |e| e.bounds.intersects_box(query))
    }

    fn query_ray(&self, ray: &Ray, max_distance: f64) -> Vec<NodeId> {
        self.collect(
            |b| b.intersect_ray(ray, max_distance).is_some(),
            |e| e.bounds.intersect_ray(ray, max_distance).is_some(),
        )
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

    fn grid(ids: &IdGenerator, n: usize) -> Vec<SpatialEntry> {
        let mut out = Vec::new();
        for x in 0..n {
            for y in 0..n {
                let c = Vector3::new(x as f64 * 2.0, y as f64 * 2.0, 0.0);
                out.push(SpatialEntry::new(ids.next_id(), Aabb::from_center_size(c, Vector3::ONE)));
            }
        }
        out
    }

    #[test]
    fn test_subdivides() {
        let entries = grid(&IdGenerator::new(), 6);
        let tree = Octree::build(&entries, OctreeConfig { max_objects_per_leaf: 2, ..Default::default() });
        assert!(tree.node_count() > 1);
        assert_eq!(tree.len(), 36);
    }

    #[test]
    fn test_aabb_query_matches_brute_force() {
        let entries = grid(&IdGenerator::new(), 6);
        let tree = Octree::build(&entries, OctreeConfig { max_objects_per_leaf: 2, ..Default::default() });
        let q = Aabb::new(Vector3::new(1.0, 1.0, -1.0), Vector3::new(5.0, 3.0, 1.0));
        let mut expected: Vec<_> = entries
            .iter()
            .filter(|e| e.bounds.intersects_box(&q))
            .map(|e| e.id)
            .collect();
        expected.sort();
        let mut got = tree.query_aabb(&q);
        got.sort();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_straddler_reported_once() {
        let ids = IdGenerator::new();
        let mut entries = grid(&ids, 3);
        let big = SpatialEntry::new(
            ids.next_id(),
            Aabb::new(Vector3::new(-10.0, -10.0, -10.0), Vector3::new(10.0, 10.0, 10.0)),
        );
        entries.push(big);
        let tree = Octree::build(&entries, OctreeConfig { max_objects_per_leaf: 1, ..Default::default() });
        let all = tree.query_aabb(tree.bounds());
        assert_eq!(all.len(), entries.len());
    }

    #[test]
    fn test_ray_query() {
        let entries = grid(&IdGenerator::new(), 4);
        let tree = Octree::build(&entries, OctreeConfig { max_objects_per_leaf: 2, ..Default::default() });
        let ray = Ray::new(Vector3::new(-5.0, 2.0, 0.0), Vector3::UNIT_X);
        assert_eq!(tree.query_ray(&ray, 100.0).len(), 4);
        assert_eq!(tree.query_ray(&ray, 1.0).len(), 0);
    }

    #[test]
    fn test_coincident_boxes_stay_in_one_leaf() {
        let ids = IdGenerator::new();
        let unit = Aabb::from_center_size(Vector3::ZERO, Vector3::ONE);
        let entries: Vec<_> = (0..9).map(|_| SpatialEntry::new(ids.next_id(), unit)).collect();
        let tree = Octree::build(&entries, OctreeConfig::default());
        assert_eq!(tree.node_count(), 1);
        assert_eq!(tree.query_aabb(&unit).len(), 9);
    }

    #[test]
    fn test_coincident_cluster_grows_linearly_with_depth() {
        let ids = IdGenerator::new();
        let far = SpatialEntry::new(ids.next_id(), Aabb::from_center_size(Vector3::new(40.0, 40.0, 40.0), Vector3::ONE));
        let unit = Aabb::from_center_size(Vector3::new(3.3, 2.1, 1.7), Vector3::ONE);
        let mut entries: Vec<_> = (0..9).map(|_| SpatialEntry::new(ids.next_id(), unit)).collect();
        entries.push(far);
        let config = OctreeConfig::default();
        let tree = Octree::build(&entries, config);
        // The cluster only ever descends through a single child per level.
        assert!(tree.node_count() <= 1 + 8 * config.max_depth, "{} nodes", tree.node_count());
        assert_eq!(tree.query_aabb(&unit).len(), 9);
    }

    #[test]
    fn test_empty() {
        let tree = Octree::build(&[], OctreeConfig::default());
        assert!(tree.is_empty());
        assert!(tree.query_aabb(&Aabb::from_center_size(Vector3::ZERO, Vector3::ONE)).is_empty());
    }
}
