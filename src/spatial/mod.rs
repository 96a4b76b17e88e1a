//! Spatial acceleration structures over scene-node bounds.

mod bvh;
mod octree;

pub use bvh::{Bvh, SplitCandidate, SAH_BUCKETS};
pub use octree::{Octree, OctreeConfig};

use crate::core::NodeId;
use crate::math::{Aabb, Ray};

/// A node reference with its world-space bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialEntry {
    /// Scene node.
    pub id: NodeId,
    /// World-space bounds.
    pub bounds: Aabb,
}

impl SpatialEntry {
    /// Create an entry.
    #[inline]
    pub const fn new(id: NodeId, bounds: Aabb) -> Self {
        Self { id, bounds }
    }
}

/// Broad-phase queries shared by the octree and the BVH.
///
/// Results are conservative: every entry whose bounds satisfy the query is
/// returned, possibly with extra candidates. Each id appears at most once.
pub trait SpatialIndex {
    /// Entries whose bounds overlap `query`.
    fn query_aabb(&self, query: &Aabb) -> Vec<NodeId>;

    /// Entries whose bounds the ray enters within `max_distance`.
    fn query_ray(&self, ray: &Ray, max_distance: f64) -> Vec<NodeId>;

    /// Number of indexed entries.
    fn len(&self) -> usize;

    /// Whether nothing is indexed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
