//! Ray queries against the scene's triangles.

use super::Scene;
use crate::core::NodeId;
use crate::math::{Ray, Vector3};
use crate::spatial::{SpatialEntry, SpatialIndex};

/// Slack allowed when deciding whether a hit blocks a line of sight.
pub const LINE_OF_SIGHT_TOLERANCE: f64 = 0.01;

/// Closest intersection found by a raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Node that was hit.
    pub node: NodeId,
    /// Distance along the ray.
    pub distance: f64,
    /// World-space hit point.
    pub point: Vector3,
}

impl Scene {
    /// World bounds of every enabled renderable node, for building a
    /// [`SpatialIndex`]. Uses the cached world matrices.
    pub fn spatial_entries(&self) -> Vec<SpatialEntry> {
        self.get_renderable_nodes()
            .into_iter()
            .filter_map(|id| Some(SpatialEntry::new(id, self.world_bounds(id)?)))
            .collect()
    }

    /// Exact test of one node's world triangles. Lines never register hits.
    fn raycast_node(&self, id: NodeId, ray: &Ray, max_distance: f64) -> Option<f64> {
        let node = self.node(id)?;
        let world = self.world_matrix(id)?;
        node.payload
            .as_ref()?
            .triangles()
            .into_iter()
            .flatten()
            .filter_map(|t| ray.intersect_triangle(&t.transformed(&world).shape()))
            .map(|hit| hit.distance)
            .filter(|d| *d <= max_distance)
            .min_by(f64::total_cmp)
    }

    fn closest(&self, candidates: impl IntoIterator<Item = NodeId>, ray: &Ray, max_distance: f64) -> Option<RaycastHit> {
        candidates
            .into_iter()
            .filter_map(|id| {
                self.raycast_node(id, ray, max_distance)
                    .map(|distance| RaycastHit {
                        node: id,
                        distance,
                        point: ray.at(distance),
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Closest triangle hit within `max_distance`, scanning every enabled
    /// node whose world bounds the ray enters.
    ///
    /// Call [`Scene::update_transforms`] first if anything moved.
    pub fn raycast(&self, ray: &Ray, max_distance: f64) -> Option<RaycastHit> {
        let candidates = self
            .get_renderable_nodes()
            .into_iter()
            .filter(|id| {
                self.world_bounds(*id)
                    .is_some_and(|b| b.intersect_ray(ray, max_distance).is_some())
            });
        self.closest(candidates, ray, max_distance)
    }

    /// Like [`Scene::raycast`], with candidates taken from a prebuilt index.
    /// Nodes disabled since the index was built are skipped.
    pub fn raycast_with(&self, index: &dyn SpatialIndex, ray: &Ray, max_distance: f64) -> Option<RaycastHit> {
        let candidates = index
            .query_ray(ray, max_distance)
            .into_iter()
            .filter(|id| self.is_enabled(*id));
        self.closest(candidates, ray, max_distance)
    }

    /// Whether nothing blocks the segment from `from` to `to`. Hits within
    /// [`LINE_OF_SIGHT_TOLERANCE`] of `to` do not count.
    pub fn line_of_sight(&self, from: &Vector3, to: &Vector3) -> bool {
        let distance = from.distance_to(to);
        if !(distance > 0.0) {
            return true;
        }
        match self.raycast(&Ray::between(from, to), distance) {
            Some(hit) => hit.distance >= distance - LINE_OF_SIGHT_TOLERANCE,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Line, Quad};
    use crate::material::Material;
    use crate::math::Rgb;
    use crate::scene::{SceneNode, Transform};
    use crate::spatial::Bvh;
    use std::sync::Arc;

    // Off the quads' shared diagonal.
    const EYE: Vector3 = Vector3::new(0.3, -0.2, 0.0);

    fn wall(scene: &mut Scene, name: &str, z: f64) -> NodeId {
        let quad = Quad::square(2.0, Arc::new(Material::default()));
        let node = SceneNode::new(name)
            .with_payload(quad)
            .with_transform(Transform::from_position(Vector3::new(0.0, 0.0, z)));
        let id = scene.add_node(node, None).unwrap();
        scene.update_transforms();
        id
    }

    #[test]
    fn test_closest_hit() {
        let mut scene = Scene::new();
        let _far = wall(&mut scene, "far", 8.0);
        let near = wall(&mut scene, "near", 3.0);
        let ray = Ray::new(EYE, Vector3::UNIT_Z);
        let hit = scene.raycast(&ray, 100.0).unwrap();
        assert_eq!(hit.node, near);
        assert!((hit.distance - 3.0).abs() < 1e-9);
        assert!(hit.point.approx_eq(&Vector3::new(0.3, -0.2, 3.0), 1e-9));
    }

    #[test]
    fn test_max_distance() {
        let mut scene = Scene::new();
        wall(&mut scene, "wall", 5.0);
        let ray = Ray::new(EYE, Vector3::UNIT_Z);
        assert!(scene.raycast(&ray, 4.0).is_none());
    }

    #[test]
    fn test_disabled_nodes_ignored() {
        let mut scene = Scene::new();
        let id = wall(&mut scene, "wall", 5.0);
        let bvh = Bvh::build(&scene.spatial_entries());
        scene.set_enabled(id, false).unwrap();
        let ray = Ray::new(EYE, Vector3::UNIT_Z);
        assert!(scene.raycast(&ray, 100.0).is_none());
        assert!(scene.raycast_with(&bvh, &ray, 100.0).is_none());
    }

    #[test]
    fn test_lines_do_not_block() {
        let mut scene = Scene::new();
        let line = Line::new(Vector3::new(-1.0, 0.0, 2.0), Vector3::new(1.0, 0.0, 2.0), Rgb::WHITE);
        scene.add_node(SceneNode::new("line").with_payload(line), None).unwrap();
        scene.update_transforms();
        assert!(scene.line_of_sight(&EYE, &Vector3::new(0.3, -0.2, 4.0)));
    }

    #[test]
    fn test_line_of_sight() {
        let mut scene = Scene::new();
        wall(&mut scene, "wall", 5.0);
        assert!(scene.line_of_sight(&EYE, &Vector3::new(0.3, -0.2, 4.0)));
        assert!(!scene.line_of_sight(&EYE, &Vector3::new(0.3, -0.2, 6.0)));
        // Target sitting on the wall itself.
        assert!(scene.line_of_sight(&EYE, &Vector3::new(0.3, -0.2, 5.0)));
    }
}
