//! Scene container: node arena, name registry and active camera.

use super::{Payload, SceneNode, Transform};
use crate::camera::Camera;
use crate::core::{IdGenerator, NodeId, SceneError};
use crate::math::{Aabb, Matrix4};
use log::debug;
use std::collections::HashMap;

/// Name given to the root node.
pub const ROOT_NAME: &str = "root";

/// The scene graph.
///
/// Nodes live in an arena keyed by [`NodeId`]; parents own their children
/// through the `children` lists. Reparenting rejects cycles, so the graph is
/// always a tree rooted at [`Scene::root`].
#[derive(Debug)]
pub struct Scene {
    nodes: HashMap<NodeId, SceneNode>,
    names: HashMap<String, NodeId>,
    root: NodeId,
    /// Active camera.
    pub camera: Camera,
    ids: IdGenerator,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Create a scene holding only the root node.
    pub fn new() -> Self {
        let ids = IdGenerator::new();
        let root = ids.next_id();
        let mut node = SceneNode::new(ROOT_NAME);
        node.id = root;
        let mut nodes = HashMap::new();
        nodes.insert(root, node);
        let mut names = HashMap::new();
        names.insert(ROOT_NAME.to_string(), root);
        Self {
            nodes,
            names,
            root,
            camera: Camera::default(),
            ids,
        }
    }

    /// Set the active camera.
    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// Root node id.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root exists.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Node by id.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Node by id, mutable. Transform edits made here are picked up by the
    /// next [`Scene::update_transforms`].
    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    /// Attach a node under `parent` (the root when `None`).
    pub fn add_node(&mut self, mut node: SceneNode, parent: Option<NodeId>) -> Result<NodeId, SceneError> {
        let parent = parent.unwrap_or(self.root);
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        if self.names.contains_key(node.name()) {
            return Err(SceneError::DuplicateName(node.name().to_string()));
        }
        let id = self.ids.next_id();
        node.id = id;
        node.parent = Some(parent);
        node.children.clear();
        node.transform.mark_dirty();
        self.names.insert(node.name().to_string(), id);
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Ok(id)
    }

    /// Detach and drop a node with its whole subtree. Returns the removed node.
    pub fn remove_node(&mut self, id: NodeId) -> Result<SceneNode, SceneError> {
        if id == self.root {
            return Err(SceneError::RootImmutable);
        }
        let parent = self.nodes.get(&id).ok_or(SceneError::UnknownNode(id))?.parent;
        if let Some(p) = parent.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != id);
        }
        let subtree = self.descendants(id);
        for child in subtree {
            if let Some(node) = self.nodes.remove(&child) {
                self.names.remove(node.name());
            }
        }
        let mut node = self.nodes.remove(&id).ok_or(SceneError::UnknownNode(id))?;
        self.names.remove(node.name());
        node.parent = None;
        debug!("removed node {} ({})", id, node.name());
        Ok(node)
    }

    /// Move a node under a new parent. Rejects moving a node below itself.
    pub fn set_parent(&mut self, id: NodeId, parent: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::RootImmutable);
        }
        if !self.nodes.contains_key(&id) {
            return Err(SceneError::UnknownNode(id));
        }
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::UnknownNode(parent));
        }
        if parent == id || self.is_ancestor(id, parent) {
            return Err(SceneError::CycleDetected { node: id, parent });
        }
        let old = self.nodes.get(&id).and_then(|n| n.parent);
        if let Some(p) = old.and_then(|p| self.nodes.get_mut(&p)) {
            p.children.retain(|c| *c != id);
        }
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        if let Some(n) = self.nodes.get_mut(&id) {
            n.parent = Some(parent);
        }
        self.mark_subtree_dirty(id);
        Ok(())
    }

    /// Whether `ancestor` lies on the path from `node` to the root.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.nodes.get(&node).and_then(|n| n.parent);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.nodes.get(&id).and_then(|n| n.parent);
        }
        false
    }

    /// All nodes below `id`, pre-order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self
            .nodes
            .get(&id)
            .map(|n| n.children.iter().rev().copied().collect())
            .unwrap_or_default();
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(n) = self.nodes.get(&current) {
                stack.extend(n.children.iter().rev());
            }
        }
        out
    }

    /// Node by name in O(1).
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    /// All nodes carrying a tag, in tree order.
    pub fn find_by_tag(&self, tag: &str) -> Vec<NodeId> {
        self.preorder(false)
            .into_iter()
            .filter(|id| self.nodes.get(id).is_some_and(|n| n.has_tag(tag)))
            .collect()
    }

    /// Enable or disable a node (and with it, its subtree).
    pub fn set_enabled(&mut self, id: NodeId, enabled: bool) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))?;
        node.enabled = enabled;
        Ok(())
    }

    /// Whether a node and all of its ancestors are enabled.
    pub fn is_enabled(&self, id: NodeId) -> bool {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            match self.nodes.get(&current) {
                Some(n) if n.enabled => cursor = n.parent,
                _ => return false,
            }
        }
        true
    }

    /// Edit a node's transform and mark its descendants dirty.
    pub fn with_transform<R>(&mut self, id: NodeId, f: impl FnOnce(&mut Transform) -> R) -> Option<R> {
        let result = f(&mut self.nodes.get_mut(&id)?.transform);
        self.mark_subtree_dirty(id);
        Some(result)
    }

    /// Mark a node and every descendant dirty.
    pub fn mark_subtree_dirty(&mut self, id: NodeId) {
        if let Some(n) = self.nodes.get_mut(&id) {
            n.transform.mark_dirty();
        }
        for child in self.descendants(id) {
            if let Some(n) = self.nodes.get_mut(&child) {
                n.transform.mark_dirty();
            }
        }
    }

    /// Recompute world matrices top-down. A node is refreshed when it is
    /// dirty or any ancestor was refreshed in this pass.
    pub fn update_transforms(&mut self) {
        let mut stack = vec![(self.root, Matrix4::IDENTITY, false)];
        while let Some((id, parent_world, parent_changed)) = stack.pop() {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            let changed = parent_changed || node.transform.is_dirty();
            if changed {
                node.transform.set_parent_world(parent_world);
            }
            let world = node.transform.world_matrix();
            stack.extend(node.children.iter().rev().map(|c| (*c, world, changed)));
        }
    }

    /// Cached world matrix of a node.
    pub fn world_matrix(&self, id: NodeId) -> Option<Matrix4> {
        self.nodes.get(&id).map(|n| *n.transform.cached_world_matrix())
    }

    /// World-space bounds of a node's payload, from the cached world matrix.
    pub fn world_bounds(&self, id: NodeId) -> Option<Aabb> {
        let node = self.nodes.get(&id)?;
        let local = node.payload.as_ref()?.local_bounds();
        Some(local.apply_matrix4(node.transform.cached_world_matrix()))
    }

    /// Node ids in depth-first pre-order, optionally skipping disabled subtrees.
    fn preorder(&self, skip_disabled: bool) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            if skip_disabled && !node.enabled {
                continue;
            }
            out.push(id);
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Enabled nodes with a payload, depth-first pre-order. Disabled nodes
    /// prune their whole subtree.
    pub fn get_renderable_nodes(&self) -> Vec<NodeId> {
        self.preorder(true)
            .into_iter()
            .filter(|id| self.nodes.get(id).is_some_and(|n| n.payload.is_some()))
            .collect()
    }

    /// Run update callbacks pre-order over enabled subtrees and advance LOD
    /// transitions. Transform changes made by a callback cascade to the
    /// node's descendants.
    pub fn update(&mut self, dt: f64) {
        for id in self.preorder(true) {
            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            if let Some(Payload::Lod(group)) = node.payload.as_mut() {
                group.update(dt);
            }
            let Some(mut callback) = node.update.take() else {
                continue;
            };
            callback(node, dt);
            let moved = node.transform.is_dirty();
            if node.update.is_none() {
                node.update = Some(callback);
            }
            if moved {
                self.mark_subtree_dirty(id);
            }
        }
    }

    /// Iterate all nodes in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &SceneNode> {
        self.nodes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector3;

    fn named(name: &str) -> SceneNode {
        SceneNode::new(name)
    }

    #[test]
    fn test_add_and_find() {
        let mut scene = Scene::new();
        let a = scene.add_node(named("a"), None).unwrap();
        let b = scene.add_node(named("b").with_tag("t"), Some(a)).unwrap();
        assert_eq!(scene.find_by_name("a"), Some(a));
        assert_eq!(scene.find_by_name("b"), Some(b));
        assert_eq!(scene.find_by_tag("t"), vec![b]);
        assert_eq!(scene.node(b).and_then(|n| n.parent()), Some(a));
        assert_eq!(scene.node(a).map(|n| n.children().to_vec()), Some(vec![b]));
    }

    #[test]
    fn test_duplicate_and_unknown() {
        let mut scene = Scene::new();
        scene.add_node(named("a"), None).unwrap();
        assert!(matches!(scene.add_node(named("a"), None), Err(SceneError::DuplicateName(_))));
        let removed = scene.add_node(named("gone"), None).unwrap();
        scene.remove_node(removed).unwrap();
        assert!(matches!(
            scene.add_node(named("c"), Some(removed)),
            Err(SceneError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_remove_subtree() {
        let mut scene = Scene::new();
        let a = scene.add_node(named("a"), None).unwrap();
        let b = scene.add_node(named("b"), Some(a)).unwrap();
        scene.add_node(named("c"), Some(b)).unwrap();
        scene.remove_node(a).unwrap();
        assert_eq!(scene.len(), 1);
        assert!(scene.find_by_name("c").is_none());
        assert!(matches!(scene.remove_node(scene.root()), Err(SceneError::RootImmutable)));
    }

    #[test]
    fn test_reparent_rejects_cycles() {
        let mut scene = Scene::new();
        let a = scene.add_node(named("a"), None).unwrap();
        let b = scene.add_node(named("b"), Some(a)).unwrap();
        let c = scene.add_node(named("c"), None).unwrap();
        assert!(matches!(scene.set_parent(a, b), Err(SceneError::CycleDetected { .. })));
        assert!(matches!(scene.set_parent(a, a), Err(SceneError::CycleDetected { .. })));
        scene.set_parent(b, c).unwrap();
        assert_eq!(scene.node(b).and_then(|n| n.parent()), Some(c));
        assert!(scene.node(a).is_some_and(|n| n.children().is_empty()));
    }

    #[test]
    fn test_enabled_is_transitive() {
        let mut scene = Scene::new();
        let a = scene.add_node(named("a"), None).unwrap();
        let b = scene.add_node(named("b"), Some(a)).unwrap();
        scene.set_enabled(a, false).unwrap();
        assert!(!scene.is_enabled(b));
        scene.set_enabled(a, true).unwrap();
        assert!(scene.is_enabled(b));
    }

    #[test]
    fn test_transform_propagation() {
        let mut scene = Scene::new();
        let a = scene
            .add_node(named("a").with_transform(Transform::from_position(Vector3::new(1.0, 0.0, 0.0))), None)
            .unwrap();
        let b = scene
            .add_node(named("b").with_transform(Transform::from_position(Vector3::new(0.0, 2.0, 0.0))), Some(a))
            .unwrap();
        scene.update_transforms();
        let p = scene.world_matrix(b).unwrap().get_position();
        assert!(p.approx_eq(&Vector3::new(1.0, 2.0, 0.0), 1e-12));

        scene.with_transform(a, |t| t.set_position(Vector3::new(5.0, 0.0, 0.0)));
        assert!(scene.node(b).is_some_and(|n| n.transform.is_dirty()));
        scene.update_transforms();
        let p = scene.world_matrix(b).unwrap().get_position();
        assert!(p.approx_eq(&Vector3::new(5.0, 2.0, 0.0), 1e-12));
        assert!(!scene.node(b).unwrap().transform.is_dirty());
    }

    #[test]
    fn test_update_runs_callbacks_preorder() {
        use std::sync::{Arc, Mutex};
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut scene = Scene::new();
        let l1 = Arc::clone(&log);
        let a = scene
            .add_node(
                named("a").with_update(move |n, dt| {
                    l1.lock().unwrap().push("a");
                    n.transform.translate(&Vector3::new(dt, 0.0, 0.0));
                }),
                None,
            )
            .unwrap();
        let l2 = Arc::clone(&log);
        let b = scene
            .add_node(named("b").with_update(move |_, _| l2.lock().unwrap().push("b")), Some(a))
            .unwrap();
        scene.update_transforms();
        scene.update(0.5);
        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
        assert!(scene.node(b).unwrap().transform.is_dirty());
        scene.update_transforms();
        let p = scene.world_matrix(b).unwrap().get_position();
        assert!(p.approx_eq(&Vector3::new(0.5, 0.0, 0.0), 1e-12));
        assert!(scene.node(a).unwrap().has_update());
    }
}
