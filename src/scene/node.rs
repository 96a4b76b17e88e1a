//! Scene nodes and their renderable payloads.

use super::Transform;
use crate::core::NodeId;
use crate::geometry::{Circle, Line, Mesh, Quad, Triangle};
use crate::lod::LodGroup;
use crate::math::Aabb;
use std::collections::HashSet;
use std::fmt;

/// Per-frame callback attached to a node. Receives the node and the frame
/// delta in seconds.
pub type UpdateFn = Box<dyn FnMut(&mut SceneNode, f64) + Send>;

/// What a node draws.
#[derive(Debug, Clone)]
pub enum Payload {
    /// A single triangle.
    Triangle(Triangle),
    /// A planar quad.
    Quad(Quad),
    /// A line segment.
    Line(Line),
    /// A filled disc.
    Circle(Circle),
    /// An indexed mesh.
    Mesh(Mesh),
    /// Alternative meshes picked by camera distance or screen size.
    Lod(LodGroup),
}

impl Payload {
    /// Bounds in the node's local space.
    pub fn local_bounds(&self) -> Aabb {
        match self {
            Payload::Triangle(t) => t.bounds(),
            Payload::Quad(q) => q.bounds(),
            Payload::Line(l) => l.bounds(),
            Payload::Circle(c) => c.bounds(),
            Payload::Mesh(m) => m.bounds(),
            Payload::Lod(g) => g.bounds(),
        }
    }

    /// Local-space triangles for ray tests. `None` entries are malformed mesh faces.
    pub fn triangles(&self) -> Vec<Option<Triangle>> {
        match self {
            Payload::Triangle(t) => vec![Some(t.clone())],
            Payload::Quad(q) => q.triangles().into_iter().map(Some).collect(),
            Payload::Line(_) => Vec::new(),
            Payload::Circle(c) => c.triangles().into_iter().map(Some).collect(),
            Payload::Mesh(m) => m.faces().collect(),
            Payload::Lod(g) => g
                .current_level()
                .map(|l| l.mesh.faces().collect())
                .unwrap_or_default(),
        }
    }

    /// Short name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Triangle(_) => "triangle",
            Payload::Quad(_) => "quad",
            Payload::Line(_) => "line",
            Payload::Circle(_) => "circle",
            Payload::Mesh(_) => "mesh",
            Payload::Lod(_) => "lod",
        }
    }
}

impl From<Triangle> for Payload {
    fn from(t: Triangle) -> Self {
        Payload::Triangle(t)
    }
}

impl From<Quad> for Payload {
    fn from(q: Quad) -> Self {
        Payload::Quad(q)
    }
}

impl From<Line> for Payload {
    fn from(l: Line) -> Self {
        Payload::Line(l)
    }
}

impl From<Circle> for Payload {
    fn from(c: Circle) -> Self {
        Payload::Circle(c)
    }
}

impl From<Mesh> for Payload {
    fn from(m: Mesh) -> Self {
        Payload::Mesh(m)
    }
}

impl From<LodGroup> for Payload {
    fn from(g: LodGroup) -> Self {
        Payload::Lod(g)
    }
}

/// A node of the scene graph.
///
/// Nodes are created free-standing and handed to
/// [`Scene::add_node`](super::Scene::add_node), which assigns the id and
/// links parent and children.
pub struct SceneNode {
    pub(crate) id: NodeId,
    name: String,
    /// Local transform.
    pub transform: Transform,
    /// Renderable content.
    pub payload: Option<Payload>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// Disabled nodes hide their whole subtree.
    pub enabled: bool,
    tags: HashSet<String>,
    pub(crate) update: Option<UpdateFn>,
}

impl SceneNode {
    /// Create an empty, enabled node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::default(),
            name: name.into(),
            transform: Transform::new(),
            payload: None,
            parent: None,
            children: Vec::new(),
            enabled: true,
            tags: HashSet::new(),
            update: None,
        }
    }

    /// Set the payload.
    pub fn with_payload(mut self, payload: impl Into<Payload>) -> Self {
        self.payload = Some(payload.into());
        self
    }

    /// Set the transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Add a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Attach an update callback.
    pub fn with_update(mut self, update: impl FnMut(&mut SceneNode, f64) + Send + 'static) -> Self {
        self.update = Some(Box::new(update));
        self
    }

    /// Node id, assigned when added to a scene.
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Unique name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent node, `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in insertion order.
    #[inline]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Add a tag.
    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    /// Remove a tag.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        self.tags.remove(tag)
    }

    /// Whether the node carries a tag.
    #[inline]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// All tags.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Whether the node has an update callback.
    #[inline]
    pub fn has_update(&self) -> bool {
        self.update.is_some()
    }
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("payload", &self.payload.as_ref().map(Payload::kind))
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("enabled", &self.enabled)
            .field("tags", &self.tags)
            .field("update", &self.update.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::material::Material;
    use crate::math::Vector3;
    use std::sync::Arc;

    #[test]
    fn test_builder() {
        let tri = Triangle::new(
            Vector3::ZERO,
            Vector3::UNIT_X,
            Vector3::UNIT_Y,
            Arc::new(Material::default()),
        );
        let node = SceneNode::new("tri").with_payload(tri).with_tag("enemy");
        assert_eq!(node.name(), "tri");
        assert!(node.has_tag("enemy"));
        assert!(node.enabled);
        assert_eq!(node.payload.as_ref().map(Payload::kind), Some("triangle"));
        let b = node.payload.as_ref().map(Payload::local_bounds).unwrap();
        assert!(b.approx_eq(&Aabb::new(Vector3::ZERO, Vector3::new(1.0, 1.0, 0.0)), 1e-12));
    }
}
