//! Transform component for scene nodes.

use crate::math::{Euler, Matrix4, Vector3};

/// Local position, rotation and scale with a cached world matrix.
///
/// The world matrix is current iff the transform is not dirty. Every setter
/// marks the transform dirty; the owning [`Scene`](super::Scene) cascades the
/// flag to descendants and supplies the parent's world matrix when
/// propagating.
#[derive(Debug, Clone)]
pub struct Transform {
    position: Vector3,
    rotation: Euler,
    scale: Vector3,
    /// World matrix of the parent, identity for roots.
    parent_world: Matrix4,
    world_matrix: Matrix4,
    dirty: bool,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}

impl Transform {
    /// Create a new identity transform.
    pub fn new() -> Self {
        Self {
            position: Vector3::ZERO,
            rotation: Euler::ZERO,
            scale: Vector3::ONE,
            parent_world: Matrix4::IDENTITY,
            world_matrix: Matrix4::IDENTITY,
            dirty: false,
        }
    }

    /// Create a transform from position.
    pub fn from_position(position: Vector3) -> Self {
        Self::from_components(position, Euler::ZERO, Vector3::ONE)
    }

    /// Create a transform from position, rotation, and scale.
    pub fn from_components(position: Vector3, rotation: Euler, scale: Vector3) -> Self {
        Self {
            position,
            rotation,
            scale,
            dirty: true,
            ..Self::new()
        }
    }

    /// Local position.
    #[inline]
    pub fn position(&self) -> Vector3 {
        self.position
    }

    /// Local rotation.
    #[inline]
    pub fn rotation(&self) -> Euler {
        self.rotation
    }

    /// Local scale.
    #[inline]
    pub fn scale(&self) -> Vector3 {
        self.scale
    }

    /// Set position.
    #[inline]
    pub fn set_position(&mut self, position: Vector3) {
        self.position = position;
        self.dirty = true;
    }

    /// Set rotation.
    #[inline]
    pub fn set_rotation(&mut self, rotation: Euler) {
        self.rotation = rotation;
        self.dirty = true;
    }

    /// Set scale.
    #[inline]
    pub fn set_scale(&mut self, scale: Vector3) {
        self.scale = scale;
        self.dirty = true;
    }

    /// Translate by a vector in parent space.
    #[inline]
    pub fn translate(&mut self, delta: &Vector3) {
        self.position += *delta;
        self.dirty = true;
    }

    /// Add a rotation delta.
    #[inline]
    pub fn rotate(&mut self, delta: &Euler) {
        self.rotation = self.rotation + *delta;
        self.dirty = true;
    }

    /// Turn to face a target in parent space. Roll is left unchanged.
    pub fn look_at(&mut self, target: &Vector3) {
        let d = *target - self.position;
        self.rotation.yaw = d.x.atan2(d.z);
        self.rotation.pitch = -d.y.atan2((d.x * d.x + d.z * d.z).sqrt());
        self.dirty = true;
    }

    /// `Translate * Rotate * Scale` from the current components.
    #[inline]
    pub fn local_matrix(&self) -> Matrix4 {
        Matrix4::compose(&self.position, &self.rotation, &self.scale)
    }

    /// Cached world matrix. Stale while [`Transform::is_dirty`] is true.
    #[inline]
    pub fn cached_world_matrix(&self) -> &Matrix4 {
        &self.world_matrix
    }

    /// World matrix, recomputed only when dirty.
    pub fn world_matrix(&mut self) -> Matrix4 {
        if self.dirty {
            self.world_matrix = self.parent_world.multiply(&self.local_matrix());
            self.dirty = false;
        }
        self.world_matrix
    }

    /// Record a new parent world matrix (identity for roots) and mark dirty.
    pub fn set_parent_world(&mut self, parent_world: Matrix4) {
        self.parent_world = parent_world;
        self.dirty = true;
    }

    /// Parent world matrix last supplied by the scene.
    #[inline]
    pub fn parent_world(&self) -> &Matrix4 {
        &self.parent_world
    }

    /// Whether the cached world matrix is out of date.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Force recomputation on the next [`Transform::world_matrix`] call.
    #[inline]
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Map a local point to world space.
    pub fn transform_point(&mut self, p: &Vector3) -> Vector3 {
        self.world_matrix().transform_point(p)
    }

    /// Map a world point back into local space.
    ///
    /// A zero scale component makes the local part non-invertible; it is
    /// then treated as identity and only the parent is undone.
    pub fn inverse_transform_point(&self, p: &Vector3) -> Vector3 {
        let in_parent = self.parent_world.inverse().transform_point(p);
        if self.scale.x == 0.0 || self.scale.y == 0.0 || self.scale.z == 0.0 {
            return in_parent;
        }
        let local = in_parent - self.position;
        let unrotated = Matrix4::from_rotation_z(-self.rotation.roll)
            .multiply(&Matrix4::from_rotation_x(-self.rotation.pitch))
            .multiply(&Matrix4::from_rotation_y(-self.rotation.yaw))
            .transform_direction(&local);
        Vector3::new(
            unrotated.x / self.scale.x,
            unrotated.y / self.scale.y,
            unrotated.z / self.scale.z,
        )
    }

    /// World position.
    pub fn world_position(&mut self) -> Vector3 {
        self.world_matrix().get_position()
    }

    /// Local +Z in world space.
    pub fn forward(&mut self) -> Vector3 {
        self.world_matrix().transform_direction(&Vector3::FORWARD).normalized()
    }

    /// Local +X in world space.
    pub fn right(&mut self) -> Vector3 {
        self.world_matrix().transform_direction(&Vector3::RIGHT).normalized()
    }

    /// Local +Y in world space.
    pub fn up(&mut self) -> Vector3 {
        self.world_matrix().transform_direction(&Vector3::UP).normalized()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transform() {
        let mut t = Transform::new();
        assert!(!t.is_dirty());
        assert!(t.world_matrix().approx_eq(&Matrix4::IDENTITY, 1e-12));
    }

    #[test]
    fn test_world_cached_until_mutated() {
        let mut t = Transform::from_position(Vector3::new(1.0, 2.0, 3.0));
        assert!(t.is_dirty());
        let m = t.world_matrix();
        assert!(!t.is_dirty());
        assert!(m.get_position().approx_eq(&Vector3::new(1.0, 2.0, 3.0), 1e-12));
        t.translate(&Vector3::UNIT_X);
        assert!(t.is_dirty());
        assert!(t.world_position().approx_eq(&Vector3::new(2.0, 2.0, 3.0), 1e-12));
    }

    #[test]
    fn test_parent_world_applied() {
        let mut t = Transform::from_position(Vector3::UNIT_X);
        t.set_parent_world(Matrix4::from_translation(&Vector3::new(0.0, 5.0, 0.0)));
        assert!(t.world_position().approx_eq(&Vector3::new(1.0, 5.0, 0.0), 1e-12));
    }

    #[test]
    fn test_inverse_roundtrip() {
        let mut t = Transform::from_components(
            Vector3::new(3.0, -1.0, 2.0),
            Euler::new(0.4, -1.2, 2.1),
            Vector3::new(2.0, 0.5, 3.0),
        );
        t.set_parent_world(Matrix4::compose(
            &Vector3::new(-4.0, 0.0, 1.0),
            &Euler::new(0.0, 0.7, 0.0),
            &Vector3::splat(1.5),
        ));
        let p = Vector3::new(0.3, 7.0, -2.5);
        let world = t.transform_point(&p);
        assert!(t.inverse_transform_point(&world).approx_eq(&p, 1e-9));
    }

    #[test]
    fn test_zero_scale_inverse_is_identity() {
        let mut t = Transform::from_position(Vector3::new(1.0, 1.0, 1.0));
        t.set_scale(Vector3::new(0.0, 1.0, 1.0));
        let p = Vector3::new(4.0, 5.0, 6.0);
        assert_eq!(t.inverse_transform_point(&p), p);
    }

    #[test]
    fn test_look_at() {
        let mut t = Transform::new();
        t.look_at(&Vector3::new(10.0, 0.0, 0.0));
        assert!(t.forward().approx_eq(&Vector3::UNIT_X, 1e-9));

        t.look_at(&Vector3::new(0.0, 10.0, 10.0));
        let f = t.forward();
        let expected = Vector3::new(0.0, 1.0, 1.0).normalized();
        assert!(f.approx_eq(&expected, 1e-9));
    }
}
